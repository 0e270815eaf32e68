//! # Core Configuration Module
//!
//! Provides collaborator wiring for the playback coordinator.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds every collaborator the coordinator drives, plus the
//! behavioural switches it honours. It enforces fail-fast validation so that
//! a host forgetting to inject, say, a focus arbiter finds out at startup
//! instead of on the first play command.
//!
//! ## Required Dependencies
//!
//! - `TrackSource` - Resolves track ids to playable locators
//! - `AudioOutput` - The player the queue is fed into
//! - `FocusArbiter` - Grants exclusive audio focus
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `MediaSessionSink` - Platform media session mirror (default: no-op)
//! - `Clock` - Timestamp source for session snapshots (default: system clock)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .track_source(Arc::new(MyTrackSource))
//!     .audio_output(Arc::new(MyPlayer))
//!     .focus_arbiter(Arc::new(MyFocusArbiter))
//!     .media_session(Arc::new(MyMediaSession))
//!     .auto_play_on_first_enqueue(true)
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! Missing collaborators produce [`Error::CapabilityMissing`] naming the trait
//! and what the host should inject.

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{
    AudioOutput, Clock, FocusArbiter, MediaSessionSink, NoopMediaSession, SystemClock,
    TrackSource,
};
use std::sync::Arc;

/// Upper bound for the event bus buffer.
const MAX_EVENT_BUFFER_SIZE: usize = 10_000;

/// Core configuration for the playback coordinator.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Locator resolution (required)
    pub track_source: Arc<dyn TrackSource>,

    /// Audio output port (required)
    pub audio_output: Arc<dyn AudioOutput>,

    /// Audio focus arbitration (required)
    pub focus_arbiter: Arc<dyn FocusArbiter>,

    /// Platform media session mirror
    pub media_session: Arc<dyn MediaSessionSink>,

    /// Timestamp source for session snapshots
    pub clock: Arc<dyn Clock>,

    /// Buffer size of the event bus created for the coordinator
    pub event_buffer_size: usize,

    /// Behavioural switches
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("track_source", &"TrackSource { ... }")
            .field("audio_output", &"AudioOutput { ... }")
            .field("focus_arbiter", &"FocusArbiter { ... }")
            .field("media_session", &"MediaSessionSink { ... }")
            .field("clock", &"Clock { ... }")
            .field("event_buffer_size", &self.event_buffer_size)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional coordinator behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Start playback automatically after the first successful enqueue of the
    /// coordinator's lifetime.
    pub auto_play_on_first_enqueue: bool,

    /// Resume playback when focus comes back after a transient loss.
    pub resume_after_transient_loss: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            auto_play_on_first_enqueue: true,
            resume_after_transient_loss: true,
        }
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size exceeds maximum of {}",
                MAX_EVENT_BUFFER_SIZE
            )));
        }

        Ok(())
    }
}

fn capability_missing(capability: &str, message: &str) -> Error {
    Error::CapabilityMissing {
        capability: capability.to_string(),
        message: message.to_string(),
    }
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    track_source: Option<Arc<dyn TrackSource>>,
    audio_output: Option<Arc<dyn AudioOutput>>,
    focus_arbiter: Option<Arc<dyn FocusArbiter>>,
    media_session: Option<Arc<dyn MediaSessionSink>>,
    clock: Option<Arc<dyn Clock>>,
    event_buffer_size: Option<usize>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the track source used for locator resolution.
    pub fn track_source(mut self, source: Arc<dyn TrackSource>) -> Self {
        self.track_source = Some(source);
        self
    }

    /// Sets the audio output port.
    pub fn audio_output(mut self, output: Arc<dyn AudioOutput>) -> Self {
        self.audio_output = Some(output);
        self
    }

    /// Sets the audio focus arbiter.
    pub fn focus_arbiter(mut self, arbiter: Arc<dyn FocusArbiter>) -> Self {
        self.focus_arbiter = Some(arbiter);
        self
    }

    /// Sets the platform media session mirror.
    pub fn media_session(mut self, sink: Arc<dyn MediaSessionSink>) -> Self {
        self.media_session = Some(sink);
        self
    }

    /// Sets the timestamp source.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the event bus buffer size (default: 100).
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Enables or disables auto-play on the first successful enqueue.
    pub fn auto_play_on_first_enqueue(mut self, enabled: bool) -> Self {
        self.features.auto_play_on_first_enqueue = enabled;
        self
    }

    /// Enables or disables resuming after a transient focus loss ends.
    pub fn resume_after_transient_loss(mut self, enabled: bool) -> Self {
        self.features.resume_after_transient_loss = enabled;
        self
    }

    /// Replaces all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the configuration, validating that every required collaborator
    /// has been provided.
    pub fn build(self) -> Result<CoreConfig> {
        let track_source = self.track_source.ok_or_else(|| {
            capability_missing(
                "TrackSource",
                "TrackSource implementation is required to resolve track ids into playable \
                 locators. Inject the music-service client adapter.",
            )
        })?;

        let audio_output = self.audio_output.ok_or_else(|| {
            capability_missing(
                "AudioOutput",
                "AudioOutput implementation is required to play queued tracks. \
                 Inject the platform player adapter.",
            )
        })?;

        let focus_arbiter = self.focus_arbiter.ok_or_else(|| {
            capability_missing(
                "FocusArbiter",
                "FocusArbiter implementation is required before playback may start. \
                 Inject the platform audio-focus adapter.",
            )
        })?;

        let config = CoreConfig {
            track_source,
            audio_output,
            focus_arbiter,
            media_session: self
                .media_session
                .unwrap_or_else(|| Arc::new(NoopMediaSession)),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}
