//! # Host Bridge Traits
//!
//! Collaborator contracts that the host must implement for the playback
//! coordinator.
//!
//! ## Overview
//!
//! The coordinator owns the play queue and the session state machine, but it
//! never touches a real audio device, a network, or the operating system's
//! focus arbitration. Each of those is a trait here, injected at construction.
//!
//! ## Traits
//!
//! ### Playback
//! - [`TrackSource`](playback::TrackSource) - Track id to playable locator resolution
//! - [`AudioOutput`](playback::AudioOutput) - The player: enqueue, clear, play, suspend
//! - [`FocusArbiter`](playback::FocusArbiter) - Exclusive audio focus requests
//! - [`MediaSessionSink`](playback::MediaSessionSink) - Platform media session mirror
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should map platform failures onto the closest variant: `NotFound` and
//! `Transport` matter to the coordinator because they classify locator
//! resolution failures.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`; the coordinator calls them from a
//! spawned task.
//!
//! ## Examples
//!
//! ```ignore
//! use bridge_traits::playback::{FocusArbiter, FocusGrant};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct AlwaysGranted;
//!
//! #[async_trait]
//! impl FocusArbiter for AlwaysGranted {
//!     async fn request_focus(&self) -> Result<FocusGrant> {
//!         Ok(FocusGrant::Granted)
//!     }
//!
//!     async fn release_focus(&self) -> Result<()> {
//!         Ok(())
//!     }
//! }
//! ```

pub mod error;
pub mod playback;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use playback::{
    AudioOutput, FocusArbiter, FocusChange, FocusGrant, Locator, MediaSessionSink,
    NoopMediaSession, PlaybackMetadata, PlaybackSessionId, PlaybackState, TrackId, TrackSource,
};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
