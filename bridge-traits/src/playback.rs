//! Playback bridge traits and supporting types.
//!
//! These abstractions let the playback coordinator drive the host's audio
//! stack without knowing which platform it runs on. Four collaborators are
//! involved:
//!
//! - [`TrackSource`] resolves a track identifier to a playable [`Locator`].
//! - [`AudioOutput`] is the player: it buffers locators and plays them.
//! - [`FocusArbiter`] grants or refuses exclusive audio focus.
//! - [`MediaSessionSink`] mirrors the session into the platform media
//!   session (lock screen, headset buttons, notification shade).
//!
//! Unsolicited focus changes are not pulled from the arbiter; the host
//! forwards them to the coordinator as [`FocusChange`] values.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Server-assigned track identifier.
///
/// Tracks that only exist on the device (not yet uploaded) carry
/// [`TrackId::UNSAVED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(i64);

impl TrackId {
    /// Sentinel for tracks that have no server identity yet.
    pub const UNSAVED: TrackId = TrackId(-1);

    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// Returns `true` if the track has a server-assigned identity.
    pub fn is_saved(self) -> bool {
        self != Self::UNSAVED
    }
}

impl From<i64> for TrackId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to playable media content, usually a resolved URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Locator {
    fn from(uri: String) -> Self {
        Self(uri)
    }
}

impl From<&str> for Locator {
    fn from(uri: &str) -> Self {
        Self(uri.to_string())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of an explicit focus request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusGrant {
    Granted,
    Denied,
}

impl FocusGrant {
    pub fn is_granted(self) -> bool {
        matches!(self, FocusGrant::Granted)
    }
}

/// Unsolicited focus transition reported by the host's arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusChange {
    /// Focus (re)gained, e.g. after a phone call ends.
    Granted,
    /// Focus lost for an unbounded time; another app took over.
    Denied,
    /// Focus lost briefly; expect a `Granted` later.
    TransientLoss,
    /// Brief loss where ducking would be allowed. Treated as a pause.
    TransientLossCanDuck,
}

impl FocusChange {
    /// Returns `true` for losses that are expected to end with a new grant.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            FocusChange::TransientLoss | FocusChange::TransientLossCanDuck
        )
    }

    pub fn is_loss(self) -> bool {
        !matches!(self, FocusChange::Granted)
    }
}

/// Playback state mirrored into the platform media session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

/// Unique identifier for one coordinator lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaybackSessionId(Uuid);

impl PlaybackSessionId {
    /// Generate a new session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlaybackSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlaybackSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata pushed to the platform media session. Implementations use this to
/// fill lock-screen controls and notification entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackMetadata {
    /// Track the metadata describes.
    pub track_id: Option<TrackId>,
    /// Display title for the track.
    pub title: Option<String>,
    /// Display artist string.
    pub artist: Option<String>,
    /// Locator of the poster/cover art, when the track has one.
    pub artwork: Option<Locator>,
    /// Arbitrary extra fields (e.g., duration in milliseconds).
    pub extra: HashMap<String, String>,
}

/// Resolves track identifiers to playable locators.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Resolve the playable locator for `track_id`.
    ///
    /// Fails with [`BridgeError::NotFound`](crate::BridgeError::NotFound) when
    /// the music service has no such track, and with
    /// [`BridgeError::Transport`](crate::BridgeError::Transport) when the
    /// service could not be reached.
    async fn resolve_locator(&self, track_id: TrackId) -> Result<Locator>;
}

/// Abstract player the coordinator drives.
///
/// Calls are fire-and-forget from the coordinator's point of view: an error is
/// logged and reported to observers but never stops event processing.
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Append a locator to the player's internal queue.
    async fn enqueue(&self, locator: &Locator) -> Result<()>;

    /// Drop everything buffered or enqueued.
    async fn clear(&self) -> Result<()>;

    /// Start playback of whatever is queued.
    async fn play(&self) -> Result<()>;

    /// Prepare the player and mark it ready to play.
    async fn set_ready_and_play(&self) -> Result<()>;

    /// Stop producing audio without dropping the queue.
    async fn suspend(&self) -> Result<()>;

    /// Advance to the next queued item.
    async fn skip_to_next(&self) -> Result<()>;

    /// Release native resources. Called once on teardown.
    async fn release(&self) -> Result<()>;
}

/// Host-side arbitration of exclusive audio focus.
#[async_trait]
pub trait FocusArbiter: Send + Sync {
    /// Ask for exclusive focus. May suspend while the host decides.
    async fn request_focus(&self) -> Result<FocusGrant>;

    /// Give focus back and unregister from change notifications.
    async fn release_focus(&self) -> Result<()>;
}

/// Platform media session mirror.
#[async_trait]
pub trait MediaSessionSink: Send + Sync {
    async fn set_active(&self, active: bool) -> Result<()>;

    async fn set_playback_state(&self, state: PlaybackState) -> Result<()>;

    async fn set_metadata(&self, metadata: PlaybackMetadata) -> Result<()>;

    /// Release the platform session. Called once on teardown.
    async fn release(&self) -> Result<()> {
        Ok(())
    }
}

/// Media session sink for hosts without a platform media session.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMediaSession;

#[async_trait]
impl MediaSessionSink for NoopMediaSession {
    async fn set_active(&self, _active: bool) -> Result<()> {
        Ok(())
    }

    async fn set_playback_state(&self, _state: PlaybackState) -> Result<()> {
        Ok(())
    }

    async fn set_metadata(&self, _metadata: PlaybackMetadata) -> Result<()> {
        Ok(())
    }
}
