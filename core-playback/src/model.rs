//! Data model shared by the coordinator and its callers.

use crate::error::PlaybackError;
use bridge_traits::{Locator, PlaybackMetadata, PlaybackSessionId, PlaybackState, TrackId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use core_runtime::events::{FaultKind, PauseReason};

/// A playable track.
///
/// Immutable once constructed; identity is [`Track::id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    pub duration: Duration,
    /// Locator of the audio file as known to the library. Used directly for
    /// unsaved tracks; saved tracks are resolved through the track source.
    pub music_file: Locator,
    pub poster_file: Option<Locator>,
}

impl Track {
    pub fn new(
        id: TrackId,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration: Duration,
        music_file: impl Into<Locator>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            artist: artist.into(),
            duration,
            music_file: music_file.into(),
            poster_file: None,
        }
    }

    pub fn with_poster(mut self, poster: impl Into<Locator>) -> Self {
        self.poster_file = Some(poster.into());
        self
    }

    /// Metadata pushed to the media session when this track is enqueued.
    pub fn metadata(&self) -> PlaybackMetadata {
        let mut metadata = PlaybackMetadata {
            track_id: Some(self.id),
            title: Some(self.title.clone()),
            artist: Some(self.artist.clone()),
            artwork: self.poster_file.clone(),
            ..Default::default()
        };
        metadata
            .extra
            .insert("duration_ms".to_string(), self.duration.as_millis().to_string());
        metadata
    }
}

/// One atomic submission of tracks to append to, or replace, the play queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueBatch {
    pub tracks: Vec<Track>,
    /// Clear everything already queued before enqueuing `tracks`.
    pub drop_queue: bool,
}

impl QueueBatch {
    /// Batch that replaces the current queue.
    pub fn replace(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            drop_queue: true,
        }
    }

    /// Batch that appends to the current queue.
    pub fn append(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            drop_queue: false,
        }
    }
}

/// Transport state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Stopped,
    Playing,
    Paused,
}

impl From<SessionState> for PlaybackState {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Stopped => PlaybackState::Stopped,
            SessionState::Playing => PlaybackState::Playing,
            SessionState::Paused => PlaybackState::Paused,
        }
    }
}

/// User and host requests that drive the transport state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportCommand {
    Play,
    Pause,
    Stop,
    /// Play when not playing, pause otherwise.
    TogglePlayPause,
    SkipToNext,
}

/// Notifications from the audio output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputEvent {
    /// The head of the output's queue finished playing.
    TrackFinished,
}

/// A recoverable failure recorded on the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub kind: FaultKind,
    pub track_id: Option<TrackId>,
    pub message: String,
}

impl Fault {
    /// Builds a fault from an error, or `None` if the error is not part of the
    /// fault taxonomy.
    pub fn from_error(error: &PlaybackError) -> Option<Self> {
        error.fault_kind().map(|kind| Self {
            kind,
            track_id: error.track_id(),
            message: error.to_string(),
        })
    }
}

/// Externally observable session snapshot.
///
/// Only the coordinator produces these; observers receive copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSession {
    pub session_id: PlaybackSessionId,
    /// Head of the output queue: the track playing, or next to play.
    /// Finishing or skipping it moves on to the following track. `None` when
    /// nothing is queued.
    pub current_track: Option<Track>,
    pub state: SessionState,
    pub pause_reason: Option<PauseReason>,
    /// One-way latch: set once auto-play on the first enqueue has actually
    /// reached PLAYING. Stays false when that attempt was refused focus.
    pub has_ever_started: bool,
    /// Whether the platform media session is active.
    pub is_active: bool,
    /// Tracks enqueued on the output and not yet finished.
    pub queue_len: usize,
    pub last_fault: Option<Fault>,
    pub updated_at_ms: i64,
}

impl PlaybackSession {
    pub fn new(session_id: PlaybackSessionId, now_ms: i64) -> Self {
        Self {
            session_id,
            current_track: None,
            state: SessionState::Stopped,
            pause_reason: None,
            has_ever_started: false,
            is_active: false,
            queue_len: 0,
            last_fault: None,
            updated_at_ms: now_ms,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    pub fn current_track_id(&self) -> Option<TrackId> {
        self.current_track.as_ref().map(|track| track.id)
    }

    /// Equality ignoring `updated_at_ms`.
    pub(crate) fn same_content(&self, other: &Self) -> bool {
        self.session_id == other.session_id
            && self.current_track == other.current_track
            && self.state == other.state
            && self.pause_reason == other.pause_reason
            && self.has_ever_started == other.has_ever_started
            && self.is_active == other.is_active
            && self.queue_len == other.queue_len
            && self.last_fault == other.last_fault
    }
}
