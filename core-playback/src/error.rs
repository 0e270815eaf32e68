//! # Playback Error Types
//!
//! Errors raised by the coordinator and its collaborators.
//!
//! Most of these never leave the dispatcher: they are converted into a
//! [`Fault`](crate::model::Fault), recorded on the session snapshot and
//! broadcast as `PlaybackEvent::Error`. Only [`PlaybackError::CoordinatorClosed`]
//! and configuration errors are returned to callers.

use bridge_traits::{BridgeError, TrackId};
use core_runtime::events::FaultKind;
use thiserror::Error;

/// Errors that can occur during playback coordination.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Queue Errors
    // ========================================================================
    /// The track source could not produce a locator for a track.
    #[error("Failed to resolve locator for track {track_id}: {source}")]
    ResolutionFailed {
        track_id: TrackId,
        #[source]
        source: BridgeError,
    },

    // ========================================================================
    // Focus & Transport Errors
    // ========================================================================
    /// The focus arbiter refused (or failed to answer) a focus request.
    #[error("Audio focus denied: {0}")]
    FocusDenied(String),

    /// The audio output or media session rejected a command.
    #[error("{operation} failed: {source}")]
    OutputFailed {
        operation: &'static str,
        #[source]
        source: BridgeError,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Releasing a collaborator during teardown failed.
    #[error("Failed to release {resource}: {source}")]
    ResourceRelease {
        resource: &'static str,
        #[source]
        source: BridgeError,
    },

    /// The coordinator has been torn down and no longer accepts events.
    #[error("Coordinator is shut down")]
    CoordinatorClosed,

    /// Coordinator configuration is invalid.
    #[error("Invalid coordinator configuration: {0}")]
    InvalidConfig(String),

    /// Collaborator wiring failed.
    #[error(transparent)]
    Runtime(#[from] core_runtime::Error),

    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Maps the error onto the fault taxonomy reported to observers.
    ///
    /// Returns `None` for errors that are returned to callers instead of being
    /// recorded on the session.
    pub fn fault_kind(&self) -> Option<FaultKind> {
        match self {
            PlaybackError::ResolutionFailed { .. } => Some(FaultKind::ResolutionFailure),
            PlaybackError::FocusDenied(_) => Some(FaultKind::FocusDenied),
            PlaybackError::ResourceRelease { .. } => Some(FaultKind::ResourceReleaseFailure),
            PlaybackError::OutputFailed { .. } => Some(FaultKind::OutputFailure),
            _ => None,
        }
    }

    /// Returns `true` if event processing continues normally after this error.
    pub fn is_recoverable(&self) -> bool {
        self.fault_kind().is_some()
    }

    /// The track the error concerns, when there is one.
    pub fn track_id(&self) -> Option<TrackId> {
        match self {
            PlaybackError::ResolutionFailed { track_id, .. } => Some(*track_id),
            _ => None,
        }
    }

    /// Returns `true` if resolution failed because the service was unreachable
    /// (or did not answer in time), as opposed to the track not existing.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            PlaybackError::ResolutionFailed { source, .. } if source.is_transient()
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
