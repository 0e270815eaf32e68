//! # Playback Coordination Module
//!
//! Owns the play queue and the playback session for a single player.
//!
//! ## Overview
//!
//! This module handles:
//! - Ordered application of queue batches (append or replace)
//! - The STOPPED / PLAYING / PAUSED transport state machine
//! - Audio focus acquisition, loss and resumption
//! - Media session activation and metadata updates
//! - Publishing session snapshots and core events to observers
//!
//! All collaborators (track source, audio output, focus arbiter, media
//! session) are host capabilities from `bridge-traits`, wired through
//! [`core_runtime::CoreConfig`]. A single dispatcher task serializes every
//! mutation; see [`coordinator`] for the concurrency model.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;

mod queue;
mod transport;

pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, CoordinatorHandle, SessionObserver};
pub use error::{PlaybackError, Result};
pub use model::{
    Fault, FaultKind, OutputEvent, PauseReason, PlaybackSession, QueueBatch, SessionState, Track,
    TransportCommand,
};
