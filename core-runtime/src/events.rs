//! # Event Bus System
//!
//! Provides an event-driven architecture for the playback coordinator using a
//! broadcast channel. Observers (UI, notification, analytics) learn about
//! queue, playback and focus activity without holding a reference to the
//! coordinator itself.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for queue, playback and focus
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//!                               ┌───────────┐
//! ┌──────────────┐     emit     │           │     subscribe    ┌────────────┐
//! │ Coordinator  ├─────────────>│ EventBus  ├─────────────────>│ Subscriber │
//! │ (dispatcher) │              │ (broadcast│                  └────────────┘
//! └──────────────┘              │  channel) │     subscribe    ┌────────────┐
//!                               │           ├─────────────────>│ Subscriber │
//!                               └───────────┘                  └────────────┘
//! ```
//!
//! Only the coordinator's dispatcher task emits, so subscribers observe events
//! in exactly the order the state changes were applied.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, QueueEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! let delivered = event_bus.emit(CoreEvent::Queue(QueueEvent::Cleared));
//! assert_eq!(delivered, 1);
//! ```
//!
//! ### Filtering Events
//!
//! ```rust
//! use core_runtime::events::{EventBus, EventStream, CoreEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut errors = EventStream::new(event_bus.subscribe())
//!     .filter(|event| event.severity() >= core_runtime::events::EventSeverity::Warning);
//! # }
//! ```
//!
//! ## Event Types
//!
//! ### Queue Events
//! - `BatchAccepted`: A batch was taken off the input stream
//! - `Cleared`: The output's queue was dropped
//! - `TrackEnqueued`: A resolved track reached the output
//! - `TrackSkipped`: A track was dropped because its locator could not be resolved
//! - `Advanced`: The head of the queue moved (track finished or skipped)
//!
//! ### Playback Events
//! - `Started`: Session entered PLAYING
//! - `Paused`: Session entered PAUSED, with the cause
//! - `Stopped`: Session entered STOPPED
//! - `Completed`: The output finished a track
//! - `Error`: A fault was recorded on the session
//!
//! ### Focus Events
//! - `Requested` / `Granted` / `Denied`: Outcome of an explicit request
//! - `Lost`: Unsolicited loss reported by the host
//! - `Released`: Focus handed back
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.

use bridge_traits::TrackId;
use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

// Re-export commonly used types
pub use core_async::sync::broadcast::error::RecvError;
pub use core_async::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Shared vocabulary
// ============================================================================

/// Why the session is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    /// The user asked for a pause.
    User,
    /// Focus was lost temporarily; playback may resume when it comes back.
    FocusTransientLoss,
    /// Focus was lost for good.
    FocusLost,
}

impl fmt::Display for PauseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PauseReason::User => "user",
            PauseReason::FocusTransientLoss => "focus_transient_loss",
            PauseReason::FocusLost => "focus_lost",
        };
        f.write_str(label)
    }
}

/// Classification of a fault recorded on the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// A track's locator could not be resolved; the track was skipped.
    ResolutionFailure,
    /// The focus arbiter refused a play request.
    FocusDenied,
    /// Releasing a collaborator failed during teardown.
    ResourceReleaseFailure,
    /// The audio output rejected a command.
    OutputFailure,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FaultKind::ResolutionFailure => "resolution_failure",
            FaultKind::FocusDenied => "focus_denied",
            FaultKind::ResourceReleaseFailure => "resource_release_failure",
            FaultKind::OutputFailure => "output_failure",
        };
        f.write_str(label)
    }
}

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Queue-related events
    Queue(QueueEvent),
    /// Playback-related events
    Playback(PlaybackEvent),
    /// Audio-focus-related events
    Focus(FocusEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Queue(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Focus(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Queue(QueueEvent::TrackSkipped { .. }) => EventSeverity::Warning,
            CoreEvent::Focus(FocusEvent::Denied) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::Started { .. })
            | CoreEvent::Playback(PlaybackEvent::Stopped { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}

// ============================================================================
// Queue Events
// ============================================================================

/// Events related to the play queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum QueueEvent {
    /// A batch was accepted for processing.
    BatchAccepted {
        /// Number of tracks in the batch.
        track_count: usize,
        /// Whether the batch replaces the current queue.
        drop_queue: bool,
    },
    /// The queue was cleared.
    Cleared,
    /// A track was appended to the output.
    TrackEnqueued {
        /// The enqueued track.
        track_id: TrackId,
        /// Track title.
        title: String,
        /// Queue length after the append.
        queue_len: usize,
    },
    /// A track was skipped because its locator could not be resolved.
    TrackSkipped {
        /// The skipped track.
        track_id: TrackId,
        /// Why resolution failed.
        reason: String,
    },
    /// The head of the queue moved on.
    Advanced {
        /// The new current track, if the queue is not exhausted.
        track_id: Option<TrackId>,
        /// Remaining queue length.
        queue_len: usize,
    },
}

impl QueueEvent {
    fn description(&self) -> &str {
        match self {
            QueueEvent::BatchAccepted { .. } => "Queue batch accepted",
            QueueEvent::Cleared => "Queue cleared",
            QueueEvent::TrackEnqueued { .. } => "Track enqueued",
            QueueEvent::TrackSkipped { .. } => "Track skipped",
            QueueEvent::Advanced { .. } => "Queue advanced",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

/// Events related to the playback session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// Playback started or resumed.
    Started {
        /// The current track, if any.
        track_id: Option<TrackId>,
    },
    /// Playback paused.
    Paused {
        /// The current track, if any.
        track_id: Option<TrackId>,
        /// Cause of the pause.
        reason: PauseReason,
    },
    /// Playback stopped.
    Stopped {
        /// The current track, if any.
        track_id: Option<TrackId>,
    },
    /// The output finished playing a track.
    Completed {
        /// The track that finished.
        track_id: TrackId,
    },
    /// A fault was recorded on the session.
    Error {
        /// Fault classification.
        kind: FaultKind,
        /// The track the fault concerns, if any.
        track_id: Option<TrackId>,
        /// Human-readable error message.
        message: String,
        /// Whether processing continues normally after the fault.
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Stopped { .. } => "Playback stopped",
            PlaybackEvent::Completed { .. } => "Track completed",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

// ============================================================================
// Focus Events
// ============================================================================

/// Events related to audio focus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum FocusEvent {
    /// Focus was requested from the arbiter.
    Requested,
    /// The arbiter granted focus.
    Granted,
    /// The arbiter refused focus.
    Denied,
    /// The host reported a loss of focus.
    Lost {
        /// Whether the loss is expected to end.
        transient: bool,
    },
    /// Focus was handed back.
    Released,
}

impl FocusEvent {
    fn description(&self) -> &str {
        match self {
            FocusEvent::Requested => "Audio focus requested",
            FocusEvent::Granted => "Audio focus granted",
            FocusEvent::Denied => "Audio focus denied",
            FocusEvent::Lost { .. } => "Audio focus lost",
            FocusEvent::Released => "Audio focus released",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Broadcast hub for [`CoreEvent`]s.
///
/// Cheap to clone; every clone publishes into the same channel. Each
/// [`subscribe`](Self::subscribe) call gets an independent receiver holding at
/// most `capacity` unread events; slower receivers see `RecvError::Lagged`.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event and returns how many subscribers it reached.
    ///
    /// Having no subscribers is normal (nobody is watching the session) and
    /// simply yields 0.
    pub fn emit(&self, event: CoreEvent) -> usize {
        match self.sender.send(event) {
            Ok(delivered) => delivered,
            Err(unsent) => {
                trace!(event = unsent.0.description(), "No event subscribers");
                0
            }
        }
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all future events.
    /// Past events are not replayed.
    ///
    /// ```no_run
    /// use core_runtime::events::EventBus;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let event_bus = EventBus::new(100);
    /// let mut subscriber = event_bus.subscribe();
    ///
    /// tokio::spawn(async move {
    ///     while let Ok(event) = subscriber.recv().await {
    ///         println!("Received: {:?}", event);
    ///     }
    /// });
    /// # }
    /// ```
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering capabilities.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
