//! # Queue State Machine
//!
//! Turns queue batches into an ordered series of output operations.
//!
//! A batch is expanded into steps when it is accepted: one `Clear` step when
//! the batch drops the queue, then one `Enqueue` step per track. The
//! dispatcher runs one step at a time and only accepts the next batch once
//! every step of the current one has run, so batch N always completes before
//! batch N+1 begins while transport and focus events can still be handled
//! between steps.
//!
//! The machine also mirrors what it has handed to the output. The head of
//! that mirror is the session's current track; finished/skip notifications
//! pop it.

use crate::error::PlaybackError;
use crate::model::{QueueBatch, Track};
use bridge_traits::{AudioOutput, BridgeError, Locator, MediaSessionSink, TrackId, TrackSource};
use core_async::time::{timeout, Duration};
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent, QueueEvent};
use core_runtime::logging::redact_locator;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// One unit of queue work.
#[derive(Debug, Clone, PartialEq, Eq)]
enum QueueStep {
    Clear,
    Enqueue(Track),
}

/// Result of running a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StepOutcome {
    /// Nothing was pending.
    Idle,
    Cleared,
    Enqueued {
        track_id: TrackId,
        /// The auto-play latch fired on this enqueue.
        start_playback: bool,
    },
    Skipped {
        track_id: TrackId,
    },
}

pub(crate) struct QueueMachine {
    source: Arc<dyn TrackSource>,
    output: Arc<dyn AudioOutput>,
    media: Arc<dyn MediaSessionSink>,
    event_bus: EventBus,
    resolve_timeout: Duration,
    pending: VecDeque<QueueStep>,
    queued: VecDeque<Track>,
    auto_play_armed: bool,
    has_ever_started: bool,
    faults: Vec<PlaybackError>,
}

impl QueueMachine {
    pub(crate) fn new(
        source: Arc<dyn TrackSource>,
        output: Arc<dyn AudioOutput>,
        media: Arc<dyn MediaSessionSink>,
        event_bus: EventBus,
        resolve_timeout: Duration,
        auto_play: bool,
    ) -> Self {
        Self {
            source,
            output,
            media,
            event_bus,
            resolve_timeout,
            pending: VecDeque::new(),
            queued: VecDeque::new(),
            auto_play_armed: auto_play,
            has_ever_started: false,
            faults: Vec::new(),
        }
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Head of the output queue.
    pub(crate) fn current_track(&self) -> Option<&Track> {
        self.queued.front()
    }

    pub(crate) fn queue_len(&self) -> usize {
        self.queued.len()
    }

    pub(crate) fn has_ever_started(&self) -> bool {
        self.has_ever_started
    }

    /// Records that auto-play reached PLAYING.
    pub(crate) fn mark_started(&mut self) {
        self.has_ever_started = true;
    }

    /// Drains the recoverable failures collected since the last call.
    pub(crate) fn take_faults(&mut self) -> Vec<PlaybackError> {
        std::mem::take(&mut self.faults)
    }

    /// Expands a batch into pending steps.
    pub(crate) fn accept(&mut self, batch: QueueBatch) {
        debug!(
            tracks = batch.tracks.len(),
            drop_queue = batch.drop_queue,
            "Accepted queue batch"
        );

        self.emit(QueueEvent::BatchAccepted {
            track_count: batch.tracks.len(),
            drop_queue: batch.drop_queue,
        });

        if batch.drop_queue {
            self.pending.push_back(QueueStep::Clear);
        }
        self.pending
            .extend(batch.tracks.into_iter().map(QueueStep::Enqueue));
    }

    /// Runs the next pending step.
    pub(crate) async fn step(&mut self) -> StepOutcome {
        match self.pending.pop_front() {
            None => StepOutcome::Idle,
            Some(QueueStep::Clear) => {
                self.clear().await;
                StepOutcome::Cleared
            }
            Some(QueueStep::Enqueue(track)) => self.enqueue(track).await,
        }
    }

    /// Abandons every step that has not started yet.
    pub(crate) fn abandon_pending(&mut self) -> usize {
        let abandoned = self.pending.len();
        self.pending.clear();
        abandoned
    }

    async fn clear(&mut self) {
        if let Err(source) = self.output.clear().await {
            self.faults.push(PlaybackError::OutputFailed {
                operation: "output.clear",
                source,
            });
        }
        self.queued.clear();
        self.emit(QueueEvent::Cleared);
    }

    #[instrument(skip(self, track), fields(track_id = %track.id))]
    async fn enqueue(&mut self, track: Track) -> StepOutcome {
        let track_id = track.id;

        let locator = match self.locator_for(&track).await {
            Ok(locator) => locator,
            Err(error) => {
                warn!("Skipping track: {}", error);
                self.emit(QueueEvent::TrackSkipped {
                    track_id,
                    reason: error.to_string(),
                });
                self.faults.push(error);
                return StepOutcome::Skipped { track_id };
            }
        };

        if let Err(source) = self.output.enqueue(&locator).await {
            warn!("Output rejected track: {}", source);
            self.emit(QueueEvent::TrackSkipped {
                track_id,
                reason: source.to_string(),
            });
            self.faults.push(PlaybackError::OutputFailed {
                operation: "output.enqueue",
                source,
            });
            return StepOutcome::Skipped { track_id };
        }

        debug!(locator = %redact_locator(locator.as_str()), "Track enqueued");

        self.publish_metadata(&track).await;

        let title = track.title.clone();
        self.queued.push_back(track);

        self.emit(QueueEvent::TrackEnqueued {
            track_id,
            title,
            queue_len: self.queued.len(),
        });

        let start_playback = std::mem::take(&mut self.auto_play_armed);
        if start_playback {
            info!("First track enqueued, starting playback");
        }

        StepOutcome::Enqueued {
            track_id,
            start_playback,
        }
    }

    async fn locator_for(&self, track: &Track) -> Result<Locator, PlaybackError> {
        if !track.id.is_saved() {
            return Ok(track.music_file.clone());
        }

        let source = match timeout(self.resolve_timeout, self.source.resolve_locator(track.id)).await
        {
            Ok(Ok(locator)) => return Ok(locator),
            Ok(Err(source)) => source,
            Err(_) => BridgeError::Transport(format!(
                "no locator after {}ms",
                self.resolve_timeout.as_millis()
            )),
        };

        Err(PlaybackError::ResolutionFailed {
            track_id: track.id,
            source,
        })
    }

    /// The output finished its head track.
    pub(crate) async fn track_finished(&mut self) {
        match self.queued.front() {
            Some(finished) => {
                let track_id = finished.id;
                self.event_bus
                    .emit(CoreEvent::Playback(PlaybackEvent::Completed { track_id }));
                self.advance().await;
            }
            None => debug!("Track finished with an empty queue"),
        }
    }

    /// Ask the output to move on and drop the head track.
    pub(crate) async fn skip_to_next(&mut self) {
        if let Err(source) = self.output.skip_to_next().await {
            self.faults.push(PlaybackError::OutputFailed {
                operation: "output.skip_to_next",
                source,
            });
            return;
        }
        self.advance().await;
    }

    async fn advance(&mut self) {
        if self.queued.pop_front().is_none() {
            return;
        }

        if let Some(head) = self.queued.front().cloned() {
            self.publish_metadata(&head).await;
        }

        self.emit(QueueEvent::Advanced {
            track_id: self.queued.front().map(|track| track.id),
            queue_len: self.queued.len(),
        });
    }

    async fn publish_metadata(&mut self, track: &Track) {
        if let Err(source) = self.media.set_metadata(track.metadata()).await {
            self.faults.push(PlaybackError::OutputFailed {
                operation: "media_session.set_metadata",
                source,
            });
        }
    }

    fn emit(&self, event: QueueEvent) {
        self.event_bus.emit(CoreEvent::Queue(event));
    }
}
