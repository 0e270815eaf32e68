//! # Playback Coordinator
//!
//! Single-writer owner of the play queue and the playback session.
//!
//! ## Overview
//!
//! The coordinator consumes four independent input streams:
//! - queue batches (from the track source or callers)
//! - transport commands (play, pause, stop, toggle, skip)
//! - focus changes reported by the host's arbiter
//! - output events (track finished)
//!
//! Every stream is an mpsc channel drained by one dispatcher task. The
//! dispatcher applies at most one state transition or one queue step at a
//! time, so the session and the output are never mutated concurrently.
//! While a step waits on a collaborator (locator resolution, focus request)
//! the other streams keep buffering; nothing is dropped.
//!
//! Batches are taken off their channel only when the previous batch has been
//! fully applied. Transport and focus events are still handled between the
//! individual steps of a batch.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_playback::{Coordinator, CoordinatorConfig, QueueBatch, TransportCommand};
//!
//! let coordinator = Coordinator::start(core_config, CoordinatorConfig::default())?;
//! let handle = coordinator.handle();
//!
//! handle.submit_queue_batch(QueueBatch::replace(tracks)).await?;
//! handle.submit_transport_command(TransportCommand::Pause).await?;
//!
//! let mut observer = handle.observe_session();
//! let paused = observer.wait_for(|s| !s.is_playing()).await;
//!
//! coordinator.shutdown().await?;
//! ```
//!
//! ## Teardown
//!
//! Dropping the [`Coordinator`] or calling [`Coordinator::shutdown`] cancels
//! the dispatcher. Input channels are closed, pending queue steps and any
//! in-flight resolution are abandoned, and the output, focus registration and
//! media session are released. Release failures are reported as
//! `ResourceReleaseFailure` faults and never stop the teardown.

use crate::config::CoordinatorConfig;
use crate::error::{PlaybackError, Result};
use crate::model::{
    Fault, OutputEvent, PauseReason, PlaybackSession, QueueBatch, SessionState, TransportCommand,
};
use crate::queue::{QueueMachine, StepOutcome};
use crate::transport::TransportMachine;
use bridge_traits::{AudioOutput, Clock, FocusChange, MediaSessionSink, PlaybackSessionId};
use core_async::runtime::Handle;
use core_async::sync::{mpsc, watch, CancellationToken};
use core_async::task::JoinHandle;
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, EventStream, PlaybackEvent};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// ============================================================================
// Coordinator
// ============================================================================

/// Owner of a running dispatcher.
///
/// Created when playback capability is acquired and torn down when it is
/// released. Cloneable [`CoordinatorHandle`]s submit events and observe state.
pub struct Coordinator {
    handle: CoordinatorHandle,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Coordinator {
    /// Starts a coordinator with a fresh event bus sized from `core`.
    ///
    /// Must be called from within an async runtime.
    pub fn start(core: CoreConfig, config: CoordinatorConfig) -> Result<Self> {
        let event_bus = EventBus::new(core.event_buffer_size);
        Self::start_with_event_bus(core, config, event_bus)
    }

    /// Starts a coordinator that publishes on an existing event bus.
    pub fn start_with_event_bus(
        core: CoreConfig,
        config: CoordinatorConfig,
        event_bus: EventBus,
    ) -> Result<Self> {
        config.validate().map_err(PlaybackError::InvalidConfig)?;
        core.validate()?;

        let runtime = Handle::try_current().map_err(|_| {
            PlaybackError::Internal("coordinator must be started inside an async runtime".into())
        })?;

        let session_id = PlaybackSessionId::new();
        let initial = PlaybackSession::new(session_id, core.clock.unix_timestamp_millis());
        let (session_tx, session_rx) = watch::channel(initial);

        let (batch_tx, batch_rx) = mpsc::channel(config.queue_capacity);
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
        let (focus_tx, focus_rx) = mpsc::channel(config.focus_capacity);
        let (output_tx, output_rx) = mpsc::channel(config.output_event_capacity);

        let cancel = CancellationToken::new();

        let dispatcher = Dispatcher {
            session_id,
            queue: QueueMachine::new(
                Arc::clone(&core.track_source),
                Arc::clone(&core.audio_output),
                Arc::clone(&core.media_session),
                event_bus.clone(),
                config.resolve_timeout,
                core.features.auto_play_on_first_enqueue,
            ),
            transport: TransportMachine::new(
                Arc::clone(&core.focus_arbiter),
                Arc::clone(&core.audio_output),
                Arc::clone(&core.media_session),
                event_bus.clone(),
                config.focus_timeout,
                core.features.resume_after_transient_loss,
            ),
            output: Arc::clone(&core.audio_output),
            media: Arc::clone(&core.media_session),
            clock: Arc::clone(&core.clock),
            event_bus: event_bus.clone(),
            session_tx,
            last_fault: None,
        };

        let inbox = Inbox {
            batches: batch_rx,
            commands: command_rx,
            focus: focus_rx,
            output_events: output_rx,
        };

        let task = runtime.spawn(dispatcher.run(inbox, cancel.clone()));

        info!(%session_id, "Playback coordinator started");

        Ok(Self {
            handle: CoordinatorHandle {
                batches: batch_tx,
                commands: command_tx,
                focus: focus_tx,
                output_events: output_tx,
                session: session_rx,
                event_bus,
                cancel: cancel.clone(),
            },
            cancel,
            task: Some(task),
        })
    }

    /// Returns a handle for submitting events.
    pub fn handle(&self) -> CoordinatorHandle {
        self.handle.clone()
    }

    /// Shortcut for `handle().observe_session()`.
    pub fn observe_session(&self) -> SessionObserver {
        self.handle.observe_session()
    }

    /// Tears the coordinator down and waits for every resource to be released.
    ///
    /// Returns the final session snapshot.
    pub async fn shutdown(mut self) -> Result<PlaybackSession> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| PlaybackError::Internal(format!("dispatcher task failed: {}", e)))?;
        }
        Ok(self.handle.session())
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Cloneable entry point into a running coordinator.
#[derive(Clone)]
pub struct CoordinatorHandle {
    batches: mpsc::Sender<QueueBatch>,
    commands: mpsc::Sender<TransportCommand>,
    focus: mpsc::Sender<FocusChange>,
    output_events: mpsc::Sender<OutputEvent>,
    session: watch::Receiver<PlaybackSession>,
    event_bus: EventBus,
    cancel: CancellationToken,
}

impl CoordinatorHandle {
    /// Submits a queue batch. Waits while the batch channel is full.
    pub async fn submit_queue_batch(&self, batch: QueueBatch) -> Result<()> {
        self.batches
            .send(batch)
            .await
            .map_err(|_| PlaybackError::CoordinatorClosed)
    }

    pub async fn submit_transport_command(&self, command: TransportCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlaybackError::CoordinatorClosed)
    }

    pub async fn play(&self) -> Result<()> {
        self.submit_transport_command(TransportCommand::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.submit_transport_command(TransportCommand::Pause).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.submit_transport_command(TransportCommand::Stop).await
    }

    pub async fn toggle(&self) -> Result<()> {
        self.submit_transport_command(TransportCommand::TogglePlayPause)
            .await
    }

    pub async fn skip_to_next(&self) -> Result<()> {
        self.submit_transport_command(TransportCommand::SkipToNext)
            .await
    }

    /// Forwards an unsolicited focus change from the host's arbiter.
    pub async fn submit_focus_event(&self, change: FocusChange) -> Result<()> {
        self.focus
            .send(change)
            .await
            .map_err(|_| PlaybackError::CoordinatorClosed)
    }

    pub async fn submit_output_event(&self, event: OutputEvent) -> Result<()> {
        self.output_events
            .send(event)
            .await
            .map_err(|_| PlaybackError::CoordinatorClosed)
    }

    /// Pumps an external batch stream into the coordinator.
    ///
    /// The returned task ends when the stream ends, the coordinator is torn
    /// down, or the batch channel closes.
    pub fn attach_queue_feed<S>(&self, feed: S) -> JoinHandle<()>
    where
        S: Stream<Item = QueueBatch> + Send + 'static,
    {
        let batches = self.batches.clone();
        let cancel = self.cancel.clone();

        core_async::task::spawn(async move {
            let mut feed = Box::pin(feed);
            loop {
                core_async::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    next = feed.next() => match next {
                        Some(batch) => {
                            if batches.send(batch).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
            debug!("Queue feed detached");
        })
    }

    /// Latest session snapshot.
    pub fn session(&self) -> PlaybackSession {
        self.session.borrow().clone()
    }

    /// Starts a new observation; it begins with the latest snapshot.
    pub fn observe_session(&self) -> SessionObserver {
        SessionObserver {
            receiver: self.session.clone(),
        }
    }

    /// Subscribes to queue, playback and focus events.
    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    /// Returns `true` once teardown has begun.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

// ============================================================================
// Session Observer
// ============================================================================

/// Observation of the published session snapshots.
///
/// Ends (returns `None`) once the coordinator has been torn down and the
/// final snapshot has been seen.
pub struct SessionObserver {
    receiver: watch::Receiver<PlaybackSession>,
}

impl SessionObserver {
    /// Latest snapshot, without marking it seen.
    pub fn current(&self) -> PlaybackSession {
        self.receiver.borrow().clone()
    }

    /// Waits for the next snapshot that has not been seen yet.
    pub async fn next(&mut self) -> Option<PlaybackSession> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Waits until a snapshot satisfies `predicate`, checking the latest one
    /// first.
    pub async fn wait_for<F>(&mut self, predicate: F) -> Option<PlaybackSession>
    where
        F: FnMut(&PlaybackSession) -> bool,
    {
        self.receiver
            .wait_for(predicate)
            .await
            .ok()
            .map(|snapshot| snapshot.clone())
    }

    /// Converts the observation into a stream that yields the latest snapshot
    /// immediately, then every change until teardown.
    pub fn into_stream(self) -> impl Stream<Item = PlaybackSession> + Send + 'static {
        futures::stream::unfold((self.receiver, true), |(mut receiver, first)| async move {
            if !first {
                receiver.changed().await.ok()?;
            }
            let snapshot = receiver.borrow_and_update().clone();
            Some((snapshot, (receiver, false)))
        })
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

struct Inbox {
    batches: mpsc::Receiver<QueueBatch>,
    commands: mpsc::Receiver<TransportCommand>,
    focus: mpsc::Receiver<FocusChange>,
    output_events: mpsc::Receiver<OutputEvent>,
}

impl Inbox {
    fn close(&mut self) {
        self.batches.close();
        self.commands.close();
        self.focus.close();
        self.output_events.close();
    }
}

struct Dispatcher {
    session_id: PlaybackSessionId,
    queue: QueueMachine,
    transport: TransportMachine,
    output: Arc<dyn AudioOutput>,
    media: Arc<dyn MediaSessionSink>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    session_tx: watch::Sender<PlaybackSession>,
    last_fault: Option<Fault>,
}

impl Dispatcher {
    async fn run(mut self, mut inbox: Inbox, cancel: CancellationToken) {
        loop {
            let batch_in_progress = self.queue.has_pending();

            core_async::select! {
                biased;
                _ = cancel.cancelled() => break,
                Some(command) = inbox.commands.recv() => self.handle_command(command).await,
                Some(change) = inbox.focus.recv() => self.transport.on_focus_change(change).await,
                Some(event) = inbox.output_events.recv() => self.handle_output_event(event).await,
                _ = std::future::ready(()), if batch_in_progress => self.step_queue(&cancel).await,
                Some(batch) = inbox.batches.recv(), if !batch_in_progress => self.queue.accept(batch),
            }

            self.publish();
        }

        self.teardown(&mut inbox).await;
    }

    #[instrument(skip(self), fields(session_id = %self.session_id))]
    async fn handle_command(&mut self, command: TransportCommand) {
        match command {
            TransportCommand::Play => self.transport.play().await,
            TransportCommand::Pause => self.transport.pause(PauseReason::User).await,
            TransportCommand::Stop => self.transport.stop().await,
            TransportCommand::TogglePlayPause => self.transport.toggle().await,
            TransportCommand::SkipToNext => self.queue.skip_to_next().await,
        }
    }

    async fn handle_output_event(&mut self, event: OutputEvent) {
        match event {
            OutputEvent::TrackFinished => self.queue.track_finished().await,
        }
    }

    async fn step_queue(&mut self, cancel: &CancellationToken) {
        let outcome = core_async::select! {
            biased;
            _ = cancel.cancelled() => return,
            outcome = self.queue.step() => outcome,
        };

        if let StepOutcome::Enqueued {
            start_playback: true,
            ..
        } = outcome
        {
            self.transport.auto_play().await;
            if self.transport.state() == SessionState::Playing {
                self.queue.mark_started();
            }
        }
    }

    /// Reports collected faults and publishes the snapshot if it changed.
    fn publish(&mut self) {
        let mut faults = self.queue.take_faults();
        faults.extend(self.transport.take_faults());
        for error in faults {
            self.report(error);
        }

        let previous = self.session_tx.borrow().state;
        let next = self.snapshot();

        if previous != next.state {
            let track_id = next.current_track_id();
            let event = match next.state {
                SessionState::Playing => PlaybackEvent::Started { track_id },
                SessionState::Paused => PlaybackEvent::Paused {
                    track_id,
                    reason: next.pause_reason.unwrap_or(PauseReason::User),
                },
                SessionState::Stopped => PlaybackEvent::Stopped { track_id },
            };
            self.event_bus.emit(CoreEvent::Playback(event));
        }

        self.session_tx.send_if_modified(|current| {
            if current.same_content(&next) {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn report(&mut self, error: PlaybackError) {
        let Some(fault) = Fault::from_error(&error) else {
            warn!("Unclassified coordinator error: {}", error);
            return;
        };

        warn!(kind = %fault.kind, track_id = ?fault.track_id, "{}", fault.message);

        self.event_bus
            .emit(CoreEvent::Playback(PlaybackEvent::Error {
                kind: fault.kind,
                track_id: fault.track_id,
                message: fault.message.clone(),
                recoverable: error.is_recoverable(),
            }));

        self.last_fault = Some(fault);
    }

    fn snapshot(&self) -> PlaybackSession {
        PlaybackSession {
            session_id: self.session_id,
            current_track: self.queue.current_track().cloned(),
            state: self.transport.state(),
            pause_reason: self.transport.pause_reason(),
            has_ever_started: self.queue.has_ever_started(),
            is_active: self.transport.is_session_active(),
            queue_len: self.queue.queue_len(),
            last_fault: self.last_fault.clone(),
            updated_at_ms: self.clock.unix_timestamp_millis(),
        }
    }

    #[instrument(skip(self, inbox), fields(session_id = %self.session_id))]
    async fn teardown(&mut self, inbox: &mut Inbox) {
        inbox.close();

        let abandoned = self.queue.abandon_pending();
        if abandoned > 0 {
            debug!(abandoned, "Abandoned pending queue steps");
        }

        self.transport.shutdown().await;

        // Anything failing while letting go of a collaborator is a release failure
        let mut faults: Vec<PlaybackError> = self
            .transport
            .take_faults()
            .into_iter()
            .map(|error| match error {
                PlaybackError::OutputFailed { operation, source } => {
                    PlaybackError::ResourceRelease {
                        resource: operation,
                        source,
                    }
                }
                other => other,
            })
            .collect();

        if let Err(source) = self.output.release().await {
            faults.push(PlaybackError::ResourceRelease {
                resource: "audio output",
                source,
            });
        }

        if let Err(source) = self.media.release().await {
            faults.push(PlaybackError::ResourceRelease {
                resource: "media session",
                source,
            });
        }

        for error in faults {
            self.report(error);
        }

        self.publish();
        info!("Playback coordinator torn down");
    }
}
