//! End-to-end tests for the playback coordinator
//!
//! This test suite verifies:
//! - Ordering of queue batches and their interaction with transport commands
//! - Auto-play and focus gating of every entry into PLAYING
//! - Focus loss, denial and resumption
//! - Resolution failures and timeouts
//! - Teardown and resource release
//!
//! All collaborators record their calls into one shared log so that the
//! relative order of output, focus and media session calls can be asserted.
//! Tests run with a paused clock; `settle()` returns once the dispatcher has
//! nothing left to do.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    AudioOutput, BridgeError, FocusArbiter, FocusChange, FocusGrant, Locator, ManualClock,
    MediaSessionSink, PlaybackMetadata, PlaybackState, TrackId, TrackSource,
};
use core_playback::{
    Coordinator, CoordinatorConfig, FaultKind, OutputEvent, PauseReason, PlaybackError,
    QueueBatch, SessionState, Track, TransportCommand,
};
use core_runtime::events::{CoreEvent, EventStream, PlaybackEvent, QueueEvent};
use core_runtime::CoreConfig;
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Recording Fakes
// ============================================================================

#[derive(Clone, Default)]
struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn push(&self, call: impl Into<String>) {
        self.0.lock().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    fn count(&self, call: &str) -> usize {
        self.0.lock().iter().filter(|c| c.as_str() == call).count()
    }

    fn position(&self, call: &str) -> usize {
        self.0
            .lock()
            .iter()
            .position(|c| c == call)
            .unwrap_or_else(|| panic!("{call} was never called"))
    }

    fn enqueued(&self) -> Vec<String> {
        self.0
            .lock()
            .iter()
            .filter_map(|c| c.strip_prefix("output.enqueue:").map(str::to_string))
            .collect()
    }
}

fn locator_for(id: i64) -> String {
    format!("https://cdn.test/{id}.mp3")
}

struct FakeSource {
    log: CallLog,
    failing: Mutex<HashSet<i64>>,
    delays: Mutex<HashMap<i64, Duration>>,
}

#[async_trait]
impl TrackSource for FakeSource {
    async fn resolve_locator(&self, track_id: TrackId) -> BridgeResult<Locator> {
        self.log.push(format!("resolve:{}", track_id.get()));

        let delay = self.delays.lock().get(&track_id.get()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.lock().contains(&track_id.get()) {
            return Err(BridgeError::NotFound(format!("track {}", track_id)));
        }
        Ok(Locator::new(locator_for(track_id.get())))
    }
}

struct FakeOutput {
    log: CallLog,
    fail_release: AtomicBool,
}

impl FakeOutput {
    fn record(&self, call: &str) -> BridgeResult<()> {
        self.log.push(call);
        Ok(())
    }
}

#[async_trait]
impl AudioOutput for FakeOutput {
    async fn enqueue(&self, locator: &Locator) -> BridgeResult<()> {
        self.log.push(format!("output.enqueue:{}", locator));
        Ok(())
    }

    async fn clear(&self) -> BridgeResult<()> {
        self.record("output.clear")
    }

    async fn play(&self) -> BridgeResult<()> {
        self.record("output.play")
    }

    async fn set_ready_and_play(&self) -> BridgeResult<()> {
        self.record("output.set_ready_and_play")
    }

    async fn suspend(&self) -> BridgeResult<()> {
        self.record("output.suspend")
    }

    async fn skip_to_next(&self) -> BridgeResult<()> {
        self.record("output.skip_to_next")
    }

    async fn release(&self) -> BridgeResult<()> {
        self.log.push("output.release");
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("player already gone".into()));
        }
        Ok(())
    }
}

struct FakeArbiter {
    log: CallLog,
    answers: Mutex<VecDeque<FocusGrant>>,
}

#[async_trait]
impl FocusArbiter for FakeArbiter {
    async fn request_focus(&self) -> BridgeResult<FocusGrant> {
        self.log.push("focus.request");
        Ok(self.answers.lock().pop_front().unwrap_or(FocusGrant::Granted))
    }

    async fn release_focus(&self) -> BridgeResult<()> {
        self.log.push("focus.release");
        Ok(())
    }
}

struct FakeMedia {
    log: CallLog,
}

#[async_trait]
impl MediaSessionSink for FakeMedia {
    async fn set_active(&self, active: bool) -> BridgeResult<()> {
        self.log.push(format!("media.active:{active}"));
        Ok(())
    }

    async fn set_playback_state(&self, state: PlaybackState) -> BridgeResult<()> {
        self.log.push(format!("media.state:{state:?}"));
        Ok(())
    }

    async fn set_metadata(&self, metadata: PlaybackMetadata) -> BridgeResult<()> {
        let id = metadata.track_id.map(|id| id.get()).unwrap_or_default();
        self.log.push(format!("media.metadata:{id}"));
        Ok(())
    }

    async fn release(&self) -> BridgeResult<()> {
        self.log.push("media.release");
        Ok(())
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    log: CallLog,
    source: Arc<FakeSource>,
    output: Arc<FakeOutput>,
    arbiter: Arc<FakeArbiter>,
    media: Arc<FakeMedia>,
}

impl Harness {
    fn new() -> Self {
        let log = CallLog::default();
        Self {
            source: Arc::new(FakeSource {
                log: log.clone(),
                failing: Mutex::new(HashSet::new()),
                delays: Mutex::new(HashMap::new()),
            }),
            output: Arc::new(FakeOutput {
                log: log.clone(),
                fail_release: AtomicBool::new(false),
            }),
            arbiter: Arc::new(FakeArbiter {
                log: log.clone(),
                answers: Mutex::new(VecDeque::new()),
            }),
            media: Arc::new(FakeMedia { log: log.clone() }),
            log,
        }
    }

    fn fail_resolution(&self, id: i64) {
        self.source.failing.lock().insert(id);
    }

    fn delay_resolution(&self, id: i64, delay: Duration) {
        self.source.delays.lock().insert(id, delay);
    }

    fn answer_focus(&self, answer: FocusGrant) {
        self.arbiter.answers.lock().push_back(answer);
    }

    fn core_config(&self) -> CoreConfig {
        CoreConfig::builder()
            .track_source(self.source.clone())
            .audio_output(self.output.clone())
            .focus_arbiter(self.arbiter.clone())
            .media_session(self.media.clone())
            .clock(Arc::new(ManualClock::new(1_700_000_000_000)))
            .build()
            .unwrap()
    }

    fn start(&self) -> Coordinator {
        Coordinator::start(self.core_config(), CoordinatorConfig::default()).unwrap()
    }
}

fn track(id: i64) -> Track {
    Track::new(
        TrackId::new(id),
        format!("Track {id}"),
        "Artist",
        Duration::from_secs(180),
        format!("file:///library/{id}.mp3"),
    )
}

fn tracks(ids: &[i64]) -> Vec<Track> {
    ids.iter().copied().map(track).collect()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

fn drain(events: &mut EventStream) -> Vec<CoreEvent> {
    let mut drained = Vec::new();
    while let Some(Ok(event)) = events.try_recv() {
        drained.push(event);
    }
    drained
}

// ============================================================================
// Queue Ordering
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_batches_apply_in_submission_order() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();

    handle
        .submit_queue_batch(QueueBatch::append(tracks(&[1, 2])))
        .await
        .unwrap();
    handle
        .submit_queue_batch(QueueBatch::append(tracks(&[3])))
        .await
        .unwrap();
    settle().await;

    assert_eq!(
        harness.log.enqueued(),
        vec![locator_for(1), locator_for(2), locator_for(3)]
    );

    let session = handle.session();
    assert_eq!(session.queue_len, 3);
    assert_eq!(session.current_track_id(), Some(TrackId::new(1)));
}

#[tokio::test(start_paused = true)]
async fn test_replace_batch_clears_before_enqueuing() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();

    handle
        .submit_queue_batch(QueueBatch::append(tracks(&[1, 2])))
        .await
        .unwrap();
    handle
        .submit_queue_batch(QueueBatch::replace(tracks(&[7])))
        .await
        .unwrap();
    settle().await;

    let clear = harness.log.position("output.clear");
    assert!(harness.log.position(&format!("output.enqueue:{}", locator_for(2))) < clear);
    assert!(clear < harness.log.position(&format!("output.enqueue:{}", locator_for(7))));

    let session = handle.session();
    assert_eq!(session.queue_len, 1);
    assert_eq!(session.current_track_id(), Some(TrackId::new(7)));
}

#[tokio::test(start_paused = true)]
async fn test_first_replace_batch_plays_after_first_enqueue() {
    let harness = Harness::new();
    let coordinator = harness.start();

    coordinator
        .handle()
        .submit_queue_batch(QueueBatch::replace(tracks(&[1, 2])))
        .await
        .unwrap();
    settle().await;

    let log = &harness.log;
    let clear = log.position("output.clear");
    let first = log.position(&format!("output.enqueue:{}", locator_for(1)));
    let request = log.position("focus.request");
    let play = log.position("output.play");
    let second = log.position(&format!("output.enqueue:{}", locator_for(2)));

    assert!(clear < first);
    assert!(first < request);
    assert!(request < play);
    assert!(play < second);
    assert!(coordinator.handle().session().is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_unsaved_track_uses_library_locator() {
    let harness = Harness::new();
    let coordinator = harness.start();

    let unsaved = Track::new(
        TrackId::UNSAVED,
        "Voice memo",
        "Me",
        Duration::from_secs(30),
        "file:///recordings/memo.m4a",
    );
    coordinator
        .handle()
        .submit_queue_batch(QueueBatch::append(vec![unsaved]))
        .await
        .unwrap();
    settle().await;

    assert!(!harness.log.calls().iter().any(|c| c.starts_with("resolve:")));
    assert_eq!(harness.log.enqueued(), vec!["file:///recordings/memo.m4a"]);
}

#[tokio::test(start_paused = true)]
async fn test_transport_commands_run_between_queue_steps() {
    let harness = Harness::new();
    harness.delay_resolution(2, Duration::from_secs(2));
    let coordinator = harness.start();
    let handle = coordinator.handle();

    handle
        .submit_queue_batch(QueueBatch::append(tracks(&[1, 2, 3])))
        .await
        .unwrap();
    settle().await;
    // Track 2 is still resolving
    handle.pause().await.unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;

    let suspend = harness.log.position("output.suspend");
    assert!(harness.log.position(&format!("output.enqueue:{}", locator_for(2))) < suspend);
    assert!(suspend < harness.log.position(&format!("output.enqueue:{}", locator_for(3))));
    assert_eq!(handle.session().state, SessionState::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_queue_feed_is_pumped_in_order() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();

    let feed = futures::stream::iter(vec![
        QueueBatch::append(tracks(&[1])),
        QueueBatch::append(tracks(&[2, 3])),
    ]);
    handle.attach_queue_feed(feed).await.unwrap();
    settle().await;

    assert_eq!(
        harness.log.enqueued(),
        vec![locator_for(1), locator_for(2), locator_for(3)]
    );
}

// ============================================================================
// Auto-play & Transport
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_auto_play_fires_exactly_once() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();

    handle
        .submit_queue_batch(QueueBatch::append(tracks(&[1])))
        .await
        .unwrap();
    settle().await;
    assert!(handle.session().is_playing());
    assert!(handle.session().has_ever_started);

    handle.pause().await.unwrap();
    handle
        .submit_queue_batch(QueueBatch::append(tracks(&[2])))
        .await
        .unwrap();
    handle
        .submit_queue_batch(QueueBatch::replace(tracks(&[3])))
        .await
        .unwrap();
    settle().await;

    assert_eq!(harness.log.count("output.play"), 1);
    assert_eq!(handle.session().state, SessionState::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_auto_play_can_be_disabled() {
    let harness = Harness::new();
    let mut core = harness.core_config();
    core.features.auto_play_on_first_enqueue = false;
    let coordinator = Coordinator::start(core, CoordinatorConfig::default()).unwrap();

    coordinator
        .handle()
        .submit_queue_batch(QueueBatch::append(tracks(&[1])))
        .await
        .unwrap();
    settle().await;

    assert_eq!(harness.log.count("focus.request"), 0);
    assert_eq!(coordinator.handle().session().state, SessionState::Stopped);
    assert!(!coordinator.handle().session().has_ever_started);
}

#[tokio::test(start_paused = true)]
async fn test_play_requests_focus_before_output() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();
    let mut events = handle.subscribe_events();

    handle.play().await.unwrap();
    settle().await;

    assert!(harness.log.position("focus.request") < harness.log.position("media.active:true"));
    assert!(
        harness.log.position("media.active:true")
            < harness.log.position("output.set_ready_and_play")
    );

    let session = handle.session();
    assert!(session.is_playing());
    assert!(session.is_active);

    let started = drain(&mut events).into_iter().any(|event| {
        matches!(event, CoreEvent::Playback(PlaybackEvent::Started { .. }))
    });
    assert!(started);
}

#[tokio::test(start_paused = true)]
async fn test_denied_focus_never_reaches_playing() {
    let harness = Harness::new();
    harness.answer_focus(FocusGrant::Denied);
    harness.answer_focus(FocusGrant::Denied);
    let coordinator = harness.start();
    let handle = coordinator.handle();

    handle
        .submit_queue_batch(QueueBatch::append(tracks(&[1])))
        .await
        .unwrap();
    handle.play().await.unwrap();
    settle().await;

    let session = handle.session();
    assert_eq!(session.state, SessionState::Stopped);
    // Auto-play was attempted and refused, so nothing has started
    assert!(!session.has_ever_started);
    assert_eq!(session.last_fault.unwrap().kind, FaultKind::FocusDenied);
    assert_eq!(harness.log.count("output.play"), 0);
    assert_eq!(harness.log.count("output.set_ready_and_play"), 0);

    // The arbiter grants from now on
    handle.play().await.unwrap();
    settle().await;
    assert!(handle.session().is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_pause_is_idempotent() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();

    handle.play().await.unwrap();
    handle.pause().await.unwrap();
    handle.pause().await.unwrap();
    settle().await;

    assert_eq!(harness.log.count("output.suspend"), 1);
    let session = handle.session();
    assert_eq!(session.state, SessionState::Paused);
    assert_eq!(session.pause_reason, Some(PauseReason::User));
}

#[tokio::test(start_paused = true)]
async fn test_toggle_alternates_play_and_pause() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();

    handle.toggle().await.unwrap();
    settle().await;
    assert!(handle.session().is_playing());

    handle
        .submit_transport_command(TransportCommand::TogglePlayPause)
        .await
        .unwrap();
    settle().await;
    assert_eq!(handle.session().state, SessionState::Paused);
}

#[tokio::test(start_paused = true)]
async fn test_stop_releases_focus_and_deactivates_session() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();

    handle.play().await.unwrap();
    handle.stop().await.unwrap();
    settle().await;

    let session = handle.session();
    assert_eq!(session.state, SessionState::Stopped);
    assert!(!session.is_active);
    assert_eq!(harness.log.count("focus.release"), 1);
    assert_eq!(harness.log.count("media.active:false"), 1);
}

// ============================================================================
// Focus Changes
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_transient_loss_pauses_and_grant_resumes() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();

    handle.play().await.unwrap();
    handle
        .submit_focus_event(FocusChange::TransientLoss)
        .await
        .unwrap();
    settle().await;

    let session = handle.session();
    assert_eq!(session.state, SessionState::Paused);
    assert_eq!(session.pause_reason, Some(PauseReason::FocusTransientLoss));
    assert_eq!(harness.log.count("output.suspend"), 1);

    handle.submit_focus_event(FocusChange::Granted).await.unwrap();
    settle().await;

    assert!(handle.session().is_playing());
    assert_eq!(harness.log.count("focus.request"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_duckable_loss_is_a_transient_pause() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();

    handle.play().await.unwrap();
    handle
        .submit_focus_event(FocusChange::TransientLossCanDuck)
        .await
        .unwrap();
    settle().await;

    assert_eq!(
        handle.session().pause_reason,
        Some(PauseReason::FocusTransientLoss)
    );
}

#[tokio::test(start_paused = true)]
async fn test_permanent_loss_suspends_without_new_request() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();

    handle.play().await.unwrap();
    handle.submit_focus_event(FocusChange::Denied).await.unwrap();
    settle().await;

    let session = handle.session();
    assert_eq!(session.state, SessionState::Paused);
    assert_eq!(session.pause_reason, Some(PauseReason::FocusLost));
    assert_eq!(harness.log.count("output.suspend"), 1);
    assert_eq!(harness.log.count("focus.request"), 1);

    // A later grant does not resume after a permanent loss
    handle.submit_focus_event(FocusChange::Granted).await.unwrap();
    settle().await;
    assert_eq!(handle.session().state, SessionState::Paused);
    assert_eq!(harness.log.count("focus.request"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_user_pause_is_not_resumed_by_grant() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();

    handle.play().await.unwrap();
    handle.pause().await.unwrap();
    handle.submit_focus_event(FocusChange::Granted).await.unwrap();
    settle().await;

    assert_eq!(handle.session().state, SessionState::Paused);
    assert_eq!(handle.session().pause_reason, Some(PauseReason::User));
}

// ============================================================================
// Resolution Failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_resolution_failure_skips_only_that_track() {
    let harness = Harness::new();
    harness.fail_resolution(2);
    let coordinator = harness.start();
    let handle = coordinator.handle();
    let mut events = handle.subscribe_events();

    handle
        .submit_queue_batch(QueueBatch::replace(tracks(&[1, 2, 3])))
        .await
        .unwrap();
    settle().await;

    assert_eq!(harness.log.enqueued(), vec![locator_for(1), locator_for(3)]);

    let session = handle.session();
    assert!(session.is_playing());
    assert_eq!(session.queue_len, 2);
    let fault = session.last_fault.unwrap();
    assert_eq!(fault.kind, FaultKind::ResolutionFailure);
    assert_eq!(fault.track_id, Some(TrackId::new(2)));

    let events = drain(&mut events);
    assert!(events.iter().any(|event| matches!(
        event,
        CoreEvent::Queue(QueueEvent::TrackSkipped { track_id, .. }) if *track_id == TrackId::new(2)
    )));
    assert!(events.iter().any(|event| matches!(
        event,
        CoreEvent::Playback(PlaybackEvent::Error {
            kind: FaultKind::ResolutionFailure,
            recoverable: true,
            ..
        })
    )));
}

#[tokio::test(start_paused = true)]
async fn test_slow_resolution_times_out_and_moves_on() {
    let harness = Harness::new();
    harness.delay_resolution(1, Duration::from_secs(60));
    let config = CoordinatorConfig {
        resolve_timeout: Duration::from_secs(1),
        ..Default::default()
    };
    let coordinator = Coordinator::start(harness.core_config(), config).unwrap();
    let handle = coordinator.handle();

    handle
        .submit_queue_batch(QueueBatch::append(tracks(&[1, 2])))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(harness.log.enqueued(), vec![locator_for(2)]);
    let fault = handle.session().last_fault.unwrap();
    assert_eq!(fault.kind, FaultKind::ResolutionFailure);
    assert!(fault.message.contains("Transport error"));
}

// ============================================================================
// Output Events
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_track_finished_advances_current_track() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();
    let mut events = handle.subscribe_events();

    handle
        .submit_queue_batch(QueueBatch::append(tracks(&[1, 2])))
        .await
        .unwrap();
    settle().await;
    handle
        .submit_output_event(OutputEvent::TrackFinished)
        .await
        .unwrap();
    settle().await;

    let session = handle.session();
    assert_eq!(session.current_track_id(), Some(TrackId::new(2)));
    assert_eq!(session.queue_len, 1);

    assert!(drain(&mut events).iter().any(|event| matches!(
        event,
        CoreEvent::Playback(PlaybackEvent::Completed { track_id }) if *track_id == TrackId::new(1)
    )));
}

#[tokio::test(start_paused = true)]
async fn test_skip_to_next_drops_head_track() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();

    handle
        .submit_queue_batch(QueueBatch::append(tracks(&[1, 2, 3])))
        .await
        .unwrap();
    settle().await;
    handle.skip_to_next().await.unwrap();
    settle().await;

    assert_eq!(harness.log.count("output.skip_to_next"), 1);
    assert_eq!(handle.session().queue_len, 2);
    assert_eq!(handle.session().current_track_id(), Some(TrackId::new(2)));
}

// ============================================================================
// Observation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_observer_stream_starts_with_current_snapshot() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();

    let mut stream = Box::pin(handle.observe_session().into_stream());
    let first = stream.next().await.unwrap();
    assert_eq!(first.state, SessionState::Stopped);

    handle.play().await.unwrap();
    let next = stream.next().await.unwrap();
    assert!(next.is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_idempotent_commands_publish_nothing() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();
    let mut observer = handle.observe_session();

    handle.stop().await.unwrap();
    settle().await;

    let unchanged = tokio::time::timeout(Duration::from_secs(1), observer.next()).await;
    assert!(unchanged.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_sees_paused_state() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();
    let mut observer = handle.observe_session();

    handle.play().await.unwrap();
    handle.pause().await.unwrap();

    let paused = observer
        .wait_for(|session| session.state == SessionState::Paused)
        .await
        .unwrap();
    assert_eq!(paused.pause_reason, Some(PauseReason::User));
}

// ============================================================================
// Lifecycle & Teardown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_shutdown_releases_every_resource() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let handle = coordinator.handle();

    handle
        .submit_queue_batch(QueueBatch::append(tracks(&[1])))
        .await
        .unwrap();
    settle().await;

    let session = coordinator.shutdown().await.unwrap();
    assert_eq!(session.state, SessionState::Stopped);
    assert!(!session.is_active);
    assert!(session.last_fault.is_none());

    assert_eq!(harness.log.count("output.suspend"), 1);
    assert_eq!(harness.log.count("focus.release"), 1);
    assert_eq!(harness.log.count("output.release"), 1);
    assert_eq!(harness.log.count("media.release"), 1);

    assert!(handle.is_closed());
    assert!(matches!(
        handle.play().await,
        Err(PlaybackError::CoordinatorClosed)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_abandons_in_flight_resolution() {
    let harness = Harness::new();
    harness.delay_resolution(1, Duration::from_secs(60));
    let coordinator = harness.start();

    coordinator
        .handle()
        .submit_queue_batch(QueueBatch::append(tracks(&[1, 2])))
        .await
        .unwrap();
    settle().await;

    let session = coordinator.shutdown().await.unwrap();
    assert!(harness.log.enqueued().is_empty());
    assert_eq!(harness.log.count("resolve:2"), 0);
    assert_eq!(session.queue_len, 0);
    assert_eq!(harness.log.count("output.release"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_release_failure_is_reported_and_teardown_completes() {
    let harness = Harness::new();
    harness.output.fail_release.store(true, Ordering::SeqCst);
    let coordinator = harness.start();
    let mut events = coordinator.handle().subscribe_events();

    let session = coordinator.shutdown().await.unwrap();

    let fault = session.last_fault.unwrap();
    assert_eq!(fault.kind, FaultKind::ResourceReleaseFailure);
    assert_eq!(harness.log.count("media.release"), 1);

    assert!(drain(&mut events).iter().any(|event| matches!(
        event,
        CoreEvent::Playback(PlaybackEvent::Error {
            kind: FaultKind::ResourceReleaseFailure,
            ..
        })
    )));
}

#[tokio::test(start_paused = true)]
async fn test_observer_ends_after_shutdown() {
    let harness = Harness::new();
    let coordinator = harness.start();
    let mut observer = coordinator.observe_session();

    coordinator.shutdown().await.unwrap();

    // The final snapshot may or may not differ; either way the stream ends
    while observer.next().await.is_some() {}
    assert_eq!(observer.current().state, SessionState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_config_is_rejected() {
    let harness = Harness::new();
    let config = CoordinatorConfig {
        command_capacity: 0,
        ..Default::default()
    };

    let result = Coordinator::start(harness.core_config(), config);
    assert!(matches!(result, Err(PlaybackError::InvalidConfig(_))));
}

#[test]
fn test_start_outside_runtime_fails() {
    let harness = Harness::new();
    let result = Coordinator::start(harness.core_config(), CoordinatorConfig::default());
    assert!(matches!(result, Err(PlaybackError::Internal(_))));
}
