//! Player service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (track source, audio
//! output, focus arbiter, media session) into the playback coordinator. Hosts
//! call [`PlayerService::start`] when playback capability is acquired and
//! [`PlayerService::stop`] when it is released; every owned resource is
//! released on stop.

pub mod error;

pub use error::{Result, ServiceError};

use std::sync::Arc;

use bridge_traits::{AudioOutput, Clock, FocusArbiter, MediaSessionSink, TrackSource};
use core_async::sync::Mutex;
use core_playback::{
    Coordinator, CoordinatorConfig, CoordinatorHandle, PlaybackSession, QueueBatch, Track,
};
use core_runtime::config::{CoreConfig, FeatureFlags};
use core_runtime::events::{EventBus, EventStream, DEFAULT_EVENT_BUFFER_SIZE};
use tracing::info;

/// Builds a fresh audio output for each coordinator.
pub type AudioOutputFactory = Arc<dyn Fn() -> Arc<dyn AudioOutput> + Send + Sync>;

/// Builds a fresh platform media session for each coordinator.
pub type MediaSessionFactory = Arc<dyn Fn() -> Arc<dyn MediaSessionSink> + Send + Sync>;

/// Aggregated handle to all bridge dependencies the player requires.
///
/// The output and the media session are released when a coordinator shuts
/// down, so they are supplied as factories and every start gets new ones.
/// The track source and focus arbiter are shared across restarts.
#[derive(Clone)]
pub struct CoreDependencies {
    pub track_source: Arc<dyn TrackSource>,
    pub audio_output: AudioOutputFactory,
    pub focus_arbiter: Arc<dyn FocusArbiter>,
    pub media_session: Option<MediaSessionFactory>,
    pub clock: Option<Arc<dyn Clock>>,
}

impl CoreDependencies {
    /// Construct a dependency bundle from the required bridge handles.
    pub fn new<F>(
        track_source: Arc<dyn TrackSource>,
        audio_output: F,
        focus_arbiter: Arc<dyn FocusArbiter>,
    ) -> Self
    where
        F: Fn() -> Arc<dyn AudioOutput> + Send + Sync + 'static,
    {
        Self {
            track_source,
            audio_output: Arc::new(audio_output),
            focus_arbiter,
            media_session: None,
            clock: None,
        }
    }

    pub fn with_media_session<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn MediaSessionSink> + Send + Sync + 'static,
    {
        self.media_session = Some(Arc::new(factory));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    fn core_config(&self, features: FeatureFlags) -> Result<CoreConfig> {
        let mut builder = CoreConfig::builder()
            .track_source(Arc::clone(&self.track_source))
            .audio_output((self.audio_output)())
            .focus_arbiter(Arc::clone(&self.focus_arbiter))
            .features(features);

        if let Some(factory) = &self.media_session {
            builder = builder.media_session(factory());
        }
        if let Some(clock) = &self.clock {
            builder = builder.clock(Arc::clone(clock));
        }

        Ok(builder.build()?)
    }
}

/// Primary façade exposed to host applications.
///
/// Owns at most one coordinator at a time. The event bus outlives individual
/// coordinators, so subscribers keep receiving events across stop/start.
pub struct PlayerService {
    deps: CoreDependencies,
    config: CoordinatorConfig,
    features: FeatureFlags,
    event_bus: EventBus,
    coordinator: Mutex<Option<Coordinator>>,
}

impl PlayerService {
    /// Create a stopped service with default coordinator settings.
    pub fn new(deps: CoreDependencies) -> Self {
        Self::with_config(deps, CoordinatorConfig::default(), FeatureFlags::default())
    }

    pub fn with_config(
        deps: CoreDependencies,
        config: CoordinatorConfig,
        features: FeatureFlags,
    ) -> Self {
        Self {
            deps,
            config,
            features,
            event_bus: EventBus::new(DEFAULT_EVENT_BUFFER_SIZE),
            coordinator: Mutex::new(None),
        }
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> &CoreDependencies {
        &self.deps
    }

    /// Acquire playback capability. Starting a running service returns the
    /// existing handle.
    pub async fn start(&self) -> Result<CoordinatorHandle> {
        let mut slot = self.coordinator.lock().await;
        if let Some(coordinator) = slot.as_ref() {
            return Ok(coordinator.handle());
        }

        let core = self.deps.core_config(self.features)?;
        let coordinator =
            Coordinator::start_with_event_bus(core, self.config.clone(), self.event_bus.clone())?;
        let handle = coordinator.handle();
        *slot = Some(coordinator);

        info!("Player service started");
        Ok(handle)
    }

    /// Release playback capability and every resource the coordinator owns.
    ///
    /// Returns the final session snapshot, or `None` if the service was not
    /// running. The slot stays locked until teardown completes, so a
    /// concurrent [`start`](Self::start) waits for the old resources to be
    /// released.
    pub async fn stop(&self) -> Result<Option<PlaybackSession>> {
        let mut slot = self.coordinator.lock().await;
        let Some(coordinator) = slot.take() else {
            return Ok(None);
        };

        let session = coordinator.shutdown().await?;
        info!("Player service stopped");
        Ok(Some(session))
    }

    pub async fn is_running(&self) -> bool {
        self.coordinator.lock().await.is_some()
    }

    /// Handle of the running coordinator.
    pub async fn handle(&self) -> Result<CoordinatorHandle> {
        self.coordinator
            .lock()
            .await
            .as_ref()
            .map(Coordinator::handle)
            .ok_or(ServiceError::NotStarted)
    }

    /// Replace the queue with `track` and play it.
    pub async fn play_track(&self, track: Track) -> Result<()> {
        let handle = self.handle().await?;
        handle
            .submit_queue_batch(QueueBatch::replace(vec![track]))
            .await?;
        Ok(())
    }

    /// Append tracks to the queue.
    pub async fn enqueue_tracks(&self, tracks: Vec<Track>) -> Result<()> {
        let handle = self.handle().await?;
        handle.submit_queue_batch(QueueBatch::append(tracks)).await?;
        Ok(())
    }

    pub async fn skip_to_next(&self) -> Result<()> {
        self.handle().await?.skip_to_next().await?;
        Ok(())
    }

    pub async fn play(&self) -> Result<()> {
        self.handle().await?.play().await?;
        Ok(())
    }

    pub async fn pause(&self) -> Result<()> {
        self.handle().await?.pause().await?;
        Ok(())
    }

    /// Latest session snapshot, or `None` while stopped.
    pub async fn session(&self) -> Option<PlaybackSession> {
        self.handle().await.ok().map(|handle| handle.session())
    }

    /// Subscribe to events from this and every later coordinator.
    pub fn subscribe_events(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }
}
