//! # Playback Coordinator Example
//!
//! Drives a coordinator with console-backed collaborators: queues an album,
//! loses focus to a "phone call", gets it back, finishes a track and tears
//! everything down.
//!
//! Run with: `cargo run --example coordinator_demo --package core-playback`

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    AudioOutput, FocusArbiter, FocusChange, FocusGrant, Locator, LogLevel, MediaSessionSink,
    PlaybackMetadata, PlaybackState, TrackId, TrackSource,
};
use core_playback::{Coordinator, CoordinatorConfig, OutputEvent, QueueBatch, Track};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::CoreConfig;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Console Collaborators
// ============================================================================

struct CdnSource;

#[async_trait]
impl TrackSource for CdnSource {
    async fn resolve_locator(&self, track_id: TrackId) -> BridgeResult<Locator> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(Locator::new(format!(
            "https://cdn.example.com/audio/{}.mp3?signature=abc123",
            track_id
        )))
    }
}

struct ConsoleOutput;

#[async_trait]
impl AudioOutput for ConsoleOutput {
    async fn enqueue(&self, locator: &Locator) -> BridgeResult<()> {
        println!("  [output] enqueue {}", locator);
        Ok(())
    }

    async fn clear(&self) -> BridgeResult<()> {
        println!("  [output] clear");
        Ok(())
    }

    async fn play(&self) -> BridgeResult<()> {
        println!("  [output] play");
        Ok(())
    }

    async fn set_ready_and_play(&self) -> BridgeResult<()> {
        println!("  [output] ready + play");
        Ok(())
    }

    async fn suspend(&self) -> BridgeResult<()> {
        println!("  [output] suspend");
        Ok(())
    }

    async fn skip_to_next(&self) -> BridgeResult<()> {
        println!("  [output] skip");
        Ok(())
    }

    async fn release(&self) -> BridgeResult<()> {
        println!("  [output] release");
        Ok(())
    }
}

struct AlwaysGrant;

#[async_trait]
impl FocusArbiter for AlwaysGrant {
    async fn request_focus(&self) -> BridgeResult<FocusGrant> {
        println!("  [focus] granted");
        Ok(FocusGrant::Granted)
    }

    async fn release_focus(&self) -> BridgeResult<()> {
        println!("  [focus] released");
        Ok(())
    }
}

struct ConsoleMediaSession;

#[async_trait]
impl MediaSessionSink for ConsoleMediaSession {
    async fn set_active(&self, active: bool) -> BridgeResult<()> {
        println!("  [media] active = {}", active);
        Ok(())
    }

    async fn set_playback_state(&self, state: PlaybackState) -> BridgeResult<()> {
        println!("  [media] state = {:?}", state);
        Ok(())
    }

    async fn set_metadata(&self, metadata: PlaybackMetadata) -> BridgeResult<()> {
        println!(
            "  [media] now showing {}",
            metadata.title.unwrap_or_default()
        );
        Ok(())
    }
}

fn album() -> Vec<Track> {
    ["Intro", "Daybreak", "Long Road"]
        .iter()
        .enumerate()
        .map(|(i, title)| {
            let id = i as i64 + 1;
            Track::new(
                TrackId::new(id),
                *title,
                "The Examples",
                Duration::from_secs(200),
                format!("library://tracks/{}", id),
            )
        })
        .collect()
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Info),
    )?;

    let core = CoreConfig::builder()
        .track_source(Arc::new(CdnSource))
        .audio_output(Arc::new(ConsoleOutput))
        .focus_arbiter(Arc::new(AlwaysGrant))
        .media_session(Arc::new(ConsoleMediaSession))
        .build()?;

    let coordinator = Coordinator::start(core, CoordinatorConfig::default())?;
    let handle = coordinator.handle();
    let mut observer = handle.observe_session();

    println!("== Queue album (auto-play)");
    handle.submit_queue_batch(QueueBatch::replace(album())).await?;
    observer.wait_for(|s| s.queue_len == 3).await;

    println!("== Incoming call");
    handle.submit_focus_event(FocusChange::TransientLoss).await?;
    let paused = observer.wait_for(|s| !s.is_playing()).await;
    println!("   paused: {:?}", paused.and_then(|s| s.pause_reason));

    println!("== Call ended");
    handle.submit_focus_event(FocusChange::Granted).await?;
    observer.wait_for(|s| s.is_playing()).await;

    println!("== First track finished");
    handle.submit_output_event(OutputEvent::TrackFinished).await?;
    let session = observer.wait_for(|s| s.queue_len == 2).await;
    println!(
        "   now playing: {:?}",
        session.and_then(|s| s.current_track).map(|t| t.title)
    );

    println!("== Teardown");
    let last = coordinator.shutdown().await?;
    println!("   final state: {:?}", last.state);

    Ok(())
}
