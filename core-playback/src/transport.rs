//! # Focus & Transport State Machine
//!
//! STOPPED / PLAYING / PAUSED, driven by transport commands and by focus
//! changes the host reports.
//!
//! Every entry into PLAYING asks the arbiter for focus first and is abandoned
//! when focus is refused. Unsolicited losses downgrade PLAYING to PAUSED
//! without a user command; a transient loss remembers that playback may
//! resume once focus comes back.

use crate::error::PlaybackError;
use crate::model::{PauseReason, SessionState};
use bridge_traits::{AudioOutput, FocusArbiter, FocusChange, FocusGrant, MediaSessionSink};
use core_async::time::{timeout, Duration};
use core_runtime::events::{CoreEvent, EventBus, FocusEvent};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// How the output is started once focus is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kick {
    /// Prepare and mark ready (transport play, resume after loss).
    ReadyAndPlay,
    /// Plain play (auto-play after the first enqueue).
    Play,
}

pub(crate) struct TransportMachine {
    focus: Arc<dyn FocusArbiter>,
    output: Arc<dyn AudioOutput>,
    media: Arc<dyn MediaSessionSink>,
    event_bus: EventBus,
    focus_timeout: Duration,
    resume_after_transient_loss: bool,
    state: SessionState,
    pause_reason: Option<PauseReason>,
    focus_held: bool,
    session_active: bool,
    faults: Vec<PlaybackError>,
}

impl TransportMachine {
    pub(crate) fn new(
        focus: Arc<dyn FocusArbiter>,
        output: Arc<dyn AudioOutput>,
        media: Arc<dyn MediaSessionSink>,
        event_bus: EventBus,
        focus_timeout: Duration,
        resume_after_transient_loss: bool,
    ) -> Self {
        Self {
            focus,
            output,
            media,
            event_bus,
            focus_timeout,
            resume_after_transient_loss,
            state: SessionState::Stopped,
            pause_reason: None,
            focus_held: false,
            session_active: false,
            faults: Vec::new(),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        self.state
    }

    pub(crate) fn pause_reason(&self) -> Option<PauseReason> {
        self.pause_reason
    }

    pub(crate) fn is_session_active(&self) -> bool {
        self.session_active
    }

    #[cfg(test)]
    pub(crate) fn focus_held(&self) -> bool {
        self.focus_held
    }

    pub(crate) fn take_faults(&mut self) -> Vec<PlaybackError> {
        std::mem::take(&mut self.faults)
    }

    /// Transport play. No-op while already PLAYING.
    pub(crate) async fn play(&mut self) {
        if self.state == SessionState::Playing {
            debug!("Play ignored, already playing");
            return;
        }
        self.enter_playing(Kick::ReadyAndPlay).await;
    }

    /// Play triggered by the first enqueue of the coordinator's lifetime.
    pub(crate) async fn auto_play(&mut self) {
        if self.state == SessionState::Playing {
            let result = self.output.play().await;
            self.record(result, "output.play");
            return;
        }
        self.enter_playing(Kick::Play).await;
    }

    /// Pause. No-op while already PAUSED.
    pub(crate) async fn pause(&mut self, reason: PauseReason) {
        if self.state == SessionState::Paused {
            debug!("Pause ignored, already paused");
            return;
        }

        let result = self.output.suspend().await;
        self.record(result, "output.suspend");
        let result = self
            .media
            .set_playback_state(SessionState::Paused.into())
            .await;
        self.record(result, "media_session.set_playback_state");

        info!(%reason, "Playback paused");
        self.state = SessionState::Paused;
        self.pause_reason = Some(reason);
    }

    /// Stop. No-op while already STOPPED.
    pub(crate) async fn stop(&mut self) {
        if self.state == SessionState::Stopped {
            debug!("Stop ignored, already stopped");
            return;
        }

        let result = self.output.suspend().await;
        self.record(result, "output.suspend");
        self.deactivate_session().await;
        self.release_focus().await;

        info!("Playback stopped");
        self.state = SessionState::Stopped;
        self.pause_reason = None;
    }

    pub(crate) async fn toggle(&mut self) {
        if self.state == SessionState::Playing {
            self.pause(PauseReason::User).await;
        } else {
            self.play().await;
        }
    }

    /// Applies an unsolicited focus change reported by the host.
    #[instrument(skip(self))]
    pub(crate) async fn on_focus_change(&mut self, change: FocusChange) {
        match change {
            FocusChange::Granted => {
                let resumable = self.state == SessionState::Paused
                    && self.pause_reason == Some(PauseReason::FocusTransientLoss);
                if resumable && self.resume_after_transient_loss {
                    info!("Focus returned, resuming playback");
                    self.enter_playing(Kick::ReadyAndPlay).await;
                } else {
                    debug!(state = ?self.state, "Focus grant ignored");
                }
            }
            FocusChange::TransientLoss | FocusChange::TransientLossCanDuck => {
                self.focus_held = false;
                self.emit(FocusEvent::Lost { transient: true });
                if self.state == SessionState::Playing {
                    self.pause(PauseReason::FocusTransientLoss).await;
                }
            }
            FocusChange::Denied => {
                self.focus_held = false;
                self.emit(FocusEvent::Lost { transient: false });
                match self.state {
                    SessionState::Playing => self.pause(PauseReason::FocusLost).await,
                    // A pending resume is cancelled by a permanent loss
                    SessionState::Paused
                        if self.pause_reason == Some(PauseReason::FocusTransientLoss) =>
                    {
                        self.pause_reason = Some(PauseReason::FocusLost);
                    }
                    _ => {}
                }
            }
        }
    }

    async fn enter_playing(&mut self, kick: Kick) {
        if let Err(error) = self.acquire_focus().await {
            warn!("Not starting playback: {}", error);
            self.faults.push(error);
            return;
        }

        let result = self.media.set_active(true).await;
        self.record(result, "media_session.set_active");
        self.session_active = true;
        let result = self
            .media
            .set_playback_state(SessionState::Playing.into())
            .await;
        self.record(result, "media_session.set_playback_state");

        let result = match kick {
            Kick::ReadyAndPlay => self.output.set_ready_and_play().await,
            Kick::Play => self.output.play().await,
        };
        self.record(
            result,
            match kick {
                Kick::ReadyAndPlay => "output.set_ready_and_play",
                Kick::Play => "output.play",
            },
        );

        info!("Playback started");
        self.state = SessionState::Playing;
        self.pause_reason = None;
    }

    async fn acquire_focus(&mut self) -> Result<(), PlaybackError> {
        self.emit(FocusEvent::Requested);

        let outcome = match timeout(self.focus_timeout, self.focus.request_focus()).await {
            Ok(Ok(FocusGrant::Granted)) => Ok(()),
            Ok(Ok(FocusGrant::Denied)) => Err("arbiter refused focus".to_string()),
            Ok(Err(error)) => Err(format!("focus request failed: {}", error)),
            Err(_) => Err(format!(
                "no answer from arbiter after {}ms",
                self.focus_timeout.as_millis()
            )),
        };

        match outcome {
            Ok(()) => {
                self.focus_held = true;
                self.emit(FocusEvent::Granted);
                Ok(())
            }
            Err(reason) => {
                self.emit(FocusEvent::Denied);
                Err(PlaybackError::FocusDenied(reason))
            }
        }
    }

    async fn deactivate_session(&mut self) {
        let result = self.media.set_active(false).await;
        self.record(result, "media_session.set_active");
        self.session_active = false;
        let result = self
            .media
            .set_playback_state(SessionState::Stopped.into())
            .await;
        self.record(result, "media_session.set_playback_state");
    }

    async fn release_focus(&mut self) {
        match self.focus.release_focus().await {
            Ok(()) => self.emit(FocusEvent::Released),
            Err(source) => self.faults.push(PlaybackError::ResourceRelease {
                resource: "audio focus",
                source,
            }),
        }
        self.focus_held = false;
    }

    /// Final release on teardown. Leaves the machine STOPPED whatever fails.
    pub(crate) async fn shutdown(&mut self) {
        if self.state != SessionState::Stopped {
            let result = self.output.suspend().await;
            self.record(result, "output.suspend");
        }
        self.deactivate_session().await;
        self.release_focus().await;
        self.state = SessionState::Stopped;
        self.pause_reason = None;
    }

    fn record(&mut self, result: bridge_traits::error::Result<()>, operation: &'static str) {
        if let Err(source) = result {
            warn!(operation, "Collaborator call failed: {}", source);
            self.faults
                .push(PlaybackError::OutputFailed { operation, source });
        }
    }

    fn emit(&self, event: FocusEvent) {
        self.event_bus.emit(CoreEvent::Focus(event));
    }
}
