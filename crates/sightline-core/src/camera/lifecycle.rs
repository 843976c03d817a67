//! Camera lifecycle state machine.
//!
//! ```text
//!   Uninitialized ──acquired──▶ Active ◀──recovery_succeeded── Recovering
//!        │                        │                              ▲    │
//!  acquisition_failed        track_ended ─▶ Lost ────────────────┘    │
//!        ▼                                                  recovery_failed
//!      Failed                   LostTerminal ◀──────────────────────────┘
//! ```
//!
//! The machine performs no I/O. Controllers drive it with the results of
//! device acquisition and schedule the recovery delay themselves.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::device::{AcquisitionError, VideoStream};
use crate::message::{ChatMessage, Sender};

pub const RECONNECTING_NOTICE: &str = "Camera connection lost. Attempting to reconnect...";
pub const RESTORED_MESSAGE: &str = "Camera connection restored";
pub const RESTORE_FAILED_MESSAGE: &str =
    "Failed to restore camera connection. Please check your camera and refresh the page.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraState {
    Uninitialized,
    Active,
    /// Initial acquisition was rejected. Terminal for that attempt.
    Failed,
    Lost,
    Recovering,
    /// The single recovery attempt failed. Only a new loss event re-arms it.
    LostTerminal,
}

/// Persistent notice shown over the video surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraNotice {
    AcquisitionFailed(String),
    Reconnecting,
}

impl CameraNotice {
    pub fn text(&self) -> &str {
        match self {
            Self::AcquisitionFailed(message) => message,
            Self::Reconnecting => RECONNECTING_NOTICE,
        }
    }
}

/// What a controller should do after a track-ended signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossDisposition {
    /// Wait the recovery delay, then re-acquire.
    BeginRecovery,
    /// Another signal already started recovery.
    AlreadyRecovering,
    /// The signal came from a stream that has since been replaced.
    Stale,
    /// No stream was ever live.
    Ignored,
}

/// Owned camera record: the live stream, the recovery flag, and what the UI
/// should show.
pub struct CameraLifecycle {
    state: CameraState,
    stream: Option<Arc<dyn VideoStream>>,
    recovering: bool,
    generation: u64,
    notice: Option<CameraNotice>,
    surface_visible: bool,
}

impl Default for CameraLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CameraLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraLifecycle")
            .field("state", &self.state)
            .field("has_stream", &self.stream.is_some())
            .field("recovering", &self.recovering)
            .field("generation", &self.generation)
            .field("notice", &self.notice)
            .finish()
    }
}

impl CameraLifecycle {
    pub fn new() -> Self {
        Self {
            state: CameraState::Uninitialized,
            stream: None,
            recovering: false,
            generation: 0,
            notice: None,
            surface_visible: true,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn notice(&self) -> Option<&CameraNotice> {
        self.notice.as_ref()
    }

    pub fn stream(&self) -> Option<&Arc<dyn VideoStream>> {
        self.stream.as_ref()
    }

    /// Identifies the currently bound stream. Loss signals carry it so that
    /// events from replaced streams can be told apart.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_recovering(&self) -> bool {
        self.recovering
    }

    pub fn surface_visible(&self) -> bool {
        self.surface_visible
    }

    /// The send control is usable only with a live stream.
    pub fn send_enabled(&self) -> bool {
        self.state == CameraState::Active && !self.recovering
    }

    /// Binds a freshly acquired stream. Returns its generation.
    pub fn acquired(&mut self, stream: Arc<dyn VideoStream>) -> u64 {
        self.release_stream();
        self.generation += 1;
        self.stream = Some(stream);
        self.state = CameraState::Active;
        self.notice = None;
        self.surface_visible = true;
        tracing::info!(generation = self.generation, "camera stream bound");
        self.generation
    }

    /// Records a rejected initial acquisition. Not retried automatically.
    pub fn acquisition_failed(&mut self, error: &AcquisitionError) {
        tracing::error!(kind = ?error.kind, reason = %error.message, "camera acquisition failed");
        self.release_stream();
        self.state = CameraState::Failed;
        self.notice = Some(CameraNotice::AcquisitionFailed(error.user_message()));
        self.surface_visible = false;
    }

    /// Handles a track-ended signal from stream `generation`.
    pub fn track_ended(&mut self, generation: u64) -> LossDisposition {
        if generation != self.generation {
            return LossDisposition::Stale;
        }
        if self.recovering {
            return LossDisposition::AlreadyRecovering;
        }

        match self.state {
            CameraState::Active | CameraState::LostTerminal => {
                tracing::warn!(generation, "camera stream ended unexpectedly");
                self.state = CameraState::Lost;
                self.release_stream();

                self.recovering = true;
                self.state = CameraState::Recovering;
                self.notice = Some(CameraNotice::Reconnecting);
                LossDisposition::BeginRecovery
            }
            _ => LossDisposition::Ignored,
        }
    }

    /// Completes recovery with a new stream. Returns the new generation and
    /// the entry to append to the chat log.
    pub fn recovery_succeeded(&mut self, stream: Arc<dyn VideoStream>) -> (u64, ChatMessage) {
        let generation = self.acquired(stream);
        self.recovering = false;
        tracing::info!("camera successfully reinitialized");
        (generation, ChatMessage::new(Sender::Error, RESTORED_MESSAGE))
    }

    /// Ends recovery after a failed re-acquisition. Returns the entry to
    /// append to the chat log.
    pub fn recovery_failed(&mut self, error: &AcquisitionError) -> ChatMessage {
        tracing::error!(kind = ?error.kind, reason = %error.message, "failed to reinitialize camera");
        self.state = CameraState::LostTerminal;
        self.recovering = false;
        self.notice = Some(CameraNotice::AcquisitionFailed(error.user_message()));
        self.surface_visible = false;
        ChatMessage::new(Sender::Error, RESTORE_FAILED_MESSAGE)
    }

    fn release_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop();
        }
    }
}
