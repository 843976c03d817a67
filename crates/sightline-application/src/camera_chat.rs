//! Camera chat controller.
//!
//! Owns the camera lifecycle and the chat log of the camera client. Each send
//! captures the current frame and posts it with the user's text to the
//! backend; track loss triggers one bounded recovery attempt.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sightline_core::camera::{
    AcquisitionError, CameraDevice, CameraLifecycle, CameraState, LossDisposition, TrackEnded,
    VideoConstraints,
};
use sightline_core::capture::{DEFAULT_JPEG_QUALITY, capture_frame};
use sightline_core::config::CameraConfig;
use sightline_core::exchange::{ChatRequest, Exchange};
use sightline_core::{ChatLog, SendGate, SightlineError};
use tokio::sync::{RwLock, mpsc};

/// Backend reachable through the shared exchange contract.
pub type ChatBackend = dyn Exchange<ChatRequest, String>;

/// Tunables for the camera client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub constraints: VideoConstraints,
    /// Fixed delay before the single re-acquisition attempt.
    pub recovery_delay: Duration,
    pub jpeg_quality: u8,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            constraints: VideoConstraints::default(),
            recovery_delay: Duration::from_secs(1),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl From<&CameraConfig> for CameraSettings {
    fn from(config: &CameraConfig) -> Self {
        Self {
            constraints: config.constraints(),
            recovery_delay: config.recovery_delay(),
            jpeg_quality: config.jpeg_quality,
        }
    }
}

/// The camera client's state record.
#[derive(Debug)]
pub struct CameraChatState {
    pub log: ChatLog,
    pub camera: CameraLifecycle,
    /// Set while a backend request is in flight.
    pub loading_since: Option<Instant>,
}

/// Result of one send action.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Empty or whitespace-only text. Nothing logged, nothing sent.
    Ignored,
    /// The send control is disabled because no camera stream is live.
    Disabled,
    /// Another send is still in flight.
    Busy,
    /// No frame could be captured; nothing was sent.
    CaptureFailed(SightlineError),
    /// The backend answered after `response_time` seconds.
    Answered { response_time: f64 },
    /// Timeout, connection, HTTP, or application failure.
    Failed(SightlineError),
}

/// What a loss signal led to.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryOutcome {
    /// No recovery was started for this signal.
    NotStarted(LossDisposition),
    Restored,
    Failed(AcquisitionError),
}

/// Drives the camera chat client.
#[derive(Clone)]
pub struct CameraChatController {
    state: Arc<RwLock<CameraChatState>>,
    device: Arc<dyn CameraDevice>,
    backend: Arc<ChatBackend>,
    settings: CameraSettings,
    gate: SendGate,
}

impl CameraChatController {
    pub fn new(
        device: Arc<dyn CameraDevice>,
        backend: Arc<ChatBackend>,
        settings: CameraSettings,
        log: ChatLog,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(CameraChatState {
                log,
                camera: CameraLifecycle::new(),
                loading_since: None,
            })),
            device,
            backend,
            settings,
            gate: SendGate::new(),
        }
    }

    /// Shared handle to the state record.
    pub fn state(&self) -> Arc<RwLock<CameraChatState>> {
        Arc::clone(&self.state)
    }

    pub async fn camera_state(&self) -> CameraState {
        self.state.read().await.camera.state()
    }

    /// Whether the send control is enabled.
    pub async fn can_send(&self) -> bool {
        self.state.read().await.camera.send_enabled() && !self.gate.is_busy()
    }

    /// Time spent waiting on the current request, for the loading indicator.
    pub async fn loading_elapsed(&self) -> Option<Duration> {
        self.state
            .read()
            .await
            .loading_since
            .map(|since| since.elapsed())
    }

    /// Acquires the camera and starts watching the stream for loss.
    ///
    /// A rejected acquisition is recorded as an inline notice and is not
    /// retried.
    pub async fn start(&self) -> CameraState {
        match self.device.acquire(&self.settings.constraints).await {
            Ok(acquired) => {
                let generation = self.state.write().await.camera.acquired(acquired.stream);
                self.watch_stream(generation, acquired.ended);
                CameraState::Active
            }
            Err(err) => {
                let mut state = self.state.write().await;
                state.camera.acquisition_failed(&err);
                state.camera.state()
            }
        }
    }

    /// Forwards loss signals of stream `generation` to the recovery handler.
    ///
    /// Each signal is handled on its own task so that signals from several
    /// tracks race exactly like independent events; the lifecycle's recovery
    /// flag lets only the first one through.
    fn watch_stream(&self, generation: u64, mut ended: mpsc::UnboundedReceiver<TrackEnded>) {
        let controller = self.clone();
        tokio::spawn(async move {
            while let Some(signal) = ended.recv().await {
                tracing::warn!(generation, track = signal.track_index, "video track ended");
                let controller = controller.clone();
                tokio::spawn(async move {
                    controller.handle_camera_loss(generation).await;
                });
            }
        });
    }

    /// Handles one track-ended signal from stream `generation`.
    pub async fn handle_camera_loss(&self, generation: u64) -> RecoveryOutcome {
        let disposition = self.state.write().await.camera.track_ended(generation);
        if disposition != LossDisposition::BeginRecovery {
            tracing::debug!(?disposition, "no recovery started");
            return RecoveryOutcome::NotStarted(disposition);
        }

        let delay = self.settings.recovery_delay;
        tracing::info!(?delay, "attempting to reinitialize camera");
        tokio::time::sleep(delay).await;

        match self.device.acquire(&self.settings.constraints).await {
            Ok(acquired) => {
                let generation = {
                    let mut state = self.state.write().await;
                    let (generation, entry) = state.camera.recovery_succeeded(acquired.stream);
                    state.log.push(entry);
                    generation
                };
                self.watch_stream(generation, acquired.ended);
                RecoveryOutcome::Restored
            }
            Err(err) => {
                let mut state = self.state.write().await;
                let entry = state.camera.recovery_failed(&err);
                state.log.push(entry);
                RecoveryOutcome::Failed(err)
            }
        }
    }

    /// Sends `text` with a frame captured from the live stream.
    ///
    /// The user's entry is always appended before the response or error
    /// entry, and exactly one of the two follows it.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }

        let Some(_permit) = self.gate.try_acquire() else {
            tracing::debug!("send ignored, previous message still in flight");
            return SendOutcome::Busy;
        };

        let stream = {
            let mut state = self.state.write().await;
            if !state.camera.send_enabled() {
                return SendOutcome::Disabled;
            }
            state.log.push_user(text);
            state.camera.stream().cloned()
        };

        let captured = stream
            .ok_or_else(|| SightlineError::capture("Video stream not ready"))
            .and_then(|stream| capture_frame(stream.as_ref(), self.settings.jpeg_quality));
        let frame = match captured {
            Ok(frame) => frame,
            Err(err) => {
                tracing::error!(error = %err, "image capture error");
                self.state
                    .write()
                    .await
                    .log
                    .push_error(format!("Failed to capture image: {err}"));
                return SendOutcome::CaptureFailed(err);
            }
        };

        let started = Instant::now();
        self.state.write().await.loading_since = Some(started);

        let result = self
            .backend
            .exchange(ChatRequest {
                message: text.to_string(),
                image: frame.data_uri,
            })
            .await;
        let response_time = started.elapsed().as_secs_f64();

        let mut state = self.state.write().await;
        state.loading_since = None;
        match result {
            Ok(response) => {
                state.log.push_assistant(response, Some(response_time));
                SendOutcome::Answered { response_time }
            }
            Err(err) => {
                state.log.push_error(err.to_string());
                SendOutcome::Failed(err)
            }
        }
    }
}
