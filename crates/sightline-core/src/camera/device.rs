//! Video device abstraction.
//!
//! A [`CameraDevice`] hands out [`AcquiredStream`]s. Each stream exposes its
//! current frame through [`VideoSurface`] and reports asynchronous loss of
//! its tracks on the `ended` channel.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

const ACCESS_REQUIRED: &str = "Camera access is required for this application. ";

/// Constraints passed to the device on acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub audio: bool,
}

impl Default for VideoConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 640,
            ideal_height: 480,
            audio: false,
        }
    }
}

/// Why the device refused to hand out a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionErrorKind {
    /// The user or the OS denied access.
    PermissionDenied,
    /// No video device exists.
    NotFound,
    /// Another application holds the device exclusively.
    Busy,
    Other,
}

/// A classified device acquisition failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct AcquisitionError {
    pub kind: AcquisitionErrorKind,
    pub message: String,
}

impl AcquisitionError {
    pub fn new(kind: AcquisitionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(AcquisitionErrorKind::PermissionDenied, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(AcquisitionErrorKind::NotFound, message)
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self::new(AcquisitionErrorKind::Busy, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(AcquisitionErrorKind::Other, message)
    }

    /// Human-readable explanation shown where the video would be.
    pub fn user_message(&self) -> String {
        let guidance = match self.kind {
            AcquisitionErrorKind::PermissionDenied => {
                "Please grant camera permissions in your browser settings and reload the page."
                    .to_string()
            }
            AcquisitionErrorKind::NotFound => "No camera device found on this system.".to_string(),
            AcquisitionErrorKind::Busy => {
                "Camera is already in use by another application.".to_string()
            }
            AcquisitionErrorKind::Other => format!("Error: {}", self.message),
        };
        format!("{ACCESS_REQUIRED}{guidance}")
    }
}

/// Something that can show a live frame.
pub trait VideoSurface: Send + Sync {
    /// Reported frame dimensions. `(0, 0)` until the first frame arrives.
    fn dimensions(&self) -> (u32, u32);

    /// The most recent frame, if the device has produced one.
    fn current_frame(&self) -> Option<RgbImage>;
}

/// A live stream bound to the display surface.
pub trait VideoStream: VideoSurface {
    /// Number of video tracks that may each signal termination.
    fn track_count(&self) -> usize {
        1
    }

    /// Releases the underlying device.
    fn stop(&self) {}
}

/// Termination signal from one of a stream's tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackEnded {
    pub track_index: usize,
}

/// A successfully acquired stream plus its termination channel.
pub struct AcquiredStream {
    pub stream: Arc<dyn VideoStream>,
    pub ended: mpsc::UnboundedReceiver<TrackEnded>,
}

impl fmt::Debug for AcquiredStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcquiredStream")
            .field("tracks", &self.stream.track_count())
            .field("dimensions", &self.stream.dimensions())
            .finish()
    }
}

/// A video capture device.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    async fn acquire(
        &self,
        constraints: &VideoConstraints,
    ) -> std::result::Result<AcquiredStream, AcquisitionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_message_asks_for_grant_and_reload() {
        let msg = AcquisitionError::permission_denied("NotAllowedError").user_message();
        assert!(msg.starts_with("Camera access is required for this application."));
        assert!(msg.contains("grant camera permissions"));
        assert!(msg.contains("reload the page"));
    }

    #[test]
    fn test_not_found_message() {
        let msg = AcquisitionError::not_found("no video input").user_message();
        assert!(msg.contains("No camera device found"));
    }

    #[test]
    fn test_busy_message() {
        let msg = AcquisitionError::busy("NotReadableError").user_message();
        assert!(msg.contains("already in use by another application"));
    }

    #[test]
    fn test_other_message_includes_reason() {
        let msg = AcquisitionError::other("overconstrained").user_message();
        assert!(msg.ends_with("Error: overconstrained"));
    }

    #[test]
    fn test_default_constraints() {
        let c = VideoConstraints::default();
        assert_eq!((c.ideal_width, c.ideal_height, c.audio), (640, 480, false));
    }
}
