//! FileCamera - a camera device whose video feed is an image file.
//!
//! Every frame re-reads the file, so replacing the file changes what the
//! camera "sees". Deleting the file while the stream is live ends the
//! stream's track, the same way unplugging a device would. A watcher task
//! polls for the file so the loss is noticed without a capture.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;
use sightline_core::camera::{
    AcquiredStream, AcquisitionError, CameraDevice, TrackEnded, VideoConstraints, VideoStream,
    VideoSurface,
};
use tokio::sync::mpsc;

/// How often a live stream checks that its source file still exists.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Camera device backed by an image file on disk.
#[derive(Debug, Clone)]
pub struct FileCamera {
    path: PathBuf,
    poll_interval: Duration,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CameraDevice for FileCamera {
    async fn acquire(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<AcquiredStream, AcquisitionError> {
        tracing::debug!(
            path = %self.path.display(),
            ideal_width = constraints.ideal_width,
            ideal_height = constraints.ideal_height,
            "acquiring file camera"
        );

        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|err| classify_io_error(&self.path, err))?;
        let frame = decode(&bytes).map_err(|err| {
            AcquisitionError::other(format!("{} is not a readable image: {err}", self.path.display()))
        })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let stream = Arc::new(FileStream {
            path: self.path.clone(),
            dimensions: frame.dimensions(),
            ended: Mutex::new(Some(tx)),
            stopped: AtomicBool::new(false),
        });
        watch_source(Arc::downgrade(&stream), self.poll_interval);

        tracing::info!(path = %self.path.display(), "camera initialized successfully");
        Ok(AcquiredStream { stream, ended: rx })
    }
}

fn classify_io_error(path: &Path, err: std::io::Error) -> AcquisitionError {
    let message = format!("{}: {err}", path.display());
    match err.kind() {
        ErrorKind::NotFound => AcquisitionError::not_found(message),
        ErrorKind::PermissionDenied => AcquisitionError::permission_denied(message),
        ErrorKind::WouldBlock => AcquisitionError::busy(message),
        _ => AcquisitionError::other(message),
    }
}

/// Ends the stream's track once its file disappears. Exits when the stream
/// is stopped or dropped.
fn watch_source(stream: Weak<FileStream>, poll_interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            ticker.tick().await;
            let Some(stream) = stream.upgrade() else {
                break;
            };
            if stream.stopped.load(Ordering::Acquire) {
                break;
            }
            if matches!(tokio::fs::try_exists(&stream.path).await, Ok(false)) {
                stream.end_track();
                break;
            }
        }
    });
}

fn decode(bytes: &[u8]) -> image::ImageResult<RgbImage> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

struct FileStream {
    path: PathBuf,
    dimensions: (u32, u32),
    ended: Mutex<Option<mpsc::UnboundedSender<TrackEnded>>>,
    stopped: AtomicBool,
}

impl FileStream {
    /// Signals termination of the single track. Fires at most once.
    fn end_track(&self) {
        let sender = match self.ended.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(sender) = sender {
            tracing::warn!(path = %self.path.display(), "camera source disappeared");
            let _ = sender.send(TrackEnded { track_index: 0 });
        }
    }
}

impl VideoSurface for FileStream {
    fn dimensions(&self) -> (u32, u32) {
        if self.stopped.load(Ordering::Acquire) {
            (0, 0)
        } else {
            self.dimensions
        }
    }

    fn current_frame(&self) -> Option<RgbImage> {
        if self.stopped.load(Ordering::Acquire) {
            return None;
        }

        match std::fs::read(&self.path) {
            Ok(bytes) => decode(&bytes).ok(),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                self.end_track();
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read camera frame");
                None
            }
        }
    }
}

impl VideoStream for FileStream {
    fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }
}
