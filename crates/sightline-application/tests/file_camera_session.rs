use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;
use sightline_application::{CameraChatController, CameraSettings, SendOutcome};
use sightline_core::camera::CameraState;
use sightline_core::camera::lifecycle::RESTORE_FAILED_MESSAGE;
use sightline_core::capture::decode_data_uri;
use sightline_core::exchange::{ChatRequest, Exchange};
use sightline_core::{ChatLog, Result, Sender};
use sightline_interaction::FileCamera;
use tempfile::TempDir;

#[derive(Default)]
struct RecordingBackend {
    requests: Mutex<Vec<ChatRequest>>,
}

#[async_trait]
impl Exchange<ChatRequest, String> for RecordingBackend {
    async fn exchange(&self, request: ChatRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        Ok("A dark frame.".to_string())
    }
}

#[tokio::test]
async fn test_deleted_source_ends_stream_and_recovery_gives_up() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("frame.png");
    RgbImage::new(40, 30).save(&path).unwrap();

    let backend = Arc::new(RecordingBackend::default());
    let settings = CameraSettings {
        recovery_delay: Duration::from_millis(10),
        ..CameraSettings::default()
    };
    let chat = CameraChatController::new(
        Arc::new(FileCamera::new(&path)),
        backend.clone(),
        settings,
        ChatLog::new(),
    );

    assert_eq!(chat.start().await, CameraState::Active);
    assert!(matches!(
        chat.send("what do you see?").await,
        SendOutcome::Answered { .. }
    ));
    {
        let requests = backend.requests.lock().unwrap();
        let decoded = decode_data_uri(&requests[0].image).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    std::fs::remove_file(&path).unwrap();
    assert!(matches!(
        chat.send("still there?").await,
        SendOutcome::CaptureFailed(_)
    ));

    tokio::time::timeout(Duration::from_secs(5), async {
        while chat.camera_state().await != CameraState::LostTerminal {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("recovery should give up once the source is gone");

    let state = chat.state();
    let state = state.read().await;
    let last = state.log.last().unwrap();
    assert_eq!(last.sender, Sender::Error);
    assert_eq!(last.text, RESTORE_FAILED_MESSAGE);
    assert!(
        state
            .log
            .entries()
            .iter()
            .any(|m| m.text == "Failed to capture image: Video stream not ready")
    );
    assert!(
        state
            .camera
            .notice()
            .unwrap()
            .text()
            .contains("No camera device found")
    );
    assert_eq!(backend.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_deleted_source_is_noticed_without_a_send() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("frame.png");
    RgbImage::new(32, 24).save(&path).unwrap();

    let backend = Arc::new(RecordingBackend::default());
    let settings = CameraSettings {
        recovery_delay: Duration::from_millis(10),
        ..CameraSettings::default()
    };
    let chat = CameraChatController::new(
        Arc::new(FileCamera::new(&path).with_poll_interval(Duration::from_millis(10))),
        backend.clone(),
        settings,
        ChatLog::new(),
    );
    assert_eq!(chat.start().await, CameraState::Active);

    std::fs::remove_file(&path).unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while chat.camera_state().await != CameraState::LostTerminal {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("losing the source should end the stream on its own");

    let state = chat.state();
    let state = state.read().await;
    let texts: Vec<(Sender, &str)> = state
        .log
        .entries()
        .iter()
        .map(|m| (m.sender, m.text.as_str()))
        .collect();
    assert_eq!(texts, vec![(Sender::Error, RESTORE_FAILED_MESSAGE)]);
    assert!(!state.camera.send_enabled());
    assert!(backend.requests.lock().unwrap().is_empty());
}
