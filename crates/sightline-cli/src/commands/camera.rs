use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use sightline_application::{CameraChatController, CameraSettings, SendOutcome};
use sightline_core::ChatLog;
use sightline_core::camera::CameraState;
use sightline_core::config::ClientConfig;
use sightline_interaction::{BackendChatClient, FileCamera};
use tokio::sync::mpsc;

use super::repl::{self, ReplInput, SlashCommand};

const COMMANDS: &[SlashCommand] = &[SlashCommand {
    name: "/status",
    summary: "show camera state and request progress",
}];

pub async fn run(
    mut config: ClientConfig,
    frame: Option<PathBuf>,
    backend: Option<String>,
) -> Result<()> {
    if let Some(frame) = frame {
        config.camera.frame_path = frame;
    }
    if let Some(url) = backend {
        config.backend.base_url = url;
    }

    let (entries_tx, entries_rx) = mpsc::unbounded_channel();
    let printer = repl::spawn_printer(entries_rx);

    let device = Arc::new(FileCamera::new(config.camera.frame_path.clone()));
    let client = Arc::new(BackendChatClient::from_config(&config.backend));
    tracing::info!(url = client.chat_url(), source = %config.camera.frame_path.display(), "camera chat starting");

    let chat = CameraChatController::new(
        device,
        client,
        CameraSettings::from(&config.camera),
        ChatLog::with_listener(entries_tx),
    );

    let mut rl = repl::editor(COMMANDS)?;
    repl::banner(
        "Sightline Camera",
        "Ask about the current frame, '/status' for camera details, or 'quit' to exit.",
    );

    if chat.start().await != CameraState::Active {
        print_camera_notice(&chat).await;
    }

    loop {
        match repl::read_input(&mut rl) {
            ReplInput::Message(text) => {
                let chat = chat.clone();
                tokio::spawn(async move {
                    match chat.send(&text).await {
                        SendOutcome::Disabled => print_camera_notice(&chat).await,
                        SendOutcome::Busy => repl::notice("Still thinking about the previous question."),
                        _ => {}
                    }
                });
            }
            ReplInput::Command(command) => match command.as_str() {
                "/status" => {
                    repl::status(&format!("camera: {:?}", chat.camera_state().await));
                    if let Some(elapsed) = chat.loading_elapsed().await {
                        repl::status(&format!("Thinking... {}s", elapsed.as_secs()));
                    }
                    print_camera_notice(&chat).await;
                }
                _ => repl::notice("Unknown command"),
            },
            ReplInput::Empty => continue,
            ReplInput::Quit => break,
        }
    }

    printer.abort();
    Ok(())
}

async fn print_camera_notice(chat: &CameraChatController) {
    let state = chat.state();
    let state = state.read().await;
    match state.camera.notice() {
        Some(notice) => repl::notice(notice.text()),
        None if !state.camera.send_enabled() => repl::notice("Camera is not available."),
        None => {}
    }
}
