use anyhow::Result;
use sightline_application::{ChatWidgetController, RuntimeBinding, SubmitOutcome};
use sightline_core::ChatLog;
use sightline_core::config::ClientConfig;
use tokio::sync::mpsc;

use super::repl::{self, ReplInput, SlashCommand};

const COMMANDS: &[SlashCommand] = &[
    SlashCommand {
        name: "/status",
        summary: "show the session id and last status",
    },
    SlashCommand {
        name: "/open",
        summary: "reopen the chat panel",
    },
    SlashCommand {
        name: "/close",
        summary: "close the chat panel",
    },
];

pub async fn run(config: ClientConfig) -> Result<()> {
    let (entries_tx, entries_rx) = mpsc::unbounded_channel();
    let printer = repl::spawn_printer(entries_rx);

    let binding = RuntimeBinding::from_config(config.dialogue.as_ref());
    let widget = ChatWidgetController::new(binding, ChatLog::with_listener(entries_tx));

    let mut rl = repl::editor(COMMANDS)?;
    repl::banner(
        "Sightline Chat",
        "Type a message, '/status' for session details, or 'quit' to exit.",
    );

    if !widget.is_initialized() {
        repl::notice("Dialogue runtime is not configured. Add a [dialogue] section to the config file.");
    }
    widget.open().await;

    loop {
        match repl::read_input(&mut rl) {
            ReplInput::Message(text) => {
                let widget = widget.clone();
                tokio::spawn(async move {
                    match widget.send(&text).await {
                        SubmitOutcome::Busy => {
                            repl::notice("Still waiting for the previous reply.")
                        }
                        SubmitOutcome::Failed(_) | SubmitOutcome::Unavailable => {
                            let status = widget.state().read().await.status.clone();
                            repl::status(&status);
                        }
                        _ => {}
                    }
                });
            }
            ReplInput::Command(command) => match command.as_str() {
                "/status" => {
                    let state = widget.state();
                    let state = state.read().await;
                    repl::status(&format!("session: {}", state.session));
                    repl::status(&format!("messages: {}", state.log.len()));
                    if !state.status.is_empty() {
                        repl::status(&state.status);
                    }
                }
                "/open" => widget.open().await,
                "/close" => widget.close().await,
                _ => repl::notice("Unknown command"),
            },
            ReplInput::Empty => continue,
            ReplInput::Quit => break,
        }
    }

    printer.abort();
    Ok(())
}
