//! Chat widget controller.
//!
//! Relays user text to a dialogue runtime and renders the returned message
//! fragments. Failures are terminal for that message; the user may resend.

use std::sync::Arc;

use sightline_core::config::DialogueConfig;
use sightline_core::dialogue::{BotConfig, DialogueRuntime, RecognizeTextRequest};
use sightline_core::exchange::Exchange;
use sightline_core::{ChatLog, SendGate, SessionId, SightlineError};
use sightline_interaction::HttpDialogueRuntime;
use tokio::sync::RwLock;

pub const WELCOME_MESSAGE: &str =
    "Hello! I'm the Wombat Tools assistant. How can I help you today?";
pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "Sorry, the chat service is not available. Please check the configuration.";
pub const APOLOGY_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";
pub const EMPTY_REPLY_MESSAGE: &str = "I received your message but have no response.";

const STATUS_SENDING: &str = "Sending...";
const STATUS_NOT_INITIALIZED: &str = "Error: Chat service not initialized";

/// A configured runtime plus the bot deployment it serves.
#[derive(Clone)]
pub struct RuntimeBinding {
    pub runtime: Arc<dyn DialogueRuntime>,
    pub bot: BotConfig,
}

impl RuntimeBinding {
    /// Builds the HTTP runtime client from configuration.
    ///
    /// Returns `None` when the runtime is not configured or its client
    /// cannot be created; the widget then answers every send with an error
    /// entry instead of attempting I/O.
    pub fn from_config(config: Option<&DialogueConfig>) -> Option<Self> {
        let Some(config) = config else {
            tracing::error!("dialogue runtime is not configured");
            return None;
        };

        match HttpDialogueRuntime::from_config(config) {
            Ok(runtime) => {
                tracing::info!(endpoint = %config.endpoint, "dialogue runtime initialized");
                Some(Self {
                    runtime: Arc::new(runtime),
                    bot: config.bot(),
                })
            }
            Err(err) => {
                tracing::error!(error = %err, "error initializing dialogue runtime");
                None
            }
        }
    }
}

/// The widget's client state record.
#[derive(Debug)]
pub struct WidgetState {
    /// Generated once; sent unchanged with every request.
    pub session: SessionId,
    pub log: ChatLog,
    /// One-line status shown under the log.
    pub status: String,
    /// Contents of the input box.
    pub input: String,
    pub open: bool,
}

impl WidgetState {
    pub fn new(log: ChatLog) -> Self {
        Self {
            session: SessionId::generate(),
            log,
            status: String::new(),
            input: String::new(),
            open: false,
        }
    }
}

/// Result of one send action.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Empty or whitespace-only text. Nothing logged, nothing sent.
    Ignored,
    /// Another send from this widget is still in flight.
    Busy,
    /// The runtime failed to initialize; no I/O was attempted.
    Unavailable,
    /// The runtime answered; `fragments` bot entries were appended.
    Delivered { fragments: usize },
    /// Transport or service failure.
    Failed(SightlineError),
}

/// Drives the chat widget.
#[derive(Clone)]
pub struct ChatWidgetController {
    state: Arc<RwLock<WidgetState>>,
    binding: Option<RuntimeBinding>,
    gate: SendGate,
}

impl ChatWidgetController {
    pub fn new(binding: Option<RuntimeBinding>, log: ChatLog) -> Self {
        Self {
            state: Arc::new(RwLock::new(WidgetState::new(log))),
            binding,
            gate: SendGate::new(),
        }
    }

    /// Shared handle to the state record.
    pub fn state(&self) -> Arc<RwLock<WidgetState>> {
        Arc::clone(&self.state)
    }

    pub fn is_initialized(&self) -> bool {
        self.binding.is_some()
    }

    pub async fn session_id(&self) -> SessionId {
        self.state.read().await.session.clone()
    }

    /// Opens the panel. Greets the user the first time the log is shown.
    pub async fn open(&self) {
        let mut state = self.state.write().await;
        state.open = true;
        if state.log.is_empty() {
            state.log.push_bot(WELCOME_MESSAGE);
        }
    }

    pub async fn close(&self) {
        self.state.write().await.open = false;
    }

    pub async fn set_input(&self, text: impl Into<String>) {
        self.state.write().await.input = text.into();
    }

    /// Sends the contents of the input box, emptying it in the same step.
    pub async fn submit(&self) -> SubmitOutcome {
        let text = std::mem::take(&mut self.state.write().await.input);
        self.send(&text).await
    }

    /// Sends `text` to the dialogue runtime.
    pub async fn send(&self, text: &str) -> SubmitOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }

        let Some(_permit) = self.gate.try_acquire() else {
            tracing::debug!("send ignored, previous message still in flight");
            return SubmitOutcome::Busy;
        };

        let (runtime, request) = {
            let mut state = self.state.write().await;
            state.log.push_user(text);

            let Some(binding) = &self.binding else {
                state.status = STATUS_NOT_INITIALIZED.to_string();
                state.log.push_bot(SERVICE_UNAVAILABLE_MESSAGE);
                return SubmitOutcome::Unavailable;
            };

            state.status = STATUS_SENDING.to_string();
            let request = RecognizeTextRequest::new(&binding.bot, &state.session, text);
            (Arc::clone(&binding.runtime), request)
        };

        let result = runtime.exchange(request).await;

        let mut state = self.state.write().await;
        match result {
            Ok(response) => {
                state.status.clear();
                tracing::debug!(messages = response.messages.len(), "runtime response");

                if response.messages.is_empty() {
                    state.log.push_bot(EMPTY_REPLY_MESSAGE);
                    return SubmitOutcome::Delivered { fragments: 0 };
                }

                let mut fragments = 0;
                for content in response.messages.iter().filter_map(|m| m.non_empty_content()) {
                    state.log.push_bot(content);
                    fragments += 1;
                }
                SubmitOutcome::Delivered { fragments }
            }
            Err(err) => {
                tracing::error!(error = %err, "dialogue runtime error");
                state.status = format!("Error: {err}");
                state.log.push_bot(APOLOGY_MESSAGE);
                SubmitOutcome::Failed(err)
            }
        }
    }
}
