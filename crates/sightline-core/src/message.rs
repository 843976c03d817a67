//! Chat log types.
//!
//! Both clients render an append-only sequence of messages. Entries carry no
//! identifier beyond their position and are never persisted.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Who produced a chat log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Text typed by the user.
    User,
    /// Reply from the vision backend.
    Assistant,
    /// Fragment returned by the dialogue runtime.
    Bot,
    /// Client-side failure or camera status report.
    Error,
}

/// A single entry in a chat log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The producer of the entry.
    pub sender: Sender,
    /// The text to display.
    pub text: String,
    /// Wall-clock seconds the backend took to answer. Display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            response_time: None,
        }
    }

    /// Returns the text as it should be rendered.
    ///
    /// Assistant entries with a measured response time get a ` (1.2s)` suffix.
    pub fn display_text(&self) -> String {
        match (self.sender, self.response_time) {
            (Sender::Assistant, Some(secs)) => format!("{} ({:.1}s)", self.text, secs),
            _ => self.text.clone(),
        }
    }
}

/// Append-only ordered chat log.
///
/// An optional listener receives a copy of every appended entry, which is how
/// front ends render new messages as they arrive.
#[derive(Debug, Default)]
pub struct ChatLog {
    entries: Vec<ChatMessage>,
    listener: Option<mpsc::UnboundedSender<ChatMessage>>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a log that forwards every appended entry to `listener`.
    pub fn with_listener(listener: mpsc::UnboundedSender<ChatMessage>) -> Self {
        Self {
            entries: Vec::new(),
            listener: Some(listener),
        }
    }

    /// Appends an entry and notifies the listener, if any.
    pub fn push(&mut self, message: ChatMessage) {
        if let Some(listener) = &self.listener {
            // A closed receiver only means nobody is rendering anymore.
            let _ = listener.send(message.clone());
        }
        self.entries.push(message);
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(ChatMessage::new(Sender::User, text));
    }

    pub fn push_bot(&mut self, text: impl Into<String>) {
        self.push(ChatMessage::new(Sender::Bot, text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>, response_time: Option<f64>) {
        let mut message = ChatMessage::new(Sender::Assistant, text);
        message.response_time = response_time;
        self.push(message);
    }

    pub fn push_error(&mut self, text: impl Into<String>) {
        self.push(ChatMessage::new(Sender::Error, text));
    }

    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_preserves_append_order() {
        let mut log = ChatLog::new();
        log.push_user("hello");
        log.push_bot("hi");
        log.push_error("oops");

        let senders: Vec<Sender> = log.entries().iter().map(|m| m.sender).collect();
        assert_eq!(senders, vec![Sender::User, Sender::Bot, Sender::Error]);
        assert_eq!(log.last().map(|m| m.text.as_str()), Some("oops"));
    }

    #[test]
    fn test_display_text_appends_response_time_for_assistant() {
        let mut log = ChatLog::new();
        log.push_assistant("a red mug", Some(2.345));
        log.push_assistant("no timing", None);

        assert_eq!(log.entries()[0].display_text(), "a red mug (2.3s)");
        assert_eq!(log.entries()[1].display_text(), "no timing");
    }

    #[test]
    fn test_listener_receives_appended_entries() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut log = ChatLog::with_listener(tx);
        log.push_user("ping");

        let received = rx.try_recv().expect("listener should be notified");
        assert_eq!(received.sender, Sender::User);
        assert_eq!(received.text, "ping");
    }

    #[test]
    fn test_closed_listener_does_not_block_appends() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut log = ChatLog::with_listener(tx);
        log.push_bot("still recorded");
        assert_eq!(log.len(), 1);
    }
}
