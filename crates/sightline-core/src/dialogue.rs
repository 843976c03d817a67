//! Dialogue runtime request/response types.
//!
//! The managed runtime receives one text turn per request and answers with an
//! ordered list of message fragments.

use serde::{Deserialize, Serialize};

use crate::exchange::Exchange;
use crate::session::SessionId;

/// Identifies the bot deployment a widget talks to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    pub bot_id: String,
    pub bot_alias_id: String,
    pub locale_id: String,
}

/// One text turn sent to the dialogue runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeTextRequest {
    pub bot_id: String,
    pub bot_alias_id: String,
    pub locale_id: String,
    pub session_id: String,
    pub text: String,
}

impl RecognizeTextRequest {
    pub fn new(bot: &BotConfig, session: &SessionId, text: impl Into<String>) -> Self {
        Self {
            bot_id: bot.bot_id.clone(),
            bot_alias_id: bot.bot_alias_id.clone(),
            locale_id: bot.locale_id.clone(),
            session_id: session.as_str().to_string(),
            text: text.into(),
        }
    }
}

/// A single fragment of the runtime's answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl RuntimeMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            content_type: Some("PlainText".to_string()),
        }
    }

    /// Returns the content when it is present and non-empty.
    pub fn non_empty_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

/// The runtime's answer to one text turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizeTextResponse {
    #[serde(default)]
    pub messages: Vec<RuntimeMessage>,
}

/// A managed conversational runtime reachable through [`Exchange`].
pub trait DialogueRuntime: Exchange<RecognizeTextRequest, RecognizeTextResponse> {}

impl<T> DialogueRuntime for T where T: Exchange<RecognizeTextRequest, RecognizeTextResponse> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_camel_case() {
        let bot = BotConfig {
            bot_id: "BOT1".to_string(),
            bot_alias_id: "ALIAS1".to_string(),
            locale_id: "en_US".to_string(),
        };
        let session = SessionId::from("session-1-abc");
        let request = RecognizeTextRequest::new(&bot, &session, "do you sell hammers?");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["botId"], "BOT1");
        assert_eq!(json["botAliasId"], "ALIAS1");
        assert_eq!(json["localeId"], "en_US");
        assert_eq!(json["sessionId"], "session-1-abc");
        assert_eq!(json["text"], "do you sell hammers?");
    }

    #[test]
    fn test_response_tolerates_missing_fields() {
        let response: RecognizeTextResponse =
            serde_json::from_str(r#"{"messages":[{"content":"Hi"},{"contentType":"PlainText"}]}"#)
                .unwrap();
        assert_eq!(response.messages.len(), 2);
        assert_eq!(response.messages[0].non_empty_content(), Some("Hi"));
        assert_eq!(response.messages[1].non_empty_content(), None);

        let empty: RecognizeTextResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.messages.is_empty());
    }
}
