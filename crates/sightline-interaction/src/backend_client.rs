//! BackendChatClient - posts a question and a captured frame to the vision
//! backend's `/chat` endpoint.
//!
//! The backend answers `{"response": "..."}` on success or `{"error": "..."}`
//! on application failure. Each call produces exactly one of: a response
//! text, a timeout, a connection failure, an HTTP status error, or an
//! application error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use sightline_core::config::BackendConfig;
use sightline_core::exchange::{ChatReply, ChatRequest, Exchange, with_timeout};
use sightline_core::{Result, SightlineError};

const CONNECT_FAILED: &str =
    "Failed to connect to server. Please check that the backend is running.";
const INVALID_RESPONSE: &str = "Received invalid response from server";
const SERVICE_NAME: &str = "VLM service";

/// HTTP client for the backend chat endpoint.
#[derive(Clone)]
pub struct BackendChatClient {
    client: Client,
    chat_url: String,
    timeout: Duration,
}

impl BackendChatClient {
    /// Creates a client posting to `chat_url` with the given deadline.
    pub fn new(chat_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            chat_url: chat_url.into(),
            timeout,
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.chat_url(), config.timeout())
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    async fn post(&self, request: &ChatRequest) -> Result<String> {
        tracing::debug!(url = %self.chat_url, "sending message to backend");

        let response = self
            .client
            .post(&self.chat_url)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            return Err(http_error(response).await);
        }

        let reply: ChatReply = response.json().await.map_err(|err| {
            tracing::error!(error = %err, "failed to parse backend response");
            SightlineError::application(INVALID_RESPONSE)
        })?;

        extract_response(reply)
    }
}

#[async_trait]
impl Exchange<ChatRequest, String> for BackendChatClient {
    async fn exchange(&self, request: ChatRequest) -> Result<String> {
        let result = with_timeout(SERVICE_NAME, self.timeout, self.post(&request)).await;
        match &result {
            Ok(_) => tracing::info!("message sent successfully"),
            Err(err) => tracing::error!(error = %err, "backend exchange failed"),
        }
        result
    }
}

fn map_transport_error(err: reqwest::Error) -> SightlineError {
    if err.is_connect() {
        SightlineError::connection(CONNECT_FAILED)
    } else {
        SightlineError::connection(format!("Network error: {err}"))
    }
}

/// Non-2xx: keep the status, and the body's `error` field when it has one.
async fn http_error(response: Response) -> SightlineError {
    let status = response.status().as_u16();
    let message = response
        .json::<ChatReply>()
        .await
        .ok()
        .and_then(|reply| reply.error);

    tracing::error!(status, "HTTP error from backend");
    SightlineError::Http { status, message }
}

fn extract_response(reply: ChatReply) -> Result<String> {
    if let Some(error) = reply.error {
        tracing::error!(error = %error, "backend returned error");
        return Err(SightlineError::application(error));
    }

    reply
        .response
        .filter(|text| !text.is_empty())
        .ok_or_else(|| SightlineError::application(INVALID_RESPONSE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_field_wins_over_response() {
        let reply = ChatReply {
            response: Some("ignored".to_string()),
            error: Some("Ollama API error: model not found".to_string()),
        };
        assert_eq!(
            extract_response(reply).unwrap_err(),
            SightlineError::Application("Ollama API error: model not found".to_string())
        );
    }

    #[test]
    fn test_empty_response_is_invalid() {
        let reply = ChatReply {
            response: Some(String::new()),
            error: None,
        };
        assert_eq!(
            extract_response(reply).unwrap_err().to_string(),
            INVALID_RESPONSE
        );
        assert!(extract_response(ChatReply::default()).is_err());
    }
}
