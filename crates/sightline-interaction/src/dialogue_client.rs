//! HttpDialogueRuntime - reaches a managed dialogue runtime through a JSON
//! HTTP endpoint.
//!
//! The endpoint receives the `RecognizeText` request body as-is and answers
//! with `{"messages": [{"content": "..."}]}`. Authentication is handled by
//! whatever fronts the endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use sightline_core::config::DialogueConfig;
use sightline_core::dialogue::{RecognizeTextRequest, RecognizeTextResponse};
use sightline_core::exchange::{Exchange, with_timeout};
use sightline_core::{Result, SightlineError};

const SERVICE_NAME: &str = "dialogue service";

/// Dialogue runtime client.
#[derive(Clone)]
pub struct HttpDialogueRuntime {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ServiceError {
    message: String,
}

impl HttpDialogueRuntime {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Builds a runtime client from configuration.
    ///
    /// Fails with an initialization error when the endpoint is not an
    /// absolute http(s) URL.
    pub fn from_config(config: &DialogueConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(SightlineError::initialization(format!(
                "Invalid dialogue endpoint '{endpoint}'"
            )));
        }
        Ok(Self::new(endpoint, Duration::from_secs(config.timeout_secs)))
    }

    async fn send_request(&self, request: &RecognizeTextRequest) -> Result<RecognizeTextResponse> {
        tracing::debug!(session_id = %request.session_id, "sending text to dialogue runtime");

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                SightlineError::connection(format!("Dialogue runtime request failed: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_service_error(status, &body));
        }

        response.json().await.map_err(|err| {
            SightlineError::application(format!("Failed to parse dialogue runtime response: {err}"))
        })
    }
}

#[async_trait]
impl Exchange<RecognizeTextRequest, RecognizeTextResponse> for HttpDialogueRuntime {
    async fn exchange(&self, request: RecognizeTextRequest) -> Result<RecognizeTextResponse> {
        with_timeout(SERVICE_NAME, self.timeout, self.send_request(&request)).await
    }
}

fn map_service_error(status: StatusCode, body: &str) -> SightlineError {
    let message = serde_json::from_str::<ServiceError>(body)
        .map(|err| err.message)
        .ok();

    SightlineError::Http {
        status: status.as_u16(),
        message,
    }
}
