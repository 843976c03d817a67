//! Asynchronous request/response contract shared by both clients.
//!
//! The dialogue runtime and the vision backend are both reached through
//! [`Exchange`]: one future per request, resolving to exactly one tagged
//! success-or-error value.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SightlineError};

/// A single request/response round trip against an external collaborator.
#[async_trait]
pub trait Exchange<Req, Resp>: Send + Sync
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    async fn exchange(&self, request: Req) -> Result<Resp>;
}

/// Races `future` against a client-side deadline.
///
/// When the deadline elapses first the future is dropped, which aborts any
/// in-flight I/O it owns, and a [`SightlineError::Timeout`] naming `service`
/// is returned.
pub async fn with_timeout<T, F>(service: &'static str, after: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(after, future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(service, timeout_secs = after.as_secs(), "request aborted by timeout");
            Err(SightlineError::Timeout { service, after })
        }
    }
}

/// Mutual exclusion for a send control.
///
/// At most one exchange may be in flight per gate. While a [`SendPermit`] is
/// alive the control is disabled; dropping the permit enables it again.
#[derive(Debug, Clone, Default)]
pub struct SendGate {
    busy: Arc<AtomicBool>,
}

impl SendGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the control, or returns `None` if a send is already in flight.
    pub fn try_acquire(&self) -> Option<SendPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SendPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof that the holder owns the send control. Releases it on drop.
#[derive(Debug)]
pub struct SendPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for SendPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Body posted to the backend `/chat` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's question.
    pub message: String,
    /// The captured frame as a `data:image/jpeg;base64,` URI.
    pub image: String,
}

/// Body returned by the backend `/chat` endpoint.
///
/// Exactly one of the fields is expected to be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
