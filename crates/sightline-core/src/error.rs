//! Error types for the Sightline clients.

use std::time::Duration;

use thiserror::Error;

use crate::camera::AcquisitionError;

/// A shared error type for both chat clients.
///
/// Each variant is one failure class of the client taxonomy. Every variant is
/// caught at the boundary where it occurs and turned into a log entry or a
/// notice; none of them is retried automatically.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SightlineError {
    /// The runtime or service client was never configured
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// The video device could not be acquired
    #[error("{}", .0.user_message())]
    DeviceAcquisition(#[from] AcquisitionError),

    /// The video surface had no frame to capture
    #[error("{0}")]
    Capture(String),

    /// Connection refused, unreachable host, or any other transport failure
    #[error("{0}")]
    Connection(String),

    /// The client-side deadline elapsed and the request was aborted
    #[error(
        "Request timed out after {} seconds. The {service} may be slow or unavailable.",
        .after.as_secs()
    )]
    Timeout {
        /// Human name of the service that did not answer, e.g. "VLM service"
        service: &'static str,
        after: Duration,
    },

    /// Non-2xx HTTP status, optionally carrying the body's error text
    #[error("{}", http_message(.status, .message))]
    Http { status: u16, message: Option<String> },

    /// Structured error returned by the application in the response body
    #[error("{0}")]
    Application(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },
}

fn http_message(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("Server error: {status}"),
    }
}

impl SightlineError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an Initialization error
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization(message.into())
    }

    /// Creates a Capture error
    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture(message.into())
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Creates an Application error
    pub fn application(message: impl Into<String>) -> Self {
        Self::Application(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is a Connection error
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Check if this is an application error
    pub fn is_application(&self) -> bool {
        matches!(self, Self::Application(_))
    }

    /// Returns the HTTP status code for `Http` errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<toml::ser::Error> for SightlineError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<image::ImageError> for SightlineError {
    fn from(err: image::ImageError) -> Self {
        Self::Serialization {
            format: "image".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, SightlineError>`.
pub type Result<T> = std::result::Result<T, SightlineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_mentions_seconds() {
        let err = SightlineError::Timeout {
            service: "VLM service",
            after: Duration::from_secs(90),
        };
        assert_eq!(
            err.to_string(),
            "Request timed out after 90 seconds. The VLM service may be slow or unavailable."
        );
        assert!(err.is_timeout());
        assert!(!err.is_connection());
    }

    #[test]
    fn test_http_error_prefers_body_message() {
        let with_body = SightlineError::Http {
            status: 503,
            message: Some("VLM service unavailable".to_string()),
        };
        assert_eq!(with_body.to_string(), "VLM service unavailable");
        assert_eq!(with_body.status_code(), Some(503));

        let bare = SightlineError::Http {
            status: 502,
            message: None,
        };
        assert_eq!(bare.to_string(), "Server error: 502");
    }

    #[test]
    fn test_timeout_names_the_silent_service() {
        let err = SightlineError::Timeout {
            service: "dialogue service",
            after: Duration::from_secs(30),
        };
        assert_eq!(
            err.to_string(),
            "Request timed out after 30 seconds. The dialogue service may be slow or unavailable."
        );
    }

    #[test]
    fn test_image_error_becomes_serialization_error() {
        let err: SightlineError = image::load_from_memory(b"not an image").unwrap_err().into();
        assert!(matches!(err, SightlineError::Serialization { ref format, .. } if format == "image"));
    }
}
