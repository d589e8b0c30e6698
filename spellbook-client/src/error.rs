//! Error types for the Spellbook client

use spellbook_core::dto::error::{ErrorBody, MALFORMED_RESULT};
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the Spellbook client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The job result exists but cannot be parsed
    #[error("Malformed job result: {0}")]
    MalformedResult(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Check if repeating the same request may succeed
    ///
    /// Transport failures, server errors, timeouts and rate limiting are
    /// transient. Other client errors and invalid requests are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::ParseError(_) => true,
            Self::ApiError { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::InvalidRequest(_) | Self::MalformedResult(_) => false,
        }
    }

    /// Structured error body sent by the API, if the message holds one
    pub fn body(&self) -> Option<ErrorBody> {
        match self {
            Self::ApiError { message, .. } => serde_json::from_str(message).ok(),
            _ => None,
        }
    }

    /// Turns a server error tagged as a malformed result into `MalformedResult`
    pub(crate) fn classify_result_error(self) -> Self {
        match self.body() {
            Some(body) if body.has_code(MALFORMED_RESULT) => Self::MalformedResult(body.error),
            _ => self,
        }
    }

    /// Extracts the `error` field of a JSON error body, if there is one
    pub fn message(&self) -> String {
        match self {
            Self::ApiError { message, .. } => self
                .body()
                .map(|body| body.error)
                .unwrap_or_else(|| message.clone()),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ClientError::api_error(503, "unavailable").is_retryable());
        assert!(ClientError::api_error(429, "slow down").is_retryable());
        assert!(ClientError::ParseError("truncated".to_string()).is_retryable());

        assert!(!ClientError::api_error(400, "bad").is_retryable());
        assert!(!ClientError::api_error(404, "missing").is_retryable());
        assert!(!ClientError::InvalidRequest("bad url".to_string()).is_retryable());
    }

    #[test]
    fn test_status_helpers() {
        let err = ClientError::api_error(404, "missing");
        assert!(err.is_not_found());
        assert!(err.is_client_error());
        assert!(!err.is_server_error());
        assert!(ClientError::api_error(500, "boom").is_server_error());
    }

    #[test]
    fn test_message_prefers_error_field() {
        let err = ClientError::api_error(409, r#"{"error":"Score already recorded"}"#);
        assert_eq!(err.message(), "Score already recorded");
        assert_eq!(ClientError::api_error(502, "Bad gateway").message(), "Bad gateway");
    }

    #[test]
    fn test_tagged_server_error_becomes_malformed_result() {
        let err = ClientError::api_error(
            500,
            r#"{"error":"result for job 1 is malformed","code":"malformed_result"}"#,
        )
        .classify_result_error();
        assert!(matches!(&err, ClientError::MalformedResult(msg) if msg.contains("malformed")));
        assert!(!err.is_retryable());

        let err = ClientError::api_error(500, r#"{"error":"disk on fire"}"#).classify_result_error();
        assert!(matches!(err, ClientError::ApiError { status: 500, .. }));
    }
}
