//! Errors from a single call to the Saleor API.
//!
//! A `TransportError` describes one failed RPC. The installer collects these
//! per target instead of propagating them, so each variant carries enough
//! context to be logged on its own.

use std::time::Duration;
use thiserror::Error;

/// One remote call failed.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The call did not complete within the configured timeout.
    #[error("request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// The request could not be sent or the response could not be read.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Saleor rejected the token (HTTP 401/403).
    #[error("unauthorized (HTTP {0})")]
    Unauthorized(u16),

    /// Saleor answered with a non-success status.
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    /// The GraphQL response carried top-level `errors`.
    #[error("GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    /// A mutation returned field-level validation errors.
    #[error("remote validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The response did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The session could not be set up (bad base URL, client build failure).
    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),
}

impl TransportError {
    /// Returns true if this failure means the app token was not accepted.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, TransportError::Unauthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_messages() {
        let err = TransportError::Validation(vec![
            "targetUrl: Enter a valid URL.".into(),
            "events: Unknown event".into(),
        ]);
        assert_eq!(
            err.to_string(),
            "remote validation error: targetUrl: Enter a valid URL.; events: Unknown event"
        );
    }

    #[test]
    fn timeout_display() {
        let err = TransportError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "request timed out after 1.5s");
    }

    #[test]
    fn auth_failure_detection() {
        assert!(TransportError::Unauthorized(401).is_auth_failure());
        assert!(!TransportError::GraphQl(vec!["nope".into()]).is_auth_failure());
    }
}
