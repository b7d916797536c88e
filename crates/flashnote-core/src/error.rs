//! Error types for the flashnote pipeline.

use thiserror::Error;

/// Result type alias using flashnote's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for pipeline operations.
///
/// Stale drafts and commit races are deliberately NOT errors — they are
/// ordinary branch outcomes and are modeled as enum variants at the
/// dispatch layer instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration problem (no usable worker, missing endpoint, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider call failed: timeout, non-success status, or empty body
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Model output was structurally invalid tagged text
    #[error("Parse error: {0}")]
    Parse(String),

    /// Directive fields were contradictory or out of range
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record/account store operation failed
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

impl Error {
    /// Whether the sequential dispatcher should retry with another worker
    /// after this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Gateway(_) | Error::Parse(_) | Error::Validation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("registry exhausted".to_string());
        assert_eq!(err.to_string(), "Configuration error: registry exhausted");
    }

    #[test]
    fn test_error_display_gateway() {
        let err = Error::Gateway("timeout after 15s".to_string());
        assert_eq!(err.to_string(), "Gateway error: timeout after 15s");
    }

    #[test]
    fn test_error_display_parse() {
        let err = Error::Parse("missing closing tag".to_string());
        assert_eq!(err.to_string(), "Parse error: missing closing tag");
    }

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("date conflicts with relative date".to_string());
        assert_eq!(
            err.to_string(),
            "Validation error: date conflicts with relative date"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Gateway("x".into()).is_retryable());
        assert!(Error::Parse("x".into()).is_retryable());
        assert!(Error::Validation("x".into()).is_retryable());
        assert!(!Error::Config("x".into()).is_retryable());
        assert!(!Error::Store("x".into()).is_retryable());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
