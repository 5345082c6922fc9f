//! Common error types for sharesweep.

use thiserror::Error;

/// Top-level error type for sharesweep operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure or unexpected API status.
    #[error("Network error: {0}")]
    Network(String),

    /// OAuth2 flow or token problem.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The API refused the request for the current credentials.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_carries_detail() {
        let err = Error::Network("API error: 500 - backend".to_string());
        assert_eq!(err.to_string(), "Network error: API error: 500 - backend");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
