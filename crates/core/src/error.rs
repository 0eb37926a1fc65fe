use std::time::Duration;
use thiserror::Error;

/// Result type alias for peditor-core
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the PEditor assistant
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error for file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Key-value persistence errors
    #[error("store error: {0}")]
    Store(String),

    /// Text generation errors
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Clipboard write failures
    #[error("clipboard error: {0}")]
    Clipboard(String),

    /// Parse/serialization errors
    #[error("parse error: {0}")]
    Parse(String),

    /// Validation errors
    #[error("validation error: {0}")]
    Validation(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

/// Failures of a single generation call.
///
/// A stream that yields `Failed` has still delivered every fragment before it;
/// consumers decide what to do with the partial text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// No credential configured; raised before any network attempt
    #[error("no API key configured")]
    MissingCredential,

    /// Transport or upstream API failure, with the upstream detail
    #[error("{0}")]
    Failed(String),

    /// No fragment arrived within the configured window
    #[error("timed out after {}s waiting for the model", .0.as_secs())]
    Timeout(Duration),

    /// The caller cancelled the stream
    #[error("generation cancelled")]
    Cancelled,
}

impl GenerationError {
    /// Create a failed error from any displayable detail
    pub fn failed(detail: impl Into<String>) -> Self {
        Self::Failed(detail.into())
    }

    /// Whether the error ends a stream that may already have delivered fragments
    pub fn is_terminal_stream_error(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let io_err: Error = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"));
        assert_eq!(io_err.to_string(), "I/O error: file not found");

        let config_err: Error = Error::Config("temperature out of range".to_string());
        assert_eq!(config_err.to_string(), "configuration error: temperature out of range");

        let store_err: Error = Error::Store("disk full".to_string());
        assert_eq!(store_err.to_string(), "store error: disk full");

        let clipboard_err: Error = Error::Clipboard("no display".to_string());
        assert_eq!(clipboard_err.to_string(), "clipboard error: no display");

        let parse_err: Error = Error::Parse("invalid JSON".to_string());
        assert_eq!(parse_err.to_string(), "parse error: invalid JSON");

        let validation_err: Error = Error::Validation("invalid input".to_string());
        assert_eq!(validation_err.to_string(), "validation error: invalid input");

        let other_err: Error = Error::Other("something went wrong".to_string());
        assert_eq!(other_err.to_string(), "something went wrong");
    }

    #[test]
    fn test_generation_error_display() {
        assert_eq!(GenerationError::MissingCredential.to_string(), "no API key configured");
        assert_eq!(GenerationError::failed("401 - bad key").to_string(), "401 - bad key");
        assert_eq!(
            GenerationError::Timeout(Duration::from_secs(30)).to_string(),
            "timed out after 30s waiting for the model"
        );
        assert_eq!(GenerationError::Cancelled.to_string(), "generation cancelled");
    }

    #[test]
    fn test_generation_error_into_error() {
        let err: Error = GenerationError::MissingCredential.into();
        assert!(matches!(err, Error::Generation(GenerationError::MissingCredential)));
        assert_eq!(err.to_string(), "generation error: no API key configured");
    }

    #[test]
    fn test_terminal_stream_errors() {
        assert!(GenerationError::failed("boom").is_terminal_stream_error());
        assert!(GenerationError::Timeout(Duration::from_secs(1)).is_terminal_stream_error());
        assert!(!GenerationError::MissingCredential.is_terminal_stream_error());
        assert!(!GenerationError::Cancelled.is_terminal_stream_error());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Parse(_)));
    }
}
