//! Error types for the quantrank system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the quantrank system.
///
/// Scoring and prediction recover locally and never surface these; they are
/// produced by configuration loading, context assembly and the per-ticker
/// orchestration step, where the batch runner turns them into omissions.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (invalid or missing data).
    #[error("Data error: {0}")]
    Data(String),

    /// Insufficient history for computation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Quote-history or market-context provider failure.
    #[error("Provider error: {0}")]
    Provider(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create an insufficient data error.
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Error::InsufficientData(msg.into())
    }

    /// Create a provider error.
    pub fn provider(msg: impl Into<String>) -> Self {
        Error::Provider(msg.into())
    }

    /// True for the skip condition (too little history), which is not a failure.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Error::InsufficientData(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::insufficient_data("AAPL: 12 bars");
        assert_eq!(err.to_string(), "Insufficient data: AAPL: 12 bars");
        assert!(err.is_insufficient_data());
        assert!(!Error::provider("timeout").is_insufficient_data());
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
