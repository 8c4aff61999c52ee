//! Error types for the intent classification service
//!
//! This module provides structured error definitions using thiserror. Each
//! variant corresponds to one failure class of the training pipeline, the
//! artifact codec or the inference service, so callers can decide whether a
//! failure is fatal (training, startup) or local to a single request.

use thiserror::Error;

/// Main error type for intent operations
#[derive(Error, Debug)]
pub enum IntentError {
    /// Training input was empty or invalid; no artifact is produced
    #[error("Training error: {0}")]
    Training(String),

    /// The trained model failed the accuracy gate
    #[error("Validation error: accuracy {accuracy:.4} is below the required minimum {minimum:.4}")]
    Validation { accuracy: f64, minimum: f64 },

    /// Artifact bytes are corrupt, truncated or of an unknown version
    #[error("Artifact format error: {0}")]
    ArtifactFormat(String),

    /// A required request field is absent
    #[error("Missing '{0}' parameter")]
    MissingField(&'static str),

    /// A request field is present but unusable
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No artifact has been loaded yet
    #[error("Model not loaded")]
    NotReady,

    /// Unexpected failure while encoding or classifying
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Result type alias for intent operations
pub type Result<T> = std::result::Result<T, IntentError>;

impl IntentError {
    /// Whether the error was caused by the caller rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IntentError::MissingField(_) | IntentError::InvalidInput(_)
        )
    }
}

/// Convert anyhow::Error to IntentError
impl From<anyhow::Error> for IntentError {
    fn from(err: anyhow::Error) -> Self {
        IntentError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IntentError::MissingField("text");
        assert_eq!(err.to_string(), "Missing 'text' parameter");

        let err = IntentError::Validation {
            accuracy: 0.25,
            minimum: 0.5,
        };
        assert_eq!(
            err.to_string(),
            "Validation error: accuracy 0.2500 is below the required minimum 0.5000"
        );
    }

    #[test]
    fn test_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{ nope").unwrap_err();
        let err: IntentError = json_err.into();
        assert!(matches!(err, IntentError::Json(_)));

        let err: IntentError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, IntentError::Other(ref msg) if msg == "boom"));
    }

    #[test]
    fn test_client_errors() {
        assert!(IntentError::MissingField("text").is_client_error());
        assert!(IntentError::InvalidInput("x".into()).is_client_error());
        assert!(!IntentError::Internal("x".into()).is_client_error());
        assert!(!IntentError::NotReady.is_client_error());
    }
}
