//! Error types for schema inference

use thiserror::Error;

/// Errors that can occur during schema inference
#[derive(Error, Debug, Clone)]
pub enum InferenceError {
    /// No unique identifier of the allowed length could be produced
    #[error(
        "Cannot produce a unique identifier of at most {max} characters for path '{path}'"
    )]
    IdentifierTooLong { path: String, max: usize },

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// Invalid JSON structure (not an object at root)
    #[error("Invalid JSON structure: expected object at root, found {0}")]
    InvalidStructure(String),

    /// Malformed Extended JSON type wrapper
    #[error("Invalid extended JSON value for {key}: {reason}")]
    InvalidExtendedJson { key: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for InferenceError {
    fn from(e: serde_json::Error) -> Self {
        InferenceError::JsonParse(e.to_string())
    }
}

impl From<std::io::Error> for InferenceError {
    fn from(e: std::io::Error) -> Self {
        InferenceError::Io(e.to_string())
    }
}

/// Result type for inference operations
pub type InferenceResult<T> = Result<T, InferenceError>;
