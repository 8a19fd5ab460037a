//! Domain-specific error types for dilemma-probe

use thiserror::Error;

/// Main error type for the dilemma-probe core.
///
/// Version drift between persisted records and the running configuration is
/// deliberately not represented here: the store logs a warning and loads the
/// data as given.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Precondition error: {message}")]
    Precondition { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Malformed data: {message}")]
    MalformedData { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        ProbeError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type alias for dilemma-probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;
