//! Store error types.

use thiserror::Error;

/// Errors that can occur while reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested file, document or account does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The target already exists and would be overwritten.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// A credential document is missing required fields.
    #[error("Invalid credentials: {0}")]
    Validation(String),

    /// A file exists but its contents are not what we expect.
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Returns true if this error means "nothing stored here".
    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::NotFound(_) => true,
            StoreError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
