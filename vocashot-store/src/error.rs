//! Store error types.

use thiserror::Error;

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A credential file exists but cannot be used.
    #[error("Invalid credential file {path}: {reason}")]
    Credential {
        /// Offending file.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The system keychain refused an operation.
    #[error("Keychain error: {0}")]
    Keychain(String),
}

impl StoreError {
    /// Returns true if the file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
