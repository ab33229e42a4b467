//! Core error types for Vocashot.

use thiserror::Error;

/// Configuration-level errors.
///
/// These are raised when the provider set is built or mutated, never from
/// inside a single upload call.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No provider could be constructed from the available configuration.
    #[error("No image hosting providers configured: {0}")]
    NoProvidersConfigured(String),

    /// A provider name did not match any configured provider.
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
