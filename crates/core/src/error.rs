//! Error types for the PromptForge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Only programmer errors (bad ids, bad configuration) surface as `Err`.
//! Untrusted LLM text never does: parsing and composition degrade instead.

use thiserror::Error;

/// The top-level error type for all PromptForge operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration errors ---
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    // --- Lookup errors ---
    #[error("Not found: {0}")]
    NotFound(#[from] NotFoundError),

    // --- Persistence errors ---
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("unknown layer type '{0}'")]
    UnknownLayerType(String),

    #[error("layer id '{0}' is already registered")]
    DuplicateLayerId(String),

    #[error("invalid layer filter: {0}")]
    InvalidFilter(String),

    #[error("prompt is empty")]
    EmptyPrompt,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFoundError {
    #[error("session '{0}'")]
    Session(String),

    #[error("iteration {index} in session '{session_id}'")]
    Iteration { session_id: String, index: usize },

    #[error("layer '{0}'")]
    Layer(String),

    #[error("session '{0}' has no iterations to follow up on")]
    NoIterations(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O failure: {0}")]
    Io(String),

    #[error("failed to serialize '{key}': {reason}")]
    Serialization { key: String, reason: String },

    #[error("corrupted entry '{key}': {reason}")]
    Corrupted { key: String, reason: String },
}

/// A failed provider call.
///
/// The core never raises these; it converts them into a degraded
/// structured response so callers render a single shape.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_displays_correctly() {
        let err = Error::from(ConfigurationError::UnknownLayerType("persona".into()));
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("persona"));
    }

    #[test]
    fn not_found_iteration_names_session_and_index() {
        let err = Error::from(NotFoundError::Iteration {
            session_id: "s-1".into(),
            index: 7,
        });
        let msg = err.to_string();
        assert!(msg.contains("s-1"));
        assert!(msg.contains('7'));
    }

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::Api {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }
}
