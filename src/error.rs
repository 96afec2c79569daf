//! Error types for game component loading
//!
//! This module defines the error taxonomy surfaced by the loader. Errors are
//! `Clone` because a single load outcome is shared by every caller waiting on
//! the same in-flight request.

use thiserror::Error;

/// Main error type for loader operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
    /// The module path is not on the registry allow-list
    #[error("Unknown module path: {module_path}")]
    UnknownModulePath { module_path: String },

    /// The module loaded but does not expose a default export
    #[error("Module {module_path} has no default export")]
    MissingDefaultExport { module_path: String },

    /// The loader function itself failed (network, bundle, panic)
    #[error("Failed to load {module_path}: {message}")]
    UnderlyingLoadFailure { module_path: String, message: String },

    /// Retry ceiling reached; the cache must be cleared for this game
    #[error("Max retries exceeded for {identifier} after {attempts} failed attempts")]
    MaxRetriesExceeded { identifier: String, attempts: u32 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

impl LoaderError {
    /// Whether a later attempt could succeed without a deployment change
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LoaderError::MissingDefaultExport { .. }
                | LoaderError::UnderlyingLoadFailure { .. }
                | LoaderError::Other(_)
        )
    }

    pub(crate) fn load_failure(module_path: &str, err: &anyhow::Error) -> Self {
        LoaderError::UnderlyingLoadFailure {
            module_path: module_path.to_string(),
            message: format!("{:#}", err),
        }
    }
}

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

impl From<String> for LoaderError {
    fn from(s: String) -> Self {
        LoaderError::Other(s)
    }
}

impl From<&str> for LoaderError {
    fn from(s: &str) -> Self {
        LoaderError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for LoaderError {
    fn from(e: serde_json::Error) -> Self {
        LoaderError::SerializationError(e.to_string())
    }
}
