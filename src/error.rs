//! Error types for the remote store, the edit cache, and configuration.

use thiserror::Error;

/// Local persistence failures (edit cache database, log and config files).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Errors surfaced to callers of the library.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A listing or read against the remote store failed.
    #[error("Remote fetch failed: {0}")]
    RemoteFetch(String),

    /// A save, rename, create or delete against the remote store failed.
    #[error("Remote write failed: {0}")]
    RemoteWrite(String),

    /// Input rejected before any network call.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A conflict resolution for this path is already running.
    #[error("Resolution already in progress for {0}")]
    ResolutionInProgress(String),

    #[error("Invalid resolution transition: {0}")]
    InvalidTransition(String),

    #[error("Prompt failed: {0}")]
    PromptError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<sled::Error> for ApiError {
    fn from(err: sled::Error) -> Self {
        ApiError::StorageError(StorageError::from(err))
    }
}
