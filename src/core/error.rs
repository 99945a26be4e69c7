//! Error types and error handling for the documentation search engine.
//!
//! This module defines the error types used throughout the
//! engine. Errors fall into a small taxonomy that callers can
//! query: retryable external failures, index corruption (which
//! the engine recovers from locally), and bad requests.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for docsearch operations
pub type Result<T> = std::result::Result<T, DocSearchError>;

/// Main error type for the docsearch engine
#[derive(Error, Debug)]
pub enum DocSearchError {
    #[error("Failed to fetch source document: {0}")]
    FetchFailed(String),

    #[error(
        "Timed out after {waited_ms}ms waiting for index lock {path:?} (held by PID {holder_pid})"
    )]
    LockTimeout {
        path: PathBuf,
        holder_pid: u32,
        waited_ms: u64,
    },

    #[error("Lock error: {0}")]
    LockFailed(String),

    #[error("Indexing failed: {0}")]
    IndexingFailed(String),

    #[error("Index corrupted: {0}")]
    IndexCorrupted(String),

    #[error("Index schema version mismatch (found v{found}, expected v{expected})")]
    SchemaMismatch { found: u32, expected: u32 },

    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Index not initialized")]
    IndexNotInitialized,

    #[error("Index generation is closed")]
    IndexClosed,

    #[error("Fallback data not found: {0}")]
    FallbackMissing(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl DocSearchError {
    /// Get user-friendly error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Check if the caller may simply try again later
    ///
    /// Covers failures of external collaborators and contention on
    /// the cross-process lock.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DocSearchError::FetchFailed(_) | DocSearchError::LockTimeout { .. }
        )
    }

    /// Check if this error means the on-disk index cannot be trusted
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            DocSearchError::IndexCorrupted(_) | DocSearchError::SchemaMismatch { .. }
        )
    }

    /// Check if this is a bad request error (invalid input)
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            DocSearchError::InvalidQuery(_) | DocSearchError::ConfigError(_)
        )
    }
}
