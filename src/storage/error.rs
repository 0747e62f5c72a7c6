//! Storage error types
//!
//! Defines the errors a durable key-value backend can report.

use thiserror::Error;

/// Errors that can occur while reading or writing durable storage
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed (quota, permissions, missing directory)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
