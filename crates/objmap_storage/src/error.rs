//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Another process holds the engine directory lock.
    #[error("engine locked: another process has exclusive access")]
    EngineLocked,

    /// The engine directory is missing or not a directory.
    #[error("invalid engine path: {message}")]
    InvalidPath {
        /// Description of the path issue.
        message: String,
    },

    /// The record log contains data that cannot be interpreted.
    #[error("log corrupted: {message}")]
    Corrupted {
        /// Description of the corruption.
        message: String,
    },
}

impl StorageError {
    /// Creates an invalid path error.
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Self::InvalidPath {
            message: message.into(),
        }
    }

    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted {
            message: message.into(),
        }
    }
}
