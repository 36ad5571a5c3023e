//! Error types for the object mapping store.

use thiserror::Error;

/// Result type for store operations.
pub type MapResult<T> = Result<T, MapError>;

/// Errors that can occur in object mapping store operations.
#[derive(Debug, Error)]
pub enum MapError {
    /// The engine failed to open; the store cannot serve this request.
    ///
    /// Read operations convert this into an empty result and write
    /// operations into a failure flag before crossing the worker boundary.
    #[error("store unavailable")]
    StoreUnavailable,

    /// Engine-level storage error.
    #[error("storage error: {0}")]
    Storage(#[from] objmap_storage::StorageError),

    /// A stored record does not match the expected shape.
    #[error("record decode failed: {message}")]
    Decode {
        /// Description of the mismatch.
        message: String,
    },

    /// A record could not be serialized.
    #[error("record encode failed: {message}")]
    Encode {
        /// Description of the failure.
        message: String,
    },

    /// A write needed the store API version before it was set.
    #[error("api version is not set")]
    ApiVersionUnset,
}

impl MapError {
    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates an encode error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }
}
