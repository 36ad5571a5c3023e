//! Key-value engine trait definition.

use crate::error::StorageResult;

/// An ordered key-value engine for objmap.
///
/// Engines are **opaque byte stores**. Keys are ordered lexicographically as
/// byte strings. objmap owns all key and value interpretation - engines do
/// not understand key prefixes, mapping records, or pending-change sets.
///
/// # Invariants
///
/// - `get` returns exactly the value most recently `put` under that key
/// - `delete` of an absent key is a no-op, not an error
/// - `scan` yields live entries in ascending key order
/// - A handle has exactly one owner; engines need not be internally shared
///
/// # Implementors
///
/// - [`super::MemoryEngine`] - For testing
/// - [`super::FileEngine`] - For persistent storage
pub trait KvEngine: Send {
    /// Reads the value stored under `key`.
    ///
    /// Returns `None` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn put(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Removes the entry under `key`.
    ///
    /// Removing an absent key succeeds without effect.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn delete(&mut self, key: &[u8]) -> StorageResult<()>;

    /// Returns a snapshot of all live entries in ascending key order.
    ///
    /// Intended for diagnostics and recovery, not hot paths.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn scan(&self) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>>;
}

/// Options controlling how a persistent engine is opened.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Create the engine directory if it does not exist.
    pub create_if_missing: bool,
    /// Sync the record log to disk after every write.
    pub sync_on_write: bool,
}

impl EngineOptions {
    /// Creates options with the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            create_if_missing: true,
            sync_on_write: true,
        }
    }

    /// Sets whether the engine directory is created when missing.
    #[must_use]
    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Sets whether writes are synced to disk immediately.
    #[must_use]
    pub fn with_sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new()
    }
}
