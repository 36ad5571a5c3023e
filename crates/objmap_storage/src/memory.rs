//! In-memory engine for testing and ephemeral stores.

use crate::engine::KvEngine;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory key-value engine.
///
/// This engine keeps all entries in a `BTreeMap` and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that do not need persistence
///
/// Keys are ordered lexicographically, matching the persistent engine.
///
/// # Example
///
/// ```rust
/// use objmap_storage::{KvEngine, MemoryEngine};
///
/// let mut engine = MemoryEngine::new();
/// engine.put(b"a", b"1").unwrap();
/// engine.put(b"b", b"2").unwrap();
/// assert_eq!(engine.scan().unwrap().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MemoryEngine {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryEngine {
    /// Creates a new empty in-memory engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the engine holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.entries.write().clear();
    }
}

impl KvEngine for MemoryEngine {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StorageResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn scan(&self) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
