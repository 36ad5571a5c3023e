//! Store core: forward/reverse mappings, pending sets, lifecycle.
//!
//! [`MapInner`] is the single-threaded heart of the store. It is owned
//! exclusively by the sequencing worker (see [`crate::worker`]); nothing
//! here is synchronized because nothing here is ever shared.
//!
//! The engine handle is opened lazily: every operation first ensures the
//! store is `Open`, reopening on demand after a `close`. Failures to open
//! degrade reads to empty results and writes to failure flags; they are
//! never surfaced as panics.

use crate::category::Category;
use crate::error::{MapError, MapResult};
use crate::key::{compose_raw_key, split_raw_key};
use crate::not_synced::{
    actions, deserialize_set, not_synced_key, serialize_set, NotSyncedOperation,
};
use crate::record::MappingRecord;
use objmap_storage::{EngineOptions, FileEngine, KvEngine, MemoryEngine};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, error, warn};

/// Name of the engine directory under the caller-supplied base directory.
pub const DB_DIR_NAME: &str = "brave_sync_db";

/// Where the store keeps its entries.
enum Backing {
    /// Persistent engine under `<base>/brave_sync_db`.
    Disk(PathBuf),
    /// Ephemeral engine; entries do not survive `close`.
    Memory,
}

/// Lifecycle state of the engine handle.
enum StoreState {
    /// No handle; the next operation opens one.
    Closed,
    /// Live handle, owned exclusively.
    Open(Box<dyn KvEngine>),
    /// The last open attempt failed. Retried on next access.
    Unavailable,
}

/// The store core. All methods run on the sequencing worker.
pub(crate) struct MapInner {
    backing: Backing,
    state: StoreState,
    api_version: String,
}

impl MapInner {
    /// Creates a store backed by `<base_dir>/brave_sync_db` on disk.
    ///
    /// The engine is not opened until the first operation needs it.
    pub(crate) fn new(base_dir: PathBuf) -> Self {
        Self {
            backing: Backing::Disk(base_dir),
            state: StoreState::Closed,
            api_version: String::new(),
        }
    }

    /// Creates an ephemeral in-memory store.
    pub(crate) fn in_memory() -> Self {
        Self {
            backing: Backing::Memory,
            state: StoreState::Closed,
            api_version: String::new(),
        }
    }

    /// Sets the store-wide API version stamped into every mapping record.
    ///
    /// One-time initialization: an empty value or a second call fails and
    /// leaves the previous value in place.
    pub(crate) fn set_api_version(&mut self, api_version: &str) -> bool {
        if api_version.is_empty() {
            error!("refusing to set an empty api version");
            return false;
        }
        if !self.api_version.is_empty() {
            error!(current = %self.api_version, "api version is already set");
            return false;
        }
        self.api_version = api_version.to_string();
        true
    }

    /// Ensures the engine is open, opening it on demand.
    fn engine_mut(&mut self) -> MapResult<&mut dyn KvEngine> {
        if !matches!(self.state, StoreState::Open(_)) {
            let engine = self.open_engine()?;
            self.state = StoreState::Open(engine);
        }
        match &mut self.state {
            StoreState::Open(engine) => Ok(engine.as_mut()),
            _ => Err(MapError::StoreUnavailable),
        }
    }

    fn open_engine(&mut self) -> MapResult<Box<dyn KvEngine>> {
        let opened = match &self.backing {
            Backing::Disk(base) => {
                let dir = base.join(DB_DIR_NAME);
                FileEngine::open(&dir, &EngineOptions::new())
                    .map(|engine| Box::new(engine) as Box<dyn KvEngine>)
            }
            Backing::Memory => Ok(Box::new(MemoryEngine::new()) as Box<dyn KvEngine>),
        };
        match opened {
            Ok(engine) => Ok(engine),
            Err(e) => {
                error!(error = %e, "store engine open failed");
                self.state = StoreState::Unavailable;
                Err(MapError::StoreUnavailable)
            }
        }
    }

    /// Reads the raw string value under a key, or `""` when absent or the
    /// store is unavailable.
    fn get_raw_value(&mut self, key: &str) -> String {
        let engine = match self.engine_mut() {
            Ok(engine) => engine,
            Err(_) => return String::new(),
        };
        match engine.get(key.as_bytes()) {
            Ok(Some(value)) => String::from_utf8_lossy(&value).into_owned(),
            Ok(None) => String::new(),
            Err(e) => {
                error!(key, error = %e, "engine get failed");
                String::new()
            }
        }
    }

    /// Writes `value` under `key` and, for a non-empty `object_id`, the
    /// reverse entry `object_id -> key`.
    ///
    /// The dual write is not transactional: if the reverse write fails the
    /// forward write stays in place and the whole operation reports failure.
    fn save_raw(&mut self, key: &str, value: &str, object_id: &str) -> MapResult<()> {
        let engine = self.engine_mut()?;
        engine.put(key.as_bytes(), value.as_bytes())?;
        if !object_id.is_empty() {
            engine.put(object_id.as_bytes(), key.as_bytes())?;
        }
        Ok(())
    }

    /// Fetches and decodes the mapping record for a local id.
    ///
    /// Absent and undecodable records both come back as `None`; the store's
    /// lookup API does not distinguish the two.
    fn get_parsed_by_local_id(
        &mut self,
        category: Category,
        local_id: &str,
    ) -> Option<MappingRecord> {
        let raw_key = compose_raw_key(category, local_id);
        let json = self.get_raw_value(&raw_key);
        if json.is_empty() {
            return None;
        }
        match MappingRecord::from_json(&json) {
            Ok(record) => Some(record),
            Err(e) => {
                error!(key = %raw_key, error = %e, "stored mapping record is undecodable");
                None
            }
        }
    }

    pub(crate) fn get_local_id_by_object_id(
        &mut self,
        category: Category,
        object_id: &str,
    ) -> String {
        let raw_key = self.get_raw_value(object_id);
        if raw_key.is_empty() {
            return String::new();
        }
        let (local_id, stored_category) = split_raw_key(&raw_key);
        if stored_category != category {
            // Inconsistency between the reverse entry and the caller's
            // expectation; reported, and the value is still returned
            warn!(
                requested = %category,
                stored = %stored_category,
                object_id,
                "reverse entry category mismatch"
            );
        }
        local_id
    }

    pub(crate) fn get_object_id_by_local_id(
        &mut self,
        category: Category,
        local_id: &str,
    ) -> String {
        self.get_parsed_by_local_id(category, local_id)
            .map(|record| record.object_id)
            .unwrap_or_default()
    }

    pub(crate) fn get_order_by_local_id(&mut self, category: Category, local_id: &str) -> String {
        self.get_parsed_by_local_id(category, local_id)
            .and_then(|record| record.order)
            .unwrap_or_default()
    }

    pub(crate) fn get_order_by_object_id(&mut self, category: Category, object_id: &str) -> String {
        let local_id = self.get_local_id_by_object_id(category, object_id);
        let Some(record) = self.get_parsed_by_local_id(category, &local_id) else {
            return String::new();
        };
        if record.object_id != object_id {
            warn!(
                object_id,
                stored = %record.object_id,
                "forward record disagrees with reverse entry"
            );
        }
        record.order.unwrap_or_default()
    }

    /// Independent per-id lookups; input order preserved, missing ids map
    /// to the empty string. Not a bulk read.
    pub(crate) fn get_orders_by_local_ids(
        &mut self,
        category: Category,
        local_ids: &[String],
    ) -> Vec<String> {
        local_ids
            .iter()
            .map(|local_id| self.get_order_by_local_id(category, local_id))
            .collect()
    }

    pub(crate) fn save_object_id(
        &mut self,
        category: Category,
        local_id: &str,
        object_id: &str,
    ) -> bool {
        self.try_save(category, local_id, object_id, None)
    }

    pub(crate) fn save_object_id_and_order(
        &mut self,
        category: Category,
        local_id: &str,
        object_id: &str,
        order: &str,
    ) -> bool {
        self.try_save(category, local_id, object_id, Some(order))
    }

    fn try_save(
        &mut self,
        category: Category,
        local_id: &str,
        object_id: &str,
        order: Option<&str>,
    ) -> bool {
        let result = (|| -> MapResult<()> {
            if self.api_version.is_empty() {
                return Err(MapError::ApiVersionUnset);
            }
            let api_version = self.api_version.clone();
            let record = match order {
                Some(order) => MappingRecord::with_order(object_id, order, api_version),
                None => MappingRecord::new(object_id, api_version),
            };
            let raw_key = compose_raw_key(category, local_id);
            self.save_raw(&raw_key, &record.to_json()?, object_id)
        })();
        match result {
            Ok(()) => true,
            Err(e) => {
                error!(%category, local_id, error = %e, "mapping write failed");
                false
            }
        }
    }

    /// Rewrites the order of an existing record.
    ///
    /// Fails without touching the store when the record is absent or holds
    /// an empty object id.
    pub(crate) fn update_order(
        &mut self,
        category: Category,
        local_id: &str,
        new_order: &str,
    ) -> bool {
        let Some(existing) = self.get_parsed_by_local_id(category, local_id) else {
            return false;
        };
        if existing.object_id.is_empty() {
            return false;
        }
        self.save_object_id_and_order(category, local_id, &existing.object_id, new_order)
    }

    /// Deletes the forward entry and, when a non-empty object id was
    /// stored, the matching reverse entry.
    ///
    /// A missing forward entry is a no-op success. A reverse delete failure
    /// after a successful forward delete reports overall failure without
    /// recreating the forward entry.
    pub(crate) fn delete_by_local_id(&mut self, category: Category, local_id: &str) -> bool {
        let raw_key = compose_raw_key(category, local_id);
        let object_id = self
            .get_parsed_by_local_id(category, local_id)
            .map(|record| record.object_id)
            .unwrap_or_default();

        let engine = match self.engine_mut() {
            Ok(engine) => engine,
            Err(_) => return false,
        };
        if let Err(e) = engine.delete(raw_key.as_bytes()) {
            error!(key = %raw_key, error = %e, "forward delete failed");
            return false;
        }
        if !object_id.is_empty() {
            if let Err(e) = engine.delete(object_id.as_bytes()) {
                error!(%object_id, error = %e, "reverse delete failed");
                return false;
            }
        }
        true
    }

    /// Raw passthrough read for records outside the standard schema.
    pub(crate) fn get_special_record(&mut self, local_id: &str) -> String {
        self.get_raw_value(local_id)
    }

    /// Raw passthrough write for records outside the standard schema.
    pub(crate) fn save_special_record(&mut self, local_id: &str, json: &str) -> bool {
        match self.save_raw(local_id, json, "") {
            Ok(()) => true,
            Err(e) => {
                error!(local_id, error = %e, "special record write failed");
                false
            }
        }
    }

    /// Applies `operation` to the `(category, action)` pending set and
    /// returns the resulting set.
    ///
    /// `DeleteItems` with [`actions::DELETE_RECORD`] also purges the
    /// mapping record of every id actually removed. A failed persist
    /// returns the empty set.
    ///
    /// # Panics
    ///
    /// Panics for [`Category::Unset`]; pending sets exist only for concrete
    /// record categories.
    pub(crate) fn save_get_delete_not_synced(
        &mut self,
        category: Category,
        action: i32,
        local_ids: &BTreeSet<String>,
        operation: NotSyncedOperation,
    ) -> BTreeSet<String> {
        let key = not_synced_key(category, action);
        let mut existing = deserialize_set(&self.get_raw_value(&key));

        match operation {
            NotSyncedOperation::GetItems => return existing,
            NotSyncedOperation::AddItems => {
                existing.extend(local_ids.iter().cloned());
            }
            NotSyncedOperation::DeleteItems => {
                let purge_mappings = action == actions::DELETE_RECORD;
                for local_id in local_ids {
                    let removed = existing.remove(local_id);
                    if removed && purge_mappings && !self.delete_by_local_id(category, local_id) {
                        warn!(%local_id, "mapping purge failed during full delete");
                    }
                }
            }
        }

        let json = serialize_set(&existing);
        match self.save_raw(&key, &json, "") {
            Ok(()) => existing,
            Err(e) => {
                error!(%key, error = %e, "pending set write failed");
                BTreeSet::new()
            }
        }
    }

    /// Deletes a single raw key without decoding or validation.
    pub(crate) fn reset_key(&mut self, key: &str) {
        let engine = match self.engine_mut() {
            Ok(engine) => engine,
            Err(_) => return,
        };
        if let Err(e) = engine.delete(key.as_bytes()) {
            error!(key, error = %e, "reset delete failed");
        }
    }

    /// Releases the engine handle. The next operation reopens lazily.
    pub(crate) fn close_handle(&mut self) {
        self.state = StoreState::Closed;
    }

    /// Closes the handle and deletes all on-disk state.
    ///
    /// Safe to call when the store was never opened. The store may be
    /// reopened fresh by the next operation.
    pub(crate) fn destroy(&mut self) {
        self.close_handle();
        if let Backing::Disk(base) = &self.backing {
            let dir = base.join(DB_DIR_NAME);
            if let Err(e) = FileEngine::destroy(&dir) {
                error!(dir = %dir.display(), error = %e, "store destroy failed");
            }
        }
    }

    /// Full-scan diagnostic snapshot of the store as string pairs.
    ///
    /// Each pair is also logged at `debug` level. Not part of the core
    /// contract; keep off hot paths.
    pub(crate) fn dump_all(&mut self) -> Vec<(String, String)> {
        let engine = match self.engine_mut() {
            Ok(engine) => engine,
            Err(_) => return Vec::new(),
        };
        let entries = match engine.scan() {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "engine scan failed");
                return Vec::new();
            }
        };
        entries
            .into_iter()
            .map(|(key, value)| {
                let key = String::from_utf8_lossy(&key).into_owned();
                let value = String::from_utf8_lossy(&value).into_owned();
                debug!(%key, %value, "store entry");
                (key, value)
            })
            .collect()
    }
}
