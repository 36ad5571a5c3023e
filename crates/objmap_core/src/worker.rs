//! Sequencing worker and the public store handle.
//!
//! All engine access is confined to one dedicated worker thread that owns
//! the [`MapInner`] exclusively. The [`ObjectMap`] handle enqueues boxed
//! tasks over an mpsc channel; tasks run strictly in submission order, so:
//!
//! - no two store operations ever interleave at the engine layer
//! - a caller that enqueues a write and then a read observes its own write
//! - cross-caller ordering is only FIFO relative to enqueue time
//!
//! Each request hands back a [`Reply`] carrying the result once the task
//! has run. There is no cancellation: an enqueued task always runs; a
//! caller that loses interest just drops the `Reply`.

use crate::category::Category;
use crate::map::MapInner;
use crate::not_synced::NotSyncedOperation;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::debug;

/// A task bound for the worker thread.
type Task = Box<dyn FnOnce(&mut MapInner) + Send + 'static>;

enum Command {
    Run(Task),
    Shutdown,
}

/// The pending result of a store operation.
///
/// Produced by every [`ObjectMap`] method; resolves once the worker has run
/// the operation. Dropping a `Reply` discards the result but not the
/// operation itself.
#[derive(Debug)]
pub struct Reply<T> {
    rx: Receiver<T>,
}

impl<T> Reply<T> {
    /// Blocks until the result is available.
    ///
    /// Returns `None` if the store was shut down before the operation ran.
    pub fn wait(self) -> Option<T> {
        self.rx.recv().ok()
    }
}

/// Asynchronous handle to the object mapping store.
///
/// The handle is cheap to use from any thread; every method posts a task to
/// the store's sequencing worker and returns a [`Reply`]. Dropping the last
/// handle drains the queue, releases the engine handle, and joins the
/// worker, so no task ever observes a half-closed store.
///
/// The map works in two directions:
///
/// 1. local id => {object id, order, api version}
/// 2. object id => local id
pub struct ObjectMap {
    tx: Sender<Command>,
    worker: Option<thread::JoinHandle<()>>,
}

impl ObjectMap {
    /// Creates a store persisted under `<base_dir>/brave_sync_db`.
    ///
    /// The engine directory is opened lazily by the first operation.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::spawn(MapInner::new(base_dir.into()))
    }

    /// Creates an ephemeral in-memory store for tests and previews.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::spawn(MapInner::in_memory())
    }

    fn spawn(mut inner: MapInner) -> Self {
        let (tx, rx) = mpsc::channel::<Command>();
        let worker = thread::Builder::new()
            .name("objmap-store".into())
            .spawn(move || {
                while let Ok(command) = rx.recv() {
                    match command {
                        Command::Run(task) => task(&mut inner),
                        Command::Shutdown => break,
                    }
                }
                debug!("store worker exiting");
            })
            .expect("failed to spawn store worker thread");
        Self {
            tx,
            worker: Some(worker),
        }
    }

    /// Posts a task and returns the pending result.
    fn post<T, F>(&self, f: F) -> Reply<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut MapInner) -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let task: Task = Box::new(move |inner| {
            // The caller may have dropped the Reply; that is fine
            let _ = tx.send(f(inner));
        });
        let _ = self.tx.send(Command::Run(task));
        Reply { rx }
    }

    /// Sets the store-wide API version stamped into mapping records.
    ///
    /// One-time initialization; resolves to `false` when called twice or
    /// with an empty value.
    pub fn set_api_version(&self, api_version: &str) -> Reply<bool> {
        let api_version = api_version.to_string();
        self.post(move |inner| inner.set_api_version(&api_version))
    }

    /// Resolves the local id mapped back from a global object id.
    ///
    /// Resolves to `""` when the object id is unknown or the store is
    /// unavailable. A category mismatch between the stored entry and
    /// `category` is logged and the stored value still returned.
    pub fn get_local_id_by_object_id(&self, category: Category, object_id: &str) -> Reply<String> {
        let object_id = object_id.to_string();
        self.post(move |inner| inner.get_local_id_by_object_id(category, &object_id))
    }

    /// Resolves the object id mapped from a local id, or `""`.
    pub fn get_object_id_by_local_id(&self, category: Category, local_id: &str) -> Reply<String> {
        let local_id = local_id.to_string();
        self.post(move |inner| inner.get_object_id_by_local_id(category, &local_id))
    }

    /// Reads the order of the record mapped from a global object id.
    pub fn get_order_by_object_id(&self, category: Category, object_id: &str) -> Reply<String> {
        let object_id = object_id.to_string();
        self.post(move |inner| inner.get_order_by_object_id(category, &object_id))
    }

    /// Reads the order of the record under a local id, or `""`.
    pub fn get_order_by_local_id(&self, category: Category, local_id: &str) -> Reply<String> {
        let local_id = local_id.to_string();
        self.post(move |inner| inner.get_order_by_local_id(category, &local_id))
    }

    /// Reads the orders for several local ids in one request.
    ///
    /// Input order is preserved and missing records map to `""`. This is a
    /// sequence of independent lookups, not an atomic bulk read.
    pub fn get_orders_by_local_ids(
        &self,
        category: Category,
        local_ids: Vec<String>,
    ) -> Reply<Vec<String>> {
        self.post(move |inner| inner.get_orders_by_local_ids(category, &local_ids))
    }

    /// Reads a raw record stored outside the standard schema, or `""`.
    pub fn get_special_record_by_local_id(&self, local_id: &str) -> Reply<String> {
        let local_id = local_id.to_string();
        self.post(move |inner| inner.get_special_record(&local_id))
    }

    /// Writes a raw record outside the standard schema.
    pub fn save_special_record(&self, local_id: &str, json: &str) -> Reply<bool> {
        let local_id = local_id.to_string();
        let json = json.to_string();
        self.post(move |inner| inner.save_special_record(&local_id, &json))
    }

    /// Maps a local id to an object id, without an order.
    ///
    /// Resolves to `false` when the API version is unset or a write fails.
    pub fn save_object_id(
        &self,
        category: Category,
        local_id: &str,
        object_id: &str,
    ) -> Reply<bool> {
        let local_id = local_id.to_string();
        let object_id = object_id.to_string();
        self.post(move |inner| inner.save_object_id(category, &local_id, &object_id))
    }

    /// Maps a local id to an object id with an order.
    ///
    /// Writes the forward record and the reverse entry as one logical
    /// operation (non-transactional; a reverse failure leaves the forward
    /// write in place and resolves to `false`).
    pub fn save_object_id_and_order(
        &self,
        category: Category,
        local_id: &str,
        object_id: &str,
        order: &str,
    ) -> Reply<bool> {
        let local_id = local_id.to_string();
        let object_id = object_id.to_string();
        let order = order.to_string();
        self.post(move |inner| {
            inner.save_object_id_and_order(category, &local_id, &object_id, &order)
        })
    }

    /// Assigns the initial order of a record.
    ///
    /// Equivalent to [`save_object_id_and_order`](Self::save_object_id_and_order);
    /// kept as a separate entry point for caller compatibility.
    // TODO: fold into save_object_id_and_order once callers agree on one name
    pub fn create_order(
        &self,
        category: Category,
        local_id: &str,
        object_id: &str,
        order: &str,
    ) -> Reply<bool> {
        self.save_object_id_and_order(category, local_id, object_id, order)
    }

    /// Rewrites the order of an existing record.
    ///
    /// Resolves to `false`, leaving the store untouched, when no record
    /// exists for `local_id` or it carries an empty object id.
    pub fn update_order(
        &self,
        category: Category,
        local_id: &str,
        new_order: &str,
    ) -> Reply<bool> {
        let local_id = local_id.to_string();
        let new_order = new_order.to_string();
        self.post(move |inner| inner.update_order(category, &local_id, &new_order))
    }

    /// Deletes the forward mapping and its reverse entry.
    ///
    /// A missing record resolves to `true` (no-op delete).
    pub fn delete_by_local_id(&self, category: Category, local_id: &str) -> Reply<bool> {
        let local_id = local_id.to_string();
        self.post(move |inner| inner.delete_by_local_id(category, &local_id))
    }

    /// Applies an operation to the `(category, action)` pending set and
    /// resolves to the resulting set.
    ///
    /// See [`NotSyncedOperation`] for the operations;
    /// [`actions::DELETE_RECORD`](crate::actions::DELETE_RECORD) combined
    /// with [`NotSyncedOperation::DeleteItems`] also purges the mapping
    /// records of the ids actually removed.
    ///
    /// The task panics (on the worker) for [`Category::Unset`].
    pub fn save_get_delete_not_synced_records(
        &self,
        category: Category,
        action: i32,
        local_ids: BTreeSet<String>,
        operation: NotSyncedOperation,
    ) -> Reply<BTreeSet<String>> {
        self.post(move |inner| {
            inner.save_get_delete_not_synced(category, action, &local_ids, operation)
        })
    }

    /// Deletes a single raw key without decoding or validation.
    ///
    /// An escape hatch for callers that need surgical removal.
    pub fn reset_key(&self, key: &str) -> Reply<()> {
        let key = key.to_string();
        self.post(move |inner| inner.reset_key(&key))
    }

    /// Schedules release of the engine handle.
    ///
    /// Operations posted after `close` reopen the store lazily.
    pub fn close(&self) -> Reply<()> {
        self.post(MapInner::close_handle)
    }

    /// Closes the store and permanently deletes its on-disk state.
    ///
    /// Runs after every previously posted operation. Safe when the store
    /// was never opened; the next operation reopens a fresh store.
    pub fn destroy_db(&self) -> Reply<()> {
        self.post(MapInner::destroy)
    }

    /// Diagnostic full-scan snapshot of the store as string pairs.
    ///
    /// Also logged at `debug` level. Not intended for hot paths.
    pub fn dump_all(&self) -> Reply<Vec<(String, String)>> {
        self.post(MapInner::dump_all)
    }
}

impl Drop for ObjectMap {
    fn drop(&mut self) {
        // The shutdown command queues behind every posted task, so the
        // engine handle is released only after all in-flight work ran
        let _ = self.tx.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
