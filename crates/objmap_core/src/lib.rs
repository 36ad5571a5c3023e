//! # objmap Core
//!
//! Persistent object-identity mapping store for sync subsystems.
//!
//! This crate provides [`ObjectMap`], a durable key-value store that works
//! in two directions:
//!
//! 1. local id => {object id, order, api version}
//! 2. object id => local id
//!
//! plus a per-category set of records pending outbound synchronization.
//!
//! ## Architecture
//!
//! All engine access happens on one dedicated sequencing worker. The public
//! [`ObjectMap`] handle can be used from any thread; each call enqueues a
//! task onto the worker and returns a [`Reply`] that delivers the result
//! once the task has run. Tasks run in submission order, so a caller that
//! issues a write followed by a read always observes its own write.
//!
//! ## Key Invariants
//!
//! - Every forward mapping write also writes the matching reverse entry
//! - Raw keys are category-prefixed: `'b'` bookmarks, `'h'` history
//! - Reads are tolerant: a missing or undecodable record yields an empty
//!   result, never a panic across the worker boundary
//! - The engine handle is owned exclusively by the worker
//!
//! ## Example
//!
//! ```no_run
//! use objmap_core::{Category, ObjectMap};
//!
//! let map = ObjectMap::new("/path/to/profile");
//! map.set_api_version("0");
//! map.save_object_id_and_order(Category::Bookmark, "123", "obj-abc", "1.0.1");
//! let order = map.get_order_by_local_id(Category::Bookmark, "123").wait();
//! assert_eq!(order.as_deref(), Some("1.0.1"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod category;
mod error;
mod key;
mod map;
mod not_synced;
mod record;
mod worker;

pub use category::Category;
pub use error::{MapError, MapResult};
pub use key::{compose_raw_key, split_raw_key};
pub use map::DB_DIR_NAME;
pub use not_synced::{actions, NotSyncedOperation};
pub use record::MappingRecord;
pub use worker::{ObjectMap, Reply};
