//! # objmap Storage
//!
//! Ordered key-value engine trait and implementations for objmap.
//!
//! This crate provides the lowest-level storage abstraction for the object
//! mapping store. Engines are **opaque byte stores** - they do not interpret
//! the keys or values they hold.
//!
//! ## Design Principles
//!
//! - Engines are simple ordered byte stores (get, put, delete, scan)
//! - No knowledge of objmap key prefixes or record formats
//! - One exclusive owner per engine handle; no internal sharing
//! - objmap owns all key and value interpretation
//!
//! ## Available Engines
//!
//! - [`MemoryEngine`] - For testing and ephemeral stores
//! - [`FileEngine`] - Persistent, log-structured, with an advisory lock
//!
//! ## Example
//!
//! ```rust
//! use objmap_storage::{KvEngine, MemoryEngine};
//!
//! let mut engine = MemoryEngine::new();
//! engine.put(b"key", b"value").unwrap();
//! assert_eq!(engine.get(b"key").unwrap(), Some(b"value".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod error;
mod file;
mod memory;

pub use engine::{EngineOptions, KvEngine};
pub use error::{StorageError, StorageResult};
pub use file::FileEngine;
pub use memory::MemoryEngine;
