//! `TrellisDB` Storage
//!
//! This crate provides the storage seam the index population machinery
//! writes through, plus the redb-backed implementation used by builds and
//! tests.
//!
//! # Overview
//!
//! An index build owns one or more *regions*: named keyspaces kept
//! permanently sorted by key bytes. The populator inserts encoded index
//! keys in batches, scans a region in key order to verify uniqueness
//! constraints, and drops the region wholesale when a build is abandoned.
//! Everything else a general storage layer might offer (schemas, secondary
//! structures, write-ahead logging) is out of scope here.
//!
//! # Core Traits
//!
//! - [`StorageEngine`] - The entry point for opening transactions
//! - [`Transaction`] - Atomic read/write access to regions
//! - [`Cursor`] - Ordered iteration over a region's keys
//!
//! # Example
//!
//! ```ignore
//! use trellisdb_storage::{StorageEngine, Transaction};
//! use trellisdb_storage::backends::RedbEngine;
//!
//! let engine = RedbEngine::in_memory()?;
//!
//! let mut tx = engine.begin_write()?;
//! tx.put("index-7", b"key-a", &[])?;
//! tx.put("index-7", b"key-b", &[])?;
//! tx.commit()?;
//!
//! let tx = engine.begin_read()?;
//! let mut cursor = tx.scan("index-7")?;
//! while let Some((key, _)) = cursor.next()? {
//!     // Keys arrive in sorted order
//! }
//! ```
//!
//! # Modules
//!
//! - [`engine`] - Storage traits and error types
//! - [`backends`] - Concrete backend implementations

pub mod backends;
pub mod engine;

pub use engine::{
    Cursor, CursorResult, KeyValue, StorageEngine, StorageError, StorageResult, Transaction,
};
