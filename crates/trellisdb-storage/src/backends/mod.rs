//! Storage backend implementations.
//!
//! # Available Backends
//!
//! - [`redb`] - Pure-Rust embedded B-tree store with atomic transactions;
//!   keeps every region sorted by key bytes, which is exactly the contract
//!   the index populator needs

pub mod redb;

pub use self::redb::{RedbConfig, RedbCursor, RedbEngine, RedbTransaction};
