//! Redb storage backend.
//!
//! Each region maps to one redb table, so dropping an abandoned index build
//! is a single table delete rather than a range scan.

mod engine;
mod transaction;

pub use engine::{RedbConfig, RedbEngine};
pub use transaction::{RedbCursor, RedbTransaction};
