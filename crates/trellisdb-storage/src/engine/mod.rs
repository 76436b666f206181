//! Storage engine traits and abstractions.
//!
//! This module defines the traits storage backends must implement:
//!
//! - [`StorageEngine`] - Entry point for opening transactions
//! - [`Transaction`] - Atomic read/write access to named regions
//! - [`Cursor`] - Ordered iteration over a region's keys
//!
//! All operations return [`StorageResult<T>`], an alias for
//! `Result<T, StorageError>`.

mod error;
mod traits;

pub use error::{StorageError, StorageResult};
pub use traits::{Cursor, CursorResult, KeyValue, StorageEngine, Transaction};
