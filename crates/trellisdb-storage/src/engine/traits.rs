//! Core storage traits.
//!
//! The index populator consumes storage through these traits: transactional
//! key insertion into named regions, ordered scans for verification, and
//! whole-region drop for abandoned builds. Backends must keep each region
//! permanently sorted by key bytes — the key codecs guarantee that byte
//! order equals domain order, so no comparator is ever injected.

use std::ops::Bound;
use std::sync::Arc;

use super::StorageError;

/// A key-value pair returned by cursor operations.
pub type KeyValue = (Vec<u8>, Vec<u8>);

/// Result type for cursor operations that return a key-value pair.
pub type CursorResult = Result<Option<KeyValue>, StorageError>;

/// A storage engine that provides transactional access to sorted regions.
///
/// Implementations must be thread-safe (`Send + Sync`); independent index
/// builds may run concurrently against the same engine, each writing into
/// its own regions.
pub trait StorageEngine: Send + Sync {
    /// The transaction type for this engine.
    type Transaction<'a>: Transaction
    where
        Self: 'a;

    /// Begin a read-only transaction.
    ///
    /// Read transactions see a consistent snapshot; multiple may run
    /// concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Transaction`] if the transaction cannot be
    /// started.
    fn begin_read(&self) -> Result<Self::Transaction<'_>, StorageError>;

    /// Begin a read-write transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Transaction`] if the transaction cannot be
    /// started.
    fn begin_write(&self) -> Result<Self::Transaction<'_>, StorageError>;

    /// Flush buffered data to durable storage.
    ///
    /// Called once when an index build closes successfully. The default
    /// implementation does nothing, for backends that are durable on commit.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the flush fails.
    fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// An atomic unit of region reads and writes.
///
/// Write transactions must be explicitly committed; dropping one without
/// committing rolls its changes back. A region that has never been written
/// behaves as empty — reading it is not an error.
pub trait Transaction {
    /// The cursor type for iteration.
    type Cursor<'a>: Cursor
    where
        Self: 'a;

    /// Get a value by key from a region.
    ///
    /// Returns `Ok(None)` if the key (or the whole region) does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Internal`] if the read fails.
    fn get(&self, region: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;

    /// Put a key-value pair into a region, creating the region on first
    /// write. An existing key has its value replaced, so re-inserting the
    /// same index key is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadOnly`] on a read-only transaction, or
    /// [`StorageError::Internal`] if the write fails.
    fn put(&mut self, region: &str, key: &[u8], value: &[u8]) -> Result<(), StorageError>;

    /// Delete a key from a region.
    ///
    /// Returns `Ok(true)` if the key existed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadOnly`] on a read-only transaction, or
    /// [`StorageError::Internal`] if the delete fails.
    fn delete(&mut self, region: &str, key: &[u8]) -> Result<bool, StorageError>;

    /// Drop a region and everything in it.
    ///
    /// Returns `Ok(true)` if the region existed. Used when an index build is
    /// abandoned or restarted.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ReadOnly`] on a read-only transaction, or
    /// [`StorageError::Internal`] if the drop fails.
    fn drop_region(&mut self, region: &str) -> Result<bool, StorageError>;

    /// Create a cursor over all keys in a region, in sorted order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Internal`] if the cursor cannot be created.
    fn scan(&self, region: &str) -> Result<Self::Cursor<'_>, StorageError>;

    /// Create a cursor over a key range in a region, in sorted order.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Internal`] if the cursor cannot be created.
    fn range(
        &self,
        region: &str,
        start: Bound<&[u8]>,
        end: Bound<&[u8]>,
    ) -> Result<Self::Cursor<'_>, StorageError>;

    /// Commit the transaction, making all changes durable.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Transaction`] if the commit fails.
    fn commit(self) -> Result<(), StorageError>;

    /// Roll back the transaction, discarding all changes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Transaction`] if the rollback fails.
    fn rollback(self) -> Result<(), StorageError>;

    /// Check if this is a read-only transaction.
    fn is_read_only(&self) -> bool;
}

/// A cursor for ordered iteration over a region's key-value pairs.
///
/// # Iteration Pattern
///
/// ```ignore
/// let mut cursor = tx.scan("index-7")?;
/// while let Some((key, value)) = cursor.next()? {
///     // Keys arrive in sorted byte order
/// }
/// ```
pub trait Cursor {
    /// Position at the first key greater than or equal to `key` and return
    /// the pair there, or `None` if no such key exists in the cursor's range.
    fn seek(&mut self, key: &[u8]) -> CursorResult;

    /// Advance to the next key-value pair, or `None` at the end.
    fn next(&mut self) -> CursorResult;
}

// ============================================================================
// Blanket Implementations
// ============================================================================

/// Implement `StorageEngine` for `Arc<E>` to allow shared ownership.
///
/// Populators hold their engine behind an `Arc` so that concurrent builds
/// (and the temporal dispatcher's per-group parts) can share one store.
impl<E: StorageEngine> StorageEngine for Arc<E> {
    type Transaction<'a>
        = E::Transaction<'a>
    where
        Self: 'a;

    fn begin_read(&self) -> Result<Self::Transaction<'_>, StorageError> {
        (**self).begin_read()
    }

    fn begin_write(&self) -> Result<Self::Transaction<'_>, StorageError> {
        (**self).begin_write()
    }

    fn flush(&self) -> Result<(), StorageError> {
        (**self).flush()
    }
}
