//! Redb transaction and cursor implementation.
//!
//! # Memory-Efficient Cursors
//!
//! Cursors stream a region in batches instead of materializing whole tables:
//! each batch re-opens the table, reads up to [`DEFAULT_BATCH_SIZE`] entries
//! past the last key seen, and the cursor drains the batch before fetching
//! the next one. Verification scans over billion-entry regions therefore
//! hold only one batch in memory at a time.

use std::collections::VecDeque;
use std::ops::Bound;

use redb::{ReadTransaction, ReadableTable, TableDefinition, WriteTransaction};

use crate::engine::{Cursor, CursorResult, KeyValue, StorageError, Transaction};

/// Number of entries fetched per cursor batch.
const DEFAULT_BATCH_SIZE: usize = 1000;

fn region_table(region: &str) -> TableDefinition<'_, &'static [u8], &'static [u8]> {
    TableDefinition::new(region)
}

/// A transaction for the redb storage engine.
///
/// Wraps both read-only and read-write redb transactions behind the
/// [`Transaction`] trait.
///
/// Note: `large_enum_variant` is allowed because boxing the write
/// transaction would add indirection on every batch insert, and
/// transactions are short-lived.
#[allow(clippy::large_enum_variant)]
pub enum RedbTransaction {
    /// A read-only transaction.
    Read(ReadTransaction),
    /// A read-write transaction.
    Write(WriteTransaction),
}

impl RedbTransaction {
    /// Create a new read-only transaction.
    pub const fn new_read(tx: ReadTransaction) -> Self {
        Self::Read(tx)
    }

    /// Create a new read-write transaction.
    pub const fn new_write(tx: WriteTransaction) -> Self {
        Self::Write(tx)
    }

    /// Read a batch of entries from `region`, starting at `start` and
    /// stopping before `end`, at most `limit` entries.
    ///
    /// A region whose table was never created reads as empty.
    fn read_batch(
        &self,
        region: &str,
        start: Bound<&[u8]>,
        end: Bound<&[u8]>,
        limit: usize,
    ) -> Result<Vec<KeyValue>, StorageError> {
        let def = region_table(region);
        let mut batch = Vec::new();

        macro_rules! drain_range {
            ($table:expr) => {{
                let range = $table
                    .range::<&[u8]>((start, end))
                    .map_err(|e| StorageError::Internal(e.to_string()))?;
                for entry in range.take(limit) {
                    let (key, value) = entry.map_err(|e| StorageError::Internal(e.to_string()))?;
                    batch.push((key.value().to_vec(), value.value().to_vec()));
                }
            }};
        }

        match self {
            Self::Read(tx) => match tx.open_table(def) {
                Ok(table) => drain_range!(table),
                Err(redb::TableError::TableDoesNotExist(_)) => {}
                Err(e) => return Err(StorageError::Internal(e.to_string())),
            },
            Self::Write(tx) => match tx.open_table(def) {
                Ok(table) => drain_range!(table),
                Err(e) => return Err(StorageError::Internal(e.to_string())),
            },
        }

        Ok(batch)
    }
}

impl Transaction for RedbTransaction {
    type Cursor<'a>
        = RedbCursor<'a>
    where
        Self: 'a;

    fn get(&self, region: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let def = region_table(region);

        macro_rules! get_from {
            ($table:expr) => {
                match $table.get(key) {
                    Ok(Some(value)) => Ok(Some(value.value().to_vec())),
                    Ok(None) => Ok(None),
                    Err(e) => Err(StorageError::Internal(e.to_string())),
                }
            };
        }

        match self {
            Self::Read(tx) => match tx.open_table(def) {
                Ok(table) => get_from!(table),
                // A region that was never written reads as empty
                Err(redb::TableError::TableDoesNotExist(_)) => Ok(None),
                Err(e) => Err(StorageError::Internal(e.to_string())),
            },
            Self::Write(tx) => match tx.open_table(def) {
                Ok(table) => get_from!(table),
                Err(e) => Err(StorageError::Internal(e.to_string())),
            },
        }
    }

    fn put(&mut self, region: &str, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        match self {
            Self::Read(_) => Err(StorageError::ReadOnly),
            Self::Write(tx) => {
                let mut table = tx
                    .open_table(region_table(region))
                    .map_err(|e| StorageError::Internal(e.to_string()))?;
                table.insert(key, value).map_err(|e| StorageError::Internal(e.to_string()))?;
                Ok(())
            }
        }
    }

    fn delete(&mut self, region: &str, key: &[u8]) -> Result<bool, StorageError> {
        match self {
            Self::Read(_) => Err(StorageError::ReadOnly),
            Self::Write(tx) => match tx.open_table(region_table(region)) {
                Ok(mut table) => match table.remove(key) {
                    Ok(removed) => Ok(removed.is_some()),
                    Err(e) => Err(StorageError::Internal(e.to_string())),
                },
                Err(e) => Err(StorageError::Internal(e.to_string())),
            },
        }
    }

    fn drop_region(&mut self, region: &str) -> Result<bool, StorageError> {
        match self {
            Self::Read(_) => Err(StorageError::ReadOnly),
            Self::Write(tx) => tx
                .delete_table(region_table(region))
                .map_err(|e| StorageError::Internal(e.to_string())),
        }
    }

    fn scan(&self, region: &str) -> Result<Self::Cursor<'_>, StorageError> {
        Ok(RedbCursor::new(self, region.to_owned(), Bound::Unbounded, Bound::Unbounded))
    }

    fn range(
        &self,
        region: &str,
        start: Bound<&[u8]>,
        end: Bound<&[u8]>,
    ) -> Result<Self::Cursor<'_>, StorageError> {
        let start = start.map(<[u8]>::to_vec);
        let end = end.map(<[u8]>::to_vec);
        Ok(RedbCursor::new(self, region.to_owned(), start, end))
    }

    fn commit(self) -> Result<(), StorageError> {
        match self {
            // Read transactions don't need an explicit commit
            Self::Read(_) => Ok(()),
            Self::Write(tx) => tx.commit().map_err(|e| StorageError::Transaction(e.to_string())),
        }
    }

    fn rollback(self) -> Result<(), StorageError> {
        match self {
            Self::Read(_) => Ok(()),
            Self::Write(tx) => {
                // Ignore the abort result; the transaction is discarded anyway
                drop(tx.abort());
                Ok(())
            }
        }
    }

    fn is_read_only(&self) -> bool {
        matches!(self, Self::Read(_))
    }
}

/// Batched streaming cursor over one region.
pub struct RedbCursor<'t> {
    tx: &'t RedbTransaction,
    region: String,
    /// Lower bound the cursor was created with; `seek` never goes below it.
    start: Bound<Vec<u8>>,
    /// Upper bound the cursor was created with.
    end: Bound<Vec<u8>>,
    /// Lower bound of the next batch fetch; advances past returned keys.
    next_start: Bound<Vec<u8>>,
    buffer: VecDeque<KeyValue>,
    exhausted: bool,
}

impl<'t> RedbCursor<'t> {
    fn new(
        tx: &'t RedbTransaction,
        region: String,
        start: Bound<Vec<u8>>,
        end: Bound<Vec<u8>>,
    ) -> Self {
        Self {
            tx,
            region,
            next_start: start.clone(),
            start,
            end,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    fn fetch_batch(&mut self) -> Result<(), StorageError> {
        let start = self.next_start.as_ref().map(Vec::as_slice);
        let end = self.end.as_ref().map(Vec::as_slice);
        let batch = self.tx.read_batch(&self.region, start, end, DEFAULT_BATCH_SIZE)?;

        if batch.len() < DEFAULT_BATCH_SIZE {
            self.exhausted = true;
        }
        if let Some((last_key, _)) = batch.last() {
            self.next_start = Bound::Excluded(last_key.clone());
        }
        self.buffer = batch.into();
        Ok(())
    }
}

impl Cursor for RedbCursor<'_> {
    fn seek(&mut self, key: &[u8]) -> CursorResult {
        // Clamp to the cursor's original lower bound
        let target = match &self.start {
            Bound::Included(s) if key < s.as_slice() => self.start.clone(),
            Bound::Excluded(s) if key <= s.as_slice() => self.start.clone(),
            _ => Bound::Included(key.to_vec()),
        };
        self.next_start = target;
        self.buffer.clear();
        self.exhausted = false;
        self.next()
    }

    fn next(&mut self) -> CursorResult {
        if self.buffer.is_empty() {
            if self.exhausted {
                return Ok(None);
            }
            self.fetch_batch()?;
        }
        Ok(self.buffer.pop_front())
    }
}
