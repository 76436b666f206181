//! Error types for index population.

use thiserror::Error;
use trellisdb_core::EncodingError;
use trellisdb_storage::StorageError;

use crate::populator::PopulatorState;
use crate::verify::UniquenessReport;

/// Errors raised by index population and verification.
///
/// Any error leaves the build unusable: the caller's only recovery is to
/// drop the populator (`close(false)`) and rebuild from scratch.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The underlying store failed. Fatal, never retried internally.
    #[error("storage failure during index population: {0}")]
    Storage(#[from] StorageError),

    /// A value fell outside the domain its codec can represent. Aborts the
    /// whole build; no partial index is persisted.
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    /// Uniqueness verification found values shared by distinct entities.
    /// Reported once, in aggregate, when the build closes.
    #[error("uniqueness constraint violated: {0}")]
    UniquenessViolated(UniquenessReport),

    /// An operation was invoked in a state that does not permit it.
    #[error("cannot {operation} in populator state {state:?}")]
    InvalidState {
        /// State the populator was in.
        state: PopulatorState,
        /// The rejected operation.
        operation: &'static str,
    },

    /// The build was previously marked failed and the operation is not a
    /// drop.
    #[error("index build previously failed: {0}")]
    BuildFailed(String),

    /// A region header names a different codec or layout version, or the
    /// region was never brought online.
    #[error("incompatible index region: {0}")]
    IncompatibleLayout(String),
}

/// Result type for index population operations.
pub type IndexResult<T> = Result<T, IndexError>;
