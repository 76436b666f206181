//! Region headers: the persisted record guarding index re-opens.
//!
//! Every index region has a header naming the codec that produced its keys,
//! the layout version, and whether the build reached the online state. A
//! re-open that finds a different codec, a different version, or a build
//! that never finished must reject the region and trigger a rebuild.

use serde::{Deserialize, Serialize};
use trellisdb_storage::Transaction;

use crate::error::{IndexError, IndexResult};

/// Version tag of the on-disk key layouts. Bumped whenever any codec's
/// binary layout changes incompatibly.
pub const LAYOUT_VERSION: u8 = 1;

/// Region that holds one header record per index region, keyed by region
/// name.
pub const HEADER_REGION: &str = "__trellis_index_headers";

/// Lifecycle state recorded in a region header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildState {
    /// Population is in progress (or crashed mid-build).
    Building,
    /// The build closed successfully; the region is safe to read.
    Online,
}

/// The persisted header of one index region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexHeader {
    /// Identifier of the codec whose keys fill the region.
    pub codec_id: String,
    /// Layout version the keys were written with.
    pub layout_version: u8,
    /// Whether the build completed.
    pub state: BuildState,
}

impl IndexHeader {
    /// Create a header for a build that is starting.
    #[must_use]
    pub fn building(codec_id: &str) -> Self {
        Self {
            codec_id: codec_id.to_owned(),
            layout_version: LAYOUT_VERSION,
            state: BuildState::Building,
        }
    }

    /// Create a header for a build that closed successfully.
    #[must_use]
    pub fn online(codec_id: &str) -> Self {
        Self {
            codec_id: codec_id.to_owned(),
            layout_version: LAYOUT_VERSION,
            state: BuildState::Online,
        }
    }

    /// Serialize to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::IncompatibleLayout`] if serialization fails.
    pub fn to_bytes(&self) -> IndexResult<Vec<u8>> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| IndexError::IncompatibleLayout(format!("failed to encode header: {e}")))
    }

    /// Deserialize from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::IncompatibleLayout`] if the bytes are not a
    /// valid header record.
    pub fn from_bytes(bytes: &[u8]) -> IndexResult<Self> {
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map(|(header, _)| header)
            .map_err(|e| IndexError::IncompatibleLayout(format!("failed to decode header: {e}")))
    }

    /// Write this header for `region`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Storage`] if the write fails.
    pub fn write<T: Transaction>(&self, tx: &mut T, region: &str) -> IndexResult<()> {
        let bytes = self.to_bytes()?;
        tx.put(HEADER_REGION, region.as_bytes(), &bytes)?;
        Ok(())
    }

    /// Read the header for `region`, if one was ever written.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Storage`] if the read fails, or
    /// [`IndexError::IncompatibleLayout`] if the stored record is malformed.
    pub fn read<T: Transaction>(tx: &T, region: &str) -> IndexResult<Option<Self>> {
        match tx.get(HEADER_REGION, region.as_bytes())? {
            Some(bytes) => Ok(Some(Self::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Remove the header for `region` (when the region is dropped).
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Storage`] if the delete fails.
    pub fn remove<T: Transaction>(tx: &mut T, region: &str) -> IndexResult<()> {
        tx.delete(HEADER_REGION, region.as_bytes())?;
        Ok(())
    }

    /// Check that a region written under this header can be re-opened with
    /// the given codec.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::IncompatibleLayout`] if the codec differs, the
    /// layout version differs, or the build never reached [`BuildState::Online`].
    pub fn check_compatible(&self, codec_id: &str) -> IndexResult<()> {
        if self.codec_id != codec_id {
            return Err(IndexError::IncompatibleLayout(format!(
                "region was written by codec '{}', expected '{codec_id}'",
                self.codec_id
            )));
        }
        if self.layout_version != LAYOUT_VERSION {
            return Err(IndexError::IncompatibleLayout(format!(
                "region has layout version {}, expected {LAYOUT_VERSION}",
                self.layout_version
            )));
        }
        if self.state != BuildState::Online {
            return Err(IndexError::IncompatibleLayout(
                "region build never completed; a rebuild is required".into(),
            ));
        }
        Ok(())
    }
}
