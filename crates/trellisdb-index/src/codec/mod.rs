//! Key codecs: per value-domain encoding into totally ordered binary keys.
//!
//! A codec turns a property value into a byte string whose lexicographic
//! order equals the domain's natural order. The populator core is generic
//! over the codec, so every index shape — number, string, one temporal
//! group, composite/spatial — runs the same state machine over a different
//! static key layout, with no runtime dispatch on the hot path.
//!
//! # Key shape
//!
//! The storage key of one index entry is the codec's value bytes followed by
//! the big-endian entity id ([`IndexKey::storage_key`]). Tree order is
//! therefore (value, entity): runs of equal values are adjacent, sorted by
//! entity — exactly what uniqueness verification scans for.
//!
//! # Codecs
//!
//! - [`NumberCodec`] - `Int` and `Float` in one numeric order
//! - [`StringCodec`] - UTF-8 strings
//! - [`TemporalCodec`] - one instance per [`TemporalGroup`]
//! - [`GenericCodec`] - composite slots of any type, including spatial

mod generic;
mod number;
mod string;
mod temporal;


use std::cmp::Ordering;

use trellisdb_core::{EncodingError, EntityId};

pub use generic::{slot_tags, GenericCodec};
pub use number::{decode_number, NumberCodec, NUMBER_KEY_WIDTH};
pub use string::StringCodec;
pub use temporal::{decode_temporal, encode_temporal, temporal_width, TemporalCodec};

/// The capability a populator needs from a value domain.
///
/// Implementations must guarantee the *monotonic embedding* law: for any two
/// inputs `a < b` in the domain's natural order, `encode_value(a) <
/// encode_value(b)` as byte strings. [`KeyCodec::compare`] is then plain byte
/// comparison and the tree store needs no injected comparator.
pub trait KeyCodec {
    /// The owned value form this codec accepts: a single [`trellisdb_core::Value`]
    /// for scalar and temporal domains, a `Vec<Value>` tuple for composite
    /// domains.
    type Input: Clone + std::fmt::Debug;

    /// Stable identifier recorded in the region header and checked on
    /// re-open.
    fn codec_id(&self) -> &'static str;

    /// Encode an input into its value bytes (without the entity id suffix).
    ///
    /// # Errors
    ///
    /// Returns an [`EncodingError`] if the input lies outside the domain
    /// this codec can represent.
    fn encode_value(&self, input: &Self::Input) -> Result<Vec<u8>, EncodingError>;

    /// Estimated encoded size in bytes, for buffer pre-allocation. May be
    /// exceeded by escaping in variable-width domains.
    fn encoded_size(&self, input: &Self::Input) -> usize;

    /// Compare two encoded value byte strings.
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }

    /// Sentinel sorting at or before every key this codec produces.
    fn lowest(&self) -> Vec<u8> {
        Vec::new()
    }

    /// Sentinel sorting after every key this codec produces.
    fn highest(&self) -> Vec<u8>;

    /// Best-effort human-readable rendering of encoded value bytes, used in
    /// violation reports. `None` where decoding is undefined for the domain.
    fn describe(&self, value_bytes: &[u8]) -> Option<String>;

    /// Encode a full index key for one entity.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodingError`] if the input lies outside the domain
    /// this codec can represent.
    fn encode_key(
        &self,
        entity_id: EntityId,
        input: &Self::Input,
    ) -> Result<IndexKey, EncodingError> {
        Ok(IndexKey { value_bytes: self.encode_value(input)?, entity_id })
    }
}

/// One encoded index entry: value bytes plus the owning entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKey {
    value_bytes: Vec<u8>,
    entity_id: EntityId,
}

impl IndexKey {
    /// Create a key from already-encoded value bytes.
    #[must_use]
    pub const fn new(value_bytes: Vec<u8>, entity_id: EntityId) -> Self {
        Self { value_bytes, entity_id }
    }

    /// The encoded value part.
    #[inline]
    #[must_use]
    pub fn value_bytes(&self) -> &[u8] {
        &self.value_bytes
    }

    /// The owning entity.
    #[inline]
    #[must_use]
    pub const fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// The byte form stored in the tree: value bytes then big-endian entity
    /// id, so tree order is (value, entity).
    #[must_use]
    pub fn storage_key(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.value_bytes.len() + 8);
        key.extend_from_slice(&self.value_bytes);
        key.extend_from_slice(&self.entity_id.to_be_bytes());
        key
    }

    /// Split a storage key back into value bytes and entity id.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::Malformed`] if the key is shorter than an
    /// entity id suffix.
    pub fn split_storage_key(key: &[u8]) -> Result<(&[u8], EntityId), EncodingError> {
        if key.len() < 8 {
            return Err(EncodingError::Malformed(format!(
                "storage key of {} byte(s) is missing its entity id suffix",
                key.len()
            )));
        }
        let (value, id_bytes) = key.split_at(key.len() - 8);
        // split_at guarantees exactly 8 bytes
        let mut id = [0u8; 8];
        id.copy_from_slice(id_bytes);
        Ok((value, EntityId::from_be_bytes(id)))
    }
}
