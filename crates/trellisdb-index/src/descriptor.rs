//! Index descriptors: the immutable schema metadata behind one index.

use serde::{Deserialize, Serialize};

/// Unique identifier of an index within the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexId(u64);

impl IndexId {
    /// Create a new index id.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

/// Immutable schema metadata for one index.
///
/// A descriptor is resolved by the schema layer before a populator is
/// constructed and is never mutated afterwards: the populator only reads the
/// uniqueness flag and the slot count.
///
/// # Example
///
/// ```
/// use trellisdb_index::{IndexDescriptor, IndexId};
///
/// let descriptor = IndexDescriptor::builder(IndexId::new(7), 42)
///     .property(666)
///     .unique(true)
///     .owning_constraint(3)
///     .build();
///
/// assert!(descriptor.unique);
/// assert_eq!(descriptor.slot_count(), 1);
/// assert_eq!(descriptor.region_name(), "index-7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    /// Identifier of the index.
    pub id: IndexId,
    /// Token of the entity label this index covers.
    pub label_id: u32,
    /// Tokens of the indexed properties, in slot order.
    pub property_ids: Vec<u32>,
    /// Whether this index enforces a uniqueness constraint.
    pub unique: bool,
    /// Identifier of the constraint that owns this index, if any.
    pub owning_constraint: Option<u64>,
}

impl IndexDescriptor {
    /// Create a new descriptor builder.
    #[must_use]
    pub const fn builder(id: IndexId, label_id: u32) -> IndexDescriptorBuilder {
        IndexDescriptorBuilder {
            id,
            label_id,
            property_ids: Vec::new(),
            unique: false,
            owning_constraint: None,
        }
    }

    /// Number of property slots this index covers.
    #[inline]
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.property_ids.len()
    }

    /// The storage region this index's keys live in.
    #[must_use]
    pub fn region_name(&self) -> String {
        format!("index-{}", self.id.as_u64())
    }
}

/// Builder for [`IndexDescriptor`].
#[derive(Debug)]
pub struct IndexDescriptorBuilder {
    id: IndexId,
    label_id: u32,
    property_ids: Vec<u32>,
    unique: bool,
    owning_constraint: Option<u64>,
}

impl IndexDescriptorBuilder {
    /// Add an indexed property slot.
    #[must_use]
    pub fn property(mut self, property_id: u32) -> Self {
        self.property_ids.push(property_id);
        self
    }

    /// Add multiple indexed property slots.
    #[must_use]
    pub fn properties(mut self, property_ids: impl IntoIterator<Item = u32>) -> Self {
        self.property_ids.extend(property_ids);
        self
    }

    /// Set whether the index enforces uniqueness.
    #[must_use]
    pub const fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Record the constraint that owns this index.
    #[must_use]
    pub const fn owning_constraint(mut self, constraint_id: u64) -> Self {
        self.owning_constraint = Some(constraint_id);
        self
    }

    /// Build the descriptor.
    #[must_use]
    pub fn build(self) -> IndexDescriptor {
        IndexDescriptor {
            id: self.id,
            label_id: self.label_id,
            property_ids: self.property_ids,
            unique: self.unique,
            owning_constraint: self.owning_constraint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_slots_in_order() {
        let descriptor = IndexDescriptor::builder(IndexId::new(1), 42)
            .property(10)
            .properties([20, 30])
            .build();

        assert_eq!(descriptor.property_ids, vec![10, 20, 30]);
        assert_eq!(descriptor.slot_count(), 3);
        assert!(!descriptor.unique);
        assert_eq!(descriptor.owning_constraint, None);
    }

    #[test]
    fn region_name_is_stable() {
        let descriptor = IndexDescriptor::builder(IndexId::new(99), 1).property(2).build();
        assert_eq!(descriptor.region_name(), "index-99");
    }
}
