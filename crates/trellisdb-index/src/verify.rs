//! Uniqueness verification.
//!
//! Invoked once per unique index when the build closes, over the full key
//! set (initial scan plus applied updates). The tree store keeps a region
//! permanently sorted by (encoded value, entity id), so verification is a
//! single streaming cursor pass: runs of equal value bytes are adjacent,
//! and a run spanning two or more distinct entities is a violation. A
//! single entity re-adding the same value collapses to one key on insert
//! and can never produce a run on its own.
//!
//! Memory use is bounded: the pass holds one run at a time, individually
//! reported violations are capped at [`MAX_REPORTED_VIOLATIONS`], and the
//! entity set inside each reported violation is capped at
//! [`MAX_ENTITIES_PER_VIOLATION`]. Violations beyond the caps still fail
//! verification — only their details are elided from the report.

use std::fmt;

use trellisdb_core::EntityId;
use trellisdb_storage::{Cursor, Transaction};

use crate::codec::{IndexKey, KeyCodec};
use crate::error::IndexResult;

/// Maximum number of distinct violating values materialized in a report.
pub const MAX_REPORTED_VIOLATIONS: usize = 10;

/// Maximum number of entity ids materialized per reported violation.
pub const MAX_ENTITIES_PER_VIOLATION: usize = 100;

/// One value shared by two or more distinct entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniquenessViolation {
    /// The offending value, rendered by the codec where decoding is
    /// defined.
    pub value: Option<String>,
    /// The encoded value bytes shared by the entities.
    pub value_bytes: Vec<u8>,
    /// Entities holding the value, ascending, capped at
    /// [`MAX_ENTITIES_PER_VIOLATION`].
    pub entity_ids: Vec<EntityId>,
}

/// Aggregate result of one verification pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UniquenessReport {
    /// Individually reported violations, capped at
    /// [`MAX_REPORTED_VIOLATIONS`].
    pub violations: Vec<UniquenessViolation>,
    /// Total count of distinct violating values, including those beyond the
    /// report cap.
    pub violating_values: usize,
}

impl UniquenessReport {
    /// Whether verification found no violations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violating_values == 0
    }

    /// Fold another report into this one, keeping the report cap.
    ///
    /// Used by the temporal dispatcher to aggregate per-partition results.
    pub fn merge(&mut self, mut other: Self) {
        self.violating_values += other.violating_values;
        for violation in other.violations.drain(..) {
            if self.violations.len() < MAX_REPORTED_VIOLATIONS {
                self.violations.push(violation);
            }
        }
    }

    fn record_run(&mut self, value_bytes: Vec<u8>, value: Option<String>, entities: Vec<EntityId>) {
        self.violating_values += 1;
        if self.violations.len() < MAX_REPORTED_VIOLATIONS {
            self.violations.push(UniquenessViolation { value, value_bytes, entity_ids: entities });
        }
    }
}

impl fmt::Display for UniquenessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} value(s) shared by distinct entities", self.violating_values)?;
        if let Some(first) = self.violations.first() {
            let rendered = first
                .value
                .clone()
                .unwrap_or_else(|| format!("{:02x?}", first.value_bytes));
            write!(f, "; first: value {rendered} held by entities [")?;
            for (i, entity) in first.entity_ids.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{entity}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// Scan a populated region for uniqueness violations.
///
/// Returns an empty report when the constraint holds. The caller decides
/// what a non-empty report means — the populator turns it into a failed
/// build.
///
/// # Errors
///
/// Returns [`crate::IndexError::Storage`] if the scan fails, or
/// [`crate::IndexError::Encoding`] if the region contains a malformed key.
pub fn verify_unique<C: KeyCodec, T: Transaction>(
    tx: &T,
    region: &str,
    codec: &C,
) -> IndexResult<UniquenessReport> {
    let mut report = UniquenessReport::default();
    let mut run_value: Option<Vec<u8>> = None;
    let mut run_entities: Vec<EntityId> = Vec::new();

    let mut flush_run = |value: Option<Vec<u8>>, entities: &mut Vec<EntityId>| {
        if let Some(value) = value {
            if entities.len() >= 2 {
                let rendered = codec.describe(&value);
                report.record_run(value, rendered, std::mem::take(entities));
            }
        }
        entities.clear();
    };

    let mut cursor = tx.scan(region)?;
    while let Some((key, _)) = cursor.next()? {
        let (value, entity) = IndexKey::split_storage_key(&key)?;
        match &run_value {
            Some(current) if current.as_slice() == value => {
                if run_entities.len() < MAX_ENTITIES_PER_VIOLATION {
                    run_entities.push(entity);
                }
            }
            _ => {
                flush_run(run_value.take(), &mut run_entities);
                run_value = Some(value.to_vec());
                run_entities.push(entity);
            }
        }
    }
    flush_run(run_value, &mut run_entities);

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::{KeyCodec, NumberCodec};
    use trellisdb_core::Value;
    use trellisdb_storage::backends::RedbEngine;
    use trellisdb_storage::StorageEngine;

    const REGION: &str = "verify-test";

    fn insert(engine: &RedbEngine, entries: &[(u64, i64)]) {
        let codec = NumberCodec::new();
        let mut tx = engine.begin_write().unwrap();
        for &(entity, value) in entries {
            let key =
                codec.encode_key(EntityId::new(entity), &Value::Int(value)).unwrap();
            tx.put(REGION, &key.storage_key(), &[]).unwrap();
        }
        tx.commit().unwrap();
    }

    fn verify(engine: &RedbEngine) -> UniquenessReport {
        let tx = engine.begin_read().unwrap();
        verify_unique(&tx, REGION, &NumberCodec::new()).unwrap()
    }

    #[test]
    fn distinct_values_pass() {
        let engine = RedbEngine::in_memory().unwrap();
        insert(&engine, &[(1, 5), (2, 7), (3, 9)]);
        assert!(verify(&engine).is_empty());
    }

    #[test]
    fn shared_value_is_reported_with_entities() {
        let engine = RedbEngine::in_memory().unwrap();
        insert(&engine, &[(1, 5), (2, 7), (3, 5)]);

        let report = verify(&engine);
        assert_eq!(report.violating_values, 1);
        let violation = &report.violations[0];
        assert_eq!(violation.value.as_deref(), Some("5"));
        assert_eq!(violation.entity_ids, vec![EntityId::new(1), EntityId::new(3)]);
    }

    #[test]
    fn report_caps_but_still_counts() {
        let engine = RedbEngine::in_memory().unwrap();
        // More violating values than the report cap
        let mut entries = Vec::new();
        for value in 0..(MAX_REPORTED_VIOLATIONS as i64 + 5) {
            entries.push((2 * value as u64, value));
            entries.push((2 * value as u64 + 1, value));
        }
        insert(&engine, &entries);

        let report = verify(&engine);
        assert_eq!(report.violating_values, MAX_REPORTED_VIOLATIONS + 5);
        assert_eq!(report.violations.len(), MAX_REPORTED_VIOLATIONS);
    }

    #[test]
    fn empty_region_passes() {
        let engine = RedbEngine::in_memory().unwrap();
        assert!(verify(&engine).is_empty());
    }

    #[test]
    fn merge_aggregates_counts_and_respects_cap() {
        let mut a = UniquenessReport::default();
        a.record_run(vec![1], None, vec![EntityId::new(1), EntityId::new(2)]);

        let mut b = UniquenessReport::default();
        for i in 0..MAX_REPORTED_VIOLATIONS {
            b.record_run(vec![i as u8], None, vec![EntityId::new(3), EntityId::new(4)]);
        }

        a.merge(b);
        assert_eq!(a.violating_values, 1 + MAX_REPORTED_VIOLATIONS);
        assert_eq!(a.violations.len(), MAX_REPORTED_VIOLATIONS);
    }

    #[test]
    fn display_names_first_violation() {
        let engine = RedbEngine::in_memory().unwrap();
        insert(&engine, &[(1, 5), (3, 5)]);
        let rendered = verify(&engine).to_string();
        assert!(rendered.contains("value 5"), "unexpected rendering: {rendered}");
        assert!(rendered.contains("[1, 3]"), "unexpected rendering: {rendered}");
    }
}
