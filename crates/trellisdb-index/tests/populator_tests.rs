//! Index population integration tests.
//!
//! Drives full builds through the population state machine against the
//! in-memory redb engine: scan batches, concurrent update replay,
//! uniqueness verification, temporal partitioning, composite tuples, and
//! failure paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use trellisdb_core::{Duration, EntityId, Value};
use trellisdb_index::{
    ConfiguredCurveSettings, GenericIndexPopulator, IndexDescriptor, IndexError, IndexHeader,
    IndexId, IndexPopulator, IndexUpdate, KeyCodec, NumberCodec, PopulationMonitor,
    PopulatorState, StringCodec, TemporalIndexPopulator, UniquenessReport,
};
use trellisdb_storage::backends::RedbEngine;
use trellisdb_storage::{Cursor, StorageEngine, Transaction};

fn engine() -> Arc<RedbEngine> {
    Arc::new(RedbEngine::in_memory().expect("failed to create engine"))
}

fn descriptor(unique: bool) -> Arc<IndexDescriptor> {
    Arc::new(IndexDescriptor::builder(IndexId::new(1), 42).property(666).unique(unique).build())
}

fn composite_descriptor(unique: bool) -> Arc<IndexDescriptor> {
    Arc::new(
        IndexDescriptor::builder(IndexId::new(2), 42)
            .properties([666, 667])
            .unique(unique)
            .build(),
    )
}

fn number_populator(
    engine: &Arc<RedbEngine>,
    unique: bool,
) -> IndexPopulator<NumberCodec, RedbEngine> {
    let descriptor = descriptor(unique);
    let region = descriptor.region_name();
    IndexPopulator::new(descriptor, NumberCodec::new(), Arc::clone(engine), region)
}

fn region_keys(engine: &RedbEngine, region: &str) -> Vec<Vec<u8>> {
    let tx = engine.begin_read().expect("begin read failed");
    let mut cursor = tx.scan(region).expect("scan failed");
    let mut keys = Vec::new();
    while let Some((key, _)) = cursor.next().expect("cursor failed") {
        keys.push(key);
    }
    keys
}

fn int_entries(entries: &[(u64, i64)]) -> Vec<(EntityId, Value)> {
    entries.iter().map(|&(e, v)| (EntityId::new(e), Value::Int(v))).collect()
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn unique_number_index_with_distinct_values_closes() {
    let engine = engine();
    let mut populator = number_populator(&engine, true);

    populator.create().expect("create failed");
    populator.add(&int_entries(&[(1, 5), (2, 7)])).expect("add failed");
    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("close should succeed");

    assert_eq!(populator.state(), PopulatorState::Online);
    assert_eq!(region_keys(&engine, populator.region()).len(), 2);
}

#[test]
fn concurrent_duplicate_fails_close_with_violation() {
    let engine = engine();
    let mut populator = number_populator(&engine, true);

    populator.create().expect("create failed");
    populator.add(&int_entries(&[(1, 5), (2, 7)])).expect("add failed");
    populator
        .apply_update(IndexUpdate::insert(EntityId::new(3), Value::Int(5)))
        .expect("apply_update failed");
    populator.scan_completed().expect("scan_completed failed");

    let err = populator.close(true).expect_err("close must fail");
    match err {
        IndexError::UniquenessViolated(report) => {
            assert_eq!(report.violating_values, 1);
            let violation = &report.violations[0];
            assert_eq!(violation.value.as_deref(), Some("5"));
            assert_eq!(violation.entity_ids, vec![EntityId::new(1), EntityId::new(3)]);
        }
        other => panic!("expected a uniqueness violation, got {other:?}"),
    }
    assert_eq!(populator.state(), PopulatorState::Failed);
}

#[test]
fn composite_tuples_differing_in_second_slot_close_unique() {
    let engine = engine();
    let mut populator = GenericIndexPopulator::new(
        composite_descriptor(true),
        Arc::clone(&engine),
        &ConfiguredCurveSettings::defaults(),
    );

    populator.create().expect("create failed");
    populator
        .add(&[
            (EntityId::new(1), vec![Value::Int(10), Value::String("a".into())]),
            (EntityId::new(2), vec![Value::Int(10), Value::String("b".into())]),
        ])
        .expect("add failed");
    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("tuples differ in slot 1, close must succeed");

    assert_eq!(region_keys(&engine, populator.region()).len(), 2);
}

#[test]
fn composite_tuples_equal_in_all_slots_fail_unique_close() {
    let engine = engine();
    let mut populator = GenericIndexPopulator::new(
        composite_descriptor(true),
        Arc::clone(&engine),
        &ConfiguredCurveSettings::defaults(),
    );

    populator.create().expect("create failed");
    populator
        .add(&[
            (EntityId::new(1), vec![Value::Int(10), Value::String("a".into())]),
            (EntityId::new(2), vec![Value::Int(10), Value::String("a".into())]),
        ])
        .expect("add failed");
    populator.scan_completed().expect("scan_completed failed");

    let err = populator.close(true).expect_err("equal tuples must fail");
    match err {
        IndexError::UniquenessViolated(report) => {
            assert_eq!(report.violations[0].value.as_deref(), Some("(10, a)"));
            assert_eq!(
                report.violations[0].entity_ids,
                vec![EntityId::new(1), EntityId::new(2)]
            );
        }
        other => panic!("expected a uniqueness violation, got {other:?}"),
    }
}

// ============================================================================
// Completeness and update replay
// ============================================================================

#[test]
fn non_unique_close_persists_exactly_the_inputs() {
    let engine = engine();
    let mut populator = number_populator(&engine, false);

    let inputs = [(1u64, 5i64), (2, 5), (3, 7), (1, 7)];
    populator.create().expect("create failed");
    populator.add(&int_entries(&inputs)).expect("add failed");
    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("close failed");

    let codec = NumberCodec::new();
    let mut expected: Vec<Vec<u8>> = inputs
        .iter()
        .map(|&(e, v)| {
            codec
                .encode_key(EntityId::new(e), &Value::Int(v))
                .expect("encode failed")
                .storage_key()
        })
        .collect();
    expected.sort();

    assert_eq!(region_keys(&engine, populator.region()), expected);
}

#[test]
fn duplicate_values_across_entities_are_fine_non_unique() {
    let engine = engine();
    let mut populator = number_populator(&engine, false);

    populator.create().expect("create failed");
    populator.add(&int_entries(&[(1, 5), (2, 5), (3, 5)])).expect("add failed");
    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("non-unique close ignores duplicates");

    assert_eq!(region_keys(&engine, populator.region()).len(), 3);
}

#[test]
fn updates_replay_in_order_and_last_one_wins() {
    let engine = engine();
    let mut populator = number_populator(&engine, false);

    populator.create().expect("create failed");
    populator.add(&int_entries(&[(1, 5)])).expect("add failed");
    populator
        .apply_update(IndexUpdate::change(EntityId::new(1), Value::Int(5), Value::Int(6)))
        .expect("apply_update failed");
    populator
        .apply_update(IndexUpdate::change(EntityId::new(1), Value::Int(6), Value::Int(7)))
        .expect("apply_update failed");
    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("close failed");

    let codec = NumberCodec::new();
    let expected = codec
        .encode_key(EntityId::new(1), &Value::Int(7))
        .expect("encode failed")
        .storage_key();
    assert_eq!(region_keys(&engine, populator.region()), vec![expected]);
}

#[test]
fn update_inserts_and_removals_apply() {
    let engine = engine();
    let mut populator = number_populator(&engine, false);

    populator.create().expect("create failed");
    populator.add(&int_entries(&[(1, 5), (2, 6)])).expect("add failed");
    populator
        .apply_update(IndexUpdate::remove(EntityId::new(2), Value::Int(6)))
        .expect("apply_update failed");
    populator
        .apply_update(IndexUpdate::insert(EntityId::new(3), Value::Int(8)))
        .expect("apply_update failed");
    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("close failed");

    let keys = region_keys(&engine, populator.region());
    assert_eq!(keys.len(), 2);
    let codec = NumberCodec::new();
    let removed = codec
        .encode_key(EntityId::new(2), &Value::Int(6))
        .expect("encode failed")
        .storage_key();
    assert!(!keys.contains(&removed));
}

#[test]
fn duplicate_resolved_by_update_closes_clean() {
    // Entity 2 briefly duplicates entity 1's value, then moves off it
    // before the scan completes; verification must see the final state.
    let engine = engine();
    let mut populator = number_populator(&engine, true);

    populator.create().expect("create failed");
    populator.add(&int_entries(&[(1, 5), (2, 5)])).expect("add failed");
    populator
        .apply_update(IndexUpdate::change(EntityId::new(2), Value::Int(5), Value::Int(9)))
        .expect("apply_update failed");
    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("duplicate was resolved before close");
    assert_eq!(populator.state(), PopulatorState::Online);
}

// ============================================================================
// State machine
// ============================================================================

#[test]
fn operations_require_their_states() {
    let engine = engine();
    let mut populator = number_populator(&engine, false);

    // Nothing before create
    assert!(matches!(
        populator.add(&int_entries(&[(1, 5)])),
        Err(IndexError::InvalidState { .. })
    ));
    assert!(matches!(populator.scan_completed(), Err(IndexError::InvalidState { .. })));
    assert!(matches!(populator.close(true), Err(IndexError::InvalidState { .. })));

    populator.create().expect("create failed");
    // Close before the scan completes is premature
    assert!(matches!(populator.close(true), Err(IndexError::InvalidState { .. })));
    // Double create is rejected
    assert!(matches!(populator.create(), Err(IndexError::InvalidState { .. })));

    populator.scan_completed().expect("scan_completed failed");
    // The scan is over: no more batches or updates
    assert!(matches!(
        populator.add(&int_entries(&[(1, 5)])),
        Err(IndexError::InvalidState { .. })
    ));
    assert!(matches!(
        populator.apply_update(IndexUpdate::insert(EntityId::new(9), Value::Int(1))),
        Err(IndexError::InvalidState { .. })
    ));

    populator.close(true).expect("close failed");
    assert_eq!(populator.state(), PopulatorState::Online);
}

#[test]
fn encoding_error_aborts_the_build() {
    let engine = engine();
    let mut populator = number_populator(&engine, false);

    populator.create().expect("create failed");
    populator.add(&int_entries(&[(1, 5)])).expect("add failed");

    let err = populator
        .add(&[(EntityId::new(2), Value::String("not a number".into()))])
        .expect_err("string in a number index must fail");
    assert!(matches!(err, IndexError::Encoding(_)));
    assert_eq!(populator.state(), PopulatorState::Failed);

    // The build is poisoned
    assert!(matches!(
        populator.add(&int_entries(&[(3, 6)])),
        Err(IndexError::BuildFailed(_))
    ));
    assert!(matches!(populator.close(true), Err(IndexError::BuildFailed(_))));

    // Only the drop path remains; it cleans everything up
    populator.close(false).expect("drop failed");
    assert_eq!(populator.state(), PopulatorState::Dropped);
    assert!(region_keys(&engine, populator.region()).is_empty());
}

#[test]
fn close_false_drops_region_and_header() {
    let engine = engine();
    let mut populator = number_populator(&engine, false);

    populator.create().expect("create failed");
    populator.add(&int_entries(&[(1, 5), (2, 7)])).expect("add failed");
    populator.close(false).expect("drop failed");

    assert_eq!(populator.state(), PopulatorState::Dropped);
    assert!(region_keys(&engine, populator.region()).is_empty());

    let tx = engine.begin_read().expect("begin read failed");
    assert!(IndexHeader::read(&tx, populator.region()).expect("header read failed").is_none());
}

#[test]
fn mark_as_failed_poisons_subsequent_operations() {
    let engine = engine();
    let mut populator = number_populator(&engine, true);

    populator.create().expect("create failed");
    populator.add(&int_entries(&[(1, 5)])).expect("add failed");
    populator.mark_as_failed("scan driver I/O error");

    assert_eq!(populator.state(), PopulatorState::Failed);
    match populator.add(&int_entries(&[(2, 6)])) {
        Err(IndexError::BuildFailed(reason)) => assert!(reason.contains("scan driver I/O error")),
        other => panic!("expected BuildFailed, got {other:?}"),
    }
    assert!(matches!(populator.close(true), Err(IndexError::BuildFailed(_))));

    populator.close(false).expect("drop after failure must work");
    assert_eq!(populator.state(), PopulatorState::Dropped);
}

#[test]
fn create_clears_stale_region_content() {
    let engine = engine();
    let mut populator = number_populator(&engine, false);

    {
        let mut tx = engine.begin_write().expect("begin write failed");
        tx.put(populator.region(), b"stale junk from a crashed build", &[])
            .expect("put failed");
        tx.commit().expect("commit failed");
    }

    populator.create().expect("create failed");
    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("close failed");

    assert!(region_keys(&engine, populator.region()).is_empty());
}

#[test]
fn empty_unique_build_closes_online() {
    let engine = engine();
    let mut populator = number_populator(&engine, true);

    populator.create().expect("create failed");
    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("an empty index is trivially unique");
    assert_eq!(populator.state(), PopulatorState::Online);
}

// ============================================================================
// Region headers
// ============================================================================

#[test]
fn header_tracks_build_state_and_guards_reopens() {
    let engine = engine();
    let mut populator = number_populator(&engine, false);

    populator.create().expect("create failed");
    {
        let tx = engine.begin_read().expect("begin read failed");
        let header = IndexHeader::read(&tx, populator.region())
            .expect("header read failed")
            .expect("header must exist after create");
        // Building regions must not pass a re-open check
        assert!(header.check_compatible("number").is_err());
    }

    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("close failed");

    let tx = engine.begin_read().expect("begin read failed");
    let header = IndexHeader::read(&tx, populator.region())
        .expect("header read failed")
        .expect("header must exist after close");
    header.check_compatible("number").expect("matching codec must pass");
    assert!(header.check_compatible(StringCodec::new().codec_id()).is_err());
}

// ============================================================================
// Temporal dispatcher
// ============================================================================

fn temporal_descriptor(unique: bool) -> Arc<IndexDescriptor> {
    Arc::new(IndexDescriptor::builder(IndexId::new(3), 42).property(668).unique(unique).build())
}

fn date(y: i32, m: u32, d: u32) -> Value {
    Value::Date(NaiveDate::from_ymd_opt(y, m, d).expect("valid date"))
}

#[test]
fn temporal_values_are_partitioned_by_group() {
    let engine = engine();
    let mut populator =
        TemporalIndexPopulator::new(temporal_descriptor(false), Arc::clone(&engine));

    populator.create().expect("create failed");
    populator
        .add(&[
            (EntityId::new(1), date(2024, 1, 1)),
            (EntityId::new(2), date(2024, 1, 2)),
            (EntityId::new(3), Value::LocalTime(NaiveTime::from_hms_opt(9, 0, 0).expect("time"))),
            (EntityId::new(4), Value::Duration(Duration::new(1, 0, 0, 0))),
        ])
        .expect("add failed");
    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("close failed");

    assert_eq!(populator.state(), PopulatorState::Online);
    assert_eq!(populator.open_parts().len(), 3);
    assert_eq!(
        region_keys(&engine, &populator.part_region(trellisdb_core::TemporalGroup::Date)).len(),
        2
    );
    assert_eq!(
        region_keys(&engine, &populator.part_region(trellisdb_core::TemporalGroup::LocalTime))
            .len(),
        1
    );
    assert_eq!(
        region_keys(&engine, &populator.part_region(trellisdb_core::TemporalGroup::Duration))
            .len(),
        1
    );
}

#[test]
fn same_underlying_integer_never_collides_across_partitions() {
    // Epoch day 100 and nanosecond-of-day 100 are the same integer under
    // their partitions' layouts; isolation must keep them apart.
    let engine = engine();
    let mut populator =
        TemporalIndexPopulator::new(temporal_descriptor(true), Arc::clone(&engine));

    let day_100 = NaiveDate::default() + chrono::TimeDelta::days(100);
    let nanos_100 =
        NaiveTime::from_num_seconds_from_midnight_opt(0, 100).expect("valid time");

    populator.create().expect("create failed");
    populator
        .add(&[
            (EntityId::new(1), Value::Date(day_100)),
            (EntityId::new(2), Value::LocalTime(nanos_100)),
        ])
        .expect("add failed");
    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("cross-partition values are never duplicates");
    assert_eq!(populator.state(), PopulatorState::Online);
}

#[test]
fn duplicate_within_one_partition_fails_unique_close() {
    let engine = engine();
    let mut populator =
        TemporalIndexPopulator::new(temporal_descriptor(true), Arc::clone(&engine));

    populator.create().expect("create failed");
    populator
        .add(&[(EntityId::new(1), date(2024, 6, 1)), (EntityId::new(2), date(2024, 6, 1))])
        .expect("add failed");
    populator.scan_completed().expect("scan_completed failed");

    let err = populator.close(true).expect_err("duplicate dates must fail");
    match err {
        IndexError::UniquenessViolated(report) => {
            assert_eq!(report.violating_values, 1);
            assert_eq!(report.violations[0].value.as_deref(), Some("2024-06-01"));
        }
        other => panic!("expected a uniqueness violation, got {other:?}"),
    }
}

#[test]
fn violations_aggregate_across_partitions() {
    let engine = engine();
    let mut populator =
        TemporalIndexPopulator::new(temporal_descriptor(true), Arc::clone(&engine));

    populator.create().expect("create failed");
    populator
        .add(&[
            (EntityId::new(1), date(2024, 6, 1)),
            (EntityId::new(2), date(2024, 6, 1)),
            (EntityId::new(3), Value::Duration(Duration::new(0, 1, 0, 0))),
            (EntityId::new(4), Value::Duration(Duration::new(0, 1, 0, 0))),
        ])
        .expect("add failed");
    populator.scan_completed().expect("scan_completed failed");

    match populator.close(true).expect_err("both partitions hold duplicates") {
        IndexError::UniquenessViolated(report) => {
            assert_eq!(report.violating_values, 2, "one violation per partition");
        }
        other => panic!("expected a uniqueness violation, got {other:?}"),
    }
    assert_eq!(populator.state(), PopulatorState::Failed);

    populator.close(false).expect("drop after failed verification");
    for group in populator.open_parts() {
        assert!(region_keys(&engine, &populator.part_region(group)).is_empty());
    }
}

#[test]
fn group_changing_update_moves_between_partitions() {
    let engine = engine();
    let mut populator =
        TemporalIndexPopulator::new(temporal_descriptor(false), Arc::clone(&engine));

    let datetime = Value::LocalDateTime(
        NaiveDateTime::parse_from_str("2024-06-01T12:00:00", "%Y-%m-%dT%H:%M:%S")
            .expect("valid datetime"),
    );

    populator.create().expect("create failed");
    populator.add(&[(EntityId::new(1), date(2024, 6, 1))]).expect("add failed");
    populator
        .apply_update(IndexUpdate::change(EntityId::new(1), date(2024, 6, 1), datetime))
        .expect("apply_update failed");
    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("close failed");

    assert!(
        region_keys(&engine, &populator.part_region(trellisdb_core::TemporalGroup::Date))
            .is_empty(),
        "the date partition entry moved away"
    );
    assert_eq!(
        region_keys(
            &engine,
            &populator.part_region(trellisdb_core::TemporalGroup::LocalDateTime)
        )
        .len(),
        1
    );
}

#[test]
fn non_temporal_value_fails_the_dispatcher() {
    let engine = engine();
    let mut populator =
        TemporalIndexPopulator::new(temporal_descriptor(false), Arc::clone(&engine));

    populator.create().expect("create failed");
    let err = populator
        .add(&[(EntityId::new(1), Value::Int(5))])
        .expect_err("an int is not a temporal value");
    assert!(matches!(err, IndexError::Encoding(_)));
    assert_eq!(populator.state(), PopulatorState::Failed);
}

// ============================================================================
// Spatial slots through the generic populator
// ============================================================================

fn spatial_descriptor(unique: bool) -> Arc<IndexDescriptor> {
    Arc::new(IndexDescriptor::builder(IndexId::new(4), 42).property(669).unique(unique).build())
}

#[test]
fn distant_points_close_unique() {
    let engine = engine();
    let mut populator = GenericIndexPopulator::new(
        spatial_descriptor(true),
        Arc::clone(&engine),
        &ConfiguredCurveSettings::defaults(),
    );

    populator.create().expect("create failed");
    populator
        .add(&[
            (EntityId::new(1), vec![Value::Point { x: 12.5, y: 55.7, z: None, srid: 4326 }]),
            (EntityId::new(2), vec![Value::Point { x: -70.0, y: -33.0, z: None, srid: 4326 }]),
        ])
        .expect("add failed");
    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("distinct cells are distinct values");
}

#[test]
fn out_of_envelope_point_aborts_the_build() {
    let engine = engine();
    let mut populator = GenericIndexPopulator::new(
        spatial_descriptor(false),
        Arc::clone(&engine),
        &ConfiguredCurveSettings::defaults(),
    );

    populator.create().expect("create failed");
    let err = populator
        .add(&[(EntityId::new(1), vec![Value::Point { x: 181.0, y: 0.0, z: None, srid: 4326 }])])
        .expect_err("longitude 181 is outside the envelope");
    assert!(matches!(err, IndexError::Encoding(_)));
    assert_eq!(populator.state(), PopulatorState::Failed);
}

// ============================================================================
// Monitor notifications
// ============================================================================

#[derive(Default)]
struct CountingMonitor {
    batches: AtomicUsize,
    keys: AtomicUsize,
    updates: AtomicUsize,
    verifications: AtomicUsize,
    violation_reports: AtomicUsize,
    completions: AtomicUsize,
}

impl PopulationMonitor for CountingMonitor {
    fn batch_added(&self, keys: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.keys.fetch_add(keys, Ordering::Relaxed);
    }

    fn updates_applied(&self, updates: usize) {
        self.updates.fetch_add(updates, Ordering::Relaxed);
    }

    fn verification_started(&self) {
        self.verifications.fetch_add(1, Ordering::Relaxed);
    }

    fn violations_found(&self, _report: &UniquenessReport) {
        self.violation_reports.fetch_add(1, Ordering::Relaxed);
    }

    fn population_completed(&self, _success: bool) {
        self.completions.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn monitor_observes_the_build() {
    let engine = engine();
    let monitor = Arc::new(CountingMonitor::default());
    let descriptor = descriptor(true);
    let region = descriptor.region_name();
    let mut populator =
        IndexPopulator::new(descriptor, NumberCodec::new(), Arc::clone(&engine), region)
            .with_monitor(Arc::clone(&monitor) as Arc<dyn PopulationMonitor>);

    populator.create().expect("create failed");
    populator.add(&int_entries(&[(1, 5), (2, 7)])).expect("add failed");
    populator.add(&int_entries(&[(3, 9)])).expect("add failed");
    populator
        .apply_update(IndexUpdate::insert(EntityId::new(4), Value::Int(11)))
        .expect("apply_update failed");
    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("close failed");

    assert_eq!(monitor.batches.load(Ordering::Relaxed), 2);
    assert_eq!(monitor.keys.load(Ordering::Relaxed), 3);
    assert_eq!(monitor.updates.load(Ordering::Relaxed), 1);
    assert_eq!(monitor.verifications.load(Ordering::Relaxed), 1);
    assert_eq!(monitor.violation_reports.load(Ordering::Relaxed), 0);
    assert_eq!(monitor.completions.load(Ordering::Relaxed), 1);
}

#[test]
fn temporal_monitor_sees_one_completion() {
    let engine = engine();
    let monitor = Arc::new(CountingMonitor::default());
    let mut populator =
        TemporalIndexPopulator::new(temporal_descriptor(false), Arc::clone(&engine))
            .with_monitor(Arc::clone(&monitor) as Arc<dyn PopulationMonitor>);

    populator.create().expect("create failed");
    populator
        .add(&[
            (EntityId::new(1), date(2024, 1, 1)),
            (EntityId::new(2), Value::Duration(Duration::new(1, 0, 0, 0))),
        ])
        .expect("add failed");
    populator.scan_completed().expect("scan_completed failed");
    populator.close(true).expect("close failed");

    // Two partitions reported their batches, but the index completed once
    assert_eq!(monitor.batches.load(Ordering::Relaxed), 2);
    assert_eq!(monitor.completions.load(Ordering::Relaxed), 1);
}
