//! The temporal dispatcher: one isolated population core per value group.
//!
//! A temporal index is partitioned by [`TemporalGroup`]: each group owns a
//! disjoint fixed-width key layout and its own storage region, so the
//! dispatcher keeps an explicit registry mapping group to an independently
//! owned [`IndexPopulator`] part, created lazily on the first value of that
//! group. Nothing is shared between partitions beyond the registry itself.
//!
//! Uniqueness verification runs per part: values from different groups can
//! never compare equal, so cross-partition duplicate checks are
//! unnecessary. The dispatcher's close succeeds only if every open part
//! succeeds, and aggregates violation reports from all parts on failure.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use trellisdb_core::{EncodingError, EntityId, TemporalGroup, Value};
use trellisdb_storage::StorageEngine;

use crate::codec::TemporalCodec;
use crate::descriptor::IndexDescriptor;
use crate::error::{IndexError, IndexResult};
use crate::monitor::{NoopMonitor, PopulationMonitor};
use crate::populator::{IndexPopulator, IndexUpdate, PopulatorState};
use crate::verify::UniquenessReport;

/// Forwards part-level progress to the dispatcher's monitor but suppresses
/// per-part completion and violation events: the temporal index completes
/// once, as a whole, and violations are reported once, aggregated.
struct PartMonitor(Arc<dyn PopulationMonitor>);

impl PopulationMonitor for PartMonitor {
    fn batch_added(&self, keys: usize) {
        self.0.batch_added(keys);
    }

    fn updates_applied(&self, updates: usize) {
        self.0.updates_applied(updates);
    }

    fn verification_started(&self) {
        self.0.verification_started();
    }

    fn violations_found(&self, _report: &UniquenessReport) {}

    fn population_completed(&self, _success: bool) {}
}

/// Populator for temporal indexes: routes each value to the population core
/// owning its value group.
pub struct TemporalIndexPopulator<E: StorageEngine> {
    descriptor: Arc<IndexDescriptor>,
    engine: Arc<E>,
    base_region: String,
    monitor: Arc<dyn PopulationMonitor>,
    parts: BTreeMap<TemporalGroup, IndexPopulator<TemporalCodec, E>>,
    state: PopulatorState,
    scan_done: bool,
    failure: Option<String>,
}

impl<E: StorageEngine> TemporalIndexPopulator<E> {
    /// Create a dispatcher for one build. Parts are created lazily; nothing
    /// is written until the first value of a group arrives.
    pub fn new(descriptor: Arc<IndexDescriptor>, engine: Arc<E>) -> Self {
        let base_region = descriptor.region_name();
        Self {
            descriptor,
            engine,
            base_region,
            monitor: Arc::new(NoopMonitor),
            parts: BTreeMap::new(),
            state: PopulatorState::Created,
            scan_done: false,
            failure: None,
        }
    }

    /// Attach an observability monitor.
    #[must_use]
    pub fn with_monitor(mut self, monitor: Arc<dyn PopulationMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Current dispatcher-level lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PopulatorState {
        self.state
    }

    /// The region name a group's partition lives in.
    #[must_use]
    pub fn part_region(&self, group: TemporalGroup) -> String {
        format!("{}/{}", self.base_region, group.as_str())
    }

    /// Groups that have received at least one value.
    #[must_use]
    pub fn open_parts(&self) -> Vec<TemporalGroup> {
        self.parts.keys().copied().collect()
    }

    /// Start the build.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidState`] outside [`PopulatorState::Created`].
    pub fn create(&mut self) -> IndexResult<()> {
        self.ensure(PopulatorState::Created, "create")?;
        self.state = PopulatorState::Populating;
        Ok(())
    }

    /// Add a batch of scanned (entity, value) pairs, routing each value to
    /// its group's part.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Encoding`] if any value is not temporal, or
    /// whatever error the receiving part raised. Either aborts the whole
    /// build, all parts included.
    pub fn add(&mut self, batch: &[(EntityId, Value)]) -> IndexResult<()> {
        self.ensure_populating("add")?;

        let mut grouped: BTreeMap<TemporalGroup, Vec<(EntityId, Value)>> = BTreeMap::new();
        for (entity_id, value) in batch {
            match value.temporal_group() {
                Some(group) => grouped.entry(group).or_default().push((*entity_id, value.clone())),
                None => {
                    let e = IndexError::Encoding(non_temporal(value));
                    return Err(self.fail_with(e));
                }
            }
        }

        for (group, sub_batch) in &grouped {
            let result = self.part_for(*group).and_then(|part| part.add(sub_batch));
            if let Err(e) = result {
                return Err(self.fail_with(e));
            }
        }
        Ok(())
    }

    /// Queue a concurrent update, routing it to the group (or groups) it
    /// touches.
    ///
    /// An update whose before- and after-values fall in different groups
    /// becomes a removal in the old group's part and an insertion in the new
    /// group's part.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Encoding`] if either side is not temporal, or
    /// [`IndexError::InvalidState`] outside the populating phase.
    pub fn apply_update(&mut self, update: IndexUpdate<Value>) -> IndexResult<()> {
        self.ensure_populating("apply an update")?;

        let IndexUpdate { entity_id, before, after } = update;
        let before_group = match before.as_ref().map(|v| require_temporal(v)).transpose() {
            Ok(group) => group,
            Err(e) => return Err(self.fail_with(e.into())),
        };
        let after_group = match after.as_ref().map(|v| require_temporal(v)).transpose() {
            Ok(group) => group,
            Err(e) => return Err(self.fail_with(e.into())),
        };

        let result = match (before_group, after_group) {
            (None, None) => Ok(()),
            (Some(group), None) => self.route(group, IndexUpdate {
                entity_id,
                before,
                after: None,
            }),
            (None, Some(group)) => self.route(group, IndexUpdate {
                entity_id,
                before: None,
                after,
            }),
            (Some(bg), Some(ag)) if bg == ag => {
                self.route(bg, IndexUpdate { entity_id, before, after })
            }
            (Some(bg), Some(ag)) => {
                // The value moved between groups: remove from one partition,
                // insert into the other.
                self.route(bg, IndexUpdate { entity_id, before, after: None })
                    .and_then(|()| self.route(ag, IndexUpdate { entity_id, before: None, after }))
            }
        };
        if let Err(e) = result {
            return Err(self.fail_with(e));
        }
        Ok(())
    }

    /// Mark the initial scan as complete on every open part.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidState`] outside the populating phase, or
    /// the error that failed a part's update replay.
    pub fn scan_completed(&mut self) -> IndexResult<()> {
        self.ensure_populating("complete the scan")?;

        let mut first_error: Option<IndexError> = None;
        for part in self.parts.values_mut() {
            if let Err(e) = part.scan_completed() {
                first_error = Some(e);
                break;
            }
        }
        if let Some(e) = first_error {
            return Err(self.fail_with(e));
        }
        self.scan_done = true;
        if self.descriptor.unique {
            self.state = PopulatorState::Verifying;
        }
        Ok(())
    }

    /// Close the build.
    ///
    /// Every part is closed even if an earlier one fails, so resources are
    /// released on all paths. On a successful close of a unique index,
    /// violation reports from all parts are aggregated into one error.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::UniquenessViolated`] with the aggregated report
    /// if any part's verification failed, or the first non-violation error
    /// encountered.
    pub fn close(&mut self, successful: bool) -> IndexResult<()> {
        if !successful {
            return self.drop_parts();
        }

        if self.state == PopulatorState::Failed {
            return Err(IndexError::BuildFailed(self.failure.clone().unwrap_or_default()));
        }
        let close_ready = match self.state {
            PopulatorState::Verifying => true,
            PopulatorState::Populating => self.scan_done && !self.descriptor.unique,
            _ => false,
        };
        if !close_ready {
            return Err(IndexError::InvalidState { state: self.state, operation: "close" });
        }

        // Verify every part before finishing any, so violations from all
        // partitions land in one aggregated report and no part goes online
        // ahead of a failing sibling.
        if self.descriptor.unique {
            let mut aggregated = UniquenessReport::default();
            let mut first_error: Option<IndexError> = None;
            for part in self.parts.values_mut() {
                match part.run_verification() {
                    Ok(report) => aggregated.merge(report),
                    Err(e) => {
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }
            if let Some(e) = first_error {
                return Err(self.fail_with(e));
            }
            if !aggregated.is_empty() {
                self.monitor.violations_found(&aggregated);
                return Err(self.fail_with(IndexError::UniquenessViolated(aggregated)));
            }
        }

        // All parts are clean; finish each one, still attempting the rest
        // if one fails.
        let mut first_error: Option<IndexError> = None;
        for part in self.parts.values_mut() {
            if let Err(e) = part.close(true) {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(self.fail_with(e));
        }

        self.state = PopulatorState::Online;
        self.monitor.population_completed(true);
        Ok(())
    }

    /// Force the build into [`PopulatorState::Failed`], all parts included.
    pub fn mark_as_failed(&mut self, reason: impl Into<String>) {
        if self.state.is_terminal() || self.state == PopulatorState::Failed {
            return;
        }
        let reason = reason.into();
        for part in self.parts.values_mut() {
            part.mark_as_failed(reason.clone());
        }
        self.failure = Some(reason);
        self.state = PopulatorState::Failed;
        self.monitor.population_completed(false);
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn ensure(&self, expected: PopulatorState, operation: &'static str) -> IndexResult<()> {
        if self.state == PopulatorState::Failed {
            return Err(IndexError::BuildFailed(self.failure.clone().unwrap_or_default()));
        }
        if self.state != expected {
            return Err(IndexError::InvalidState { state: self.state, operation });
        }
        Ok(())
    }

    fn ensure_populating(&self, operation: &'static str) -> IndexResult<()> {
        self.ensure(PopulatorState::Populating, operation)?;
        if self.scan_done {
            return Err(IndexError::InvalidState { state: self.state, operation });
        }
        Ok(())
    }

    fn fail_with(&mut self, error: IndexError) -> IndexError {
        self.mark_as_failed(error.to_string());
        error
    }

    /// The part owning a group, created (and its region initialized) on
    /// first use.
    fn part_for(
        &mut self,
        group: TemporalGroup,
    ) -> IndexResult<&mut IndexPopulator<TemporalCodec, E>> {
        let region = self.part_region(group);
        match self.parts.entry(group) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let mut part = IndexPopulator::new(
                    Arc::clone(&self.descriptor),
                    TemporalCodec::new(group),
                    Arc::clone(&self.engine),
                    region,
                )
                .with_monitor(Arc::new(PartMonitor(Arc::clone(&self.monitor))));
                part.create()?;
                Ok(entry.insert(part))
            }
        }
    }

    fn route(&mut self, group: TemporalGroup, update: IndexUpdate<Value>) -> IndexResult<()> {
        self.part_for(group)?.apply_update(update)
    }

    fn drop_parts(&mut self) -> IndexResult<()> {
        if self.state.is_terminal() {
            return Err(IndexError::InvalidState { state: self.state, operation: "drop" });
        }
        let was_failed = self.state == PopulatorState::Failed;

        // Attempt to drop every part even if one fails, then surface the
        // first failure.
        let mut first_error: Option<IndexError> = None;
        for part in self.parts.values_mut() {
            if part.state().is_terminal() {
                continue;
            }
            if let Err(e) = part.close(false) {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        if let Some(e) = first_error {
            return Err(self.fail_with(e));
        }

        self.state = PopulatorState::Dropped;
        if !was_failed {
            self.monitor.population_completed(false);
        }
        Ok(())
    }
}

fn non_temporal(value: &Value) -> EncodingError {
    EncodingError::UnsupportedType { codec: "temporal", actual: value.type_name() }
}

fn require_temporal(value: &Value) -> Result<TemporalGroup, EncodingError> {
    value.temporal_group().ok_or_else(|| non_temporal(value))
}
