//! The generic/composite populator.
//!
//! Builds indexes over one or more property slots of possibly mixed types,
//! including spatial. The heavy lifting happens in
//! [`GenericCodec`](crate::codec::GenericCodec) (cross-type slot encoding)
//! and the shared [`IndexPopulator`] core; this wrapper's job is the curve
//! hand-off: it snapshots the [`CurveSettingsProvider`] once, at
//! construction, so the spatial key layout is frozen before the first value
//! arrives and later provider changes cannot corrupt the build.

use std::sync::Arc;

use trellisdb_core::{EntityId, Value};
use trellisdb_storage::StorageEngine;

use crate::codec::GenericCodec;
use crate::curve::{CurveSettingsProvider, IndexCurveSettings};
use crate::descriptor::IndexDescriptor;
use crate::error::IndexResult;
use crate::monitor::PopulationMonitor;
use crate::populator::{IndexPopulator, IndexUpdate, PopulatorState};

/// Populator for composite indexes: tuples of mixed-type slots, spatial
/// included.
pub struct GenericIndexPopulator<E: StorageEngine> {
    inner: IndexPopulator<GenericCodec, E>,
}

impl<E: StorageEngine> GenericIndexPopulator<E> {
    /// Create a populator for one build, freezing the curve settings
    /// snapshot for its lifetime.
    pub fn new(
        descriptor: Arc<IndexDescriptor>,
        engine: Arc<E>,
        curve_settings: &dyn CurveSettingsProvider,
    ) -> Self {
        let curves = Arc::new(IndexCurveSettings::snapshot(curve_settings));
        let codec = GenericCodec::new(descriptor.slot_count(), curves);
        let region = descriptor.region_name();
        Self { inner: IndexPopulator::new(descriptor, codec, engine, region) }
    }

    /// Attach an observability monitor.
    #[must_use]
    pub fn with_monitor(mut self, monitor: Arc<dyn PopulationMonitor>) -> Self {
        self.inner = self.inner.with_monitor(monitor);
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PopulatorState {
        self.inner.state()
    }

    /// The region this build writes into.
    #[must_use]
    pub fn region(&self) -> &str {
        self.inner.region()
    }

    /// The composite codec, with its frozen curve snapshot.
    #[must_use]
    pub fn codec(&self) -> &GenericCodec {
        self.inner.codec()
    }

    /// Start the build. See [`IndexPopulator::create`].
    ///
    /// # Errors
    ///
    /// Propagates the core populator's errors.
    pub fn create(&mut self) -> IndexResult<()> {
        self.inner.create()
    }

    /// Add a batch of scanned (entity, tuple) pairs. See
    /// [`IndexPopulator::add`].
    ///
    /// # Errors
    ///
    /// Propagates the core populator's errors.
    pub fn add(&mut self, batch: &[(EntityId, Vec<Value>)]) -> IndexResult<()> {
        self.inner.add(batch)
    }

    /// Queue a concurrent tuple update. See [`IndexPopulator::apply_update`].
    ///
    /// # Errors
    ///
    /// Propagates the core populator's errors.
    pub fn apply_update(&mut self, update: IndexUpdate<Vec<Value>>) -> IndexResult<()> {
        self.inner.apply_update(update)
    }

    /// Mark the initial scan as complete. See
    /// [`IndexPopulator::scan_completed`].
    ///
    /// # Errors
    ///
    /// Propagates the core populator's errors.
    pub fn scan_completed(&mut self) -> IndexResult<()> {
        self.inner.scan_completed()
    }

    /// Close the build. See [`IndexPopulator::close`].
    ///
    /// # Errors
    ///
    /// Propagates the core populator's errors, including the aggregated
    /// uniqueness report over full tuples.
    pub fn close(&mut self, successful: bool) -> IndexResult<()> {
        self.inner.close(successful)
    }

    /// Force the build into [`PopulatorState::Failed`]. See
    /// [`IndexPopulator::mark_as_failed`].
    pub fn mark_as_failed(&mut self, reason: impl Into<String>) {
        self.inner.mark_as_failed(reason);
    }
}
