//! The index population core.
//!
//! One [`IndexPopulator`] drives one index build from first scan batch to a
//! durable online region. It is generic over the key codec and the storage
//! engine, so every index shape — number, string, one temporal partition,
//! composite/spatial — runs the same state machine over a different static
//! key layout.
//!
//! # Lifecycle
//!
//! ```text
//! Created --create()--> Populating --scan_completed()--> [Verifying] --close(true)--> Online
//!                            |                                |
//!                            +---- mark_as_failed / error ----+--> Failed
//!                            |                                |
//!                            +--------- close(false) ---------+--> Dropped
//! ```
//!
//! The `Verifying` state only occurs for uniqueness-enforcing indexes;
//! non-unique builds go straight from a completed scan to `close(true)`.
//!
//! Concurrent updates arriving during the scan are queued and replayed, in
//! arrival order, when the scan completes — never interleaved mid-scan, so
//! the key set stays stable during the main pass and the last update for an
//! entity wins.

use std::sync::Arc;

use tracing::{debug, info, warn};
use trellisdb_core::EntityId;
use trellisdb_storage::{StorageEngine, Transaction};

use crate::codec::KeyCodec;
use crate::descriptor::IndexDescriptor;
use crate::error::{IndexError, IndexResult};
use crate::header::IndexHeader;
use crate::monitor::{NoopMonitor, PopulationMonitor};
use crate::verify::{verify_unique, UniquenessReport};

/// Lifecycle state of one index build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulatorState {
    /// Constructed; the region has not been touched.
    Created,
    /// Accepting scan batches and queuing concurrent updates.
    Populating,
    /// Scan complete on a unique index; awaiting verification at close.
    Verifying,
    /// Build closed successfully; the region is durable and readable.
    Online,
    /// Build failed; only `close(false)` is meaningful now.
    Failed,
    /// Build dropped; the region and header are gone.
    Dropped,
}

impl PopulatorState {
    /// Whether the build can still make progress.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Online | Self::Dropped)
    }
}

/// One concurrent change observed while the scan was running.
///
/// `before`/`after` describe the indexed value of the entity before and
/// after the change: an insert has no `before`, a removal has no `after`,
/// and a value change has both.
#[derive(Debug, Clone)]
pub struct IndexUpdate<I> {
    /// The entity the change happened on.
    pub entity_id: EntityId,
    /// Indexed value before the change, if the entity was indexed.
    pub before: Option<I>,
    /// Indexed value after the change, if the entity still is indexed.
    pub after: Option<I>,
}

impl<I> IndexUpdate<I> {
    /// An entity gained an indexed value.
    #[must_use]
    pub const fn insert(entity_id: EntityId, value: I) -> Self {
        Self { entity_id, before: None, after: Some(value) }
    }

    /// An entity lost its indexed value.
    #[must_use]
    pub const fn remove(entity_id: EntityId, value: I) -> Self {
        Self { entity_id, before: Some(value), after: None }
    }

    /// An entity's indexed value changed.
    #[must_use]
    pub const fn change(entity_id: EntityId, before: I, after: I) -> Self {
        Self { entity_id, before: Some(before), after: Some(after) }
    }
}

/// The population core: state machine from scan to durable online index.
///
/// A populator exists for the duration of exactly one build. The scan
/// driver feeds it serially (`&mut self` makes interleaving impossible to
/// express); independent builds share nothing but the engine.
pub struct IndexPopulator<C: KeyCodec, E: StorageEngine> {
    descriptor: Arc<IndexDescriptor>,
    codec: C,
    engine: Arc<E>,
    region: String,
    state: PopulatorState,
    scan_done: bool,
    verified: bool,
    pending_updates: Vec<IndexUpdate<C::Input>>,
    monitor: Arc<dyn PopulationMonitor>,
    failure: Option<String>,
}

impl<C: KeyCodec, E: StorageEngine> IndexPopulator<C, E> {
    /// Create a populator for one build.
    ///
    /// Nothing is written until [`create`](Self::create) is called.
    pub fn new(
        descriptor: Arc<IndexDescriptor>,
        codec: C,
        engine: Arc<E>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            descriptor,
            codec,
            engine,
            region: region.into(),
            state: PopulatorState::Created,
            scan_done: false,
            verified: false,
            pending_updates: Vec::new(),
            monitor: Arc::new(NoopMonitor),
            failure: None,
        }
    }

    /// Attach an observability monitor.
    #[must_use]
    pub fn with_monitor(mut self, monitor: Arc<dyn PopulationMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// The descriptor this build serves.
    #[must_use]
    pub fn descriptor(&self) -> &IndexDescriptor {
        &self.descriptor
    }

    /// The codec encoding this build's keys.
    #[must_use]
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// The region this build writes into.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PopulatorState {
        self.state
    }

    /// Initialize the build: clear any stale region content and write the
    /// building header.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidState`] outside [`PopulatorState::Created`],
    /// or [`IndexError::Storage`] if initialization fails (the build then
    /// moves to [`PopulatorState::Failed`]).
    pub fn create(&mut self) -> IndexResult<()> {
        self.ensure(PopulatorState::Created, "create")?;

        let result = (|| -> IndexResult<()> {
            let mut tx = self.engine.begin_write()?;
            tx.drop_region(&self.region)?;
            IndexHeader::building(self.codec.codec_id()).write(&mut tx, &self.region)?;
            tx.commit()?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                self.state = PopulatorState::Populating;
                debug!(region = %self.region, codec = self.codec.codec_id(), "population started");
                Ok(())
            }
            Err(e) => Err(self.fail_with(e)),
        }
    }

    /// Add a batch of scanned (entity, value) pairs.
    ///
    /// Batches may be arbitrarily large, may repeat entities, and may arrive
    /// in any entity order; each batch is one storage transaction.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Encoding`] if any value lies outside the
    /// codec's domain, or [`IndexError::Storage`] if the insert fails.
    /// Either failure aborts the whole build.
    pub fn add(&mut self, batch: &[(EntityId, C::Input)]) -> IndexResult<()> {
        self.ensure_populating("add")?;

        // Encode everything before writing anything: an encoding failure
        // must not leave a partial batch behind.
        let mut keys = Vec::with_capacity(batch.len());
        for (entity_id, input) in batch {
            match self.codec.encode_key(*entity_id, input) {
                Ok(key) => keys.push(key.storage_key()),
                Err(e) => return Err(self.fail_with(e.into())),
            }
        }

        if let Err(e) = self.write_keys(&keys) {
            return Err(self.fail_with(e));
        }
        self.monitor.batch_added(keys.len());
        debug!(region = %self.region, keys = keys.len(), "batch added");
        Ok(())
    }

    /// Queue a concurrent update observed while the scan is running.
    ///
    /// Updates are applied, strictly in arrival order, when
    /// [`scan_completed`](Self::scan_completed) is called.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidState`] outside the populating phase.
    pub fn apply_update(&mut self, update: IndexUpdate<C::Input>) -> IndexResult<()> {
        self.ensure_populating("apply an update")?;
        self.pending_updates.push(update);
        Ok(())
    }

    /// Mark the initial scan as complete and replay queued updates.
    ///
    /// For a unique index the build then moves to
    /// [`PopulatorState::Verifying`]; a non-unique build becomes
    /// close-ready.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidState`] outside the populating phase,
    /// or the error that failed the update replay.
    pub fn scan_completed(&mut self) -> IndexResult<()> {
        self.ensure_populating("complete the scan")?;

        let updates = std::mem::take(&mut self.pending_updates);
        if let Err(e) = self.replay_updates(&updates) {
            return Err(self.fail_with(e));
        }
        if !updates.is_empty() {
            self.monitor.updates_applied(updates.len());
        }

        self.scan_done = true;
        if self.descriptor.unique {
            self.state = PopulatorState::Verifying;
        }
        debug!(region = %self.region, updates = updates.len(), "scan completed");
        Ok(())
    }

    /// Close the build.
    ///
    /// `close(false)` drops the build regardless of state: the region and
    /// its header are deleted and all resources released. `close(true)`
    /// verifies uniqueness first (for unique indexes), then flushes and
    /// marks the region online.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::UniquenessViolated`] with the aggregated
    /// violation report if verification fails, [`IndexError::BuildFailed`]
    /// when closing a failed build successfully, or [`IndexError::Storage`]
    /// if the flush fails.
    pub fn close(&mut self, successful: bool) -> IndexResult<()> {
        if !successful {
            return self.drop_build();
        }

        match self.state {
            PopulatorState::Failed => {
                Err(IndexError::BuildFailed(self.failure.clone().unwrap_or_default()))
            }
            PopulatorState::Verifying => self.verify_then_finish(),
            PopulatorState::Populating if self.scan_done && !self.descriptor.unique => {
                self.finish()
            }
            state => Err(IndexError::InvalidState { state, operation: "close" }),
        }
    }

    /// Force the build into [`PopulatorState::Failed`].
    ///
    /// Used when an external error (storage I/O in the scan driver,
    /// cancellation) occurs outside the populator's own calls. Terminal
    /// states keep their outcome; repeated calls keep the first reason.
    pub fn mark_as_failed(&mut self, reason: impl Into<String>) {
        if self.state.is_terminal() || self.state == PopulatorState::Failed {
            return;
        }
        let reason = reason.into();
        warn!(region = %self.region, %reason, "index build failed");
        self.state = PopulatorState::Failed;
        self.failure = Some(reason);
        self.pending_updates = Vec::new();
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

    /// Populating, with the scan still running.
    fn ensure_populating(&self, operation: &'static str) -> IndexResult<()> {
        self.ensure(PopulatorState::Populating, operation)?;
        if self.scan_done {
            return Err(IndexError::InvalidState { state: self.state, operation });
        }
        Ok(())
    }

    /// Record a failure and hand the error back for propagation.
    fn fail_with(&mut self, error: IndexError) -> IndexError {
        self.mark_as_failed(error.to_string());
        error
    }

    fn write_keys(&self, keys: &[Vec<u8>]) -> IndexResult<()> {
        let mut tx = self.engine.begin_write()?;
        for key in keys {
            tx.put(&self.region, key, &[])?;
        }
        tx.commit()?;
        Ok(())
    }

    fn replay_updates(&self, updates: &[IndexUpdate<C::Input>]) -> IndexResult<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let mut tx = self.engine.begin_write()?;
        for update in updates {
            if let Some(before) = &update.before {
                let key = self.codec.encode_key(update.entity_id, before)?;
                tx.delete(&self.region, &key.storage_key())?;
            }
            if let Some(after) = &update.after {
                let key = self.codec.encode_key(update.entity_id, after)?;
                tx.put(&self.region, &key.storage_key(), &[])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Run uniqueness verification without finishing the build.
    ///
    /// A non-empty report moves the build to [`PopulatorState::Failed`]; an
    /// empty one leaves it in [`PopulatorState::Verifying`] so the caller
    /// can aggregate results across partitions before anything finishes.
    /// Re-runs after a clean pass are free.
    pub(crate) fn run_verification(&mut self) -> IndexResult<UniquenessReport> {
        self.ensure(PopulatorState::Verifying, "verify")?;
        if self.verified {
            return Ok(UniquenessReport::default());
        }

        self.monitor.verification_started();
        info!(region = %self.region, "uniqueness verification started");

        let verification = (|| -> IndexResult<UniquenessReport> {
            let tx = self.engine.begin_read()?;
            verify_unique(&tx, &self.region, &self.codec)
        })();
        let report = match verification {
            Ok(report) => report,
            Err(e) => return Err(self.fail_with(e)),
        };

        if report.is_empty() {
            self.verified = true;
        } else {
            self.monitor.violations_found(&report);
            self.mark_as_failed(format!("uniqueness constraint violated: {report}"));
        }
        Ok(report)
    }

    fn verify_then_finish(&mut self) -> IndexResult<()> {
        let report = self.run_verification()?;
        if !report.is_empty() {
            return Err(IndexError::UniquenessViolated(report));
        }
        self.finish()
    }

    fn finish(&mut self) -> IndexResult<()> {
        let result = (|| -> IndexResult<()> {
            let mut tx = self.engine.begin_write()?;
            IndexHeader::online(self.codec.codec_id()).write(&mut tx, &self.region)?;
            tx.commit()?;
            self.engine.flush()?;
            Ok(())
        })();
        if let Err(e) = result {
            return Err(self.fail_with(e));
        }

        self.state = PopulatorState::Online;
        self.monitor.population_completed(true);
        info!(region = %self.region, "index online");
        Ok(())
    }

    fn drop_build(&mut self) -> IndexResult<()> {
        if self.state.is_terminal() {
            return Err(IndexError::InvalidState { state: self.state, operation: "drop" });
        }
        let was_failed = self.state == PopulatorState::Failed;

        let result = (|| -> IndexResult<()> {
            let mut tx = self.engine.begin_write()?;
            tx.drop_region(&self.region)?;
            IndexHeader::remove(&mut tx, &self.region)?;
            tx.commit()?;
            Ok(())
        })();
        if let Err(e) = result {
            return Err(self.fail_with(e));
        }

        self.pending_updates = Vec::new();
        self.state = PopulatorState::Dropped;
        if !was_failed {
            self.monitor.population_completed(false);
        }
        info!(region = %self.region, "index build dropped");
        Ok(())
    }
}
