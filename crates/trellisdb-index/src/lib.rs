//! `TrellisDB` Index
//!
//! Native index population and uniqueness verification for `TrellisDB`.
//!
//! # Overview
//!
//! A native index is an on-disk structure keyed by a type-specific,
//! totally-ordered binary encoding of property values. This crate builds
//! them: a scan driver feeds (entity, value) pairs into a populator, which
//! encodes each value through a [`KeyCodec`] and forwards the keys to a
//! sorted storage region; when the scan completes, queued concurrent
//! updates are replayed, a uniqueness constraint (if any) is verified in
//! one ordered pass, and the region is flushed and marked online.
//!
//! # Components
//!
//! - [`codec`] - per value-domain key codecs (number, string, temporal
//!   groups, composite/spatial)
//! - [`curve`] - space-filling curve settings, frozen per build
//! - [`populator`] - the [`IndexPopulator`] state machine core
//! - [`verify`] - the streaming uniqueness verifier
//! - [`temporal`] - the per-value-group dispatcher
//! - [`generic`] - the composite/spatial populator
//! - [`descriptor`] - read-only index schema metadata
//! - [`header`] - persisted region headers guarding re-opens
//! - [`monitor`] - fire-and-forget observability hooks
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellisdb_core::{EntityId, Value};
//! use trellisdb_index::{IndexDescriptor, IndexId, IndexPopulator, NumberCodec};
//! use trellisdb_storage::backends::RedbEngine;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = Arc::new(RedbEngine::in_memory()?);
//! let descriptor = Arc::new(
//!     IndexDescriptor::builder(IndexId::new(1), 42).property(666).unique(true).build(),
//! );
//!
//! let region = descriptor.region_name();
//! let mut populator =
//!     IndexPopulator::new(descriptor, NumberCodec::new(), engine, region);
//! populator.create()?;
//! populator.add(&[(EntityId::new(1), Value::Int(5)), (EntityId::new(2), Value::Int(7))])?;
//! populator.scan_completed()?;
//! populator.close(true)?;
//! # Ok(())
//! # }
//! ```

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod codec;
pub mod curve;
pub mod descriptor;
pub mod error;
pub mod generic;
pub mod header;
pub mod monitor;
pub mod populator;
pub mod temporal;
pub mod verify;

pub use codec::{GenericCodec, IndexKey, KeyCodec, NumberCodec, StringCodec, TemporalCodec};
pub use curve::{
    ConfiguredCurveSettings, CurveSettings, CurveSettingsProvider, IndexCurveSettings, ZOrderCurve,
};
pub use descriptor::{IndexDescriptor, IndexId};
pub use error::{IndexError, IndexResult};
pub use generic::GenericIndexPopulator;
pub use header::{BuildState, IndexHeader, HEADER_REGION, LAYOUT_VERSION};
pub use monitor::{NoopMonitor, PopulationMonitor};
pub use populator::{IndexPopulator, IndexUpdate, PopulatorState};
pub use temporal::TemporalIndexPopulator;
pub use verify::{
    verify_unique, UniquenessReport, UniquenessViolation, MAX_ENTITIES_PER_VIOLATION,
    MAX_REPORTED_VIOLATIONS,
};
