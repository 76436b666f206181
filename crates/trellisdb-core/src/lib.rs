//! `TrellisDB` Core
//!
//! This crate provides the fundamental types shared by the `TrellisDB` index
//! machinery.
//!
//! # Overview
//!
//! - **Identifiers**: [`EntityId`] for referencing the graph entity that owns
//!   an index entry
//! - **Values**: the [`Value`] enum covering scalar, temporal, and spatial
//!   property values, plus the [`TemporalGroup`] classification and the
//!   calendar-aware [`Duration`] type
//! - **Encoding primitives**: order-preserving binary transforms used by every
//!   key codec ([`encoding::sortable`])
//! - **Errors**: [`EncodingError`] for values a codec cannot represent
//!
//! # Example
//!
//! ```
//! use trellisdb_core::{EntityId, Value};
//!
//! let owner = EntityId::new(42);
//! let value = Value::Int(30);
//!
//! assert_eq!(owner.as_u64(), 42);
//! assert_eq!(value.as_int(), Some(30));
//! assert!(value.temporal_group().is_none());
//! ```
//!
//! # Modules
//!
//! - [`types`] - Core data types ([`EntityId`], [`Value`], [`Duration`])
//! - [`encoding`] - Order-preserving encoding primitives
//! - [`error`] - Error types ([`EncodingError`])

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod encoding;
pub mod error;
pub mod types;

pub use error::EncodingError;
pub use types::{Duration, EntityId, TemporalGroup, Value};
