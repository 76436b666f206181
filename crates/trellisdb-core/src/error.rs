//! Error types for the core crate.

use thiserror::Error;

/// Errors raised when a property value cannot be turned into an index key.
///
/// Any of these aborts the index build that produced it: the populator never
/// persists a partial key set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodingError {
    /// The value's type is outside the domain the codec covers.
    #[error("value of type {actual} is not supported by the {codec} codec")]
    UnsupportedType {
        /// Identifier of the codec that rejected the value.
        codec: &'static str,
        /// Type name of the offending value.
        actual: &'static str,
    },

    /// A point coordinate falls outside the configured curve envelope.
    #[error(
        "point coordinate {value} on axis {axis} is outside the curve envelope \
         [{min}, {max}] for crs {crs}"
    )]
    PointOutOfBounds {
        /// Coordinate reference system of the point.
        crs: u32,
        /// Zero-based axis index of the offending coordinate.
        axis: usize,
        /// The coordinate value.
        value: f64,
        /// Lower envelope bound for the axis.
        min: f64,
        /// Upper envelope bound for the axis.
        max: f64,
    },

    /// No curve settings are configured for the point's coordinate reference
    /// system.
    #[error("no curve settings configured for crs {0}")]
    UnknownCrs(u32),

    /// A composite value has the wrong number of slots for its index.
    #[error("composite value has {actual} slot(s), index expects {expected}")]
    SlotCount {
        /// Slot count the index descriptor declares.
        expected: usize,
        /// Slot count of the value that arrived.
        actual: usize,
    },

    /// Encoded bytes are truncated or structurally invalid.
    #[error("malformed key encoding: {0}")]
    Malformed(String),
}
