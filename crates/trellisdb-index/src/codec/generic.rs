//! Generic composite key codec.
//!
//! Handles indexes over one or more property slots of possibly mixed types,
//! including spatial. Every slot is encoded as a leading cross-type tag byte
//! followed by the slot's domain encoding, and the slots are concatenated in
//! order. Because fixed-width domains are self-sized and variable-width
//! domains self-terminate, plain lexicographic comparison of the
//! concatenation realizes slot-by-slot order: slot 0 decides first, later
//! slots only break ties, and the entity id suffix breaks full-tuple ties.
//!
//! The tag bytes fix one deterministic cross-type order for the index's
//! whole lifetime — every number sorts before every string in the same
//! slot, and the null tag sorts before everything.
//!
//! Spatial slots encode as the point's CRS id followed by the derived value
//! of the curve frozen for this build; the codec therefore owns an
//! [`IndexCurveSettings`] snapshot taken at populator construction.

use std::sync::Arc;

use trellisdb_core::encoding::sortable::{decode_escaped, encode_escaped};
use trellisdb_core::{EncodingError, TemporalGroup, Value};

use crate::curve::IndexCurveSettings;

use super::number::{decode_number, NUMBER_KEY_WIDTH};
use super::temporal::{decode_temporal, encode_temporal, temporal_width};
use super::{KeyCodec, NumberCodec};

/// Cross-type slot tags, in sort order.
///
/// The relative order of these constants is part of the persisted key
/// layout; changing it requires a [`crate::header::LAYOUT_VERSION`] bump.
pub mod slot_tags {
    /// Absent/null slot values sort before all real values.
    pub const NULL: u8 = 0x00;
    /// Booleans (false before true).
    pub const BOOL: u8 = 0x01;
    /// The unified int/float numeric domain.
    pub const NUMBER: u8 = 0x02;
    /// UTF-8 strings.
    pub const STRING: u8 = 0x03;
    /// Raw bytes.
    pub const BYTES: u8 = 0x04;
    /// Calendar dates.
    pub const DATE: u8 = 0x05;
    /// Times of day.
    pub const LOCAL_TIME: u8 = 0x06;
    /// Times of day with UTC offset.
    pub const ZONED_TIME: u8 = 0x07;
    /// Zone-less date-times.
    pub const LOCAL_DATE_TIME: u8 = 0x08;
    /// Offset-carrying date-times.
    pub const ZONED_DATE_TIME: u8 = 0x09;
    /// Calendar-aware durations.
    pub const DURATION: u8 = 0x0A;
    /// Spatial points (CRS id + curve derived value).
    pub const POINT: u8 = 0x0B;
}

/// Encoded width of a spatial slot body: CRS id plus curve derived value.
const POINT_BODY_WIDTH: usize = 4 + 8;

/// Key codec for composite tuples of mixed-type slots.
#[derive(Debug, Clone)]
pub struct GenericCodec {
    slot_count: usize,
    curves: Arc<IndexCurveSettings>,
}

impl GenericCodec {
    /// Create a codec for `slot_count` slots with a frozen curve snapshot.
    #[must_use]
    pub const fn new(slot_count: usize, curves: Arc<IndexCurveSettings>) -> Self {
        Self { slot_count, curves }
    }

    /// Number of slots per tuple.
    #[inline]
    #[must_use]
    pub const fn slot_count(&self) -> usize {
        self.slot_count
    }

    fn encode_slot(&self, value: &Value, buf: &mut Vec<u8>) -> Result<(), EncodingError> {
        match value {
            Value::Null => buf.push(slot_tags::NULL),
            Value::Bool(b) => {
                buf.push(slot_tags::BOOL);
                buf.push(u8::from(*b));
            }
            Value::Int(_) | Value::Float(_) => {
                buf.push(slot_tags::NUMBER);
                buf.extend_from_slice(&NumberCodec::new().encode_value(value)?);
            }
            Value::String(s) => {
                buf.push(slot_tags::STRING);
                encode_escaped(s.as_bytes(), buf);
            }
            Value::Bytes(b) => {
                buf.push(slot_tags::BYTES);
                encode_escaped(b, buf);
            }
            Value::Date(_) => {
                buf.push(slot_tags::DATE);
                encode_temporal(TemporalGroup::Date, value, buf)?;
            }
            Value::LocalTime(_) => {
                buf.push(slot_tags::LOCAL_TIME);
                encode_temporal(TemporalGroup::LocalTime, value, buf)?;
            }
            Value::ZonedTime { .. } => {
                buf.push(slot_tags::ZONED_TIME);
                encode_temporal(TemporalGroup::ZonedTime, value, buf)?;
            }
            Value::LocalDateTime(_) => {
                buf.push(slot_tags::LOCAL_DATE_TIME);
                encode_temporal(TemporalGroup::LocalDateTime, value, buf)?;
            }
            Value::ZonedDateTime(_) => {
                buf.push(slot_tags::ZONED_DATE_TIME);
                encode_temporal(TemporalGroup::ZonedDateTime, value, buf)?;
            }
            Value::Duration(_) => {
                buf.push(slot_tags::DURATION);
                encode_temporal(TemporalGroup::Duration, value, buf)?;
            }
            Value::Point { x, y, z, srid } => {
                buf.push(slot_tags::POINT);
                let derived = self.derive_point(*x, *y, *z, *srid)?;
                buf.extend_from_slice(&srid.to_be_bytes());
                buf.extend_from_slice(&derived.to_be_bytes());
            }
        }
        Ok(())
    }

    fn derive_point(
        &self,
        x: f64,
        y: f64,
        z: Option<f64>,
        srid: u32,
    ) -> Result<u64, EncodingError> {
        let curve = self.curves.curve_for(srid)?;
        let coords: Vec<f64> = match z {
            Some(z) => vec![x, y, z],
            None => vec![x, y],
        };
        if coords.len() != curve.dimensions() {
            return Err(EncodingError::Malformed(format!(
                "point has {} coordinate(s), crs {srid} expects {}",
                coords.len(),
                curve.dimensions()
            )));
        }
        for (axis, &v) in coords.iter().enumerate() {
            if v < curve.axis_min(axis) || v > curve.axis_max(axis) {
                return Err(EncodingError::PointOutOfBounds {
                    crs: srid,
                    axis,
                    value: v,
                    min: curve.axis_min(axis),
                    max: curve.axis_max(axis),
                });
            }
        }
        curve.derived_value(&coords).ok_or_else(|| {
            EncodingError::Malformed(format!("curve for crs {srid} rejected in-envelope point"))
        })
    }

    /// Render one slot starting at `bytes`, returning the rendering and the
    /// number of bytes consumed.
    fn describe_slot(bytes: &[u8]) -> Option<(String, usize)> {
        let tag = *bytes.first()?;
        let body = &bytes[1..];
        match tag {
            slot_tags::NULL => Some(("null".to_owned(), 1)),
            slot_tags::BOOL => {
                let b = *body.first()?;
                Some(((b != 0).to_string(), 2))
            }
            slot_tags::NUMBER => {
                let value = decode_number(body.get(..NUMBER_KEY_WIDTH)?)?;
                Some((value.to_string(), 1 + NUMBER_KEY_WIDTH))
            }
            slot_tags::STRING => {
                let (decoded, consumed) = decode_escaped(body).ok()?;
                let s = String::from_utf8(decoded).ok()?;
                Some((s, 1 + consumed))
            }
            slot_tags::BYTES => {
                let (decoded, consumed) = decode_escaped(body).ok()?;
                Some((Value::Bytes(decoded).to_string(), 1 + consumed))
            }
            slot_tags::DATE
            | slot_tags::LOCAL_TIME
            | slot_tags::ZONED_TIME
            | slot_tags::LOCAL_DATE_TIME
            | slot_tags::ZONED_DATE_TIME
            | slot_tags::DURATION => {
                let group = match tag {
                    slot_tags::DATE => TemporalGroup::Date,
                    slot_tags::LOCAL_TIME => TemporalGroup::LocalTime,
                    slot_tags::ZONED_TIME => TemporalGroup::ZonedTime,
                    slot_tags::LOCAL_DATE_TIME => TemporalGroup::LocalDateTime,
                    slot_tags::ZONED_DATE_TIME => TemporalGroup::ZonedDateTime,
                    _ => TemporalGroup::Duration,
                };
                let width = temporal_width(group);
                let value = decode_temporal(group, body.get(..width)?)?;
                Some((value.to_string(), 1 + width))
            }
            slot_tags::POINT => {
                let crs = u32::from_be_bytes(body.get(..4)?.try_into().ok()?);
                let derived = u64::from_be_bytes(body.get(4..12)?.try_into().ok()?);
                Some((format!("point(crs={crs}, cell={derived})"), 1 + POINT_BODY_WIDTH))
            }
            _ => None,
        }
    }
}

impl KeyCodec for GenericCodec {
    type Input = Vec<Value>;

    fn codec_id(&self) -> &'static str {
        "generic"
    }

    fn encode_value(&self, input: &Self::Input) -> Result<Vec<u8>, EncodingError> {
        if input.len() != self.slot_count {
            return Err(EncodingError::SlotCount {
                expected: self.slot_count,
                actual: input.len(),
            });
        }
        let mut bytes = Vec::with_capacity(self.encoded_size(input));
        for value in input {
            self.encode_slot(value, &mut bytes)?;
        }
        Ok(bytes)
    }

    fn encoded_size(&self, input: &Self::Input) -> usize {
        input
            .iter()
            .map(|value| {
                1 + match value {
                    Value::Null => 0,
                    Value::Bool(_) => 1,
                    Value::Int(_) | Value::Float(_) => NUMBER_KEY_WIDTH,
                    Value::String(s) => s.len() + 2,
                    Value::Bytes(b) => b.len() + 2,
                    Value::Point { .. } => POINT_BODY_WIDTH,
                    temporal => {
                        temporal.temporal_group().map_or(0, temporal_width)
                    }
                }
            })
            .sum()
    }

    fn highest(&self) -> Vec<u8> {
        // Every slot starts with a tag byte below 0xFF
        vec![0xFF]
    }

    fn describe(&self, value_bytes: &[u8]) -> Option<String> {
        let mut slots = Vec::with_capacity(self.slot_count);
        let mut rest = value_bytes;
        while !rest.is_empty() {
            let (rendered, consumed) = Self::describe_slot(rest)?;
            slots.push(rendered);
            rest = &rest[consumed..];
        }
        match slots.len() {
            0 => None,
            1 => slots.pop(),
            _ => Some(format!("({})", slots.join(", "))),
        }
    }
}
