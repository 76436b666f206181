//! Temporal key codecs: one fixed-width layout per value group.
//!
//! Each temporal value group owns a disjoint binary layout, and each
//! [`TemporalCodec`] instance covers exactly one group — a value from any
//! other group is an encoding error, never a silent cross-group key. Zoned
//! layouts order by the UTC-normalized instant first and use the offset only
//! as a deterministic tie-breaker, so simultaneous values with different
//! offsets stay adjacent but distinct.
//!
//! # Layouts
//!
//! | Group | Bytes | Fields |
//! |-------|-------|--------|
//! | date | 8 | epoch day (sign-flipped) |
//! | local-time | 8 | nanosecond of day |
//! | zoned-time | 12 | UTC nanosecond of day (sign-flipped), offset seconds (sign-flipped) |
//! | local-datetime | 12 | epoch second (sign-flipped), nanosecond |
//! | zoned-datetime | 16 | UTC epoch second (sign-flipped), nanosecond, offset seconds (sign-flipped) |
//! | duration | 28 | average seconds (sign-flipped), nanosecond, months (sign-flipped), days (sign-flipped) |

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta};
use trellisdb_core::encoding::sortable::{
    restore_i32, restore_i64, sortable_i32, sortable_i64,
};
use trellisdb_core::types::value::nanos_of_day;
use trellisdb_core::{Duration, EncodingError, TemporalGroup, Value};

use super::KeyCodec;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Encoded width of one temporal key's value part, per group.
#[must_use]
pub const fn temporal_width(group: TemporalGroup) -> usize {
    match group {
        TemporalGroup::Date | TemporalGroup::LocalTime => 8,
        TemporalGroup::ZonedTime | TemporalGroup::LocalDateTime => 12,
        TemporalGroup::ZonedDateTime => 16,
        TemporalGroup::Duration => 28,
    }
}

/// Append the fixed-width encoding of a temporal value to `buf`.
///
/// # Errors
///
/// Returns [`EncodingError::UnsupportedType`] if the value does not belong
/// to `group`.
pub fn encode_temporal(
    group: TemporalGroup,
    value: &Value,
    buf: &mut Vec<u8>,
) -> Result<(), EncodingError> {
    let mismatch = || EncodingError::UnsupportedType {
        codec: temporal_codec_id(group),
        actual: value.type_name(),
    };

    match (group, value) {
        (TemporalGroup::Date, Value::Date(date)) => {
            let epoch_day = date.signed_duration_since(NaiveDate::default()).num_days();
            buf.extend_from_slice(&sortable_i64(epoch_day));
        }
        (TemporalGroup::LocalTime, Value::LocalTime(time)) => {
            buf.extend_from_slice(&nanos_of_day(time).to_be_bytes());
        }
        (TemporalGroup::ZonedTime, Value::ZonedTime { time, offset_seconds }) => {
            let utc_nanos =
                nanos_of_day(time) as i64 - i64::from(*offset_seconds) * NANOS_PER_SECOND;
            buf.extend_from_slice(&sortable_i64(utc_nanos));
            buf.extend_from_slice(&sortable_i32(*offset_seconds));
        }
        (TemporalGroup::LocalDateTime, Value::LocalDateTime(dt)) => {
            let utc = dt.and_utc();
            buf.extend_from_slice(&sortable_i64(utc.timestamp()));
            buf.extend_from_slice(&utc.timestamp_subsec_nanos().to_be_bytes());
        }
        (TemporalGroup::ZonedDateTime, Value::ZonedDateTime(dt)) => {
            buf.extend_from_slice(&sortable_i64(dt.timestamp()));
            buf.extend_from_slice(&dt.timestamp_subsec_nanos().to_be_bytes());
            buf.extend_from_slice(&sortable_i32(dt.offset().local_minus_utc()));
        }
        (TemporalGroup::Duration, Value::Duration(d)) => {
            buf.extend_from_slice(&sortable_i64(d.avg_seconds()));
            buf.extend_from_slice(&(d.nanos as u32).to_be_bytes());
            buf.extend_from_slice(&sortable_i64(d.months));
            buf.extend_from_slice(&sortable_i64(d.days));
        }
        _ => return Err(mismatch()),
    }
    Ok(())
}

/// Decode a fixed-width temporal encoding back into a value.
///
/// Returns `None` for byte strings that do not describe a representable
/// value of the group.
#[must_use]
pub fn decode_temporal(group: TemporalGroup, bytes: &[u8]) -> Option<Value> {
    if bytes.len() != temporal_width(group) {
        return None;
    }

    match group {
        TemporalGroup::Date => {
            let epoch_day = restore_i64(bytes[..8].try_into().ok()?);
            let date = NaiveDate::default().checked_add_signed(TimeDelta::days(epoch_day))?;
            Some(Value::Date(date))
        }
        TemporalGroup::LocalTime => {
            let nanos = u64::from_be_bytes(bytes[..8].try_into().ok()?);
            Some(Value::LocalTime(time_from_nanos(nanos)?))
        }
        TemporalGroup::ZonedTime => {
            let utc_nanos = restore_i64(bytes[..8].try_into().ok()?);
            let offset_seconds = restore_i32(bytes[8..12].try_into().ok()?);
            let local_nanos = utc_nanos + i64::from(offset_seconds) * NANOS_PER_SECOND;
            let time = time_from_nanos(u64::try_from(local_nanos).ok()?)?;
            Some(Value::ZonedTime { time, offset_seconds })
        }
        TemporalGroup::LocalDateTime => {
            let seconds = restore_i64(bytes[..8].try_into().ok()?);
            let nanos = u32::from_be_bytes(bytes[8..12].try_into().ok()?);
            Some(Value::LocalDateTime(DateTime::from_timestamp(seconds, nanos)?.naive_utc()))
        }
        TemporalGroup::ZonedDateTime => {
            let seconds = restore_i64(bytes[..8].try_into().ok()?);
            let nanos = u32::from_be_bytes(bytes[8..12].try_into().ok()?);
            let offset_seconds = restore_i32(bytes[12..16].try_into().ok()?);
            let offset = FixedOffset::east_opt(offset_seconds)?;
            Some(Value::ZonedDateTime(
                DateTime::from_timestamp(seconds, nanos)?.with_timezone(&offset),
            ))
        }
        TemporalGroup::Duration => {
            let nanos = u32::from_be_bytes(bytes[8..12].try_into().ok()?);
            let months = restore_i64(bytes[12..20].try_into().ok()?);
            let days = restore_i64(bytes[20..28].try_into().ok()?);
            let avg_seconds = restore_i64(bytes[..8].try_into().ok()?);
            let seconds = avg_seconds
                - months * trellisdb_core::types::value::AVG_SECONDS_PER_MONTH
                - days * trellisdb_core::types::value::SECONDS_PER_DAY;
            Some(Value::Duration(Duration { months, days, seconds, nanos: nanos as i32 }))
        }
    }
}

fn time_from_nanos(nanos: u64) -> Option<NaiveTime> {
    let seconds = u32::try_from(nanos / NANOS_PER_SECOND as u64).ok()?;
    let subsec = (nanos % NANOS_PER_SECOND as u64) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, subsec)
}

const fn temporal_codec_id(group: TemporalGroup) -> &'static str {
    match group {
        TemporalGroup::Date => "temporal-date",
        TemporalGroup::LocalTime => "temporal-local-time",
        TemporalGroup::ZonedTime => "temporal-zoned-time",
        TemporalGroup::LocalDateTime => "temporal-local-datetime",
        TemporalGroup::ZonedDateTime => "temporal-zoned-datetime",
        TemporalGroup::Duration => "temporal-duration",
    }
}

/// Key codec for one temporal value group.
#[derive(Debug, Clone, Copy)]
pub struct TemporalCodec {
    group: TemporalGroup,
}

impl TemporalCodec {
    /// Create the codec for a group.
    #[must_use]
    pub const fn new(group: TemporalGroup) -> Self {
        Self { group }
    }

    /// The group this codec covers.
    #[inline]
    #[must_use]
    pub const fn group(&self) -> TemporalGroup {
        self.group
    }
}

impl KeyCodec for TemporalCodec {
    type Input = Value;

    fn codec_id(&self) -> &'static str {
        temporal_codec_id(self.group)
    }

    fn encode_value(&self, input: &Self::Input) -> Result<Vec<u8>, EncodingError> {
        let mut bytes = Vec::with_capacity(temporal_width(self.group));
        encode_temporal(self.group, input, &mut bytes)?;
        Ok(bytes)
    }

    fn encoded_size(&self, _input: &Self::Input) -> usize {
        temporal_width(self.group)
    }

    fn highest(&self) -> Vec<u8> {
        vec![0xFF; temporal_width(self.group) + 1]
    }

    fn describe(&self, value_bytes: &[u8]) -> Option<String> {
        decode_temporal(self.group, value_bytes).map(|v| v.to_string())
    }
}
