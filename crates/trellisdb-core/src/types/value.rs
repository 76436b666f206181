//! Property values that can be stored on entities and indexed.
//!
//! This module provides the [`Value`] enum, which represents all property
//! value types the index machinery can encode: scalars, six temporal
//! subtypes, and spatial points.
//!
//! # Temporal value groups
//!
//! Each temporal subtype has its own fixed binary key layout, so temporal
//! indexes are partitioned by [`TemporalGroup`]. Values from different groups
//! never compare equal and never share a partition.
//!
//! # Example
//!
//! ```
//! use trellisdb_core::{TemporalGroup, Value};
//!
//! let age: Value = 30i64.into();
//! let name: Value = "Alice".into();
//! let birthday = Value::Date(chrono::NaiveDate::from_ymd_opt(1990, 4, 12).unwrap());
//!
//! assert_eq!(age.as_int(), Some(30));
//! assert_eq!(name.as_str(), Some("Alice"));
//! assert_eq!(birthday.temporal_group(), Some(TemporalGroup::Date));
//! ```

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Average number of seconds in one calendar month (per the Gregorian mean
/// year of 365.2425 days). Used to place durations on a single physical
/// timeline for ordering.
pub const AVG_SECONDS_PER_MONTH: i64 = 2_629_746;

/// Number of seconds in one day.
pub const SECONDS_PER_DAY: i64 = 86_400;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// A calendar-aware duration.
///
/// Months and days are kept separate from seconds because their physical
/// length depends on the calendar context (`P1M` is 28 to 31 days). Ordering
/// follows the duration's *average* physical length, with the nanosecond,
/// month, and day components as deterministic tie-breakers so that the order
/// is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Duration {
    /// Whole calendar months.
    pub months: i64,
    /// Whole days, in addition to `months`.
    pub days: i64,
    /// Seconds, in addition to `days`.
    pub seconds: i64,
    /// Nanoseconds, normalized to `0..1_000_000_000`.
    pub nanos: i32,
}

impl Duration {
    /// Create a duration, normalizing nanoseconds into `0..1_000_000_000` by
    /// moving whole seconds into the `seconds` component.
    #[must_use]
    pub fn new(months: i64, days: i64, seconds: i64, nanos: i64) -> Self {
        let carry = nanos.div_euclid(NANOS_PER_SECOND);
        let nanos = nanos.rem_euclid(NANOS_PER_SECOND);
        Self {
            months,
            days,
            seconds: seconds.saturating_add(carry),
            // Normalized remainder is < 1e9 so the narrowing cast is exact.
            nanos: nanos as i32,
        }
    }

    /// The duration's average physical length in whole seconds.
    ///
    /// This is the primary ordering criterion: a month counts as
    /// [`AVG_SECONDS_PER_MONTH`] seconds, a day as [`SECONDS_PER_DAY`].
    #[must_use]
    pub fn avg_seconds(&self) -> i64 {
        self.months
            .saturating_mul(AVG_SECONDS_PER_MONTH)
            .saturating_add(self.days.saturating_mul(SECONDS_PER_DAY))
            .saturating_add(self.seconds)
    }
}

impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Duration {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.avg_seconds(), self.nanos, self.months, self.days).cmp(&(
            other.avg_seconds(),
            other.nanos,
            other.months,
            other.days,
        ))
    }
}

impl std::fmt::Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}M{}DT{}", self.months, self.days, self.seconds)?;
        if self.nanos != 0 {
            write!(f, ".{:09}", self.nanos)?;
        }
        write!(f, "S")
    }
}

/// The temporal value groups, each with its own disjoint binary key layout.
///
/// The derived `Ord` fixes the relative order of groups inside composite
/// keys; it has no meaning across index partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TemporalGroup {
    /// Calendar dates without a time component.
    Date,
    /// Times of day without a date or zone.
    LocalTime,
    /// Times of day with a fixed UTC offset.
    ZonedTime,
    /// Date-times without a zone.
    LocalDateTime,
    /// Date-times with a fixed UTC offset.
    ZonedDateTime,
    /// Calendar-aware durations.
    Duration,
}

impl TemporalGroup {
    /// Every group, in a fixed order. Used to name partitions and to fan out
    /// dispatcher operations deterministically.
    pub const ALL: [Self; 6] = [
        Self::Date,
        Self::LocalTime,
        Self::ZonedTime,
        Self::LocalDateTime,
        Self::ZonedDateTime,
        Self::Duration,
    ];

    /// Stable name of the group, used in partition region names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::LocalTime => "local-time",
            Self::ZonedTime => "zoned-time",
            Self::LocalDateTime => "local-datetime",
            Self::ZonedDateTime => "zoned-datetime",
            Self::Duration => "duration",
        }
    }
}

impl std::fmt::Display for TemporalGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property value that can be stored on an entity and indexed.
///
/// # Supported Types
///
/// | Variant | Rust Type | Use Case |
/// |---------|-----------|----------|
/// | `Null` | - | Missing/optional values |
/// | `Bool` | `bool` | Boolean flags |
/// | `Int` | `i64` | Integers, counters |
/// | `Float` | `f64` | Numeric measurements |
/// | `String` | `String` | Text data |
/// | `Bytes` | `Vec<u8>` | Binary data |
/// | `Date` | `NaiveDate` | Calendar dates |
/// | `LocalTime` | `NaiveTime` | Times of day |
/// | `ZonedTime` | `NaiveTime` + offset | Times of day with UTC offset |
/// | `LocalDateTime` | `NaiveDateTime` | Zone-less date-times |
/// | `ZonedDateTime` | `DateTime<FixedOffset>` | Offset-carrying date-times |
/// | `Duration` | [`Duration`] | Calendar-aware durations |
/// | `Point` | coordinates + srid | Spatial data |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null/missing value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Calendar date without a time component
    Date(NaiveDate),
    /// Time of day without a date or zone
    LocalTime(NaiveTime),
    /// Time of day with a fixed UTC offset
    ZonedTime {
        /// Local wall-clock time of day.
        time: NaiveTime,
        /// Offset from UTC in seconds, positive east of Greenwich.
        offset_seconds: i32,
    },
    /// Date-time without a zone
    LocalDateTime(NaiveDateTime),
    /// Date-time with a fixed UTC offset
    ZonedDateTime(DateTime<FixedOffset>),
    /// Calendar-aware duration
    Duration(Duration),
    /// Spatial point for geographic and cartesian data.
    ///
    /// - Geographic points use WGS84 (srid 4326, or 7203 for 3D) with
    ///   longitude as `x` and latitude as `y`
    /// - Cartesian points use srid 0 (2D) or 9157 (3D)
    Point {
        /// X coordinate (or longitude for geographic points)
        x: f64,
        /// Y coordinate (or latitude for geographic points)
        y: f64,
        /// Optional Z coordinate (height/elevation)
        z: Option<f64>,
        /// Spatial Reference System Identifier
        srid: u32,
    },
}

impl Value {
    /// Returns `true` if the value is null.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the value as an integer if it is one.
    #[inline]
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a float if it is one.
    #[inline]
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the value as a string slice if it is one.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a point if it is one.
    ///
    /// Returns a tuple of (x, y, z, srid) where z is optional.
    #[inline]
    #[must_use]
    pub const fn as_point(&self) -> Option<(f64, f64, Option<f64>, u32)> {
        match self {
            Self::Point { x, y, z, srid } => Some((*x, *y, *z, *srid)),
            _ => None,
        }
    }

    /// The temporal value group this value belongs to, or `None` for
    /// non-temporal values.
    #[must_use]
    pub const fn temporal_group(&self) -> Option<TemporalGroup> {
        match self {
            Self::Date(_) => Some(TemporalGroup::Date),
            Self::LocalTime(_) => Some(TemporalGroup::LocalTime),
            Self::ZonedTime { .. } => Some(TemporalGroup::ZonedTime),
            Self::LocalDateTime(_) => Some(TemporalGroup::LocalDateTime),
            Self::ZonedDateTime(_) => Some(TemporalGroup::ZonedDateTime),
            Self::Duration(_) => Some(TemporalGroup::Duration),
            _ => None,
        }
    }

    /// Human-readable type name, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Date(_) => "date",
            Self::LocalTime(_) => "local-time",
            Self::ZonedTime { .. } => "zoned-time",
            Self::LocalDateTime(_) => "local-datetime",
            Self::ZonedDateTime(_) => "zoned-datetime",
            Self::Duration(_) => "duration",
            Self::Point { .. } => "point",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
            Self::Bytes(b) => {
                f.write_str("0x")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Self::Date(d) => write!(f, "{d}"),
            Self::LocalTime(t) => write!(f, "{t}"),
            Self::ZonedTime { time, offset_seconds } => {
                let sign = if *offset_seconds < 0 { '-' } else { '+' };
                let abs = offset_seconds.unsigned_abs();
                write!(f, "{time}{sign}{:02}:{:02}", abs / 3600, abs % 3600 / 60)
            }
            Self::LocalDateTime(dt) => write!(f, "{dt}"),
            Self::ZonedDateTime(dt) => write!(f, "{dt}"),
            Self::Duration(d) => write!(f, "{d}"),
            Self::Point { x, y, z, srid } => match z {
                Some(z) => write!(f, "point({x}, {y}, {z}; crs={srid})"),
                None => write!(f, "point({x}, {y}; crs={srid})"),
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Self::LocalTime(t)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Self::LocalDateTime(dt)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self::ZonedDateTime(dt)
    }
}

impl From<Duration> for Value {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

/// Nanosecond of day for a wall-clock time, including leap-second overflow.
#[must_use]
pub fn nanos_of_day(time: &NaiveTime) -> u64 {
    u64::from(time.num_seconds_from_midnight()) * 1_000_000_000 + u64::from(time.nanosecond())
}
