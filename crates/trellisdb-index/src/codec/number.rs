//! Number key codec: `Int` and `Float` in one totally ordered domain.
//!
//! Graph property semantics treat `5` and `5.0` as the same value, so a
//! number index holds both integer and float forms in one numeric order —
//! and a uniqueness constraint must see them collide. A plain `as f64`
//! conversion cannot carry that order: above 2^53 adjacent integers collapse
//! onto the same double.
//!
//! # Layout (16 bytes)
//!
//! - bytes 0-7: the greatest `f64` not exceeding the value, in the sortable
//!   bit transform (sign-flip for positives, complement for negatives, NaN
//!   above everything)
//! - bytes 8-15: big-endian residual `value - floor_double(value)`, an
//!   integer in `0..ulp` (always zero for float inputs, which are exactly
//!   representable)
//!
//! For `a < b` the floor-double is non-decreasing and the residual breaks
//! the tie inside one double bucket, so lexicographic byte order equals
//! numeric order across the mixed domain. Equal numbers — including an
//! `Int` and a `Float` of the same magnitude — encode identically.

use trellisdb_core::encoding::sortable::{restore_f64, sortable_f64};
use trellisdb_core::{EncodingError, Value};

use super::KeyCodec;

/// Encoded width of one number key's value part.
pub const NUMBER_KEY_WIDTH: usize = 16;

/// Key codec for the unified numeric domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberCodec;

impl NumberCodec {
    /// Create the codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// The greatest `f64` that does not exceed `i`, and the integer residual
/// `i - floor`.
fn floor_double(i: i64) -> (f64, u64) {
    // `as f64` rounds to nearest; step one ulp down when it rounded up.
    let d = i as f64;
    let d = if d as i128 > i128::from(i) { next_down(d) } else { d };
    // d is integral and within one ulp below i, so both casts are exact.
    let residual = (i128::from(i) - d as i128) as u64;
    (d, residual)
}

/// The next representable `f64` toward negative infinity.
///
/// Only called on finite, nonzero, integral doubles produced by `as f64`
/// rounding of an `i64`.
fn next_down(d: f64) -> f64 {
    let bits = d.to_bits();
    if d > 0.0 {
        f64::from_bits(bits - 1)
    } else {
        f64::from_bits(bits + 1)
    }
}

impl KeyCodec for NumberCodec {
    type Input = Value;

    fn codec_id(&self) -> &'static str {
        "number"
    }

    fn encode_value(&self, input: &Self::Input) -> Result<Vec<u8>, EncodingError> {
        let (primary, residual) = match input {
            Value::Int(i) => floor_double(*i),
            Value::Float(f) => (*f, 0),
            other => {
                return Err(EncodingError::UnsupportedType {
                    codec: self.codec_id(),
                    actual: other.type_name(),
                })
            }
        };

        let mut bytes = Vec::with_capacity(NUMBER_KEY_WIDTH);
        bytes.extend_from_slice(&sortable_f64(primary));
        bytes.extend_from_slice(&residual.to_be_bytes());
        Ok(bytes)
    }

    fn encoded_size(&self, _input: &Self::Input) -> usize {
        NUMBER_KEY_WIDTH
    }

    fn highest(&self) -> Vec<u8> {
        vec![0xFF; NUMBER_KEY_WIDTH + 1]
    }

    fn describe(&self, value_bytes: &[u8]) -> Option<String> {
        decode_number(value_bytes).map(|v| v.to_string())
    }
}

/// Decode a number key back into a value.
///
/// Whole numbers in `i64` range decode as [`Value::Int`] — the canonical
/// form of a number the index considers equal to its float spelling.
#[must_use]
pub fn decode_number(bytes: &[u8]) -> Option<Value> {
    if bytes.len() != NUMBER_KEY_WIDTH {
        return None;
    }
    let mut primary = [0u8; 8];
    primary.copy_from_slice(&bytes[..8]);
    let mut residual = [0u8; 8];
    residual.copy_from_slice(&bytes[8..]);

    let d = restore_f64(primary);
    let r = u64::from_be_bytes(residual);

    if r > 0 {
        // Only integer inputs carry a residual; the sum is exact by
        // construction.
        return Some(Value::Int((d as i128 + i128::from(r)) as i64));
    }
    if d.is_finite() && d.fract() == 0.0 {
        let candidate = d as i128;
        if let Ok(i) = i64::try_from(candidate) {
            return Some(Value::Int(i));
        }
    }
    Some(Value::Float(d))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn encode(value: Value) -> Vec<u8> {
        NumberCodec::new().encode_value(&value).unwrap()
    }

    // ========================================================================
    // Ordering tests
    // ========================================================================

    #[test]
    fn mixed_domain_orders_numerically() {
        let ascending = [
            Value::Float(f64::NEG_INFINITY),
            Value::Int(i64::MIN),
            Value::Float(-1.0e18),
            Value::Int(-1000),
            Value::Float(-1.5),
            Value::Int(-1),
            Value::Float(-0.5),
            Value::Int(0),
            Value::Float(0.5),
            Value::Int(1),
            Value::Float(1.5),
            Value::Int(1000),
            Value::Int(i64::MAX),
            Value::Float(1.0e19),
            Value::Float(f64::INFINITY),
            Value::Float(f64::NAN),
        ];
        let encoded: Vec<_> = ascending.iter().map(|v| encode(v.clone())).collect();
        for pair in encoded.windows(2) {
            assert!(pair[0] < pair[1], "encodings out of order");
        }
    }

    #[test]
    fn adjacent_large_integers_stay_ordered() {
        // Above 2^53 the double grid is coarser than the integers
        let base = 1i64 << 53;
        for i in [base - 1, base, base + 1, base + 2, i64::MAX - 1, i64::MAX] {
            let lo = encode(Value::Int(i - 1));
            let hi = encode(Value::Int(i));
            assert!(lo < hi, "{} and {} out of order", i - 1, i);
        }
    }

    #[test]
    fn int_and_float_of_same_magnitude_collide() {
        assert_eq!(encode(Value::Int(5)), encode(Value::Float(5.0)));
        assert_eq!(encode(Value::Int(0)), encode(Value::Float(0.0)));
        assert_eq!(encode(Value::Int(-17)), encode(Value::Float(-17.0)));
    }

    #[test]
    fn float_between_integers_sorts_between() {
        let five = encode(Value::Int(5));
        let half = encode(Value::Float(5.5));
        let six = encode(Value::Int(6));
        assert!(five < half && half < six);
    }

    // ========================================================================
    // Round-trip tests
    // ========================================================================

    #[test]
    fn decode_canonicalizes_whole_numbers() {
        for i in [i64::MIN, -1_000_000, -1, 0, 1, (1 << 53) + 1, i64::MAX] {
            let decoded = decode_number(&encode(Value::Int(i))).unwrap();
            assert_eq!(decoded, Value::Int(i), "failed for {i}");
        }
        // A whole float decodes to its canonical integer form
        assert_eq!(decode_number(&encode(Value::Float(5.0))).unwrap(), Value::Int(5));
    }

    #[test]
    fn decode_preserves_fractional_floats() {
        for f in [-1.0e300, -2.5, -f64::MIN_POSITIVE, 0.5, 3.75, 1.0e300] {
            let decoded = decode_number(&encode(Value::Float(f))).unwrap();
            assert_eq!(decoded, Value::Float(f), "failed for {f}");
        }
    }

    #[test]
    fn decode_preserves_non_finite_floats() {
        assert_eq!(
            decode_number(&encode(Value::Float(f64::INFINITY))).unwrap(),
            Value::Float(f64::INFINITY)
        );
        match decode_number(&encode(Value::Float(f64::NAN))).unwrap() {
            Value::Float(f) => assert!(f.is_nan()),
            other => panic!("expected Float, got {other:?}"),
        }
    }

    // ========================================================================
    // Contract tests
    // ========================================================================

    #[test]
    fn rejects_non_numeric_values() {
        let result = NumberCodec::new().encode_value(&Value::String("5".into()));
        assert!(matches!(result, Err(EncodingError::UnsupportedType { .. })));
    }

    #[test]
    fn sentinels_bound_all_keys() {
        let codec = NumberCodec::new();
        for v in [Value::Int(i64::MIN), Value::Float(f64::NAN), Value::Int(i64::MAX)] {
            let key = codec.encode_value(&v).unwrap();
            assert!(codec.lowest().as_slice() <= key.as_slice());
            assert!(key < codec.highest());
        }
    }

    #[test]
    fn describe_renders_the_number() {
        let codec = NumberCodec::new();
        assert_eq!(codec.describe(&encode(Value::Int(5))), Some("5".into()));
        assert_eq!(codec.describe(&encode(Value::Float(2.5))), Some("2.5".into()));
        assert_eq!(codec.describe(&[1, 2, 3]), None);
    }
}
