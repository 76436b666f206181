//! Sort-order preserving binary transforms.
//!
//! These primitives are the foundation of every index key codec. Comparing
//! the produced bytes lexicographically gives the same ordering as comparing
//! the original values:
//!
//! - **Signed integers** use a "sign-flip" encoding: XOR with the sign bit
//!   makes negative numbers sort before positive numbers in unsigned
//!   big-endian form.
//! - **Floats** use the IEEE 754 bit representation with the sign bit flipped
//!   for positives and all bits complemented for negatives; NaN is mapped
//!   above every other value so the order stays total.
//! - **Byte strings** use null-escaped encoding: `0x00` in the data becomes
//!   `0x00 0x01` and the sequence ends with `0x00 0x00`, which preserves
//!   lexicographic order (`"a" < "aa" < "b"`) and lets variable-width fields
//!   self-terminate inside composite keys.

use crate::error::EncodingError;

/// Constant for flipping the sign bit of a 64-bit value.
const SIGN_FLIP_64: u64 = 0x8000_0000_0000_0000;

/// Constant for flipping the sign bit of a 32-bit value.
const SIGN_FLIP_32: u32 = 0x8000_0000;

/// Escape byte: a 0x00 in the data is written as 0x00 0x01.
const ESCAPE_BYTE: u8 = 0x01;
/// Terminator: end of an escaped sequence is marked by 0x00 0x00.
const TERMINATOR: u8 = 0x00;

/// Encode a signed 64-bit integer so byte order equals numeric order.
#[inline]
#[must_use]
pub fn sortable_i64(value: i64) -> [u8; 8] {
    ((value as u64) ^ SIGN_FLIP_64).to_be_bytes()
}

/// Invert [`sortable_i64`].
#[inline]
#[must_use]
pub fn restore_i64(bytes: [u8; 8]) -> i64 {
    (u64::from_be_bytes(bytes) ^ SIGN_FLIP_64) as i64
}

/// Encode a signed 32-bit integer so byte order equals numeric order.
#[inline]
#[must_use]
pub fn sortable_i32(value: i32) -> [u8; 4] {
    ((value as u32) ^ SIGN_FLIP_32).to_be_bytes()
}

/// Invert [`sortable_i32`].
#[inline]
#[must_use]
pub fn restore_i32(bytes: [u8; 4]) -> i32 {
    (u32::from_be_bytes(bytes) ^ SIGN_FLIP_32) as i32
}

/// The sortable bit form of a float: positives get the sign bit flipped,
/// negatives are fully complemented, NaN sorts above everything.
#[inline]
#[must_use]
pub fn sortable_f64_bits(value: f64) -> u64 {
    if value.is_nan() {
        return u64::MAX;
    }
    let bits = value.to_bits();
    if bits & SIGN_FLIP_64 == 0 {
        // Positive float (including +0): flip sign bit
        bits ^ SIGN_FLIP_64
    } else {
        // Negative float (including -0): flip all bits
        !bits
    }
}

/// Encode a float so byte order equals numeric order (NaN last).
#[inline]
#[must_use]
pub fn sortable_f64(value: f64) -> [u8; 8] {
    sortable_f64_bits(value).to_be_bytes()
}

/// Invert [`sortable_f64`].
#[inline]
#[must_use]
pub fn restore_f64(bytes: [u8; 8]) -> f64 {
    let encoded = u64::from_be_bytes(bytes);
    let bits = if encoded == u64::MAX {
        f64::NAN.to_bits()
    } else if encoded & SIGN_FLIP_64 != 0 {
        // Was positive: flip sign bit back
        encoded ^ SIGN_FLIP_64
    } else {
        // Was negative: flip all bits back
        !encoded
    };
    f64::from_bits(bits)
}

/// Append the null-escaped form of `data` to `buf`, terminator included.
pub fn encode_escaped(data: &[u8], buf: &mut Vec<u8>) {
    for &byte in data {
        if byte == 0x00 {
            buf.push(0x00);
            buf.push(ESCAPE_BYTE);
        } else {
            buf.push(byte);
        }
    }
    buf.push(TERMINATOR);
    buf.push(TERMINATOR);
}

/// Decode a null-escaped sequence.
///
/// Returns the decoded bytes and the number of input bytes consumed,
/// terminator included.
///
/// # Errors
///
/// Returns [`EncodingError::Malformed`] if the input ends before the
/// terminator or contains an invalid escape sequence.
pub fn decode_escaped(data: &[u8]) -> Result<(Vec<u8>, usize), EncodingError> {
    let mut result = Vec::new();
    let mut i = 0;

    while i < data.len() {
        if data[i] == 0x00 {
            if i + 1 >= data.len() {
                return Err(EncodingError::Malformed("unexpected end of escaped bytes".into()));
            }
            match data[i + 1] {
                TERMINATOR => return Ok((result, i + 2)),
                ESCAPE_BYTE => {
                    result.push(0x00);
                    i += 2;
                }
                other => {
                    return Err(EncodingError::Malformed(format!(
                        "invalid escape sequence: 0x00 0x{other:02x}"
                    )));
                }
            }
        } else {
            result.push(data[i]);
            i += 1;
        }
    }

    Err(EncodingError::Malformed("missing terminator in escaped bytes".into()))
}
