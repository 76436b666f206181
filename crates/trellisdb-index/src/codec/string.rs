//! String key codec.
//!
//! UTF-8 bytes in the null-escaped form from
//! [`trellisdb_core::encoding::sortable`]: lexicographic byte order of the
//! encoding equals lexicographic order of the strings, and the 0x00 0x00
//! terminator keeps string slots self-delimiting inside composite keys.

use trellisdb_core::encoding::sortable::{decode_escaped, encode_escaped};
use trellisdb_core::{EncodingError, Value};

use super::KeyCodec;

/// Key codec for the string domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl StringCodec {
    /// Create the codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl KeyCodec for StringCodec {
    type Input = Value;

    fn codec_id(&self) -> &'static str {
        "string"
    }

    fn encode_value(&self, input: &Self::Input) -> Result<Vec<u8>, EncodingError> {
        match input {
            Value::String(s) => {
                let mut bytes = Vec::with_capacity(s.len() + 2);
                encode_escaped(s.as_bytes(), &mut bytes);
                Ok(bytes)
            }
            other => Err(EncodingError::UnsupportedType {
                codec: self.codec_id(),
                actual: other.type_name(),
            }),
        }
    }

    fn encoded_size(&self, input: &Self::Input) -> usize {
        match input {
            Value::String(s) => s.len() + 2,
            _ => 0,
        }
    }

    fn highest(&self) -> Vec<u8> {
        // UTF-8 never contains 0xFF, so a single 0xFF byte sorts after every
        // encoded string.
        vec![0xFF]
    }

    fn describe(&self, value_bytes: &[u8]) -> Option<String> {
        let (bytes, consumed) = decode_escaped(value_bytes).ok()?;
        if consumed != value_bytes.len() {
            return None;
        }
        String::from_utf8(bytes).ok()
    }
}
