//! Value codec
//!
//! Reversible byte <-> string encoding for stored KV values.
//!
//! The encoded form must never collide with the spreadsheet engine's own
//! "value not found" marker (`#N/A`), and an empty user value must still
//! produce a non-empty stored string so "key absent" stays distinguishable
//! from "key present with empty value". Both properties come from the
//! one-character prefix.

use crate::error::{GridError, Result};

/// Encoding and decoding of values before they are stored in and after
/// they are read back from the sheet.
///
/// The KV engine accepts any codec satisfying this contract; the default
/// is [`PrefixCodec`]. Injected at store construction as an immutable
/// value, never shared between stores.
pub trait Codec {
    /// Encode raw bytes into the stored cell text.
    fn encode(&self, data: &[u8]) -> Result<String>;

    /// Decode stored cell text back into raw bytes.
    fn decode(&self, data: &str) -> Result<Vec<u8>>;
}

/// Default codec: a fixed one-character prefix in front of the UTF-8 text.
#[derive(Debug, Clone)]
pub struct PrefixCodec {
    prefix: char,
}

impl PrefixCodec {
    pub const DEFAULT_PREFIX: char = '!';

    pub fn new(prefix: char) -> Self {
        Self { prefix }
    }
}

impl Default for PrefixCodec {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

impl Codec for PrefixCodec {
    fn encode(&self, data: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(data)
            .map_err(|e| GridError::Decode(format!("value is not valid UTF-8: {}", e)))?;

        let mut out = String::with_capacity(text.len() + 1);
        out.push(self.prefix);
        out.push_str(text);
        Ok(out)
    }

    fn decode(&self, data: &str) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Err(GridError::Decode("data can't be empty".to_string()));
        }

        match data.strip_prefix(self.prefix) {
            Some(rest) => Ok(rest.as_bytes().to_vec()),
            None => Err(GridError::Decode("malformed data".to_string())),
        }
    }
}
