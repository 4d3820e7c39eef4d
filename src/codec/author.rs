//! Bijective integer ↔ string encoding for author ids.
//!
//! Owner ids are written in base N over a fixed alphabet so they stay short
//! and contain no whitespace (storage keys are `"{sortID} {authorID}"`).

use crate::error::{MarbleError, Result};

/// The default 92-character alphabet: printable ASCII without space, `"` and `\`.
pub const DEFAULT_ALPHABET: &str =
    "!#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[]^_`abcdefghijklmnopqrstuvwxyz{|}~";

/// Positional base-N codec over an alphabet of distinct characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorCodec {
    digits: Vec<char>,
}

impl AuthorCodec {
    /// Create a codec. The alphabet needs at least two distinct characters.
    pub fn new(alphabet: &str) -> Result<Self> {
        let digits: Vec<char> = alphabet.chars().collect();
        if digits.len() < 2 {
            return Err(MarbleError::Validation {
                message: format!("Author alphabet needs at least 2 characters, got {}", digits.len()),
                help: None,
            });
        }
        for (i, c) in digits.iter().enumerate() {
            if c.is_whitespace() {
                return Err(MarbleError::Validation {
                    message: "Author alphabet contains whitespace".to_string(),
                    help: Some("Storage keys separate sort and author ids with a space".to_string()),
                });
            }
            if digits[..i].contains(c) {
                return Err(MarbleError::Validation {
                    message: format!("Author alphabet repeats '{}'", c),
                    help: Some("Every digit must be distinct".to_string()),
                });
            }
        }
        Ok(Self { digits })
    }

    /// Numeric base of this codec.
    pub fn base(&self) -> u64 {
        self.digits.len() as u64
    }

    /// Encode a number. Zero is the first digit on its own.
    pub fn encode(&self, mut value: u64) -> String {
        let base = self.base();
        if value == 0 {
            return self.digits[0].to_string();
        }

        let mut out = Vec::new();
        while value > 0 {
            out.push(self.digits[(value % base) as usize]);
            value /= base;
        }
        out.iter().rev().collect()
    }

    /// Decode a string produced by [`encode`](Self::encode).
    ///
    /// Rejects unknown characters, leading zero digits and values that do
    /// not fit in a `u64`, so every accepted string maps to exactly one number.
    pub fn decode(&self, encoded: &str) -> Result<u64> {
        let base = self.base();
        let mut chars = encoded.chars().peekable();

        let first = *chars
            .peek()
            .ok_or_else(|| MarbleError::parse("Author id is empty"))?;
        if first == self.digits[0] && encoded.chars().count() > 1 {
            return Err(MarbleError::parse(format!(
                "Author id '{}' has a leading zero digit",
                encoded
            )));
        }

        let mut value: u64 = 0;
        for c in chars {
            let digit = self
                .digits
                .iter()
                .position(|d| *d == c)
                .ok_or_else(|| {
                    MarbleError::parse(format!("Invalid character '{}' in author id '{}'", c, encoded))
                })? as u64;

            value = value
                .checked_mul(base)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| {
                    MarbleError::parse(format!("Author id '{}' is out of range", encoded))
                })?;
        }
        Ok(value)
    }
}

impl Default for AuthorCodec {
    fn default() -> Self {
        Self {
            digits: DEFAULT_ALPHABET.chars().collect(),
        }
    }
}
