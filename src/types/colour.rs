//! Colour type and parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{MarbleError, Result};

/// Alpha at or above which a centre cell counts as a real pixel.
pub const ALPHA_THRESHOLD: u8 = 64;

/// An opaque RGB colour, the key of every palette entry.
///
/// Palette keys are persisted as `"r,g,b"` strings (e.g. `"255,0,0"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Create a colour from its components.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The "transparent marker": a template pixel that is intentionally blank.
    pub const SENTINEL: Self = Self::new(222, 250, 206);

    /// Take the colour part of an RGBA pixel.
    pub fn from_rgba(rgba: [u8; 4]) -> Self {
        Self::new(rgba[0], rgba[1], rgba[2])
    }

    /// Expand to an RGBA pixel with the given alpha.
    pub fn with_alpha(self, a: u8) -> [u8; 4] {
        [self.r, self.g, self.b, a]
    }

    /// Check if this is the transparent marker colour.
    pub fn is_sentinel(self) -> bool {
        self == Self::SENTINEL
    }

    /// Parse a hex colour string (`#RRGGBB`, with or without `#`).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 {
            return Err(MarbleError::Parse {
                message: format!("Invalid hex colour: {}", s),
                help: Some("Use #RRGGBB format".to_string()),
            });
        }
        Ok(Self::new(
            parse_hex_byte(&hex[0..2])?,
            parse_hex_byte(&hex[2..4])?,
            parse_hex_byte(&hex[4..6])?,
        ))
    }

    /// Format as `#RRGGBB`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = MarbleError;

    /// Accepts the persisted `"r,g,b"` form as well as `#RRGGBB`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with('#') {
            return Self::from_hex(s);
        }

        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(MarbleError::Parse {
                message: format!("Invalid colour key '{}'", s),
                help: Some("Use r,g,b (e.g. 255,0,0) or #RRGGBB".to_string()),
            });
        }

        let channel = |p: &str| {
            p.parse::<u8>().map_err(|_| MarbleError::Parse {
                message: format!("Invalid colour channel '{}' in '{}'", p, s),
                help: Some("Channels must be integers between 0 and 255".to_string()),
            })
        };

        Ok(Self::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a two-character hex byte.
fn parse_hex_byte(s: &str) -> Result<u8> {
    u8::from_str_radix(s, 16).map_err(|_| MarbleError::Parse {
        message: format!("Invalid hex byte: {}", s),
        help: None,
    })
}
