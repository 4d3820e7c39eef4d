//! Template persistence codec.
//!
//! Chunks are stored as base64-wrapped PNG so the whole registry fits in a
//! string-only key/value store. Single templates travel between installs as
//! one opaque string: the base64 of a container holding just that entry.

mod author;
mod container;
mod migrate;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::RgbaImage;
use serde_json::Value;

use crate::error::{MarbleError, Result};
use crate::render::{decode_rgba, encode_png};

pub use author::{AuthorCodec, DEFAULT_ALPHABET};
pub use container::{ContainerMeta, TemplateContainer, TemplateEntry, DEFAULT_FORMAT_TAG, SCHEMA_VERSION};
pub use migrate::{migrate, Migrated, CURRENT_MAJOR};

/// Encode a chunk bitmap as base64 PNG.
pub fn encode_chunk(chunk: &RgbaImage) -> Result<String> {
    Ok(STANDARD.encode(encode_png(chunk)?))
}

/// Decode a base64 PNG chunk. A `data:` URL prefix is tolerated.
pub fn decode_chunk(encoded: &str) -> Result<RgbaImage> {
    let payload = match encoded.split_once("base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| MarbleError::parse(format!("Invalid base64 chunk data: {}", e)))?;
    decode_rgba(&bytes)
}

/// Wrap one entry in a fresh container and encode it as an opaque string.
pub fn export_entry(meta: &ContainerMeta, key: &str, entry: &TemplateEntry) -> Result<String> {
    let container = TemplateContainer::single(meta, key, entry.clone());
    let json = serde_json::to_string(&container)
        .map_err(|e| MarbleError::parse(format!("Failed to serialise template: {}", e)))?;
    Ok(STANDARD.encode(json.as_bytes()))
}

/// Parse an import string: the base64 export form or raw JSON.
pub fn parse_import_string(input: &str) -> Result<Value> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(MarbleError::Parse {
            message: "Import string is empty".to_string(),
            help: Some("Paste the string produced by `marble export`".to_string()),
        });
    }

    if looks_like_base64(trimmed) {
        if let Some(value) = decode_base64_json(trimmed) {
            return Ok(value);
        }
    }

    serde_json::from_str(trimmed).map_err(|e| MarbleError::Parse {
        message: format!("Import string is neither an export string nor JSON: {}", e),
        help: Some("Paste the string produced by `marble export`".to_string()),
    })
}

fn looks_like_base64(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=') || c.is_whitespace())
}

fn decode_base64_json(s: &str) -> Option<Value> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    serde_json::from_str(&text).ok()
}
