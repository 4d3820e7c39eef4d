//! The persisted template container.
//!
//! The whole registry is stored as one JSON document:
//!
//! ```json
//! {
//!   "whoami": "BlackMarble",
//!   "scriptVersion": "0.85.2",
//!   "schemaVersion": "1.0.0",
//!   "templates": {
//!     "0 !": {
//!       "name": "Flag",
//!       "coords": "12,34,500,500",
//!       "enabled": true,
//!       "tiles": { "0012,0034,500,500": "<base64 png>" },
//!       "palette": { "255,0,0": { "count": 2, "enabled": true } }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::PersistedColour;

/// Schema version written by this build.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Format tag written when no producer name is configured.
pub const DEFAULT_FORMAT_TAG: &str = "BlackMarble";

/// Identity stamped on every container this build writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerMeta {
    /// Producer name with whitespace removed.
    pub format_tag: String,
    /// Producer version.
    pub producer_version: String,
}

impl ContainerMeta {
    /// Build from a human-readable producer name such as "Black Marble".
    pub fn new(name: &str, producer_version: impl Into<String>) -> Self {
        let format_tag: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        Self {
            format_tag: if format_tag.is_empty() {
                DEFAULT_FORMAT_TAG.to_string()
            } else {
                format_tag
            },
            producer_version: producer_version.into(),
        }
    }
}

impl Default for ContainerMeta {
    fn default() -> Self {
        Self::new(DEFAULT_FORMAT_TAG, env!("CARGO_PKG_VERSION"))
    }
}

/// Canonical registry document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateContainer {
    /// Format tag (producer name).
    pub whoami: String,

    #[serde(rename = "scriptVersion")]
    pub script_version: String,

    #[serde(rename = "schemaVersion")]
    pub schema_version: String,

    /// Highest sortID ever issued, so deleted ids are never handed out again.
    #[serde(rename = "lastSortId", default, skip_serializing_if = "Option::is_none")]
    pub last_sort_id: Option<u64>,

    /// Entries keyed by storage key.
    #[serde(default)]
    pub templates: BTreeMap<String, TemplateEntry>,

    /// Fields written by other producers, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TemplateContainer {
    /// An empty container stamped with `meta`.
    pub fn empty(meta: &ContainerMeta) -> Self {
        Self {
            whoami: meta.format_tag.clone(),
            script_version: meta.producer_version.clone(),
            schema_version: SCHEMA_VERSION.to_string(),
            last_sort_id: None,
            templates: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    /// A container holding a single entry, used for exports.
    pub fn single(meta: &ContainerMeta, key: &str, entry: TemplateEntry) -> Self {
        let mut container = Self::empty(meta);
        container.templates.insert(key.to_string(), entry);
        container
    }
}

/// One template as stored in the container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Anchor as `"tx,ty,px,py"`. Older documents stored a number array.
    #[serde(
        default,
        deserialize_with = "deserialize_coords",
        skip_serializing_if = "Option::is_none"
    )]
    pub coords: Option<String>,

    #[serde(default = "default_enabled", deserialize_with = "deserialize_enabled")]
    pub enabled: bool,

    /// Chunk key → base64 PNG.
    #[serde(default, deserialize_with = "deserialize_tiles")]
    pub tiles: BTreeMap<String, String>,

    #[serde(default, deserialize_with = "deserialize_palette")]
    pub palette: BTreeMap<String, PersistedColour>,
}

fn default_enabled() -> bool {
    true
}

fn deserialize_coords<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Coords {
        Text(String),
        List(Vec<f64>),
    }

    Ok(match Option::<Coords>::deserialize(deserializer)? {
        Some(Coords::Text(s)) => Some(s),
        Some(Coords::List(values)) => Some(
            values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(","),
        ),
        None => None,
    })
}

/// Drops tiles whose data is not a string so the rest of the entry loads.
fn deserialize_tiles<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error> {
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(tile, value)| match value {
            Value::String(data) => Some((tile, data)),
            other => {
                tracing::warn!(%tile, found = %other, "skipping tile with non-string data");
                None
            }
        })
        .collect())
}

/// Drops palette entries that are not `{count, enabled}` objects.
fn deserialize_palette<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, PersistedColour>, D::Error> {
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|(colour, value)| match serde_json::from_value::<PersistedColour>(value) {
            Ok(entry) => Some((colour, entry)),
            Err(e) => {
                tracing::warn!(%colour, error = %e, "skipping malformed palette entry");
                None
            }
        })
        .collect())
}

/// Accepts booleans, 0/1 and null (null keeps the default).
fn deserialize_enabled<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map_or(true, |v| v != 0.0),
        Value::Null => true,
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a boolean for 'enabled', found {}",
                other
            )))
        }
    })
}
