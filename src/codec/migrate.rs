//! Schema migration for stored and imported documents.
//!
//! A document's `schemaVersion` selects where the chain starts. Documents
//! without a version marker are all treated as legacy version 0; no further
//! guessing is attempted. Each step rewrites the raw JSON to the next major
//! version until the current one is reached, after which the document is
//! read into a [`TemplateContainer`].

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{MarbleError, Result};

use super::container::{ContainerMeta, TemplateContainer, TemplateEntry, SCHEMA_VERSION};

/// Major schema version produced by this build.
pub const CURRENT_MAJOR: u32 = 1;

/// Field name older builds used for the templates map.
const LEGACY_TEMPLATES_FIELD: &str = "Ot";

/// Fields that identify a template entry in a legacy root-level map.
const ENTRY_FIELDS: [&str; 4] = ["tiles", "coords", "name", "palette"];

type Step = fn(Map<String, Value>) -> Option<Map<String, Value>>;

/// Migration steps, indexed by the version they upgrade from.
const STEPS: [Step; CURRENT_MAJOR as usize] = [legacy_to_v1];

/// Outcome of reading a raw document.
#[derive(Debug, Clone, PartialEq)]
pub enum Migrated {
    /// The document is (now) a canonical container.
    Container(TemplateContainer),
    /// The payload has no recognisable shape.
    Unrecognized,
}

/// Bring a raw JSON document up to the current schema.
pub fn migrate(value: Value, meta: &ContainerMeta) -> Result<Migrated> {
    let Value::Object(mut doc) = value else {
        return Ok(Migrated::Unrecognized);
    };
    if doc.is_empty() {
        return Ok(Migrated::Unrecognized);
    }

    let mut version = schema_major(&doc)?;
    if version > CURRENT_MAJOR {
        return Err(MarbleError::Parse {
            message: format!("Unsupported template schema version {}", version),
            help: Some("This document was written by a newer release".to_string()),
        });
    }

    while version < CURRENT_MAJOR {
        match STEPS[version as usize](doc) {
            Some(next) => doc = next,
            None => return Ok(Migrated::Unrecognized),
        }
        version += 1;
    }

    Ok(Migrated::Container(into_container(doc, meta)))
}

/// Major version from the `schemaVersion` marker; 0 when absent.
fn schema_major(doc: &Map<String, Value>) -> Result<u32> {
    let Some(marker) = doc.get("schemaVersion") else {
        return Ok(0);
    };
    let text = match marker {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(MarbleError::parse(format!(
                "Invalid schemaVersion marker: {}",
                other
            )))
        }
    };
    text.split('.')
        .next()
        .and_then(|major| major.trim().parse().ok())
        .ok_or_else(|| MarbleError::parse(format!("Invalid schemaVersion '{}'", text)))
}

/// Version 0 → 1: put the templates map under `templates`.
///
/// Legacy documents either already carry `templates`, use the minified `Ot`
/// field, or are themselves the templates map.
fn legacy_to_v1(mut doc: Map<String, Value>) -> Option<Map<String, Value>> {
    if doc.get("templates").is_some_and(Value::is_object) {
        doc.insert("schemaVersion".to_string(), Value::from(SCHEMA_VERSION));
        return Some(doc);
    }

    if doc.get(LEGACY_TEMPLATES_FIELD).is_some_and(Value::is_object) {
        let templates = doc.remove(LEGACY_TEMPLATES_FIELD)?;
        doc.insert("templates".to_string(), templates);
        doc.insert("schemaVersion".to_string(), Value::from(SCHEMA_VERSION));
        return Some(doc);
    }

    if doc.values().all(looks_like_entry) {
        let mut wrapped = Map::new();
        wrapped.insert("schemaVersion".to_string(), Value::from(SCHEMA_VERSION));
        wrapped.insert("templates".to_string(), Value::Object(doc));
        return Some(wrapped);
    }

    None
}

fn looks_like_entry(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| ENTRY_FIELDS.iter().any(|f| obj.get(*f).is_some_and(|v| !v.is_null())))
}

/// Read a current-version document, skipping entries that fail to parse.
fn into_container(mut doc: Map<String, Value>, meta: &ContainerMeta) -> TemplateContainer {
    let mut container = TemplateContainer::empty(meta);

    if let Some(Value::String(who)) = doc.remove("whoami") {
        container.whoami = who;
    }
    if let Some(Value::String(version)) = doc.remove("scriptVersion") {
        container.script_version = version;
    }
    doc.remove("schemaVersion");
    container.last_sort_id = doc.remove("lastSortId").and_then(|v| v.as_u64());

    let mut templates = BTreeMap::new();
    if let Some(Value::Object(entries)) = doc.remove("templates") {
        for (key, raw) in entries {
            match serde_json::from_value::<TemplateEntry>(raw) {
                Ok(entry) => {
                    templates.insert(key, entry);
                }
                Err(e) => tracing::warn!(key = %key, error = %e, "skipping unreadable template entry"),
            }
        }
    }
    container.templates = templates;
    container.extra = doc;
    container
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta() -> ContainerMeta {
        ContainerMeta::new("Black Marble", "0.85.2")
    }

    fn expect_container(value: Value) -> TemplateContainer {
        match migrate(value, &meta()).unwrap() {
            Migrated::Container(c) => c,
            Migrated::Unrecognized => panic!("expected a container"),
        }
    }

    #[test]
    fn test_current_version_passes_through() {
        let c = expect_container(json!({
            "whoami": "SomeFork",
            "scriptVersion": "1.2.3",
            "schemaVersion": "1.0.0",
            "templates": { "0 !": { "name": "A", "coords": "1,2,3,4" } }
        }));
        assert_eq!(c.whoami, "SomeFork");
        assert_eq!(c.script_version, "1.2.3");
        assert_eq!(c.schema_version, SCHEMA_VERSION);
        assert_eq!(c.templates["0 !"].name.as_deref(), Some("A"));
    }

    #[test]
    fn test_versioned_without_templates_is_empty() {
        let c = expect_container(json!({ "schemaVersion": "1.0.0", "whoami": "X" }));
        assert!(c.templates.is_empty());
    }

    #[test]
    fn test_unmarked_with_templates() {
        let c = expect_container(json!({ "templates": { "3 #": { "name": "B" } } }));
        assert_eq!(c.whoami, "BlackMarble");
        assert!(c.templates.contains_key("3 #"));
    }

    #[test]
    fn test_legacy_minified_field() {
        let c = expect_container(json!({ "whoami": "Old", "Ot": { "1 !": { "name": "C" } } }));
        assert!(c.templates.contains_key("1 !"));
        assert!(!c.extra.contains_key("Ot"));
    }

    #[test]
    fn test_legacy_root_map() {
        let c = expect_container(json!({
            "0 !": { "tiles": {}, "name": "D" },
            "1 !": { "coords": "0,0,0,0" }
        }));
        assert_eq!(c.templates.len(), 2);
    }

    #[test]
    fn test_unrecognized_shapes() {
        for value in [
            json!({}),
            json!([1, 2, 3]),
            json!("text"),
            json!({ "foo": 1 }),
            json!({ "a": { "tiles": {} }, "b": { "other": 1 } }),
        ] {
            assert_eq!(migrate(value, &meta()).unwrap(), Migrated::Unrecognized);
        }
    }

    #[test]
    fn test_newer_major_rejected() {
        let err = migrate(json!({ "schemaVersion": "2.0.0", "templates": {} }), &meta());
        assert!(err.is_err());
    }

    #[test]
    fn test_bad_entry_skipped() {
        let c = expect_container(json!({
            "schemaVersion": "1.0.0",
            "templates": {
                "0 !": { "name": "ok" },
                "1 !": { "tiles": "not a map" }
            }
        }));
        assert_eq!(c.templates.len(), 1);
        assert!(c.templates.contains_key("0 !"));
    }

    #[test]
    fn test_extra_fields_and_last_sort_id_kept() {
        let c = expect_container(json!({
            "schemaVersion": "1.0.0",
            "lastSortId": 9,
            "custom": true,
            "templates": {}
        }));
        assert_eq!(c.last_sort_id, Some(9));
        assert_eq!(c.extra.get("custom"), Some(&Value::Bool(true)));
    }
}
