//! User settings document.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MarbleError, Result};

use super::{KeyValueStore, SETTINGS_KEY};

/// Per-install settings kept next to the template container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Random identifier generated once per install.
    pub uuid: Uuid,

    /// Whether the user opted in to telemetry.
    #[serde(default)]
    pub telemetry: bool,

    /// Storage key of the template CLI commands default to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_template: Option<String>,
}

impl UserSettings {
    /// Fresh settings with a new install id and telemetry off.
    pub fn generate() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            telemetry: false,
            selected_template: None,
        }
    }

    /// Load settings, creating and saving them when absent or unreadable.
    ///
    /// The install id stays stable once written.
    pub fn load_or_init(store: &mut dyn KeyValueStore) -> Result<Self> {
        if let Some(bytes) = store.get(SETTINGS_KEY)? {
            match serde_json::from_slice::<UserSettings>(&bytes) {
                Ok(settings) => return Ok(settings),
                Err(e) => tracing::warn!(error = %e, "discarding unreadable settings document"),
            }
        }

        let settings = Self::generate();
        settings.save(store)?;
        Ok(settings)
    }

    /// Persist the settings document.
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<()> {
        let json = serde_json::to_vec(self).map_err(|e| MarbleError::Store {
            message: format!("Failed to serialise settings: {}", e),
        })?;
        store.set(SETTINGS_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_install_id_is_stable() {
        let mut store = MemoryStore::new();
        let first = UserSettings::load_or_init(&mut store).unwrap();
        let second = UserSettings::load_or_init(&mut store).unwrap();
        assert_eq!(first, second);
        assert!(!first.telemetry);
    }

    #[test]
    fn test_telemetry_flag_persists() {
        let mut store = MemoryStore::new();
        let mut settings = UserSettings::load_or_init(&mut store).unwrap();
        settings.telemetry = true;
        settings.save(&mut store).unwrap();

        let reloaded = UserSettings::load_or_init(&mut store).unwrap();
        assert!(reloaded.telemetry);
        assert_eq!(reloaded.uuid, settings.uuid);
    }

    #[test]
    fn test_corrupt_settings_replaced() {
        let mut store = MemoryStore::new();
        store.set(SETTINGS_KEY, b"garbage").unwrap();
        let settings = UserSettings::load_or_init(&mut store).unwrap();

        let stored = store.get(SETTINGS_KEY).unwrap().unwrap();
        let parsed: UserSettings = serde_json::from_slice(&stored).unwrap();
        assert_eq!(parsed, settings);
    }
}
