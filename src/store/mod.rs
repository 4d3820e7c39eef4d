//! Key/value persistence.
//!
//! The registry only needs a string-keyed byte store: the whole template
//! container lives under [`TEMPLATES_KEY`] and the settings document under
//! [`SETTINGS_KEY`].

mod settings;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MarbleError, Result};

pub use settings::UserSettings;

/// Key holding the serialised template container.
pub const TEMPLATES_KEY: &str = "bmTemplates";

/// Key holding the user settings document.
pub const SETTINGS_KEY: &str = "bmUserSettings";

/// A string-keyed byte store.
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `None` when the key was never written.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write a value, replacing any previous one.
    fn set(&mut self, key: &str, value: &[u8]) -> Result<()>;
}

/// In-process store, used by tests and embedders that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.values.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Directory-backed store: one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            || key.starts_with('.')
        {
            return Err(MarbleError::Store {
                message: format!("Invalid store key '{}'", key),
            });
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MarbleError::Io {
                path,
                message: format!("Failed to read store entry: {}", e),
            }),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).map_err(|e| MarbleError::Io {
            path: self.root.clone(),
            message: format!("Failed to create store directory: {}", e),
        })?;

        // Write then rename so a crash never leaves a half-written document
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| MarbleError::Io {
            path: tmp.clone(),
            message: format!("Failed to write store entry: {}", e),
        })?;
        fs::rename(&tmp, &path).map_err(|e| MarbleError::Io {
            path: path.clone(),
            message: format!("Failed to replace store entry: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", b"one").unwrap();
        store.set("a", b"two").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get(TEMPLATES_KEY).unwrap(), None);
        store.set(TEMPLATES_KEY, b"{}").unwrap();
        assert_eq!(store.get(TEMPLATES_KEY).unwrap(), Some(b"{}".to_vec()));
        assert!(dir.path().join("nested").join("bmTemplates.json").exists());

        // A second handle sees the same data
        let other = FileStore::new(dir.path().join("nested"));
        assert_eq!(other.get(TEMPLATES_KEY).unwrap(), Some(b"{}".to_vec()));
    }

    #[test]
    fn test_file_store_rejects_bad_keys() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        assert!(store.set("../escape", b"x").is_err());
        assert!(store.set("", b"x").is_err());
        assert!(store.get("a/b").is_err());
    }
}
