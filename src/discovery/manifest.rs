//! Project manifest (marble.yaml) parsing.
//!
//! The manifest sets where templates are stored, the world grid geometry and
//! the identity written into exported containers.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::{AuthorCodec, ContainerMeta, DEFAULT_ALPHABET};
use crate::error::{MarbleError, Result};
use crate::registry::RegistryOptions;
use crate::types::Grid;

/// Project manifest loaded from marble.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Directory holding the template and settings documents.
    pub store: PathBuf,

    /// Logical pixels per tile side.
    pub tile_size: u32,

    /// Upscale factor applied to templates and live tiles.
    pub draw_mult: u32,

    /// Numeric owner id encoded into new storage keys.
    pub user_id: u64,

    /// Producer name; whitespace is stripped to form the container tag.
    pub name: String,

    /// Alphabet used to encode author ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alphabet: Option<String>,

    /// Patterns to skip when scanning tile directories.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            store: PathBuf::from(".marble"),
            tile_size: Grid::DEFAULT_TILE_SIZE,
            draw_mult: Grid::DEFAULT_DRAW_MULT,
            user_id: 0,
            name: "Black Marble".to_string(),
            alphabet: None,
            excludes: vec![],
        }
    }
}

impl Manifest {
    /// Load manifest from a marble.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| MarbleError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read manifest: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse manifest from YAML string.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| MarbleError::Parse {
            message: format!("Invalid manifest: {}", e),
            help: Some("Check marble.yaml syntax".to_string()),
        })
    }

    /// Render the manifest as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| MarbleError::parse(format!("Failed to write manifest: {}", e)))
    }

    /// The validated world grid.
    pub fn grid(&self) -> Result<Grid> {
        Grid::new(self.tile_size, self.draw_mult)
    }

    /// Identity stamped on written containers.
    pub fn meta(&self) -> ContainerMeta {
        ContainerMeta::new(&self.name, env!("CARGO_PKG_VERSION"))
    }

    /// The author-id codec for the configured alphabet.
    pub fn author_codec(&self) -> Result<AuthorCodec> {
        AuthorCodec::new(self.alphabet.as_deref().unwrap_or(DEFAULT_ALPHABET))
    }

    /// Options for opening the project's registry.
    pub fn registry_options(&self) -> Result<RegistryOptions> {
        Ok(RegistryOptions {
            grid: self.grid()?,
            meta: self.meta(),
            author_codec: self.author_codec()?,
            user_id: self.user_id,
        })
    }

    /// Store directory resolved against the project root.
    pub fn store_path(&self, root: &Path) -> PathBuf {
        if self.store.is_absolute() {
            self.store.clone()
        } else {
            root.join(&self.store)
        }
    }

    /// Check if a path should be excluded based on exclude patterns.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.excludes.iter().any(|pattern| matches_pattern(&path_str, pattern))
    }
}

/// Minimal glob matching: `*.ext`, `dir/*`, `**/dir/*`, otherwise substring.
fn matches_pattern(path: &str, pattern: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix("**/") {
        if let Some(dir) = suffix.strip_suffix("/*") {
            return path.starts_with(&format!("{}/", dir)) || path.contains(&format!("/{}/", dir));
        }
        return path.ends_with(suffix) || path.contains(suffix);
    }

    if let Some(suffix) = pattern.strip_prefix('*') {
        if !pattern.contains('/') {
            return path.ends_with(suffix);
        }
    }

    if let Some(prefix) = pattern.strip_suffix("/*") {
        return path.starts_with(&format!("{}/", prefix)) || path.contains(&format!("/{}/", prefix));
    }

    path.contains(pattern)
}
