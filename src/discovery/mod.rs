//! Project discovery for marble.
//!
//! A project is a directory with an optional `marble.yaml` manifest. The
//! manifest decides where the template store lives and which grid geometry
//! templates are sliced against.
//!
//! # Example
//!
//! ```ignore
//! use marble::discovery::discover;
//!
//! let project = discover("./my-project")?;
//! let registry = project.open_registry()?;
//! println!("{} templates loaded", registry.len());
//! ```

mod manifest;
mod scanner;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::registry::TemplateRegistry;
use crate::store::{FileStore, UserSettings};

pub use manifest::Manifest;
pub use scanner::{detect_tile_coord, scan_tile_sources, scan_tiles, TileFile, TileScan};

/// The name of the manifest file.
pub const MANIFEST_FILENAME: &str = "marble.yaml";

/// A discovered project.
#[derive(Debug, Clone)]
pub struct Project {
    /// The project root directory.
    pub root: PathBuf,

    /// The loaded manifest (default when no marble.yaml was found).
    pub manifest: Manifest,

    /// Whether a marble.yaml manifest was found.
    pub has_manifest: bool,
}

impl Project {
    /// Directory backing the template store.
    pub fn store_path(&self) -> PathBuf {
        self.manifest.store_path(&self.root)
    }

    /// The project's file-backed store.
    pub fn store(&self) -> FileStore {
        FileStore::new(self.store_path())
    }

    /// Open the template registry configured by the manifest.
    pub fn open_registry(&self) -> Result<TemplateRegistry> {
        let options = self.manifest.registry_options()?;
        TemplateRegistry::open(Box::new(self.store()), options)
    }

    /// Load the user settings, creating them on first use.
    pub fn open_settings(&self) -> Result<UserSettings> {
        let mut store = self.store();
        UserSettings::load_or_init(&mut store)
    }
}

/// Discover a project rooted at `root`.
///
/// Looks for a `marble.yaml` manifest in the root directory, falling back
/// to defaults when there is none.
pub fn discover(root: impl AsRef<Path>) -> Result<Project> {
    let root = root.as_ref().to_path_buf();
    let manifest_path = root.join(MANIFEST_FILENAME);
    discover_with_manifest(root, &manifest_path)
}

/// Discover a project using an explicit manifest path.
///
/// The project root is the manifest's directory. A missing file falls back
/// to defaults, like [`discover`].
pub fn discover_manifest(manifest_path: &Path) -> Result<Project> {
    let root = manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    discover_with_manifest(root, manifest_path)
}

fn discover_with_manifest(root: PathBuf, manifest_path: &Path) -> Result<Project> {
    let (manifest, has_manifest) = if manifest_path.exists() {
        (Manifest::load(manifest_path)?, true)
    } else {
        (Manifest::default(), false)
    };

    tracing::debug!(root = %root.display(), has_manifest, "discovered project");
    Ok(Project {
        root,
        manifest,
        has_manifest,
    })
}
