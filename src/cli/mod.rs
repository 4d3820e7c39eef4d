pub mod completions;
pub mod create;
pub mod delete;
pub mod export;
pub mod import;
pub mod init;
pub mod list;
pub mod overlay;
pub mod palette;
pub mod select;
pub mod settings;
pub mod toggle;

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};

use crate::discovery::{discover, discover_manifest, Project};
use crate::error::{MarbleError, Result};
use crate::registry::TemplateRegistry;
use crate::store::UserSettings;
use crate::types::Template;

/// marble - Template overlay and pixel accounting for tiled canvases
#[derive(Parser, Debug)]
#[command(name = "marble")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to marble.yaml (default: ./marble.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a marble project (generates marble.yaml)
    Init(init::InitArgs),

    /// Create a template from an image
    Create(create::CreateArgs),

    /// List stored templates
    List(list::ListArgs),

    /// Delete a template
    Delete(delete::DeleteArgs),

    /// Show templates on overlaid tiles
    Enable(toggle::ToggleArgs),

    /// Hide templates from overlaid tiles
    Disable(toggle::ToggleArgs),

    /// Select the template palette and export act on by default
    Select(select::SelectArgs),

    /// Show or toggle the colours of a template
    Palette(palette::PaletteArgs),

    /// Export a template as a shareable string
    Export(export::ExportArgs),

    /// Import templates from export strings or JSON
    Import(import::ImportArgs),

    /// Draw templates over live tile images and report progress
    Overlay(overlay::OverlayArgs),

    /// Show or change user settings
    Settings(settings::SettingsArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Find the project for `--config`, or the current directory.
pub fn load_project(config: Option<&Path>) -> Result<Project> {
    match config {
        Some(path) => discover_manifest(path),
        None => discover("."),
    }
}

/// Open the project's registry with the remembered selection applied.
///
/// A remembered key that no longer exists is ignored.
pub(crate) fn open_registry_with_selection(project: &Project) -> Result<TemplateRegistry> {
    let mut registry = project.open_registry()?;
    let settings = UserSettings::load_or_init(&mut project.store())?;
    if let Some(key) = settings.selected_template {
        if registry.select(&key).is_err() {
            tracing::debug!(key = %key, "remembered selection no longer exists");
        }
    }
    Ok(registry)
}

/// The template named by `key`, or the selected/first one.
pub(crate) fn resolve_template<'a>(registry: &'a TemplateRegistry, key: Option<&str>) -> Result<&'a Template> {
    match key {
        Some(key) => registry
            .get(key)
            .ok_or_else(|| MarbleError::NotFound { key: key.to_string() }),
        None => registry.selected_or_first().ok_or_else(|| MarbleError::Validation {
            message: "No templates stored".to_string(),
            help: Some("Create one with `marble create IMAGE --coords TX,TY,PX,PY`".to_string()),
        }),
    }
}
