//! Init command implementation.
//!
//! Writes a `marble.yaml` manifest and creates the per-install settings.

use std::fs;
use std::path::PathBuf;

use clap::Args;

use crate::discovery::{discover, Manifest, MANIFEST_FILENAME};
use crate::error::{MarbleError, Result};
use crate::output::{display_path, Printer};

/// Initialize a marble project by generating a marble.yaml manifest
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Numeric user id encoded into new template keys
    #[arg(long)]
    pub user_id: Option<u64>,

    /// Producer name stamped on exported templates
    #[arg(long)]
    pub name: Option<String>,

    /// Overwrite existing marble.yaml
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let manifest_path = args.path.join(MANIFEST_FILENAME);

    if manifest_path.exists() && !args.force {
        return Err(MarbleError::Validation {
            message: format!("{} already exists", MANIFEST_FILENAME),
            help: Some("Use --force to overwrite".to_string()),
        });
    }

    let mut manifest = Manifest::default();
    if let Some(user_id) = args.user_id {
        manifest.user_id = user_id;
    }
    if let Some(name) = args.name {
        manifest.name = name;
    }
    // Reject bad settings before anything is written
    manifest.registry_options()?;

    fs::create_dir_all(&args.path).map_err(|e| MarbleError::Io {
        path: args.path.clone(),
        message: format!("Failed to create project directory: {}", e),
    })?;
    fs::write(&manifest_path, manifest.to_yaml()?).map_err(|e| MarbleError::Io {
        path: manifest_path.clone(),
        message: format!("Failed to write manifest: {}", e),
    })?;
    printer.status("Created", &display_path(&manifest_path));

    let project = discover(&args.path)?;
    let settings = project.open_settings()?;
    printer.info("Install", &format!("{} {}", settings.uuid, printer.dim("(install id)")));
    printer.info("Store", &display_path(&project.store_path()));

    Ok(())
}
