//! Export command implementation.

use std::fs;
use std::path::PathBuf;

use clap::Args;

use crate::discovery::Project;
use crate::error::{MarbleError, Result};
use crate::output::{display_path, Printer};

use super::{open_registry_with_selection, resolve_template};

/// Export a template as a shareable string
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Storage key of the template (default: selected template)
    pub key: Option<String>,

    /// Write to a file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

pub fn run(args: ExportArgs, project: &Project, printer: &Printer) -> Result<()> {
    let registry = open_registry_with_selection(project)?;
    let template = resolve_template(&registry, args.key.as_deref())?;
    let exported = registry.export_template_as_string(&template.storage_key.to_string())?;

    match &args.output {
        Some(path) => {
            fs::write(path, &exported).map_err(|e| MarbleError::Io {
                path: path.clone(),
                message: format!("Failed to write export: {}", e),
            })?;
            printer.status(
                "Exported",
                &format!("{} to {}", template.display_name, printer.cyan(&display_path(path))),
            );
        }
        None => println!("{}", exported),
    }

    Ok(())
}
