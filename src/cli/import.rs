//! Import command implementation.
//!
//! Accepts export strings or raw container JSON, from files or stdin (`-`).

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Args;

use crate::discovery::Project;
use crate::error::{MarbleError, Result};
use crate::output::{display_path, plural, Printer};
use crate::registry::ImportOutcome;

/// Import templates from export strings or JSON
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Files holding export strings or JSON ("-" for stdin)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run(args: ImportArgs, project: &Project, printer: &Printer) -> Result<()> {
    let mut registry = project.open_registry()?;
    let mut total = 0;

    for file in &args.files {
        let input = read_input(file)?;
        let label = if file == Path::new("-") {
            "stdin".to_string()
        } else {
            display_path(file)
        };

        match registry.import_template_from_string(&input)? {
            ImportOutcome::Imported(keys) => {
                for key in &keys {
                    let name = registry.get(&key.to_string()).map(|t| t.display_name.as_str()).unwrap_or("");
                    printer.status("Imported", &printer.template(name, key));
                }
                total += keys.len();
            }
            ImportOutcome::Unrecognized => {
                printer.warning("Skipped", &format!("{}: no templates found", label));
            }
        }
    }

    printer.status("Finished", &format!("imported {}", plural(total, "template", "templates")));
    Ok(())
}

fn read_input(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        return Ok(input);
    }
    fs::read_to_string(file).map_err(|e| MarbleError::Io {
        path: file.to_path_buf(),
        message: format!("Failed to read import: {}", e),
    })
}
