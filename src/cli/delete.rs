//! Delete command implementation.

use clap::Args;

use crate::discovery::Project;
use crate::error::Result;
use crate::output::Printer;
use crate::registry::DeleteOutcome;

/// Delete a template
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Storage key of the template, e.g. "3 !"
    #[arg(required = true)]
    pub key: String,
}

pub fn run(args: DeleteArgs, project: &Project, printer: &Printer) -> Result<()> {
    let mut registry = project.open_registry()?;

    match registry.delete(&args.key)? {
        DeleteOutcome::Deleted => printer.status("Deleted", &args.key),
        DeleteOutcome::NotFound => printer.warning("Missing", &format!("no template with key '{}'", args.key)),
    }

    Ok(())
}
