//! Select command implementation.
//!
//! The selection is remembered in the user settings so later `palette` and
//! `export` invocations default to it.

use clap::Args;

use crate::discovery::Project;
use crate::error::Result;
use crate::output::Printer;
use crate::store::UserSettings;

/// Select a template
#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Storage key of the template, e.g. "3 !"
    #[arg(required = true)]
    pub key: String,
}

pub fn run(args: SelectArgs, project: &Project, printer: &Printer) -> Result<()> {
    let mut registry = project.open_registry()?;
    registry.select(&args.key)?;

    let mut store = project.store();
    let mut settings = UserSettings::load_or_init(&mut store)?;
    settings.selected_template = Some(args.key.clone());
    settings.save(&mut store)?;

    if let Some(template) = registry.get(&args.key) {
        printer.status(
            "Selected",
            &printer.template(&template.display_name, &template.storage_key),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::open_registry_with_selection;
    use crate::discovery::discover;
    use crate::render::encode_png;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn test_selection_remembered() {
        let dir = tempdir().unwrap();
        let project = discover(dir.path()).unwrap();
        {
            let mut registry = project.open_registry().unwrap();
            let png = encode_png(&RgbaImage::from_pixel(1, 1, Rgba([1, 1, 1, 255]))).unwrap();
            registry.create(&png, "a", [0.0; 4]).unwrap();
            registry.create(&png, "b", [0.0; 4]).unwrap();
        }

        run(SelectArgs { key: "1 !".to_string() }, &project, &Printer::plain()).unwrap();

        let registry = open_registry_with_selection(&project).unwrap();
        assert_eq!(registry.selected_or_first().unwrap().display_name, "b");
    }

    #[test]
    fn test_select_unknown_key() {
        let dir = tempdir().unwrap();
        let project = discover(dir.path()).unwrap();
        assert!(run(SelectArgs { key: "0 !".to_string() }, &project, &Printer::plain()).is_err());
    }
}
