//! Enable and disable commands.

use clap::Args;

use crate::discovery::Project;
use crate::error::{MarbleError, Result};
use crate::output::{plural, Printer};

/// Select templates to show or hide
#[derive(Args, Debug)]
pub struct ToggleArgs {
    /// Storage key of the template, e.g. "3 !"
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub key: Option<String>,

    /// Apply to every template
    #[arg(long)]
    pub all: bool,
}

pub fn run(args: ToggleArgs, enabled: bool, project: &Project, printer: &Printer) -> Result<()> {
    let mut registry = project.open_registry()?;
    let verb = if enabled { "Enabled" } else { "Disabled" };

    if args.all {
        let changed = registry.set_all_enabled(enabled)?;
        printer.status(verb, &plural(changed, "template", "templates"));
        return Ok(());
    }

    let key = args.key.ok_or_else(|| MarbleError::validation("A template key or --all is required"))?;
    registry.set_enabled(&key, enabled)?;
    printer.status(verb, &key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::discover;
    use crate::render::encode_png;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn test_disable_then_enable_all() {
        let dir = tempdir().unwrap();
        let project = discover(dir.path()).unwrap();
        {
            let mut registry = project.open_registry().unwrap();
            let png = encode_png(&RgbaImage::from_pixel(1, 1, Rgba([1, 1, 1, 255]))).unwrap();
            registry.create(&png, "a", [0.0; 4]).unwrap();
            registry.create(&png, "b", [0.0; 4]).unwrap();
        }

        let printer = Printer::plain();
        run(ToggleArgs { key: Some("1 !".to_string()), all: false }, false, &project, &printer).unwrap();
        assert_eq!(project.open_registry().unwrap().active_sorted().len(), 1);

        run(ToggleArgs { key: None, all: true }, true, &project, &printer).unwrap();
        assert_eq!(project.open_registry().unwrap().active_sorted().len(), 2);

        assert!(run(ToggleArgs { key: Some("9 !".to_string()), all: false }, true, &project, &printer).is_err());
    }
}
