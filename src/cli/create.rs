//! Create command implementation.

use std::fs;
use std::path::PathBuf;

use clap::Args;

use crate::discovery::Project;
use crate::error::{MarbleError, Result};
use crate::output::{display_path, plural, Printer};
use crate::progress::group_thousands;

/// Create a template from an image
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Image file (PNG, JPEG, WebP, ...)
    #[arg(required = true)]
    pub file: PathBuf,

    /// Anchor as TX,TY,PX,PY (tile X/Y, pixel X/Y within the tile)
    #[arg(long, value_parser = parse_coords, allow_hyphen_values = true)]
    pub coords: [f64; 4],

    /// Display name (default: file name)
    #[arg(long)]
    pub name: Option<String>,
}

pub fn run(args: CreateArgs, project: &Project, printer: &Printer) -> Result<()> {
    let bytes = fs::read(&args.file).map_err(|e| MarbleError::Io {
        path: args.file.clone(),
        message: format!("Failed to read image: {}", e),
    })?;

    let name = args.name.unwrap_or_else(|| {
        args.file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let mut registry = project.open_registry()?;
    let template = registry.create(&bytes, &name, args.coords)?;

    printer.status(
        "Created",
        &format!(
            "{} {}",
            printer.template(&template.display_name, &template.storage_key),
            printer.dim(&format!("from {}", display_path(&args.file)))
        ),
    );
    printer.info(
        "Placed",
        &format!(
            "at {} across {}, {} {} to paint",
            template.anchor,
            plural(template.tiles().len(), "tile", "tiles"),
            group_thousands(template.required_pixel_count),
            if template.required_pixel_count == 1 { "pixel" } else { "pixels" }
        ),
    );

    Ok(())
}

/// Parse `"TX,TY,PX,PY"` into four raw numbers; range checks happen later.
pub(crate) fn parse_coords(s: &str) -> std::result::Result<[f64; 4], String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().map_err(|_| format!("'{}' is not a number", p.trim())))
        .collect::<std::result::Result<_, _>>()?;
    values
        .try_into()
        .map_err(|v: Vec<f64>| format!("expected 4 comma-separated numbers, got {}", v.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::discover;
    use crate::render::encode_png;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn test_parse_coords() {
        assert_eq!(parse_coords("12,34,500,500").unwrap(), [12.0, 34.0, 500.0, 500.0]);
        assert_eq!(parse_coords(" 1, 2 ,3,4").unwrap(), [1.0, 2.0, 3.0, 4.0]);
        assert!(parse_coords("1,2,3").is_err());
        assert!(parse_coords("1,2,3,x").is_err());
    }

    #[test]
    fn test_create_stores_template() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("flag.png");
        fs::write(&file, encode_png(&RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255]))).unwrap()).unwrap();
        let project = discover(dir.path()).unwrap();

        let args = CreateArgs {
            file,
            coords: [0.0, 0.0, 0.0, 0.0],
            name: None,
        };
        run(args, &project, &Printer::plain()).unwrap();

        let registry = project.open_registry().unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.templates()[0].display_name, "flag");
        assert_eq!(registry.templates()[0].required_pixel_count, 4);
    }

    #[test]
    fn test_create_rejects_negative_coords() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("flag.png");
        fs::write(&file, encode_png(&RgbaImage::new(1, 1)).unwrap()).unwrap();
        let project = discover(dir.path()).unwrap();

        let args = CreateArgs {
            file,
            coords: [-1.0, 0.0, 0.0, 0.0],
            name: None,
        };
        assert!(run(args, &project, &Printer::plain()).is_err());
        assert!(project.open_registry().unwrap().is_empty());
    }
}
