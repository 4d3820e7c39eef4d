//! List command implementation.
//!
//! Prints the stored templates, or a JSON inventory with `--json`.

use clap::Args;
use serde_json::json;

use crate::discovery::Project;
use crate::error::{MarbleError, Result};
use crate::output::{plural, Printer};
use crate::progress::group_thousands;
use crate::registry::TemplateRegistry;

/// List stored templates
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print machine-readable JSON to stdout
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: ListArgs, project: &Project, printer: &Printer) -> Result<()> {
    let registry = project.open_registry()?;

    if args.json {
        let json = serde_json::to_string_pretty(&inventory(&registry))
            .map_err(|e| MarbleError::parse(format!("Failed to serialise inventory: {}", e)))?;
        println!("{}", json);
        return Ok(());
    }

    if registry.is_empty() {
        printer.warning("Empty", "no templates stored");
        return Ok(());
    }

    for template in registry.templates() {
        let state = if template.enabled { "" } else { " (hidden)" };
        printer.info(
            &template.storage_key.to_string(),
            &format!(
                "{}{} {}",
                printer.bold(&template.display_name),
                printer.dim(state),
                printer.dim(&format!(
                    "{} · {} px · {}",
                    template.anchor,
                    group_thousands(template.required_pixel_count),
                    plural(template.palette.len(), "colour", "colours")
                ))
            ),
        );
    }
    printer.status(
        "Listed",
        &format!(
            "{} ({} active)",
            plural(registry.len(), "template", "templates"),
            registry.active_sorted().len()
        ),
    );

    Ok(())
}

/// JSON view of every template.
fn inventory(registry: &TemplateRegistry) -> serde_json::Value {
    let templates: Vec<serde_json::Value> = registry
        .templates()
        .iter()
        .map(|t| {
            json!({
                "key": t.storage_key.to_string(),
                "name": t.display_name,
                "coords": t.anchor.to_coords_string(),
                "enabled": t.enabled,
                "selected": t.selected,
                "required": t.required_pixel_count,
                "tiles": t.tiles().iter().map(|c| c.to_string()).collect::<Vec<_>>(),
                "colours": t.palette.len(),
            })
        })
        .collect();
    json!({ "templates": templates })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegistryOptions;
    use crate::render::encode_png;
    use crate::types::Grid;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_inventory_json() {
        let mut registry = TemplateRegistry::in_memory(RegistryOptions {
            grid: Grid::new(10, 3).unwrap(),
            ..RegistryOptions::default()
        });
        let png = encode_png(&RgbaImage::from_pixel(2, 1, Rgba([7, 7, 7, 255]))).unwrap();
        registry.create(&png, "Bar", [3.0, 4.0, 9.0, 0.0]).unwrap();

        insta::assert_json_snapshot!(inventory(&registry), @r###"
        {
          "templates": [
            {
              "colours": 1,
              "coords": "3,4,9,0",
              "enabled": true,
              "key": "0 !",
              "name": "Bar",
              "required": 2,
              "selected": false,
              "tiles": [
                "3,4",
                "4,4"
              ]
            }
          ]
        }
        "###);
    }
}
