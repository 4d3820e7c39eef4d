//! Palette command implementation.
//!
//! Lists a template's colours by frequency and toggles their visibility.
//! Colour lines go to stdout; status goes to stderr.

use clap::Args;

use crate::discovery::Project;
use crate::error::Result;
use crate::output::{plural, Printer};
use crate::progress::group_thousands;
use crate::types::Rgb;

use super::{open_registry_with_selection, resolve_template};

/// Show or toggle the colours of a template
#[derive(Args, Debug)]
pub struct PaletteArgs {
    /// Storage key of the template (default: selected template)
    pub key: Option<String>,

    /// Show a colour again ("r,g,b" or #RRGGBB)
    #[arg(long, value_name = "COLOUR")]
    pub enable: Vec<Rgb>,

    /// Hide a colour from drawing and counting ("r,g,b" or #RRGGBB)
    #[arg(long, value_name = "COLOUR")]
    pub disable: Vec<Rgb>,
}

pub fn run(args: PaletteArgs, project: &Project, printer: &Printer) -> Result<()> {
    let mut registry = open_registry_with_selection(project)?;
    let key = resolve_template(&registry, args.key.as_deref())?.storage_key.to_string();

    for rgb in &args.enable {
        registry.set_colour_enabled(&key, *rgb, true)?;
        printer.status("Enabled", &format!("{} {}", rgb, printer.swatch(*rgb)));
    }
    for rgb in &args.disable {
        registry.set_colour_enabled(&key, *rgb, false)?;
        printer.status("Disabled", &format!("{} {}", rgb, printer.swatch(*rgb)));
    }

    let template = resolve_template(&registry, Some(&key))?;
    let colours = template.palette.by_frequency();
    printer.info(
        "Palette",
        &format!("{} {}", template.display_name, printer.dim(&plural(colours.len(), "colour", "colours"))),
    );
    for (rgb, entry) in colours {
        let state = if entry.enabled { "shown" } else { "hidden" };
        println!("{:<12} {} {:>10} {}", rgb.to_string(), rgb.to_hex(), group_thousands(entry.count), state);
    }

    Ok(())
}
