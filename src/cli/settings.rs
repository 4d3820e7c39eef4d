//! Settings command implementation.

use clap::{Args, ValueEnum};

use crate::discovery::Project;
use crate::error::Result;
use crate::output::Printer;
use crate::store::UserSettings;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

/// Show or change user settings
#[derive(Args, Debug)]
pub struct SettingsArgs {
    /// Opt in or out of telemetry
    #[arg(long, value_enum)]
    pub telemetry: Option<Switch>,
}

pub fn run(args: SettingsArgs, project: &Project, printer: &Printer) -> Result<()> {
    let mut store = project.store();
    let mut settings = UserSettings::load_or_init(&mut store)?;

    if let Some(switch) = args.telemetry {
        settings.telemetry = switch == Switch::On;
        settings.save(&mut store)?;
        printer.status("Updated", &format!("telemetry {}", if settings.telemetry { "on" } else { "off" }));
    }

    printer.info("Install", &settings.uuid.to_string());
    printer.info("Telemetry", if settings.telemetry { "on" } else { "off" });
    if let Some(key) = &settings.selected_template {
        printer.info("Selected", key);
    }
    Ok(())
}
