use clap::Parser;
use miette::Result;
use marble::cli::{Cli, Commands};
use marble::output::Printer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let printer = Printer::new();
    let project = || marble::cli::load_project(cli.config.as_deref());

    match cli.command {
        Commands::Init(args) => marble::cli::init::run(args, &printer)?,
        Commands::Create(args) => marble::cli::create::run(args, &project()?, &printer)?,
        Commands::List(args) => marble::cli::list::run(args, &project()?, &printer)?,
        Commands::Delete(args) => marble::cli::delete::run(args, &project()?, &printer)?,
        Commands::Enable(args) => marble::cli::toggle::run(args, true, &project()?, &printer)?,
        Commands::Disable(args) => marble::cli::toggle::run(args, false, &project()?, &printer)?,
        Commands::Select(args) => marble::cli::select::run(args, &project()?, &printer)?,
        Commands::Palette(args) => marble::cli::palette::run(args, &project()?, &printer)?,
        Commands::Export(args) => marble::cli::export::run(args, &project()?, &printer)?,
        Commands::Import(args) => marble::cli::import::run(args, &project()?, &printer)?,
        Commands::Overlay(args) => marble::cli::overlay::run(args, &project()?, &printer)?,
        Commands::Settings(args) => marble::cli::settings::run(args, &project()?, &printer)?,
        Commands::Completions(args) => marble::cli::completions::run(args)?,
    }

    Ok(())
}

/// Log to stderr. `MARBLE_LOG` wins over `RUST_LOG`; `-v` raises the default.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "marble=warn",
        1 => "marble=debug",
        _ => "marble=trace",
    };
    let filter = EnvFilter::try_from_env("MARBLE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| default.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).without_time())
        .init();
}
