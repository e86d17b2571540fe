//! Tide command-line front end.
//!
//! Runs, validates, and lists ocean simulation configurations driven by
//! the reference kinematic solver.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Tide ocean simulation driver
#[derive(Parser)]
#[command(name = "tide")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Adaptive time-stepping driver for ocean simulations", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation to its end time
    Run(commands::run::RunArgs),
    /// Check a configuration without running it
    Validate(commands::validate::ValidateArgs),
    /// List built-in presets or print one as JSON
    Presets(commands::presets::PresetsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Presets(args) => commands::presets::execute(args),
    }
}
