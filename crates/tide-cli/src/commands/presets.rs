//! The `presets` subcommand.

use anyhow::{Context, Result};
use clap::Args;
use tide::engine::Preset;

/// Arguments for `tide presets`.
#[derive(Args)]
pub struct PresetsArgs {
    /// Print this preset's configuration as JSON
    #[arg(short, long)]
    pub show: Option<Preset>,
}

/// Execute `tide presets`.
pub fn execute(args: PresetsArgs) -> Result<()> {
    match args.show {
        Some(preset) => {
            let json = preset
                .config()
                .to_json()
                .with_context(|| format!("serializing preset {preset}"))?;
            println!("{json}");
        }
        None => {
            for preset in Preset::ALL {
                println!("{:<14} {}", preset.name(), preset.description());
            }
        }
    }
    Ok(())
}
