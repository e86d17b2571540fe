//! Subcommand implementations.

pub mod presets;
pub mod run;
pub mod validate;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use tide::engine::{Preset, SimulationConfig};

/// Where a configuration comes from.
#[derive(Args)]
pub struct ConfigSource {
    /// JSON configuration file
    #[arg(short, long, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Built-in preset (point-source, line-inlet, box-model)
    #[arg(short, long)]
    pub preset: Option<Preset>,
}

impl ConfigSource {
    /// Load the selected configuration without validating it.
    pub fn load(&self) -> Result<SimulationConfig> {
        match (&self.config, self.preset) {
            (Some(path), _) => SimulationConfig::from_file(path)
                .with_context(|| format!("loading configuration from {}", path.display())),
            (None, Some(preset)) => Ok(preset.config()),
            (None, None) => bail!("pass either --config <FILE> or --preset <NAME>"),
        }
    }
}
