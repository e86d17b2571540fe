//! The `validate` subcommand.

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::ConfigSource;

/// Arguments for `tide validate`.
#[derive(Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: ConfigSource,
}

/// Execute `tide validate`.
pub fn execute(args: ValidateArgs) -> Result<()> {
    let config = args.source.load()?;
    config.validate().context("configuration is invalid")?;
    let [nx, ny, nz] = config.grid.size;
    info!(
        name = %config.name,
        grid = %format!("{nx}x{ny}x{nz}"),
        regions = config.forcing.regions.len(),
        sponge = config.forcing.sponge.is_some(),
        maintenance = %config.forcing.maintenance,
        outputs = config.outputs.len(),
        "configuration is valid"
    );
    println!("{}: OK", config.name);
    Ok(())
}
