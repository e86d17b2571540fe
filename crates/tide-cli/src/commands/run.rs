//! The `run` subcommand.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tide::engine::{Simulation, SimulationConfig, SimulationSetup, SinkConfig};
use tide::solvers::KinematicSolver;
use tracing::info;

use super::ConfigSource;

/// Arguments for `tide run`.
#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: ConfigSource,

    /// Redirect every schedule whose sink is `null` to `<DIR>/<name>.frames`
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Override the end time [s]
    #[arg(short = 't', long)]
    pub end_time: Option<f64>,
}

/// Execute `tide run`.
pub fn execute(args: RunArgs) -> Result<()> {
    let mut config = args.source.load()?;
    if let Some(end_time) = args.end_time {
        config.end_time = end_time;
    }
    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        redirect_outputs(&mut config, dir);
    }

    let setup = config.build().context("invalid simulation configuration")?;
    let solver = kinematic_solver(&setup).context("building kinematic solver")?;
    let mut sim = Simulation::new(setup, solver);

    let start = Instant::now();
    let summary = sim.run().context("simulation failed")?;
    info!(
        outer_iterations = summary.outer_iterations,
        sub_steps = summary.sub_steps,
        time = summary.time,
        wall_s = start.elapsed().as_secs_f64(),
        "done"
    );
    for (name, fires) in &summary.fires {
        info!(schedule = %name, fires, "output summary");
    }
    Ok(())
}

fn redirect_outputs(config: &mut SimulationConfig, dir: &std::path::Path) {
    for output in &mut config.outputs {
        if output.sink == SinkConfig::Null {
            output.sink = SinkConfig::Frames {
                path: dir.join(format!("{}.frames", output.name)),
            };
        }
    }
}

fn kinematic_solver(setup: &SimulationSetup) -> Result<KinematicSolver> {
    let init = &setup.initial;
    let solver = KinematicSolver::builder(&setup.context.grid)
        .velocity(init.velocity)
        .viscosity(init.viscosity)
        .diffusivity(init.diffusivity)
        .temperature(init.temperature)
        .salinity(init.salinity)
        .forcing(setup.forcing.clone())
        .build()?;
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tide::engine::Preset;

    #[test]
    fn redirect_only_touches_null_sinks() {
        let mut config = Preset::PointSource.config();
        config.outputs[1].sink = SinkConfig::Frames {
            path: PathBuf::from("keep.frames"),
        };
        redirect_outputs(&mut config, std::path::Path::new("out"));
        assert_eq!(
            config.outputs[0].sink,
            SinkConfig::Frames {
                path: PathBuf::from("out").join("fields.frames")
            }
        );
        assert_eq!(
            config.outputs[1].sink,
            SinkConfig::Frames {
                path: PathBuf::from("keep.frames")
            }
        );
    }

    #[test]
    fn solver_matches_setup_grid() {
        let setup = Preset::LineInlet.config().build().unwrap();
        let solver = kinematic_solver(&setup).unwrap();
        assert_eq!(solver.grid(), &setup.context.grid);
    }
}
