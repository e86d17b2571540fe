//! Benchmark fixtures for the Tide simulation driver.
//!
//! - [`box_model_forcing`]: the 1×256×64 box-model forcing (source block
//!   plus linear-profile sponge)
//! - [`stratified_temperature`]: a deterministic non-uniform T field
//! - [`box_model_simulation`]: the box-model preset driven by the
//!   kinematic solver

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tide_core::{ConfigError, Field};
use tide_engine::{Preset, RunError, Simulation};
use tide_forcing::ForcingEngine;
use tide_grid::GridDescriptor;
use tide_solvers::KinematicSolver;

/// Forcing engine and grid of the box-model preset.
pub fn box_model_forcing() -> Result<ForcingEngine, ConfigError> {
    let config = Preset::BoxModel.config();
    let grid = config.grid.build()?;
    let (forcing, _) = config.forcing.build(&grid)?;
    Ok(forcing)
}

/// Temperature decreasing linearly with depth plus a small along-y ripple.
pub fn stratified_temperature(grid: &GridDescriptor) -> Vec<f64> {
    grid.cells()
        .map(|c| {
            let z = c.k as f64 / grid.nz() as f64;
            let ripple = ((c.j % 16) as f64 / 16.0 - 0.5) * 0.1;
            -1.5 + 2.5 * z + ripple
        })
        .collect()
}

/// The box-model preset with `end_time` seconds, outputs discarded, driven
/// by the kinematic solver.
pub fn box_model_simulation(end_time: f64) -> Result<Simulation<KinematicSolver>, RunError> {
    let mut config = Preset::BoxModel.config();
    config.end_time = end_time;
    let setup = config.build()?;
    let init = &setup.initial;
    let mut solver = KinematicSolver::builder(&setup.context.grid)
        .velocity(init.velocity)
        .viscosity(init.viscosity)
        .diffusivity(init.diffusivity)
        .salinity(init.salinity)
        .forcing(setup.forcing.clone())
        .build()?;
    let t = stratified_temperature(&setup.context.grid);
    solver
        .solver_fields_mut()
        .get_mut(Field::Temperature)
        .copy_from_slice(&t);
    Ok(Simulation::new(setup, solver))
}
