//! Tide: the control loop around a time-stepping ocean simulation.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Tide sub-crates. For most users, adding `tide-ocean` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tide::prelude::*;
//!
//! // A small box model: source block, sponge, two output schedules.
//! let mut config = Preset::BoxModel.config();
//! config.end_time = 120.0;
//! let setup = config.build().unwrap();
//!
//! let init = setup.initial.clone();
//! let solver = KinematicSolver::builder(&setup.context.grid)
//!     .velocity(init.velocity)
//!     .diffusivity(init.diffusivity)
//!     .temperature(init.temperature)
//!     .salinity(init.salinity)
//!     .forcing(setup.forcing.clone())
//!     .build()
//!     .unwrap();
//!
//! let mut sim = Simulation::new(setup, solver);
//! let summary = sim.run().unwrap();
//! assert!(summary.time >= 120.0);
//! assert_eq!(sim.state(), DriverState::Terminated);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tide-core` | Field identifiers, solver and field traits, errors |
//! | [`grid`] | `tide-grid` | Grid descriptor, cell indices, regions |
//! | [`forcing`] | `tide-forcing` | Relaxation forcing, sponge, meltwater maintenance |
//! | [`obs`] | `tide-obs` | Output specs, scheduler, sinks, frame files |
//! | [`engine`] | `tide-engine` | CFL monitors, step-size controller, driver, config |
//! | [`solvers`] | `tide-solvers` | Reference kinematic solver |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and errors (`tide-core`).
///
/// Contains the [`types::OceanSolver`] contract, the field access traits
/// ([`types::FieldReader`], [`types::FieldWriter`]), and the error enums.
pub use tide_core as types;

/// Grid geometry and forcing regions (`tide-grid`).
pub use tide_grid as grid;

/// Relaxation forcing and meltwater maintenance (`tide-forcing`).
///
/// [`forcing::ForcingEngine`] evaluates per-cell source terms;
/// [`forcing::MeltwaterMaintenance`] runs once per outer iteration.
pub use tide_forcing as forcing;

/// Output specification, scheduling, and sinks (`tide-obs`).
///
/// Build [`obs::OutputSpec`] descriptions, register
/// [`obs::WriterSchedule`]s, and persist with [`obs::FrameWriter`].
pub use tide_obs as obs;

/// Stability monitoring, step-size control, and the driver (`tide-engine`).
pub use tide_engine as engine;

/// Reference solvers (`tide-solvers`).
pub use tide_solvers as solvers;

/// Common imports for typical Tide usage.
///
/// ```rust
/// use tide::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use tide_core::{Field, FieldReader, FieldWriter, OceanSolver, Tracer};

    // Errors
    pub use tide_core::{ConfigError, OutputError, SolverFault};

    // Grid
    pub use tide_grid::{Axis, CellIndex, GridDescriptor, Region, Side};

    // Forcing
    pub use tide_forcing::{
        ForcingEngine, MaintenanceStrategy, OverlapPolicy, ReferenceProfile, RelaxationRegion,
        SpongeLayer, TracerTargets,
    };

    // Output
    pub use tide_obs::{FrameReader, FrameWriter, OutputEntry, OutputSink, OutputSpec, Payload};

    // Engine
    pub use tide_engine::{
        DriverState, Preset, ProgressReport, RunError, Simulation, SimulationConfig,
        SimulationSetup, TimeStepWizard,
    };

    // Solvers
    pub use tide_solvers::KinematicSolver;
}
