//! Simulation driver for Tide ocean runs.
//!
//! Orchestrates the outer loop around an external [`OceanSolver`]:
//! advance a batch of sub-steps, maintain the meltwater tracer, fire due
//! output schedules, sample stability monitors, and adapt the step size.
//!
//! [`Simulation`] is the user-facing entry point. It is built from a
//! validated [`SimulationSetup`], which in turn comes from a
//! [`SimulationConfig`] (JSON or a [`Preset`]).
//!
//! [`OceanSolver`]: tide_core::OceanSolver

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cfl;
pub mod clock;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod metrics;
pub mod presets;
pub mod progress;
pub mod wizard;

pub use cfl::{advective_cfl, diffusive_cfl, CflNumbers, Extrema, StabilityMonitor, StabilitySample};
pub use clock::SimulationClock;
pub use config::{
    ControllerConfig, ForcingConfig, GridConfig, InitialConditions, OutputConfig, SimulationConfig,
    SimulationSetup, SinkConfig,
};
pub use context::SimulationContext;
pub use driver::{DriverState, RunSummary, Simulation};
pub use error::RunError;
pub use metrics::StepMetrics;
pub use presets::Preset;
pub use progress::ProgressReport;
pub use wizard::{TimeStepWizard, CFL_EPSILON};
