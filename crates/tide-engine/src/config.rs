//! Run configuration, validation, and assembly.
//!
//! [`SimulationConfig`] is the serde-facing description of a run. It is
//! loaded from JSON (or produced by a [`Preset`](crate::Preset)),
//! [`validate`](SimulationConfig::validate)d eagerly, and assembled into a
//! [`SimulationSetup`] ready to hand to the driver.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tide_core::{ConfigError, OutputError};
use tide_forcing::{
    ForcingEngine, MaintenanceStrategy, MeltwaterMaintenance, OverlapPolicy, RelaxationRegion,
    SpongeLayer,
};
use tide_grid::GridDescriptor;
use tide_obs::{
    FrameWriter, NullSink, OutputEntry, OutputPlan, OutputScheduler, OutputSink, OutputSpec,
    WriterSchedule,
};

use crate::clock::SimulationClock;
use crate::context::SimulationContext;
use crate::error::RunError;
use crate::wizard::TimeStepWizard;

// ── GridConfig ─────────────────────────────────────────────────────

/// Grid dimensions and physical extents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Cell counts `[Nx, Ny, Nz]`.
    pub size: [usize; 3],
    /// Extents `[Lx, Ly, Lz]` in metres.
    pub extent: [f64; 3],
}

impl GridConfig {
    /// Build the grid descriptor.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidGrid`].
    pub fn build(&self) -> Result<GridDescriptor, ConfigError> {
        GridDescriptor::new(self.size, self.extent)
    }
}

// ── ControllerConfig ───────────────────────────────────────────────

/// Step-size controller parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Initial step `Δt₀` in seconds.
    pub initial_dt: f64,
    /// Target advective Courant number.
    #[serde(default = "default_cfl_target")]
    pub cfl_target: f64,
    /// Bound on the per-iteration ratio `Δt'/Δt`; must exceed 1.
    #[serde(default = "default_max_change")]
    pub max_change: f64,
    /// Hard ceiling on `Δt` in seconds.
    pub max_dt: f64,
    /// Optional diffusive Courant target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diffusive_cfl_target: Option<f64>,
}

fn default_cfl_target() -> f64 {
    0.5
}

fn default_max_change() -> f64 {
    1.1
}

impl ControllerConfig {
    /// Build the controller.
    ///
    /// # Errors
    ///
    /// Any invalid parameter, see [`TimeStepWizard::new`].
    pub fn build(&self) -> Result<TimeStepWizard, ConfigError> {
        let wizard =
            TimeStepWizard::new(self.initial_dt, self.cfl_target, self.max_change, self.max_dt)?;
        match self.diffusive_cfl_target {
            Some(target) => wizard.with_diffusive_cfl_target(target),
            None => Ok(wizard),
        }
    }
}

// ── ForcingConfig ──────────────────────────────────────────────────

/// Relaxation regions, sponge, and meltwater maintenance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ForcingConfig {
    /// Source regions.
    #[serde(default)]
    pub regions: Vec<RelaxationRegion>,
    /// Optional boundary sponge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sponge: Option<SpongeLayer>,
    /// How the sponge combines with sources where both apply.
    #[serde(default)]
    pub overlap: OverlapPolicy,
    /// Meltwater tracer maintenance strategy.
    #[serde(default)]
    pub maintenance: MaintenanceStrategy,
}

impl ForcingConfig {
    /// Build the forcing engine and the maintenance step for `grid`.
    ///
    /// # Errors
    ///
    /// Any region, sponge, or strategy error.
    pub fn build(
        &self,
        grid: &GridDescriptor,
    ) -> Result<(ForcingEngine, MeltwaterMaintenance), ConfigError> {
        let engine =
            ForcingEngine::new(grid, self.regions.clone(), self.sponge.clone(), self.overlap)?;
        let maintenance = MeltwaterMaintenance::from_engine(&engine, self.maintenance)?;
        Ok((engine, maintenance))
    }
}

// ── InitialConditions ──────────────────────────────────────────────

/// Uniform starting state handed to the solver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    /// Temperature (°C).
    #[serde(default)]
    pub temperature: f64,
    /// Salinity (psu).
    #[serde(default = "default_salinity")]
    pub salinity: f64,
    /// Background velocity `[u, v, w]` (m/s).
    #[serde(default)]
    pub velocity: [f64; 3],
    /// Turbulent viscosity ν (m²/s).
    #[serde(default = "default_closure")]
    pub viscosity: f64,
    /// Turbulent diffusivity κ (m²/s).
    #[serde(default = "default_closure")]
    pub diffusivity: f64,
}

fn default_salinity() -> f64 {
    34.5
}

fn default_closure() -> f64 {
    1e-4
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            salinity: default_salinity(),
            velocity: [0.0; 3],
            viscosity: default_closure(),
            diffusivity: default_closure(),
        }
    }
}

impl InitialConditions {
    /// Check that every value is finite and closures are non-negative.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidParameter`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let values = [
            ("temperature", self.temperature),
            ("salinity", self.salinity),
            ("u", self.velocity[0]),
            ("v", self.velocity[1]),
            ("w", self.velocity[2]),
        ];
        for (what, v) in values {
            if !v.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name: "initial conditions",
                    reason: format!("{what} must be finite, got {v}"),
                });
            }
        }
        for (what, v) in [("viscosity", self.viscosity), ("diffusivity", self.diffusivity)] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name: "initial conditions",
                    reason: format!("{what} must be finite and non-negative, got {v}"),
                });
            }
        }
        Ok(())
    }
}

// ── OutputConfig ───────────────────────────────────────────────────

/// Where a schedule's payloads go.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Discard output.
    #[default]
    Null,
    /// Binary frame file.
    Frames {
        /// Output file path.
        path: PathBuf,
    },
}

impl SinkConfig {
    /// Open the sink for schedule `name`.
    ///
    /// # Errors
    ///
    /// Any I/O error creating the file.
    pub fn open(&self, name: &str) -> Result<Box<dyn OutputSink>, OutputError> {
        match self {
            Self::Null => Ok(Box::new(NullSink)),
            Self::Frames { path } => Ok(Box::new(FrameWriter::create(path, name)?)),
        }
    }
}

/// One output schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Unique schedule name.
    pub name: String,
    /// Cadence in simulation seconds.
    pub interval: f64,
    /// Arrays to persist.
    pub entries: Vec<OutputEntry>,
    /// Destination.
    #[serde(default)]
    pub sink: SinkConfig,
}

impl OutputConfig {
    /// The output spec for this schedule.
    pub fn spec(&self) -> OutputSpec {
        OutputSpec::new(self.entries.clone())
    }

    fn validate(&self, grid: &GridDescriptor) -> Result<(), ConfigError> {
        if !(self.interval.is_finite() && self.interval > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "output interval",
                value: self.interval,
            });
        }
        if self.entries.is_empty() {
            return Err(ConfigError::EmptyOutput {
                name: self.name.clone(),
            });
        }
        OutputPlan::compile(&self.spec(), grid).map(|_| ())
    }
}

// ── SimulationConfig ───────────────────────────────────────────────

/// Complete description of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Run name used in logs.
    #[serde(default = "default_name")]
    pub name: String,
    /// Grid geometry.
    pub grid: GridConfig,
    /// Stop time in seconds.
    pub end_time: f64,
    /// Solver sub-steps per outer iteration (`Ni`).
    #[serde(default = "default_inner_steps")]
    pub inner_steps: u32,
    /// Step-size controller.
    pub controller: ControllerConfig,
    /// Forcing and maintenance.
    #[serde(default)]
    pub forcing: ForcingConfig,
    /// Starting state.
    #[serde(default)]
    pub initial: InitialConditions,
    /// Output schedules, fired in this order.
    #[serde(default)]
    pub outputs: Vec<OutputConfig>,
}

fn default_name() -> String {
    "tide".to_string()
}

fn default_inner_steps() -> u32 {
    10
}

/// Validated components ready to drive a run.
pub struct SimulationSetup {
    /// Grid, clock, and controller.
    pub context: SimulationContext,
    /// Per-cell relaxation forcing.
    pub forcing: ForcingEngine,
    /// Once-per-iteration meltwater step.
    pub maintenance: MeltwaterMaintenance,
    /// Registered output schedules.
    pub scheduler: OutputScheduler,
    /// Starting state for the solver.
    pub initial: InitialConditions,
    /// Run name.
    pub name: String,
}

impl std::fmt::Debug for SimulationSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationSetup")
            .field("name", &self.name)
            .field("context", &self.context)
            .field("outputs", &self.scheduler.len())
            .finish_non_exhaustive()
    }
}

impl SimulationConfig {
    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Unreadable`] or [`ConfigError::Malformed`]. The
    /// result is not validated.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    /// Parse a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Malformed`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Malformed {
            reason: e.to_string(),
        })
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Malformed`] if a value cannot be represented.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Malformed {
            reason: e.to_string(),
        })
    }

    /// Write pretty-printed JSON to `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Unreadable`] on I/O failure.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Check every invariant without opening any sink.
    ///
    /// # Errors
    ///
    /// The first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let grid = self.grid.build()?;
        self.validate_run()?;
        self.controller.build()?;
        self.forcing.build(&grid)?;
        self.initial.validate()?;
        self.validate_outputs(&grid)
    }

    fn validate_run(&self) -> Result<(), ConfigError> {
        if !(self.end_time.is_finite() && self.end_time > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "end time",
                value: self.end_time,
            });
        }
        if self.inner_steps == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "inner_steps",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    fn validate_outputs(&self, grid: &GridDescriptor) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for output in &self.outputs {
            if !names.insert(output.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    name: output.name.clone(),
                });
            }
            output.validate(grid)?;
        }
        Ok(())
    }

    /// Validate and assemble, opening each sink from its [`SinkConfig`].
    ///
    /// # Errors
    ///
    /// Any configuration error, or an I/O error opening a sink.
    pub fn build(&self) -> Result<SimulationSetup, RunError> {
        self.build_with(|output| output.sink.open(&output.name))
    }

    /// Validate and assemble, opening sinks with `make_sink`.
    ///
    /// Every invariant is checked before the first sink is opened.
    ///
    /// # Errors
    ///
    /// Any configuration error, or an error returned by `make_sink`.
    pub fn build_with<F>(&self, mut make_sink: F) -> Result<SimulationSetup, RunError>
    where
        F: FnMut(&OutputConfig) -> Result<Box<dyn OutputSink>, OutputError>,
    {
        let grid = self.grid.build()?;
        self.validate_run()?;
        let wizard = self.controller.build()?;
        let (forcing, maintenance) = self.forcing.build(&grid)?;
        self.initial.validate()?;
        self.validate_outputs(&grid)?;

        let mut scheduler = OutputScheduler::new();
        for output in &self.outputs {
            let sink = make_sink(output)?;
            let schedule =
                WriterSchedule::new(&output.name, output.interval, &output.spec(), &grid, sink)?;
            scheduler.register(schedule)?;
        }

        Ok(SimulationSetup {
            context: SimulationContext {
                grid,
                clock: SimulationClock::new(),
                wizard,
                end_time: self.end_time,
                inner_steps: self.inner_steps,
            },
            forcing,
            maintenance,
            scheduler,
            initial: self.initial.clone(),
            name: self.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tide_core::Field;
    use tide_forcing::TracerTargets;
    use tide_grid::{Axis, CellIndex, Region};

    fn base() -> SimulationConfig {
        SimulationConfig {
            name: "test".into(),
            grid: GridConfig {
                size: [8, 8, 4],
                extent: [80.0, 80.0, 40.0],
            },
            end_time: 600.0,
            inner_steps: 10,
            controller: ControllerConfig {
                initial_dt: 1.0,
                cfl_target: 0.5,
                max_change: 1.1,
                max_dt: 10.0,
                diffusive_cfl_target: None,
            },
            forcing: ForcingConfig {
                regions: vec![RelaxationRegion::new(
                    Region::Point {
                        cell: CellIndex::new(4, 0, 2),
                    },
                    TracerTargets::new(-1.0, 0.0),
                    1.0 / 60.0,
                )],
                ..Default::default()
            },
            initial: InitialConditions::default(),
            outputs: vec![OutputConfig {
                name: "fields".into(),
                interval: 60.0,
                entries: vec![OutputEntry::slice(Field::Temperature, Axis::X, 4)],
                sink: SinkConfig::Null,
            }],
        }
    }

    #[test]
    fn base_config_is_valid() {
        base().validate().unwrap();
        let setup = base().build().unwrap();
        assert_eq!(setup.scheduler.len(), 1);
        assert_eq!(setup.context.wizard.dt(), 1.0);
        assert_eq!(setup.context.clock.time(), 0.0);
    }

    #[test]
    fn json_round_trip_preserves_config() {
        let cfg = base();
        let json = cfg.to_json().unwrap();
        assert_eq!(SimulationConfig::from_json(&json).unwrap(), cfg);
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let json = r#"{
            "grid": {"size": [4, 4, 4], "extent": [4.0, 4.0, 4.0]},
            "end_time": 100.0,
            "controller": {"initial_dt": 1.0, "max_dt": 5.0}
        }"#;
        let cfg = SimulationConfig::from_json(json).unwrap();
        assert_eq!(cfg.name, "tide");
        assert_eq!(cfg.inner_steps, 10);
        assert_eq!(cfg.controller.cfl_target, 0.5);
        assert_eq!(cfg.controller.max_change, 1.1);
        assert_eq!(cfg.forcing.maintenance, MaintenanceStrategy::PinOnly);
        assert!(cfg.outputs.is_empty());
        cfg.validate().unwrap();
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            SimulationConfig::from_json("{ not json"),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn missing_file_is_unreadable() {
        match SimulationConfig::from_file("/nonexistent/tide/config.json") {
            Err(ConfigError::Unreadable { path, .. }) => assert!(path.contains("config.json")),
            other => panic!("expected Unreadable, got {other:?}"),
        }
    }

    #[test]
    fn zero_inner_steps_rejected() {
        let mut cfg = base();
        cfg.inner_steps = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidParameter { name: "inner_steps", .. })
        ));
    }

    #[test]
    fn bad_end_time_rejected() {
        let mut cfg = base();
        cfg.end_time = -1.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::NonPositive { .. })));
    }

    #[test]
    fn max_change_at_one_rejected() {
        let mut cfg = base();
        cfg.controller.max_change = 1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn out_of_range_slice_rejected_before_any_sink_opens() {
        let mut cfg = base();
        cfg.outputs[0].entries = vec![OutputEntry::slice(Field::Temperature, Axis::Z, 4)];
        let mut opened = 0;
        let result = cfg.build_with(|_| {
            opened += 1;
            Ok(Box::new(NullSink))
        });
        assert!(matches!(
            result,
            Err(RunError::Config(ConfigError::SliceOutOfBounds { .. }))
        ));
        assert_eq!(opened, 0);
    }

    #[test]
    fn duplicate_output_names_rejected() {
        let mut cfg = base();
        let dup = cfg.outputs[0].clone();
        cfg.outputs.push(dup);
        assert!(matches!(cfg.validate(), Err(ConfigError::DuplicateName { .. })));
    }

    #[test]
    fn zeroing_strategy_without_sponge_rejected() {
        let mut cfg = base();
        cfg.forcing.maintenance = MaintenanceStrategy::PinAndZeroSponge;
        assert!(matches!(cfg.validate(), Err(ConfigError::MissingSponge { .. })));
    }

    #[test]
    fn negative_viscosity_rejected() {
        let mut cfg = base();
        cfg.initial.viscosity = -1.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_output_interval_rejected() {
        let mut cfg = base();
        cfg.outputs[0].interval = 0.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NonPositive { name: "output interval", .. })
        ));
    }
}
