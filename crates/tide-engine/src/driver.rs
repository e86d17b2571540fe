//! The outer simulation loop.
//!
//! [`Simulation`] owns the solver, the [`SimulationContext`], the
//! meltwater maintenance step, and the output scheduler. Each
//! [`step()`](Simulation::step) runs one outer iteration:
//!
//! 1. `advance(Δt, Ni)` on the solver, then tick the clock.
//! 2. Meltwater maintenance.
//! 3. Poll output schedules at the new clock time.
//! 4. Sample stability monitors and update the step size.
//! 5. Emit and return a [`ProgressReport`].
//!
//! # Ownership model
//!
//! Every mutating method takes `&mut self`, so outer iterations cannot
//! overlap and maintenance can never run concurrently with `advance`.
//! `Simulation<S>` is [`Send`] whenever `S` is.
//!
//! # Failure
//!
//! Nothing is retried. On a solver fault or output error the driver moves
//! to [`DriverState::Terminated`], closes every writer, and returns the
//! original error.

use std::time::Instant;

use tide_core::{Field, OceanSolver, SolverFault};
use tide_forcing::{ForcingEngine, MeltwaterMaintenance};
use tide_obs::OutputScheduler;
use tracing::{debug, info, warn};

use crate::cfl::StabilityMonitor;
use crate::config::SimulationSetup;
use crate::context::SimulationContext;
use crate::error::RunError;
use crate::metrics::{micros, StepMetrics};
use crate::progress::ProgressReport;

const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check<S: OceanSolver + Send>() {
        assert_send::<Simulation<S>>();
    }
};

/// Lifecycle of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState {
    /// Accepting `step()` calls.
    Running,
    /// End time reached or a fatal error occurred; writers are closed.
    Terminated,
}

/// What a completed [`Simulation::run`] did.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Outer iterations (one progress report each).
    pub outer_iterations: u64,
    /// Solver sub-steps.
    pub sub_steps: u64,
    /// Final simulation time in seconds.
    pub time: f64,
    /// Fires per output schedule, in registration order.
    pub fires: Vec<(String, u64)>,
}

/// Drives an [`OceanSolver`] to the configured end time.
///
/// # Example
///
/// ```ignore
/// let setup = Preset::BoxModel.config().build()?;
/// let solver = make_solver(&setup);
/// let mut sim = Simulation::new(setup, solver);
/// let summary = sim.run()?;
/// ```
pub struct Simulation<S: OceanSolver> {
    name: String,
    solver: S,
    context: SimulationContext,
    forcing: ForcingEngine,
    maintenance: MeltwaterMaintenance,
    scheduler: OutputScheduler,
    monitor: StabilityMonitor,
    state: DriverState,
    outer_iterations: u64,
    last_metrics: StepMetrics,
}

impl<S: OceanSolver> Simulation<S> {
    /// Assemble a driver from a validated setup and a solver.
    ///
    /// The solver is expected to consume `setup.forcing` as its per-cell
    /// source term; the driver keeps a copy for inspection only.
    pub fn new(setup: SimulationSetup, solver: S) -> Self {
        let SimulationSetup {
            context,
            forcing,
            maintenance,
            scheduler,
            name,
            ..
        } = setup;
        let monitor = StabilityMonitor::new(&context.grid);
        info!(
            simulation = %name,
            cells = context.grid.cell_count(),
            regions = forcing.regions().len(),
            sponge = forcing.sponge().is_some(),
            maintenance = %maintenance.strategy(),
            outputs = scheduler.len(),
            end_time = context.end_time,
            "simulation ready"
        );
        Self {
            name,
            solver,
            context,
            forcing,
            maintenance,
            scheduler,
            monitor,
            state: DriverState::Running,
            outer_iterations: 0,
            last_metrics: StepMetrics::default(),
        }
    }

    /// Run one outer iteration.
    ///
    /// When the clock reaches the end time the driver terminates and
    /// closes every writer before returning the final report.
    ///
    /// # Errors
    ///
    /// [`RunError::Terminated`] if the run has already ended; otherwise
    /// any solver fault or output error, after writers are closed.
    pub fn step(&mut self) -> Result<ProgressReport, RunError> {
        if self.state == DriverState::Terminated {
            return Err(RunError::Terminated);
        }
        let start = Instant::now();
        let dt = self.context.wizard.dt();
        let n_steps = self.context.inner_steps;
        let mut metrics = StepMetrics {
            sub_steps: n_steps,
            ..StepMetrics::default()
        };

        let t0 = Instant::now();
        if let Err(fault) = self.solver.advance(dt, n_steps) {
            return Err(self.abort(fault.into()));
        }
        metrics.advance_us = micros(t0.elapsed());
        self.context.clock.tick(dt, n_steps);

        let t0 = Instant::now();
        if let Err(fault) = self.maintain() {
            return Err(self.abort(fault.into()));
        }
        metrics.maintenance_us = micros(t0.elapsed());

        let t0 = Instant::now();
        let time = self.context.clock.time();
        metrics.outputs_fired = match self.scheduler.poll(time, self.solver.fields()) {
            Ok(fired) => fired,
            Err(e) => return Err(self.abort(e.into())),
        };
        metrics.output_us = micros(t0.elapsed());

        let t0 = Instant::now();
        let sample = match self.monitor.sample(&self.solver, dt) {
            Ok(sample) => sample,
            Err(fault) => return Err(self.abort(fault.into())),
        };
        let next_dt = self.context.wizard.update(sample.cfl);
        metrics.monitor_us = micros(t0.elapsed());
        metrics.total_us = micros(start.elapsed());

        self.outer_iterations += 1;
        let report = ProgressReport {
            percent: self.context.percent_complete(),
            iteration: self.context.clock.iteration(),
            time,
            days: self.context.clock.days(),
            extrema: sample.extrema,
            cfl: sample.cfl,
            next_dt,
            wall_per_substep: metrics.wall_per_substep(),
        };
        info!(simulation = %self.name, "{report}");
        debug!(
            total_us = metrics.total_us,
            advance_us = metrics.advance_us,
            maintenance_us = metrics.maintenance_us,
            output_us = metrics.output_us,
            monitor_us = metrics.monitor_us,
            outputs_fired = metrics.outputs_fired,
            "iteration timings"
        );
        self.last_metrics = metrics;

        if self.context.is_finished() {
            self.finish()?;
        }
        Ok(report)
    }

    /// Step until the end time.
    ///
    /// # Errors
    ///
    /// The first error from [`step`](Self::step).
    pub fn run(&mut self) -> Result<RunSummary, RunError> {
        while self.state == DriverState::Running {
            self.step()?;
        }
        Ok(self.summary())
    }

    /// Counts so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            outer_iterations: self.outer_iterations,
            sub_steps: self.context.clock.iteration(),
            time: self.context.clock.time(),
            fires: self
                .scheduler
                .schedules()
                .iter()
                .map(|s| (s.name().to_string(), s.fires()))
                .collect(),
        }
    }

    fn maintain(&mut self) -> Result<(), SolverFault> {
        if self.maintenance.is_noop() {
            return Ok(());
        }
        let expected = self.context.grid.cell_count();
        let field = self
            .solver
            .fields_mut()
            .write(Field::Meltwater)
            .ok_or(SolverFault::MissingField {
                field: Field::Meltwater,
            })?;
        if field.len() != expected {
            return Err(SolverFault::Diverged {
                reason: format!(
                    "meltwater field has {} cells, grid has {expected}",
                    field.len()
                ),
            });
        }
        self.maintenance.apply(field);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), RunError> {
        self.state = DriverState::Terminated;
        self.scheduler.close_all()?;
        info!(
            simulation = %self.name,
            outer_iterations = self.outer_iterations,
            sub_steps = self.context.clock.iteration(),
            days = self.context.clock.days(),
            "run complete"
        );
        Ok(())
    }

    fn abort(&mut self, error: RunError) -> RunError {
        self.state = DriverState::Terminated;
        warn!(simulation = %self.name, error = %error, "run aborted");
        if let Err(e) = self.scheduler.close_all() {
            warn!(simulation = %self.name, error = %e, "closing outputs after abort failed");
        }
        error
    }

    /// Grid, clock, and controller.
    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    /// The driven solver.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Mutable access to the solver between steps.
    pub fn solver_mut(&mut self) -> &mut S {
        &mut self.solver
    }

    /// The forcing engine this run was configured with.
    pub fn forcing(&self) -> &ForcingEngine {
        &self.forcing
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Timings from the most recent successful iteration.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// The output scheduler.
    pub fn scheduler(&self) -> &OutputScheduler {
        &self.scheduler
    }

    /// Run name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S: OceanSolver> std::fmt::Debug for Simulation<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("time", &self.context.clock.time())
            .field("iteration", &self.context.clock.iteration())
            .field("dt", &self.context.wizard.dt())
            .field("outputs", &self.scheduler.len())
            .finish()
    }
}
