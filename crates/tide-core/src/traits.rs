//! Core abstraction traits for field access and the solver collaborator.

use crate::error::SolverFault;
use crate::field::{DiffusivityComponent, Field, VelocityComponent};

/// Read-only access to solver fields.
///
/// Implemented by solver states to give output selectors and stability
/// monitors read access to field buffers. Returns `None` if the field is
/// not exposed by this solver.
pub trait FieldReader {
    /// Read the data for a field as a flat f64 slice in canonical order.
    fn read(&self, field: Field) -> Option<&[f64]>;
}

/// Mutable access to solver fields.
///
/// Only the driver's once-per-iteration maintenance step writes through
/// this trait, and only between `advance()` calls.
pub trait FieldWriter {
    /// Get a mutable slice for a field.
    ///
    /// Returns `None` if the field is not exposed by this solver.
    fn write(&mut self, field: Field) -> Option<&mut [f64]>;
}

/// The external physics solver driven by the simulation loop.
///
/// The solver owns the velocity, tracer, and closure fields. Its internals
/// (advection schemes, pressure projection, equation of state, turbulence
/// closure) are opaque to the driver. `advance` may be internally parallel
/// but is treated as a synchronous blocking call.
///
/// # Object safety
///
/// This trait is object-safe; drivers may hold `Box<dyn OceanSolver>`.
pub trait OceanSolver {
    /// Advance the state by `n_steps` sub-steps of length `dt` seconds.
    ///
    /// A returned fault is fatal for the run; the driver never retries.
    fn advance(&mut self, dt: f64, n_steps: u32) -> Result<(), SolverFault>;

    /// Minimum cell-crossing time (seconds) for the current velocity field.
    ///
    /// Returns `f64::INFINITY` when the flow is at rest.
    fn cell_advection_timescale(&self) -> f64;

    /// Maximum absolute value of one velocity component (m/s).
    fn max_abs_velocity(&self, component: VelocityComponent) -> f64;

    /// Maximum of one closure diffusivity (m²/s).
    fn max_diffusivity(&self, component: DiffusivityComponent) -> f64;

    /// Read access to the solver's fields.
    fn fields(&self) -> &dyn FieldReader;

    /// Write access to the solver's fields.
    fn fields_mut(&mut self) -> &mut dyn FieldWriter;
}

impl<S: OceanSolver + ?Sized> OceanSolver for Box<S> {
    fn advance(&mut self, dt: f64, n_steps: u32) -> Result<(), SolverFault> {
        (**self).advance(dt, n_steps)
    }

    fn cell_advection_timescale(&self) -> f64 {
        (**self).cell_advection_timescale()
    }

    fn max_abs_velocity(&self, component: VelocityComponent) -> f64 {
        (**self).max_abs_velocity(component)
    }

    fn max_diffusivity(&self, component: DiffusivityComponent) -> f64 {
        (**self).max_diffusivity(component)
    }

    fn fields(&self) -> &dyn FieldReader {
        (**self).fields()
    }

    fn fields_mut(&mut self) -> &mut dyn FieldWriter {
        (**self).fields_mut()
    }
}
