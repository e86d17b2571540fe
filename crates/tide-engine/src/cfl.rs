//! Stability monitors: advective and diffusive Courant numbers.
//!
//! Both are pure functions of the current solver extrema and step size.
//! The driver samples them once per outer iteration for reporting and to
//! feed the [`TimeStepWizard`](crate::TimeStepWizard).

use tide_core::{DiffusivityComponent, OceanSolver, SolverFault, VelocityComponent};
use tide_grid::GridDescriptor;

/// Advective Courant number `dt / timescale`.
///
/// An infinite timescale (fluid at rest) gives `0.0`.
///
/// ```
/// use tide_engine::advective_cfl;
///
/// assert_eq!(advective_cfl(10.0, 40.0), 0.25);
/// assert_eq!(advective_cfl(10.0, f64::INFINITY), 0.0);
/// ```
#[inline]
pub fn advective_cfl(dt: f64, timescale: f64) -> f64 {
    if timescale.is_infinite() {
        0.0
    } else {
        dt / timescale
    }
}

/// Diffusive Courant number `dt · max_diffusivity / min_spacing²`.
#[inline]
pub fn diffusive_cfl(dt: f64, max_diffusivity: f64, min_spacing: f64) -> f64 {
    dt * max_diffusivity / (min_spacing * min_spacing)
}

/// Both Courant numbers for one step size.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CflNumbers {
    /// `Δt / cell_advection_timescale`.
    pub advective: f64,
    /// `Δt · max(ν, κ) / Δ_min²`.
    pub diffusive: f64,
}

/// Solver extrema read once per iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extrema {
    /// Max |u| (m/s).
    pub max_u: f64,
    /// Max |v| (m/s).
    pub max_v: f64,
    /// Max |w| (m/s).
    pub max_w: f64,
    /// Max viscosity ν (m²/s).
    pub max_viscosity: f64,
    /// Max diffusivity κ (m²/s).
    pub max_diffusivity: f64,
    /// Minimum cell-crossing time (s); infinite at rest.
    pub advection_timescale: f64,
}

impl Extrema {
    /// Query every extremum from `solver`.
    ///
    /// # Errors
    ///
    /// [`SolverFault::NonFinite`] if any velocity or diffusivity maximum is
    /// NaN or infinite, or the advection timescale is NaN.
    pub fn from_solver<S: OceanSolver + ?Sized>(solver: &S) -> Result<Self, SolverFault> {
        let extrema = Self {
            max_u: solver.max_abs_velocity(VelocityComponent::U),
            max_v: solver.max_abs_velocity(VelocityComponent::V),
            max_w: solver.max_abs_velocity(VelocityComponent::W),
            max_viscosity: solver.max_diffusivity(DiffusivityComponent::Viscosity),
            max_diffusivity: solver.max_diffusivity(DiffusivityComponent::Diffusivity),
            advection_timescale: solver.cell_advection_timescale(),
        };
        let finite = [
            ("max |u|", extrema.max_u),
            ("max |v|", extrema.max_v),
            ("max |w|", extrema.max_w),
            ("max viscosity", extrema.max_viscosity),
            ("max diffusivity", extrema.max_diffusivity),
        ];
        for (quantity, value) in finite {
            if !value.is_finite() {
                return Err(SolverFault::NonFinite { quantity, value });
            }
        }
        if extrema.advection_timescale.is_nan() {
            return Err(SolverFault::NonFinite {
                quantity: "advection timescale",
                value: extrema.advection_timescale,
            });
        }
        Ok(extrema)
    }

    /// `max(ν, κ)`.
    pub fn max_closure_diffusivity(&self) -> f64 {
        self.max_viscosity.max(self.max_diffusivity)
    }
}

/// Extrema plus the Courant numbers derived from them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StabilitySample {
    /// Raw solver extrema.
    pub extrema: Extrema,
    /// Courant numbers at the sampled step size.
    pub cfl: CflNumbers,
}

/// Evaluates Courant numbers against a fixed grid.
#[derive(Clone, Copy, Debug)]
pub struct StabilityMonitor {
    min_spacing: f64,
}

impl StabilityMonitor {
    /// A monitor for `grid`.
    pub fn new(grid: &GridDescriptor) -> Self {
        Self {
            min_spacing: grid.min_spacing(),
        }
    }

    /// `min(Δx, Δy, Δz)` in metres.
    pub fn min_spacing(&self) -> f64 {
        self.min_spacing
    }

    /// Courant numbers for `dt` given already-read extrema.
    pub fn evaluate(&self, extrema: &Extrema, dt: f64) -> CflNumbers {
        CflNumbers {
            advective: advective_cfl(dt, extrema.advection_timescale),
            diffusive: diffusive_cfl(dt, extrema.max_closure_diffusivity(), self.min_spacing),
        }
    }

    /// Read extrema from `solver` and evaluate Courant numbers for `dt`.
    ///
    /// # Errors
    ///
    /// Any non-finite extremum, see [`Extrema::from_solver`].
    pub fn sample<S: OceanSolver + ?Sized>(
        &self,
        solver: &S,
        dt: f64,
    ) -> Result<StabilitySample, SolverFault> {
        let extrema = Extrema::from_solver(solver)?;
        Ok(StabilitySample {
            cfl: self.evaluate(&extrema, dt),
            extrema,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tide_core::Field;
    use tide_test_utils::MockSolver;

    fn grid() -> GridDescriptor {
        GridDescriptor::new([4, 4, 4], [40.0, 40.0, 8.0]).unwrap()
    }

    #[test]
    fn diffusive_uses_smallest_spacing() {
        // Δ_min = 2 m, ν = 1e-2: Δt · ν / 4.
        assert_eq!(diffusive_cfl(100.0, 1e-2, 2.0), 0.25);
    }

    #[test]
    fn sample_at_rest_is_zero_advective() {
        let mut solver = MockSolver::new(64);
        solver.mock_fields_mut().fill(Field::Viscosity, 1e-3);
        solver.mock_fields_mut().fill(Field::Diffusivity, 4e-3);
        let s = StabilityMonitor::new(&grid()).sample(&solver, 50.0).unwrap();
        assert_eq!(s.cfl.advective, 0.0);
        assert_eq!(s.cfl.diffusive, 50.0 * 4e-3 / 4.0);
        assert_eq!(s.extrema.max_closure_diffusivity(), 4e-3);
    }

    #[test]
    fn sample_uses_solver_timescale() {
        let solver = MockSolver::new(64).with_timescale(200.0);
        let s = StabilityMonitor::new(&grid()).sample(&solver, 50.0).unwrap();
        assert_eq!(s.cfl.advective, 0.25);
    }

    #[test]
    fn nan_velocity_is_a_solver_fault() {
        let mut solver = MockSolver::new(64);
        let mut u = vec![0.0; 64];
        u[10] = f64::NAN;
        solver.mock_fields_mut().set_field(Field::VelocityU, u);
        match StabilityMonitor::new(&grid()).sample(&solver, 1.0) {
            Err(SolverFault::NonFinite { quantity, .. }) => assert_eq!(quantity, "max |u|"),
            other => panic!("expected NonFinite, got {other:?}"),
        }
    }

    #[test]
    fn nan_timescale_is_a_solver_fault() {
        let solver = MockSolver::new(64).with_timescale(f64::NAN);
        assert!(matches!(
            StabilityMonitor::new(&grid()).sample(&solver, 1.0),
            Err(SolverFault::NonFinite { .. })
        ));
    }
}
