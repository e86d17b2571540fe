//! Prescribed-flow tracer solver.
//!
//! Constructed via the builder pattern: [`KinematicSolver::builder`].

use tide_core::{
    max_abs, max_value, ConfigError, DiffusivityComponent, Field, FieldReader, FieldWriter,
    OceanSolver, SolverFault, Tracer, VelocityComponent,
};
use tide_forcing::ForcingEngine;
use tide_grid::{Axis, GridDescriptor};

use crate::fields::SolverFields;

/// Explicit advection-diffusion of T, S, and meltwater in a prescribed
/// velocity field.
///
/// Each sub-step computes, per cell and per axis with spacing `Δ`:
/// ```text
/// dφ/dt = −c · ∂φ (upwind) + κ · (φ₊ − 2φ + φ₋) / Δ² + F(φ)
/// ```
/// where `F` is the relaxation forcing for T and S and zero for the
/// passive meltwater tracer. Neighbours are clamped at the domain edge, so
/// boundaries are zero-flux.
///
/// Velocity and closure fields are never changed by `advance`, but may be
/// overwritten between calls through [`FieldWriter`].
///
/// # Construction
///
/// ```
/// use tide_core::OceanSolver;
/// use tide_grid::GridDescriptor;
/// use tide_solvers::KinematicSolver;
///
/// let grid = GridDescriptor::new([8, 8, 4], [80.0, 80.0, 40.0]).unwrap();
/// let mut solver = KinematicSolver::builder(&grid)
///     .velocity([0.1, 0.0, 0.0])
///     .diffusivity(1e-4)
///     .temperature(2.0)
///     .build()
///     .unwrap();
/// assert_eq!(solver.cell_advection_timescale(), 100.0);
/// solver.advance(10.0, 5).unwrap();
/// ```
#[derive(Debug)]
pub struct KinematicSolver {
    grid: GridDescriptor,
    forcing: ForcingEngine,
    fields: SolverFields,
    rhs: Vec<f64>,
    source: Vec<f64>,
    sub_steps: u64,
}

/// Builder for [`KinematicSolver`].
///
/// Every value is uniform over the grid. Defaults: fluid at rest, zero
/// closure coefficients, `T = 0`, `S = 0`, no forcing.
#[derive(Debug)]
pub struct KinematicSolverBuilder {
    grid: GridDescriptor,
    velocity: [f64; 3],
    viscosity: f64,
    diffusivity: f64,
    temperature: f64,
    salinity: f64,
    forcing: Option<ForcingEngine>,
}

impl KinematicSolver {
    /// Create a new builder on `grid`.
    pub fn builder(grid: &GridDescriptor) -> KinematicSolverBuilder {
        KinematicSolverBuilder {
            grid: grid.clone(),
            velocity: [0.0; 3],
            viscosity: 0.0,
            diffusivity: 0.0,
            temperature: 0.0,
            salinity: 0.0,
            forcing: None,
        }
    }

    /// The grid this solver runs on.
    pub fn grid(&self) -> &GridDescriptor {
        &self.grid
    }

    /// The forcing consumed as a source term.
    pub fn forcing(&self) -> &ForcingEngine {
        &self.forcing
    }

    /// Direct access to the field buffers.
    pub fn solver_fields(&self) -> &SolverFields {
        &self.fields
    }

    /// Mutable access to the field buffers.
    pub fn solver_fields_mut(&mut self) -> &mut SolverFields {
        &mut self.fields
    }

    /// Sub-steps taken since construction.
    pub fn sub_steps(&self) -> u64 {
        self.sub_steps
    }

    fn sub_step(&mut self, dt: f64) -> Result<(), SolverFault> {
        for (field, tracer) in [
            (Field::Temperature, Some(Tracer::Temperature)),
            (Field::Salinity, Some(Tracer::Salinity)),
            (Field::Meltwater, None),
        ] {
            let (velocity, kappa, phi) = self.fields.split_tracer(field);
            transport(&self.grid, velocity, kappa, phi, &mut self.rhs);
            match tracer {
                Some(tracer) => self.forcing.tendency(tracer, phi, &mut self.source),
                None => self.source.fill(0.0),
            }
            for ((p, r), s) in phi.iter_mut().zip(&self.rhs).zip(&self.source) {
                *p += dt * (r + s);
            }
            if let Some(cell) = phi.iter().position(|p| !p.is_finite()) {
                return Err(SolverFault::NanDetected {
                    field,
                    cell_index: Some(cell),
                });
            }
        }
        self.sub_steps += 1;
        Ok(())
    }
}

/// Upwind advection plus centred diffusion of `phi` into `out`.
fn transport(
    grid: &GridDescriptor,
    velocity: [&[f64]; 3],
    kappa: &[f64],
    phi: &[f64],
    out: &mut [f64],
) {
    for (idx, cell) in grid.cells().enumerate() {
        let here = phi[idx];
        let mut acc = 0.0;
        for axis in Axis::ALL {
            let d = grid.spacing_along(axis);
            let lo = phi[grid.flat_index(grid.clamped_neighbour(cell, axis, -1))];
            let hi = phi[grid.flat_index(grid.clamped_neighbour(cell, axis, 1))];
            let c = velocity[axis.position()][idx];
            acc -= if c > 0.0 {
                c * (here - lo) / d
            } else {
                c * (hi - here) / d
            };
            acc += kappa[idx] * (hi - 2.0 * here + lo) / (d * d);
        }
        out[idx] = acc;
    }
}

impl OceanSolver for KinematicSolver {
    fn advance(&mut self, dt: f64, n_steps: u32) -> Result<(), SolverFault> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SolverFault::NonFinite {
                quantity: "dt",
                value: dt,
            });
        }
        tracing::trace!(dt, n_steps, "kinematic advance");
        for _ in 0..n_steps {
            self.sub_step(dt)?;
        }
        Ok(())
    }

    fn cell_advection_timescale(&self) -> f64 {
        Axis::ALL
            .iter()
            .zip(self.fields.velocity())
            .map(|(axis, c)| self.grid.spacing_along(*axis) / max_abs(c))
            .fold(f64::INFINITY, f64::min)
    }

    fn max_abs_velocity(&self, component: VelocityComponent) -> f64 {
        max_abs(self.fields.get(component.field()))
    }

    fn max_diffusivity(&self, component: DiffusivityComponent) -> f64 {
        let values = self.fields.get(component.field());
        if values.is_empty() {
            0.0
        } else {
            max_value(values)
        }
    }

    fn fields(&self) -> &dyn FieldReader {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut dyn FieldWriter {
        &mut self.fields
    }
}

impl KinematicSolverBuilder {
    /// Set the uniform velocity `[u, v, w]` in m/s (default at rest).
    pub fn velocity(mut self, velocity: [f64; 3]) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the viscosity ν in m²/s (default 0). Reported only.
    pub fn viscosity(mut self, nu: f64) -> Self {
        self.viscosity = nu;
        self
    }

    /// Set the tracer diffusivity κ in m²/s (default 0).
    pub fn diffusivity(mut self, kappa: f64) -> Self {
        self.diffusivity = kappa;
        self
    }

    /// Set the initial temperature in °C (default 0).
    pub fn temperature(mut self, t: f64) -> Self {
        self.temperature = t;
        self
    }

    /// Set the initial salinity in psu (default 0).
    pub fn salinity(mut self, s: f64) -> Self {
        self.salinity = s;
        self
    }

    /// Consume `forcing` as the T and S source term.
    pub fn forcing(mut self, forcing: ForcingEngine) -> Self {
        self.forcing = Some(forcing);
        self
    }

    /// Build the solver, validating all configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] if:
    /// - any velocity or initial tracer value is not finite
    /// - `viscosity` or `diffusivity` is negative or not finite
    /// - the forcing engine was built for a different grid
    pub fn build(self) -> Result<KinematicSolver, ConfigError> {
        let invalid = |name: &'static str, reason: String| ConfigError::InvalidParameter {
            name,
            reason,
        };
        let finite = [
            ("u", self.velocity[0]),
            ("v", self.velocity[1]),
            ("w", self.velocity[2]),
            ("temperature", self.temperature),
            ("salinity", self.salinity),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(invalid(name, format!("must be finite, got {value}")));
            }
        }
        for (name, value) in [("viscosity", self.viscosity), ("diffusivity", self.diffusivity)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(name, format!("must be finite and >= 0, got {value}")));
            }
        }
        let forcing = match self.forcing {
            Some(forcing) if forcing.grid() != &self.grid => {
                return Err(invalid(
                    "forcing",
                    "engine was built for a different grid".to_string(),
                ));
            }
            Some(forcing) => forcing,
            None => ForcingEngine::empty(&self.grid),
        };

        let n = self.grid.cell_count();
        let mut fields = SolverFields::zeros(n);
        fields.fill(Field::VelocityU, self.velocity[0]);
        fields.fill(Field::VelocityV, self.velocity[1]);
        fields.fill(Field::VelocityW, self.velocity[2]);
        fields.fill(Field::Viscosity, self.viscosity);
        fields.fill(Field::Diffusivity, self.diffusivity);
        fields.fill(Field::Temperature, self.temperature);
        fields.fill(Field::Salinity, self.salinity);

        Ok(KinematicSolver {
            grid: self.grid,
            forcing,
            fields,
            rhs: vec![0.0; n],
            source: vec![0.0; n],
            sub_steps: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tide_forcing::{OverlapPolicy, RelaxationRegion, TracerTargets};
    use tide_grid::{CellIndex, Region};

    fn line(n: usize) -> GridDescriptor {
        GridDescriptor::new([n, 1, 1], [n as f64, 1.0, 1.0]).unwrap()
    }

    #[test]
    fn at_rest_timescale_is_infinite() {
        let s = KinematicSolver::builder(&line(4)).build().unwrap();
        assert_eq!(s.cell_advection_timescale(), f64::INFINITY);
    }

    #[test]
    fn timescale_is_fastest_crossing() {
        let grid = GridDescriptor::new([4, 4, 4], [40.0, 40.0, 4.0]).unwrap();
        let s = KinematicSolver::builder(&grid)
            .velocity([0.5, 0.0, 0.01])
            .build()
            .unwrap();
        // x: 10 / 0.5 = 20 s; z: 1 / 0.01 = 100 s.
        assert_eq!(s.cell_advection_timescale(), 20.0);
        assert_eq!(s.max_abs_velocity(VelocityComponent::U), 0.5);
    }

    #[test]
    fn upwind_moves_front_downstream() {
        let mut s = KinematicSolver::builder(&line(4))
            .velocity([1.0, 0.0, 0.0])
            .build()
            .unwrap();
        s.solver_fields_mut()
            .get_mut(Field::Temperature)
            .copy_from_slice(&[1.0, 0.0, 0.0, 0.0]);
        s.advance(0.5, 1).unwrap();
        assert_eq!(s.solver_fields().get(Field::Temperature), &[1.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn negative_velocity_moves_upstream() {
        let mut s = KinematicSolver::builder(&line(4))
            .velocity([-1.0, 0.0, 0.0])
            .build()
            .unwrap();
        s.solver_fields_mut()
            .get_mut(Field::Meltwater)
            .copy_from_slice(&[0.0, 0.0, 0.0, 1.0]);
        s.advance(0.5, 1).unwrap();
        assert_eq!(s.solver_fields().get(Field::Meltwater), &[0.0, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn forcing_relaxes_source_cell_only() {
        let grid = GridDescriptor::new([4, 4, 4], [4.0, 4.0, 4.0]).unwrap();
        let source = CellIndex::new(1, 2, 3);
        let forcing = ForcingEngine::new(
            &grid,
            vec![RelaxationRegion::new(
                Region::Point { cell: source },
                TracerTargets::new(-1.0, 0.0),
                1.0 / 60.0,
            )],
            None,
            OverlapPolicy::Additive,
        )
        .unwrap();
        let mut s = KinematicSolver::builder(&grid)
            .salinity(34.5)
            .forcing(forcing)
            .build()
            .unwrap();
        s.advance(1.0, 1).unwrap();
        let t = s.solver_fields().get(Field::Temperature);
        let idx = grid.flat_index(source);
        assert_eq!(t[idx], -1.0 / 60.0);
        assert!(t.iter().enumerate().all(|(i, &v)| i == idx || v == 0.0));
        let sal = s.solver_fields().get(Field::Salinity);
        assert!((sal[idx] - (34.5 - 34.5 / 60.0)).abs() < 1e-12);
        // Meltwater is never forced by the engine.
        assert!(s.solver_fields().get(Field::Meltwater).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn diffusion_conserves_total() {
        let grid = GridDescriptor::new([5, 3, 2], [5.0, 3.0, 2.0]).unwrap();
        let mut s = KinematicSolver::builder(&grid)
            .diffusivity(0.05)
            .build()
            .unwrap();
        let n = grid.cell_count();
        let initial: Vec<f64> = (0..n).map(|i| (i % 7) as f64).collect();
        s.solver_fields_mut()
            .get_mut(Field::Temperature)
            .copy_from_slice(&initial);
        s.advance(1.0, 20).unwrap();
        let before: f64 = initial.iter().sum();
        let after: f64 = s.solver_fields().get(Field::Temperature).iter().sum();
        assert!((before - after).abs() < 1e-9, "{before} vs {after}");
        assert_eq!(s.sub_steps(), 20);
    }

    #[test]
    fn blow_up_is_reported_as_nan() {
        let mut s = KinematicSolver::builder(&line(4))
            .diffusivity(1.0)
            .build()
            .unwrap();
        s.solver_fields_mut()
            .get_mut(Field::Temperature)
            .copy_from_slice(&[1.0, 0.0, 0.0, 0.0]);
        match s.advance(1e200, 10) {
            Err(SolverFault::NanDetected { field, cell_index }) => {
                assert_eq!(field, Field::Temperature);
                assert!(cell_index.is_some());
            }
            other => panic!("expected NanDetected, got {other:?}"),
        }
    }

    #[test]
    fn builder_rejects_bad_values() {
        let g = line(4);
        assert!(KinematicSolver::builder(&g).diffusivity(-1.0).build().is_err());
        assert!(KinematicSolver::builder(&g).viscosity(f64::NAN).build().is_err());
        assert!(KinematicSolver::builder(&g)
            .velocity([f64::INFINITY, 0.0, 0.0])
            .build()
            .is_err());
        let other = ForcingEngine::empty(&line(5));
        assert!(matches!(
            KinematicSolver::builder(&g).forcing(other).build(),
            Err(ConfigError::InvalidParameter { name: "forcing", .. })
        ));
    }

    #[test]
    fn non_positive_dt_rejected() {
        let mut s = KinematicSolver::builder(&line(4)).build().unwrap();
        assert!(matches!(
            s.advance(0.0, 1),
            Err(SolverFault::NonFinite { quantity: "dt", .. })
        ));
    }

    proptest! {
        #[test]
        fn uniform_state_without_forcing_is_steady(
            t in -2.0f64..10.0,
            u in -1.0f64..1.0,
            kappa in 0.0f64..0.1,
        ) {
            let grid = GridDescriptor::new([4, 3, 2], [4.0, 3.0, 2.0]).unwrap();
            let mut s = KinematicSolver::builder(&grid)
                .velocity([u, 0.0, 0.0])
                .diffusivity(kappa)
                .temperature(t)
                .build()
                .unwrap();
            s.advance(0.5, 4).unwrap();
            prop_assert!(s.solver_fields().get(Field::Temperature).iter().all(|&v| v == t));
        }
    }
}
