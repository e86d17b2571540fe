//! A scriptable stand-in for the physics solver.

use tide_core::{
    max_abs, max_value, DiffusivityComponent, FieldReader, FieldWriter, OceanSolver,
    SolverFault, VelocityComponent,
};

use crate::MockFields;

/// Mock [`OceanSolver`] with fixed fields and a scripted timescale.
///
/// `advance` records each call and leaves the fields untouched unless a
/// hook is installed with [`on_advance`](MockSolver::on_advance). Extrema
/// are computed from the field buffers, so putting a NaN into a velocity
/// field makes the reported maximum non-finite.
pub struct MockSolver {
    fields: MockFields,
    timescale: f64,
    fail_after: Option<usize>,
    calls: Vec<(f64, u32)>,
    hook: Option<Box<dyn FnMut(&mut MockFields, f64, u32) + Send>>,
}

impl MockSolver {
    /// A solver at rest with `cell_count` cells and an infinite advection
    /// timescale.
    pub fn new(cell_count: usize) -> Self {
        Self {
            fields: MockFields::new(cell_count),
            timescale: f64::INFINITY,
            fail_after: None,
            calls: Vec::new(),
            hook: None,
        }
    }

    /// Report `timescale` seconds from `cell_advection_timescale`.
    pub fn with_timescale(mut self, timescale: f64) -> Self {
        self.timescale = timescale;
        self
    }

    /// Succeed `n` times, then return [`SolverFault::Diverged`].
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    /// Run `hook` on every successful `advance` call.
    pub fn on_advance(
        mut self,
        hook: impl FnMut(&mut MockFields, f64, u32) + Send + 'static,
    ) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Change the reported timescale between calls.
    pub fn set_timescale(&mut self, timescale: f64) {
        self.timescale = timescale;
    }

    /// The backing fields.
    pub fn mock_fields(&self) -> &MockFields {
        &self.fields
    }

    /// Mutable access to the backing fields.
    pub fn mock_fields_mut(&mut self) -> &mut MockFields {
        &mut self.fields
    }

    /// Every `(dt, n_steps)` passed to `advance`, including failed calls.
    pub fn calls(&self) -> &[(f64, u32)] {
        &self.calls
    }
}

impl OceanSolver for MockSolver {
    fn advance(&mut self, dt: f64, n_steps: u32) -> Result<(), SolverFault> {
        let n = self.calls.len();
        self.calls.push((dt, n_steps));
        if let Some(limit) = self.fail_after {
            if n >= limit {
                return Err(SolverFault::Diverged {
                    reason: format!("deliberate failure after {limit} successful calls"),
                });
            }
        }
        if let Some(hook) = self.hook.as_mut() {
            hook(&mut self.fields, dt, n_steps);
        }
        Ok(())
    }

    fn cell_advection_timescale(&self) -> f64 {
        self.timescale
    }

    fn max_abs_velocity(&self, component: VelocityComponent) -> f64 {
        self.fields
            .get_field(component.field())
            .map_or(0.0, max_abs)
    }

    fn max_diffusivity(&self, component: DiffusivityComponent) -> f64 {
        self.fields
            .get_field(component.field())
            .map_or(0.0, |v| if v.is_empty() { 0.0 } else { max_value(v) })
    }

    fn fields(&self) -> &dyn FieldReader {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut dyn FieldWriter {
        &mut self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tide_core::Field;

    #[test]
    fn fails_after_scripted_count() {
        let mut s = MockSolver::new(4).fail_after(2);
        assert!(s.advance(1.0, 10).is_ok());
        assert!(s.advance(1.0, 10).is_ok());
        assert!(matches!(
            s.advance(1.0, 10),
            Err(SolverFault::Diverged { .. })
        ));
        assert_eq!(s.calls().len(), 3);
    }

    #[test]
    fn extrema_follow_fields() {
        let mut s = MockSolver::new(3);
        s.mock_fields_mut()
            .set_field(Field::VelocityV, vec![0.1, -0.4, 0.2]);
        s.mock_fields_mut().fill(Field::Viscosity, 1e-3);
        assert_eq!(s.max_abs_velocity(VelocityComponent::V), 0.4);
        assert_eq!(s.max_diffusivity(DiffusivityComponent::Viscosity), 1e-3);
        assert_eq!(s.max_abs_velocity(VelocityComponent::U), 0.0);
    }

    #[test]
    fn nan_velocity_is_reported() {
        let mut s = MockSolver::new(2);
        s.mock_fields_mut()
            .set_field(Field::VelocityW, vec![0.0, f64::NAN]);
        assert!(s.max_abs_velocity(VelocityComponent::W).is_nan());
    }

    #[test]
    fn hook_runs_on_success() {
        let mut s = MockSolver::new(2).on_advance(|f, dt, n| {
            f.fill(Field::Temperature, dt * f64::from(n));
        });
        s.advance(0.5, 4).unwrap();
        assert_eq!(s.fields().read(Field::Temperature), Some(&[2.0, 2.0][..]));
    }
}
