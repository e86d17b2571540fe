//! Field storage for the reference solvers.

use tide_core::{Field, FieldReader, FieldWriter};

/// One flat buffer per [`Field`], all of the same length.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverFields {
    u: Vec<f64>,
    v: Vec<f64>,
    w: Vec<f64>,
    temperature: Vec<f64>,
    salinity: Vec<f64>,
    meltwater: Vec<f64>,
    viscosity: Vec<f64>,
    diffusivity: Vec<f64>,
}

impl SolverFields {
    /// Every field set to zero over `cell_count` cells.
    pub fn zeros(cell_count: usize) -> Self {
        Self {
            u: vec![0.0; cell_count],
            v: vec![0.0; cell_count],
            w: vec![0.0; cell_count],
            temperature: vec![0.0; cell_count],
            salinity: vec![0.0; cell_count],
            meltwater: vec![0.0; cell_count],
            viscosity: vec![0.0; cell_count],
            diffusivity: vec![0.0; cell_count],
        }
    }

    /// Number of cells.
    pub fn cell_count(&self) -> usize {
        self.temperature.len()
    }

    /// The buffer for `field`.
    pub fn get(&self, field: Field) -> &[f64] {
        match field {
            Field::VelocityU => &self.u,
            Field::VelocityV => &self.v,
            Field::VelocityW => &self.w,
            Field::Temperature => &self.temperature,
            Field::Salinity => &self.salinity,
            Field::Meltwater => &self.meltwater,
            Field::Viscosity => &self.viscosity,
            Field::Diffusivity => &self.diffusivity,
        }
    }

    /// The mutable buffer for `field`.
    pub fn get_mut(&mut self, field: Field) -> &mut [f64] {
        match field {
            Field::VelocityU => &mut self.u,
            Field::VelocityV => &mut self.v,
            Field::VelocityW => &mut self.w,
            Field::Temperature => &mut self.temperature,
            Field::Salinity => &mut self.salinity,
            Field::Meltwater => &mut self.meltwater,
            Field::Viscosity => &mut self.viscosity,
            Field::Diffusivity => &mut self.diffusivity,
        }
    }

    /// Set every cell of `field` to `value`.
    pub fn fill(&mut self, field: Field, value: f64) {
        self.get_mut(field).fill(value);
    }

    /// The three velocity buffers in `(u, v, w)` order.
    pub(crate) fn velocity(&self) -> [&[f64]; 3] {
        [&self.u, &self.v, &self.w]
    }

    /// Split borrows for one tracer update: velocities and diffusivity
    /// read-only, the tracer mutable. Non-tracer fields map to temperature.
    pub(crate) fn split_tracer(
        &mut self,
        tracer: Field,
    ) -> ([&[f64]; 3], &[f64], &mut Vec<f64>) {
        let Self {
            u,
            v,
            w,
            temperature,
            salinity,
            meltwater,
            diffusivity,
            ..
        } = self;
        let phi = match tracer {
            Field::Salinity => salinity,
            Field::Meltwater => meltwater,
            _ => temperature,
        };
        ([&u[..], &v[..], &w[..]], &diffusivity[..], phi)
    }
}

impl FieldReader for SolverFields {
    fn read(&self, field: Field) -> Option<&[f64]> {
        Some(self.get(field))
    }
}

impl FieldWriter for SolverFields {
    fn write(&mut self, field: Field) -> Option<&mut [f64]> {
        Some(self.get_mut(field))
    }
}
