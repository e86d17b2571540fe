//! Test utilities and mock types for Tide development.
//!
//! Provides mock implementations of the core traits ([`FieldReader`],
//! [`FieldWriter`], [`OceanSolver`]) for exercising the driver, monitors,
//! and output plans without a real physics solver.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::HashMap;

use tide_core::{Field, FieldReader, FieldWriter};

pub mod solver;

pub use solver::MockSolver;

/// Mock implementation of [`FieldReader`].
///
/// Backed by a `HashMap<Field, Vec<f64>>`. Pre-populate fields with
/// [`set_field`](MockFieldReader::set_field) before passing to code under
/// test.
///
/// [`OceanSolver`]: tide_core::OceanSolver
pub struct MockFieldReader {
    fields: HashMap<Field, Vec<f64>>,
}

impl MockFieldReader {
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
        }
    }

    /// Pre-populate a field with data for testing.
    pub fn set_field(&mut self, field: Field, data: Vec<f64>) {
        self.fields.insert(field, data);
    }
}

impl Default for MockFieldReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldReader for MockFieldReader {
    fn read(&self, field: Field) -> Option<&[f64]> {
        self.fields.get(&field).map(|v| v.as_slice())
    }
}

/// Mock field store implementing both [`FieldReader`] and [`FieldWriter`].
///
/// Every field in [`Field::ALL`] is allocated with `cell_count` zeros.
pub struct MockFields {
    fields: HashMap<Field, Vec<f64>>,
}

impl MockFields {
    pub fn new(cell_count: usize) -> Self {
        Self {
            fields: Field::ALL
                .iter()
                .map(|f| (*f, vec![0.0; cell_count]))
                .collect(),
        }
    }

    /// Overwrite every value of a field.
    pub fn fill(&mut self, field: Field, value: f64) {
        if let Some(v) = self.fields.get_mut(&field) {
            v.fill(value);
        }
    }

    /// Replace a field's buffer.
    pub fn set_field(&mut self, field: Field, data: Vec<f64>) {
        self.fields.insert(field, data);
    }

    /// Remove a field so reads and writes of it return `None`.
    pub fn remove(&mut self, field: Field) {
        self.fields.remove(&field);
    }

    /// Read back field data for assertions.
    pub fn get_field(&self, field: Field) -> Option<&[f64]> {
        self.fields.get(&field).map(|v| v.as_slice())
    }
}

impl FieldReader for MockFields {
    fn read(&self, field: Field) -> Option<&[f64]> {
        self.get_field(field)
    }
}

impl FieldWriter for MockFields {
    fn write(&mut self, field: Field) -> Option<&mut [f64]> {
        self.fields.get_mut(&field).map(|v| v.as_mut_slice())
    }
}
