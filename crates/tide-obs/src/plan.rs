//! Output plan compilation and execution.
//!
//! An [`OutputPlan`] is compiled from an [`OutputSpec`] against a
//! [`GridDescriptor`]. Compilation validates slice indices and array
//! names once, so execution only gathers values.

use std::collections::HashSet;

use smallvec::smallvec;
use tide_core::{max_abs, max_value, Attributes, ConfigError, FieldReader, OutputError};
use tide_grid::{Axis, CellIndex, GridDescriptor};

use crate::payload::{OutputArray, Payload, Shape};
use crate::spec::{OutputSpec, Selector};

#[derive(Clone, Debug)]
struct CompiledEntry {
    name: String,
    selector: Selector,
    shape: Shape,
    attributes: Attributes,
}

/// A compiled, reusable output extraction plan.
///
/// # Examples
///
/// ```
/// use tide_core::Field;
/// use tide_grid::{Axis, GridDescriptor};
/// use tide_obs::{OutputEntry, OutputPlan, OutputSpec};
///
/// let grid = GridDescriptor::new([4, 3, 2], [4.0, 3.0, 2.0]).unwrap();
/// let spec = OutputSpec::new(vec![OutputEntry::slice(Field::Temperature, Axis::Y, 1)]);
/// let plan = OutputPlan::compile(&spec, &grid).unwrap();
/// assert_eq!(plan.shape("T_y1").map(|s| s.to_vec()), Some(vec![4, 2]));
///
/// // Out-of-range slices are rejected at compile time.
/// let bad = OutputSpec::new(vec![OutputEntry::slice(Field::Temperature, Axis::Y, 3)]);
/// assert!(OutputPlan::compile(&bad, &grid).is_err());
/// ```
#[derive(Clone, Debug)]
pub struct OutputPlan {
    grid: GridDescriptor,
    entries: Vec<CompiledEntry>,
}

impl OutputPlan {
    /// Compile `spec` against `grid`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::SliceOutOfBounds`] for a slice index outside the
    /// grid, [`ConfigError::DuplicateName`] if two entries share a name.
    pub fn compile(spec: &OutputSpec, grid: &GridDescriptor) -> Result<Self, ConfigError> {
        let mut seen = HashSet::with_capacity(spec.entries.len());
        let mut entries = Vec::with_capacity(spec.entries.len());
        let [nx, ny, nz] = grid.size();

        for entry in &spec.entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    name: entry.name.clone(),
                });
            }
            let base = entry.selector.field().attributes();
            let (shape, attributes): (Shape, Attributes) = match entry.selector {
                Selector::Full { .. } => (smallvec![nx, ny, nz], base),
                Selector::Slice { axis, index, .. } => {
                    grid.check_slice(axis, index)?;
                    let shape = match axis {
                        Axis::X => smallvec![ny, nz],
                        Axis::Y => smallvec![nx, nz],
                        Axis::Z => smallvec![nx, ny],
                    };
                    (shape, base)
                }
                Selector::Maximum { .. } => (
                    Shape::new(),
                    Attributes::new(format!("maximum {}", base.long_name), base.units),
                ),
                Selector::MaxAbs { .. } => (
                    Shape::new(),
                    Attributes::new(format!("maximum absolute {}", base.long_name), base.units),
                ),
            };
            entries.push(CompiledEntry {
                name: entry.name.clone(),
                selector: entry.selector,
                shape,
                attributes,
            });
        }

        Ok(Self {
            grid: grid.clone(),
            entries,
        })
    }

    /// Number of arrays each execution produces.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the plan produces no arrays.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shape of the named array, if the plan produces it.
    pub fn shape(&self, name: &str) -> Option<&Shape> {
        self.entries.iter().find(|e| e.name == name).map(|e| &e.shape)
    }

    /// Gather every entry from `reader` into a fresh payload.
    ///
    /// # Errors
    ///
    /// [`OutputError::MissingField`] if the reader does not expose a field,
    /// [`OutputError::FieldLength`] if a field does not match the grid.
    pub fn execute(&self, reader: &dyn FieldReader) -> Result<Payload, OutputError> {
        let mut payload = Payload::with_capacity(self.entries.len());
        let expected = self.grid.cell_count();
        for entry in &self.entries {
            let field = entry.selector.field();
            let values = reader
                .read(field)
                .ok_or(OutputError::MissingField { field })?;
            if values.len() != expected {
                return Err(OutputError::FieldLength {
                    field,
                    found: values.len(),
                    expected,
                });
            }
            let data = match entry.selector {
                Selector::Full { .. } => values.to_vec(),
                Selector::Slice { axis, index, .. } => self.gather_slice(values, axis, index),
                Selector::Maximum { .. } => vec![max_value(values)],
                Selector::MaxAbs { .. } => vec![max_abs(values)],
            };
            payload.insert(
                entry.name.clone(),
                OutputArray {
                    data,
                    shape: entry.shape.clone(),
                    attributes: entry.attributes.clone(),
                },
            );
        }
        Ok(payload)
    }

    fn gather_slice(&self, values: &[f64], axis: Axis, index: usize) -> Vec<f64> {
        let g = &self.grid;
        let [nx, ny, nz] = g.size();
        let at = |i, j, k| values[g.flat_index(CellIndex::new(i, j, k))];
        match axis {
            Axis::X => (0..nz)
                .flat_map(|k| (0..ny).map(move |j| (j, k)))
                .map(|(j, k)| at(index, j, k))
                .collect(),
            Axis::Y => (0..nz)
                .flat_map(|k| (0..nx).map(move |i| (i, k)))
                .map(|(i, k)| at(i, index, k))
                .collect(),
            Axis::Z => {
                let start = g.flat_index(CellIndex::new(0, 0, index));
                values[start..start + nx * ny].to_vec()
            }
        }
    }
}
