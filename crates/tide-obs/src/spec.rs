//! Output specification types.
//!
//! An [`OutputSpec`] is an ordered list of named [`OutputEntry`]s. Each
//! entry pairs an array name with a [`Selector`] describing which part of
//! which field to persist.

use serde::{Deserialize, Serialize};
use tide_core::Field;
use tide_grid::Axis;

/// Which subset of a field an output entry extracts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selector {
    /// The full 3-D field.
    Full {
        /// Field to persist.
        field: Field,
    },
    /// A 2-D slice at a fixed index along one axis.
    Slice {
        /// Field to slice.
        field: Field,
        /// Axis normal to the slice.
        axis: Axis,
        /// Layer index along `axis`.
        index: usize,
    },
    /// The maximum value of a field, e.g. maximum viscosity.
    Maximum {
        /// Field to reduce.
        field: Field,
    },
    /// The maximum absolute value of a field.
    MaxAbs {
        /// Field to reduce.
        field: Field,
    },
}

impl Selector {
    /// The field this selector reads.
    pub fn field(&self) -> Field {
        match *self {
            Self::Full { field }
            | Self::Slice { field, .. }
            | Self::Maximum { field }
            | Self::MaxAbs { field } => field,
        }
    }
}

/// A named array in an output payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEntry {
    /// Array name in the payload.
    pub name: String,
    /// What to extract.
    pub selector: Selector,
}

impl OutputEntry {
    /// An entry with an explicit name.
    pub fn new(name: impl Into<String>, selector: Selector) -> Self {
        Self {
            name: name.into(),
            selector,
        }
    }

    /// The full field, named by its short name (`"u"`, `"T"`, ...).
    pub fn full(field: Field) -> Self {
        Self::new(field.short_name(), Selector::Full { field })
    }

    /// A slice named `"{short}_{axis}{index}"`, e.g. `"T_y16"`.
    pub fn slice(field: Field, axis: Axis, index: usize) -> Self {
        Self::new(
            format!("{}_{}{}", field.short_name(), axis, index),
            Selector::Slice { field, axis, index },
        )
    }

    /// The field maximum, named `"max_{short}"`.
    pub fn maximum(field: Field) -> Self {
        Self::new(format!("max_{}", field.short_name()), Selector::Maximum { field })
    }
}

/// The ordered list of arrays one writer persists.
///
/// # Examples
///
/// ```
/// use tide_core::Field;
/// use tide_grid::Axis;
/// use tide_obs::{OutputEntry, OutputSpec};
///
/// let spec = OutputSpec::new(vec![
///     OutputEntry::slice(Field::Temperature, Axis::Y, 1),
///     OutputEntry::maximum(Field::Viscosity),
/// ]);
/// assert_eq!(spec.entries[0].name, "T_y1");
/// assert_eq!(spec.entries[1].name, "max_nu");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    /// Ordered output entries.
    pub entries: Vec<OutputEntry>,
}

impl OutputSpec {
    /// Construct a spec from entries.
    pub fn new(entries: Vec<OutputEntry>) -> Self {
        Self { entries }
    }

    /// Full fields for every listed field.
    pub fn full_fields(fields: &[Field]) -> Self {
        Self::new(fields.iter().map(|f| OutputEntry::full(*f)).collect())
    }
}
