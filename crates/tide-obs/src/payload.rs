//! Named arrays handed to output sinks.

use indexmap::IndexMap;
use smallvec::SmallVec;
use tide_core::Attributes;

/// Array dimensions in `(x, y, z)` axis order, omitting reduced axes.
///
/// A full field has three dimensions, a slice two, a scalar reduction
/// none.
pub type Shape = SmallVec<[usize; 3]>;

/// One persisted array with its shape and metadata.
///
/// `data` is in x-fastest order over the dimensions of `shape`.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputArray {
    /// Flat values.
    pub data: Vec<f64>,
    /// Dimensions.
    pub shape: Shape,
    /// Long name and units.
    pub attributes: Attributes,
}

impl OutputArray {
    /// A zero-dimensional array holding one value.
    pub fn scalar(value: f64, attributes: Attributes) -> Self {
        Self {
            data: vec![value],
            shape: Shape::new(),
            attributes,
        }
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the array holds no values.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether `data.len()` equals the product of `shape`.
    pub fn is_consistent(&self) -> bool {
        self.shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d)) == Some(self.data.len())
    }
}

/// Named arrays in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload {
    arrays: IndexMap<String, OutputArray>,
}

impl Payload {
    /// An empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty payload with room for `n` arrays.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            arrays: IndexMap::with_capacity(n),
        }
    }

    /// Insert an array, replacing any previous array of the same name.
    pub fn insert(&mut self, name: impl Into<String>, array: OutputArray) {
        self.arrays.insert(name.into(), array);
    }

    /// Look up an array by name.
    pub fn get(&self, name: &str) -> Option<&OutputArray> {
        self.arrays.get(name)
    }

    /// Iterate `(name, array)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OutputArray)> {
        self.arrays.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Array names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(String::as_str)
    }

    /// Number of arrays.
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// Whether the payload holds no arrays.
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}
