//! Grid axes and band sides.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three grid axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Along-x (`i`).
    X,
    /// Along-y (`j`).
    Y,
    /// Vertical (`k`).
    Z,
}

impl Axis {
    /// All axes in `(x, y, z)` order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Position of this axis in `[x, y, z]` arrays.
    pub fn position(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }

    /// Lowercase axis name.
    pub fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which end of an axis a boundary band sits against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The first `width` layers (indices `0..width`).
    Low,
    /// The last `width` layers (indices `len - width..len`).
    High,
}
