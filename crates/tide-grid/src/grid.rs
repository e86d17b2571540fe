//! The immutable [`GridDescriptor`] and [`CellIndex`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tide_core::ConfigError;

use crate::axis::Axis;

/// A cell position `(i, j, k)` on the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellIndex {
    /// Index along x.
    pub i: usize,
    /// Index along y.
    pub j: usize,
    /// Index along z (0 = bottom).
    pub k: usize,
}

impl CellIndex {
    /// Construct a cell index.
    pub const fn new(i: usize, j: usize, k: usize) -> Self {
        Self { i, j, k }
    }

    /// The component along `axis`.
    pub fn along(self, axis: Axis) -> usize {
        match axis {
            Axis::X => self.i,
            Axis::Y => self.j,
            Axis::Z => self.k,
        }
    }

    /// Component-wise `self <= other`.
    pub fn all_le(self, other: CellIndex) -> bool {
        self.i <= other.i && self.j <= other.j && self.k <= other.k
    }
}

impl From<[usize; 3]> for CellIndex {
    fn from([i, j, k]: [usize; 3]) -> Self {
        Self { i, j, k }
    }
}

impl fmt::Display for CellIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.i, self.j, self.k)
    }
}

/// Uniform structured-grid geometry.
///
/// Holds the cell counts `(Nx, Ny, Nz)`, physical extents `(Lx, Ly, Lz)`
/// in metres, and the derived spacings `(Δx, Δy, Δz)`. `Nx = 1` is
/// allowed for degenerate 2-D (y–z) configurations.
///
/// Immutable once constructed; construction validates every invariant.
///
/// # Examples
///
/// ```
/// use tide_grid::{CellIndex, GridDescriptor};
///
/// let grid = GridDescriptor::new([32, 32, 16], [640.0, 640.0, 160.0]).unwrap();
/// assert_eq!(grid.cell_count(), 32 * 32 * 16);
/// assert_eq!(grid.spacing(), [20.0, 20.0, 10.0]);
/// assert_eq!(grid.min_spacing(), 10.0);
///
/// let cell = CellIndex::new(3, 1, 2);
/// assert_eq!(grid.cell_at(grid.flat_index(cell)), cell);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct GridDescriptor {
    size: [usize; 3],
    extent: [f64; 3],
    spacing: [f64; 3],
}

impl GridDescriptor {
    /// Build a grid from cell counts and physical extents.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGrid`] if any count is zero, any
    /// extent is non-finite or non-positive, or the total cell count
    /// overflows `usize`.
    pub fn new(size: [usize; 3], extent: [f64; 3]) -> Result<Self, ConfigError> {
        for axis in Axis::ALL {
            let p = axis.position();
            if size[p] == 0 {
                return Err(ConfigError::InvalidGrid {
                    reason: format!("N{} must be at least 1", axis.name()),
                });
            }
            if !extent[p].is_finite() || extent[p] <= 0.0 {
                return Err(ConfigError::InvalidGrid {
                    reason: format!(
                        "L{} must be finite and positive, got {}",
                        axis.name(),
                        extent[p]
                    ),
                });
            }
        }
        size[0]
            .checked_mul(size[1])
            .and_then(|n| n.checked_mul(size[2]))
            .ok_or_else(|| ConfigError::InvalidGrid {
                reason: format!("cell count {}x{}x{} overflows", size[0], size[1], size[2]),
            })?;

        let spacing = [
            extent[0] / size[0] as f64,
            extent[1] / size[1] as f64,
            extent[2] / size[2] as f64,
        ];
        if spacing.iter().any(|d| !(d.is_finite() && *d > 0.0)) {
            return Err(ConfigError::InvalidGrid {
                reason: format!("derived spacing {spacing:?} is not strictly positive"),
            });
        }

        Ok(Self {
            size,
            extent,
            spacing,
        })
    }

    /// Cell counts `[Nx, Ny, Nz]`.
    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    /// Number of cells along x.
    pub fn nx(&self) -> usize {
        self.size[0]
    }

    /// Number of cells along y.
    pub fn ny(&self) -> usize {
        self.size[1]
    }

    /// Number of cells along z.
    pub fn nz(&self) -> usize {
        self.size[2]
    }

    /// Number of cells along `axis`.
    pub fn len_along(&self, axis: Axis) -> usize {
        self.size[axis.position()]
    }

    /// Physical extents `[Lx, Ly, Lz]` in metres.
    pub fn extent(&self) -> [f64; 3] {
        self.extent
    }

    /// Cell spacings `[Δx, Δy, Δz]` in metres.
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// Spacing along `axis`.
    pub fn spacing_along(&self, axis: Axis) -> f64 {
        self.spacing[axis.position()]
    }

    /// `min(Δx, Δy, Δz)`, the length scale of the diffusive CFL limit.
    pub fn min_spacing(&self) -> f64 {
        self.spacing.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.size[0] * self.size[1] * self.size[2]
    }

    /// Whether `cell` lies inside the grid.
    pub fn contains(&self, cell: CellIndex) -> bool {
        cell.i < self.size[0] && cell.j < self.size[1] && cell.k < self.size[2]
    }

    /// Flat canonical index of `cell`: `i + Nx * (j + Ny * k)`.
    ///
    /// The cell must be inside the grid; this is checked in debug builds.
    #[inline]
    pub fn flat_index(&self, cell: CellIndex) -> usize {
        debug_assert!(self.contains(cell), "cell {cell} outside grid");
        cell.i + self.size[0] * (cell.j + self.size[1] * cell.k)
    }

    /// Inverse of [`flat_index`](Self::flat_index).
    #[inline]
    pub fn cell_at(&self, flat: usize) -> CellIndex {
        let nx = self.size[0];
        let ny = self.size[1];
        CellIndex {
            i: flat % nx,
            j: (flat / nx) % ny,
            k: flat / (nx * ny),
        }
    }

    /// Iterate every cell in canonical (flat index) order.
    pub fn cells(&self) -> impl Iterator<Item = CellIndex> + '_ {
        (0..self.cell_count()).map(move |flat| self.cell_at(flat))
    }

    /// The neighbour of `cell` offset by `delta` along `axis`, clamped to
    /// the grid (zero-gradient boundary).
    #[inline]
    pub fn clamped_neighbour(&self, cell: CellIndex, axis: Axis, delta: isize) -> CellIndex {
        let len = self.len_along(axis) as isize;
        let moved = (cell.along(axis) as isize + delta).clamp(0, len - 1) as usize;
        match axis {
            Axis::X => CellIndex { i: moved, ..cell },
            Axis::Y => CellIndex { j: moved, ..cell },
            Axis::Z => CellIndex { k: moved, ..cell },
        }
    }

    /// Cell-centre coordinates in metres; z is measured upward from the
    /// bottom of the domain.
    pub fn cell_center(&self, cell: CellIndex) -> [f64; 3] {
        [
            (cell.i as f64 + 0.5) * self.spacing[0],
            (cell.j as f64 + 0.5) * self.spacing[1],
            (cell.k as f64 + 0.5) * self.spacing[2],
        ]
    }

    /// Validate a fixed-index slice normal to `axis`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SliceOutOfBounds`] if `index` is not a valid
    /// layer along `axis`.
    pub fn check_slice(&self, axis: Axis, index: usize) -> Result<(), ConfigError> {
        let len = self.len_along(axis);
        if index >= len {
            return Err(ConfigError::SliceOutOfBounds {
                axis: axis.name(),
                index,
                len,
            });
        }
        Ok(())
    }
}
