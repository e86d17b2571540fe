//! Region membership predicates for localized forcing.
//!
//! A [`Region`] identifies a set of cells by a pure predicate over
//! `(i, j, k)`. Membership never depends on field values or on the
//! evaluation order of other cells.

use serde::{Deserialize, Serialize};
use tide_core::ConfigError;

use crate::axis::{Axis, Side};
use crate::grid::{CellIndex, GridDescriptor};

/// A set of grid cells receiving forcing.
///
/// # Examples
///
/// ```
/// use tide_grid::{CellIndex, Region};
///
/// let inlet = Region::Line { j: 0, k: 4 };
/// assert!(inlet.matches(CellIndex::new(7, 0, 4)));
/// assert!(!inlet.matches(CellIndex::new(7, 1, 4)));
///
/// let block = Region::Box {
///     lo: CellIndex::new(0, 0, 0),
///     hi: CellIndex::new(0, 49, 9),
/// };
/// assert!(block.matches(CellIndex::new(0, 24, 4)));
/// assert!(!block.matches(CellIndex::new(0, 59, 4)));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Region {
    /// A single cell.
    Point {
        /// The forced cell.
        cell: CellIndex,
    },
    /// Every cell with the given `(j, k)`, for all `i`.
    ///
    /// Models an inlet spanning the full x extent.
    Line {
        /// Index along y.
        j: usize,
        /// Index along z.
        k: usize,
    },
    /// Axis-aligned block, inclusive on both corners.
    Box {
        /// Minimum corner (inclusive).
        lo: CellIndex,
        /// Maximum corner (inclusive).
        hi: CellIndex,
    },
}

impl Region {
    /// Whether `cell` belongs to this region.
    #[inline]
    pub fn matches(&self, cell: CellIndex) -> bool {
        match *self {
            Self::Point { cell: p } => cell == p,
            Self::Line { j, k } => cell.j == j && cell.k == k,
            Self::Box { lo, hi } => lo.all_le(cell) && cell.all_le(hi),
        }
    }

    /// Check that the region is well-formed and lies inside `grid`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RegionOutOfBounds`] for a point or line
    /// outside the grid, a box with `lo > hi` on any axis, or a box corner
    /// outside the grid.
    pub fn validate(&self, grid: &GridDescriptor) -> Result<(), ConfigError> {
        let out_of_bounds = |reason: String| ConfigError::RegionOutOfBounds {
            region: format!("{self:?}"),
            reason,
        };
        let [nx, ny, nz] = grid.size();
        match *self {
            Self::Point { cell } => {
                if !grid.contains(cell) {
                    return Err(out_of_bounds(format!(
                        "cell {cell} outside [0, {nx}) x [0, {ny}) x [0, {nz})"
                    )));
                }
            }
            Self::Line { j, k } => {
                if j >= ny || k >= nz {
                    return Err(out_of_bounds(format!(
                        "(j, k) = ({j}, {k}) outside [0, {ny}) x [0, {nz})"
                    )));
                }
            }
            Self::Box { lo, hi } => {
                if !lo.all_le(hi) {
                    return Err(out_of_bounds(format!(
                        "lower corner {lo} exceeds upper corner {hi}"
                    )));
                }
                if !grid.contains(hi) {
                    return Err(out_of_bounds(format!(
                        "upper corner {hi} outside [0, {nx}) x [0, {ny}) x [0, {nz})"
                    )));
                }
            }
        }
        Ok(())
    }

    /// The box covering the first or last `width` layers along `axis`.
    ///
    /// Used for sponge bands, e.g. the last 16 rows in y.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] if `width` is zero or
    /// exceeds the grid size along `axis`.
    pub fn band(
        grid: &GridDescriptor,
        axis: Axis,
        width: usize,
        side: Side,
    ) -> Result<Region, ConfigError> {
        let len = grid.len_along(axis);
        if width == 0 || width > len {
            return Err(ConfigError::InvalidParameter {
                name: "band width",
                reason: format!("width {width} must be in 1..={len} along {axis}"),
            });
        }
        let [nx, ny, nz] = grid.size();
        let mut lo = [0, 0, 0];
        let mut hi = [nx - 1, ny - 1, nz - 1];
        let p = axis.position();
        match side {
            Side::Low => hi[p] = width - 1,
            Side::High => lo[p] = len - width,
        }
        Ok(Region::Box {
            lo: lo.into(),
            hi: hi.into(),
        })
    }

    /// Iterate the cells of this region in canonical order.
    ///
    /// The region must have passed [`validate`](Self::validate) against
    /// `grid`.
    pub fn cells<'g>(&self, grid: &'g GridDescriptor) -> impl Iterator<Item = CellIndex> + 'g {
        let (lo, hi) = match *self {
            Self::Point { cell } => (cell, cell),
            Self::Line { j, k } => (CellIndex::new(0, j, k), CellIndex::new(grid.nx() - 1, j, k)),
            Self::Box { lo, hi } => (lo, hi),
        };
        (lo.k..=hi.k).flat_map(move |k| {
            (lo.j..=hi.j).flat_map(move |j| (lo.i..=hi.i).map(move |i| CellIndex::new(i, j, k)))
        })
    }

    /// Number of cells in this region on `grid`.
    pub fn cell_count(&self, grid: &GridDescriptor) -> usize {
        match *self {
            Self::Point { .. } => 1,
            Self::Line { .. } => grid.nx(),
            Self::Box { lo, hi } => (hi.i - lo.i + 1) * (hi.j - lo.j + 1) * (hi.k - lo.k + 1),
        }
    }
}
