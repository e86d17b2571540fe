//! Boundary sponge bands relaxing toward a vertical reference profile.

use serde::{Deserialize, Serialize};
use tide_core::{ConfigError, Tracer};
use tide_grid::{Axis, CellIndex, GridDescriptor, Region, Side};

/// One value per vertical level for each forced tracer.
///
/// Index `k = 0` is the bottom level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceProfile {
    /// Temperature by level (°C).
    pub temperature: Vec<f64>,
    /// Salinity by level (psu).
    pub salinity: Vec<f64>,
}

impl ReferenceProfile {
    /// A depth-independent profile with `nz` levels.
    pub fn uniform(nz: usize, temperature: f64, salinity: f64) -> Self {
        Self {
            temperature: vec![temperature; nz],
            salinity: vec![salinity; nz],
        }
    }

    /// A profile varying linearly from `bottom` at the lowest cell centre
    /// to `top` at the highest, each given as `(temperature, salinity)`.
    pub fn linear(nz: usize, bottom: (f64, f64), top: (f64, f64)) -> Self {
        let lerp = |a: f64, b: f64, k: usize| {
            if nz <= 1 {
                a
            } else {
                a + (b - a) * k as f64 / (nz - 1) as f64
            }
        };
        Self {
            temperature: (0..nz).map(|k| lerp(bottom.0, top.0, k)).collect(),
            salinity: (0..nz).map(|k| lerp(bottom.1, top.1, k)).collect(),
        }
    }

    /// The profile value for `tracer` at level `k`.
    #[inline]
    pub fn at(&self, tracer: Tracer, k: usize) -> f64 {
        match tracer {
            Tracer::Temperature => self.temperature[k],
            Tracer::Salinity => self.salinity[k],
        }
    }

    /// Check lengths and finiteness against `nz` levels.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ProfileLength`] or [`ConfigError::InvalidParameter`].
    pub fn validate(&self, nz: usize) -> Result<(), ConfigError> {
        for (tracer, values) in [("T", &self.temperature), ("S", &self.salinity)] {
            if values.len() != nz {
                return Err(ConfigError::ProfileLength {
                    tracer,
                    found: values.len(),
                    expected: nz,
                });
            }
            if let Some(k) = values.iter().position(|v| !v.is_finite()) {
                return Err(ConfigError::InvalidParameter {
                    name: "reference profile",
                    reason: format!("{tracer} at level {k} is {}", values[k]),
                });
            }
        }
        Ok(())
    }
}

/// A band of `width` layers against one side of an axis, relaxing tracers
/// toward [`ReferenceProfile`] at `rate` (s⁻¹).
///
/// # Examples
///
/// ```
/// use tide_core::Tracer;
/// use tide_forcing::{ReferenceProfile, SpongeLayer};
/// use tide_grid::{Axis, CellIndex, GridDescriptor, Side};
///
/// let grid = GridDescriptor::new([1, 64, 8], [1.0, 640.0, 80.0]).unwrap();
/// let sponge = SpongeLayer::new(
///     Axis::Y,
///     16,
///     Side::High,
///     1.0 / 3600.0,
///     ReferenceProfile::uniform(8, 0.5, 34.5),
/// );
/// let region = sponge.region(&grid).unwrap();
/// assert!(region.matches(CellIndex::new(0, 63, 2)));
/// assert!(!region.matches(CellIndex::new(0, 47, 2)));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpongeLayer {
    /// Axis normal to the band.
    pub axis: Axis,
    /// Number of layers in the band.
    pub width: usize,
    /// Which end of the axis the band sits against.
    pub side: Side,
    /// Relaxation rate `λ` in s⁻¹.
    pub rate: f64,
    /// Restoring profile by vertical level.
    pub profile: ReferenceProfile,
}

impl SpongeLayer {
    /// Construct a sponge layer. Call [`validate`](Self::validate) before
    /// use.
    pub fn new(axis: Axis, width: usize, side: Side, rate: f64, profile: ReferenceProfile) -> Self {
        Self {
            axis,
            width,
            side,
            rate,
            profile,
        }
    }

    /// The box region covered by the band on `grid`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] if the width does not fit.
    pub fn region(&self, grid: &GridDescriptor) -> Result<Region, ConfigError> {
        Region::band(grid, self.axis, self.width, self.side)
    }

    /// Check the rate, band width, and profile.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self, grid: &GridDescriptor) -> Result<(), ConfigError> {
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "sponge rate",
                value: self.rate,
            });
        }
        self.region(grid)?;
        self.profile.validate(grid.nz())
    }

    /// The restoring term `−λ · (value − profile[k])`.
    #[inline]
    pub fn contribution(&self, tracer: Tracer, cell: CellIndex, value: f64) -> f64 {
        -self.rate * (value - self.profile.at(tracer, cell.k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridDescriptor {
        GridDescriptor::new([1, 32, 4], [1.0, 320.0, 40.0]).unwrap()
    }

    #[test]
    fn linear_profile_hits_endpoints() {
        let p = ReferenceProfile::linear(5, (0.0, 34.0), (4.0, 30.0));
        assert_eq!(p.temperature, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(p.salinity, vec![34.0, 33.0, 32.0, 31.0, 30.0]);
    }

    #[test]
    fn single_level_linear_profile_uses_bottom() {
        let p = ReferenceProfile::linear(1, (2.0, 35.0), (8.0, 30.0));
        assert_eq!(p.temperature, vec![2.0]);
        assert_eq!(p.salinity, vec![35.0]);
    }

    #[test]
    fn profile_length_mismatch_rejected() {
        let sponge = SpongeLayer::new(
            Axis::Y,
            4,
            Side::High,
            1e-3,
            ReferenceProfile::uniform(3, 0.0, 34.0),
        );
        assert_eq!(
            sponge.validate(&grid()),
            Err(ConfigError::ProfileLength {
                tracer: "T",
                found: 3,
                expected: 4,
            })
        );
    }

    #[test]
    fn non_finite_profile_rejected() {
        let mut profile = ReferenceProfile::uniform(4, 0.0, 34.0);
        profile.salinity[2] = f64::NAN;
        assert!(matches!(
            profile.validate(4),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn oversized_band_rejected() {
        let sponge = SpongeLayer::new(
            Axis::Z,
            5,
            Side::Low,
            1e-3,
            ReferenceProfile::uniform(4, 0.0, 34.0),
        );
        assert!(sponge.validate(&grid()).is_err());
    }

    #[test]
    fn negative_rate_rejected() {
        let sponge = SpongeLayer::new(
            Axis::Y,
            4,
            Side::High,
            -1.0,
            ReferenceProfile::uniform(4, 0.0, 34.0),
        );
        match sponge.validate(&grid()) {
            Err(ConfigError::NonPositive { name, value }) => {
                assert_eq!(name, "sponge rate");
                assert_eq!(value, -1.0);
            }
            other => panic!("expected NonPositive, got {other:?}"),
        }
    }

    #[test]
    fn contribution_uses_level_of_cell() {
        let sponge = SpongeLayer::new(
            Axis::Y,
            4,
            Side::High,
            0.5,
            ReferenceProfile::linear(4, (0.0, 34.0), (3.0, 31.0)),
        );
        let cell = CellIndex::new(0, 30, 2);
        assert_eq!(sponge.contribution(Tracer::Temperature, cell, 4.0), -1.0);
        assert_eq!(sponge.contribution(Tracer::Salinity, cell, 32.0), 0.0);
    }
}
