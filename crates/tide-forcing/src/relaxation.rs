//! Relaxation regions: a region, tracer targets, and a restoring rate.

use serde::{Deserialize, Serialize};
use tide_core::{ConfigError, Tracer};
use tide_grid::{GridDescriptor, Region};

/// Target values the forcing restores tracers toward.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TracerTargets {
    /// Target temperature (°C).
    pub temperature: f64,
    /// Target salinity (psu).
    pub salinity: f64,
}

impl TracerTargets {
    /// Targets for a meltwater-like source.
    pub fn new(temperature: f64, salinity: f64) -> Self {
        Self {
            temperature,
            salinity,
        }
    }

    /// The target for one tracer.
    #[inline]
    pub fn get(&self, tracer: Tracer) -> f64 {
        match tracer {
            Tracer::Temperature => self.temperature,
            Tracer::Salinity => self.salinity,
        }
    }
}

/// A forced region: cells matching `region` relax toward `targets` at
/// `rate` (s⁻¹).
///
/// # Examples
///
/// ```
/// use tide_core::Tracer;
/// use tide_forcing::{RelaxationRegion, TracerTargets};
/// use tide_grid::{CellIndex, Region};
///
/// let source = RelaxationRegion::new(
///     Region::Point { cell: CellIndex::new(16, 1, 16) },
///     TracerTargets::new(-1.0, 0.0),
///     1.0 / 60.0,
/// );
/// assert_eq!(source.contribution(Tracer::Temperature, 0.0), -1.0 / 60.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelaxationRegion {
    /// Cells receiving this forcing.
    pub region: Region,
    /// Restoring targets.
    pub targets: TracerTargets,
    /// Relaxation rate `λ` in s⁻¹.
    pub rate: f64,
}

impl RelaxationRegion {
    /// Construct a relaxation region. Call [`validate`](Self::validate)
    /// before use.
    pub fn new(region: Region, targets: TracerTargets, rate: f64) -> Self {
        Self {
            region,
            targets,
            rate,
        }
    }

    /// Check the rate, the targets, and the region bounds.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NonPositive`] for a non-finite or non-positive rate,
    /// [`ConfigError::InvalidParameter`] for a non-finite target, or the
    /// region's own bounds error.
    pub fn validate(&self, grid: &GridDescriptor) -> Result<(), ConfigError> {
        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err(ConfigError::NonPositive {
                name: "relaxation rate",
                value: self.rate,
            });
        }
        for tracer in Tracer::ALL {
            let target = self.targets.get(tracer);
            if !target.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name: "relaxation target",
                    reason: format!("{tracer} target must be finite, got {target}"),
                });
            }
        }
        self.region.validate(grid)
    }

    /// The restoring term `−λ · (value − target)` for one tracer.
    #[inline]
    pub fn contribution(&self, tracer: Tracer, value: f64) -> f64 {
        -self.rate * (value - self.targets.get(tracer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tide_grid::CellIndex;

    fn cube() -> GridDescriptor {
        GridDescriptor::new([32, 32, 32], [320.0, 320.0, 320.0]).unwrap()
    }

    fn point(rate: f64) -> RelaxationRegion {
        RelaxationRegion::new(
            Region::Point {
                cell: CellIndex::new(16, 1, 16),
            },
            TracerTargets::new(-1.0, 0.0),
            rate,
        )
    }

    #[test]
    fn contribution_restores_toward_target() {
        let r = point(0.5);
        assert_eq!(r.contribution(Tracer::Temperature, 1.0), -1.0);
        assert_eq!(r.contribution(Tracer::Temperature, -1.0), 0.0);
        assert_eq!(r.contribution(Tracer::Salinity, 34.0), -17.0);
    }

    #[test]
    fn zero_rate_rejected() {
        match point(0.0).validate(&cube()) {
            Err(ConfigError::NonPositive { name, .. }) => assert_eq!(name, "relaxation rate"),
            other => panic!("expected NonPositive, got {other:?}"),
        }
    }

    #[test]
    fn nan_rate_rejected() {
        assert!(point(f64::NAN).validate(&cube()).is_err());
        assert!(point(f64::INFINITY).validate(&cube()).is_err());
    }

    #[test]
    fn non_finite_target_rejected() {
        let mut r = point(1.0);
        r.targets.salinity = f64::NAN;
        assert!(matches!(
            r.validate(&cube()),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn region_bounds_checked() {
        let g = GridDescriptor::new([8, 8, 8], [8.0, 8.0, 8.0]).unwrap();
        assert!(matches!(
            point(1.0).validate(&g),
            Err(ConfigError::RegionOutOfBounds { .. })
        ));
    }

    #[test]
    fn serde_round_trip_from_json() {
        let json = r#"{
            "region": {"kind": "line", "j": 0, "k": 3},
            "targets": {"temperature": -2.0, "salinity": 0.0},
            "rate": 0.01
        }"#;
        let r: RelaxationRegion = serde_json::from_str(json).unwrap();
        assert_eq!(r.region, Region::Line { j: 0, k: 3 });
        assert_eq!(r.targets.temperature, -2.0);
        assert_eq!(r.rate, 0.01);
    }
}
