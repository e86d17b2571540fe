//! Once-per-iteration maintenance of the passive meltwater tracer.
//!
//! Unlike [`ForcingEngine::evaluate`](crate::ForcingEngine::evaluate),
//! this step mutates the field directly. The driver runs it between
//! `advance()` calls, never during one.

use std::fmt;

use serde::{Deserialize, Serialize};
use tide_core::ConfigError;
use tide_grid::{GridDescriptor, Region};

use crate::engine::ForcingEngine;

/// Which bulk operations run on the meltwater tracer, and in what order.
///
/// Every strategy starts by re-pinning the tracer to `1.0` inside each
/// source region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStrategy {
    /// Re-pin only.
    #[default]
    PinOnly,
    /// Re-pin, then zero the sponge band.
    PinAndZeroSponge,
    /// Re-pin, then clip and normalize into `[0, 1]`.
    PinAndNormalize,
    /// Re-pin, zero the sponge band, then normalize.
    PinZeroSpongeThenNormalize,
    /// Re-pin, normalize, then zero the sponge band.
    PinNormalizeThenZeroSponge,
}

impl MaintenanceStrategy {
    /// Every strategy.
    pub const ALL: [MaintenanceStrategy; 5] = [
        Self::PinOnly,
        Self::PinAndZeroSponge,
        Self::PinAndNormalize,
        Self::PinZeroSpongeThenNormalize,
        Self::PinNormalizeThenZeroSponge,
    ];

    /// Whether the strategy zeroes a sponge band.
    pub fn zeroes_sponge(self) -> bool {
        matches!(
            self,
            Self::PinAndZeroSponge | Self::PinZeroSpongeThenNormalize | Self::PinNormalizeThenZeroSponge
        )
    }

    /// Whether the strategy normalizes.
    pub fn normalizes(self) -> bool {
        matches!(
            self,
            Self::PinAndNormalize | Self::PinZeroSpongeThenNormalize | Self::PinNormalizeThenZeroSponge
        )
    }

    fn name(self) -> &'static str {
        match self {
            Self::PinOnly => "pin_only",
            Self::PinAndZeroSponge => "pin_and_zero_sponge",
            Self::PinAndNormalize => "pin_and_normalize",
            Self::PinZeroSpongeThenNormalize => "pin_zero_sponge_then_normalize",
            Self::PinNormalizeThenZeroSponge => "pin_normalize_then_zero_sponge",
        }
    }
}

impl fmt::Display for MaintenanceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Clip negatives to zero, then divide by the maximum.
///
/// Returns `false` and leaves the clipped values undivided when the
/// maximum is not positive, so an all-zero field stays all zero.
///
/// ```
/// let mut c = [-0.5, 0.0, 2.0];
/// assert!(tide_forcing::normalize_unit_interval(&mut c));
/// assert_eq!(c, [0.0, 0.0, 1.0]);
///
/// let mut zeros = [0.0; 4];
/// assert!(!tide_forcing::normalize_unit_interval(&mut zeros));
/// assert_eq!(zeros, [0.0; 4]);
/// ```
pub fn normalize_unit_interval(values: &mut [f64]) -> bool {
    let mut max = 0.0f64;
    for v in values.iter_mut() {
        if *v < 0.0 {
            *v = 0.0;
        }
        max = max.max(*v);
    }
    if max <= 0.0 {
        return false;
    }
    for v in values.iter_mut() {
        *v /= max;
    }
    true
}

/// The bulk meltwater step bound to a grid, source regions, and an
/// optional sponge band.
#[derive(Clone, Debug)]
pub struct MeltwaterMaintenance {
    grid: GridDescriptor,
    sources: Vec<Region>,
    sponge: Option<Region>,
    strategy: MaintenanceStrategy,
}

impl MeltwaterMaintenance {
    /// Build a maintenance step.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingSponge`] if `strategy` zeroes a sponge band
    /// and `sponge` is `None`; otherwise any region bounds error.
    pub fn new(
        grid: &GridDescriptor,
        sources: Vec<Region>,
        sponge: Option<Region>,
        strategy: MaintenanceStrategy,
    ) -> Result<Self, ConfigError> {
        if strategy.zeroes_sponge() && sponge.is_none() {
            return Err(ConfigError::MissingSponge {
                strategy: strategy.to_string(),
            });
        }
        for region in sources.iter().chain(sponge.iter()) {
            region.validate(grid)?;
        }
        Ok(Self {
            grid: grid.clone(),
            sources,
            sponge,
            strategy,
        })
    }

    /// Take source regions and the sponge band from a forcing engine.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn from_engine(
        engine: &ForcingEngine,
        strategy: MaintenanceStrategy,
    ) -> Result<Self, ConfigError> {
        let sources = engine.regions().iter().map(|r| r.region).collect();
        Self::new(engine.grid(), sources, engine.sponge_region(), strategy)
    }

    /// The configured strategy.
    pub fn strategy(&self) -> MaintenanceStrategy {
        self.strategy
    }

    /// Whether applying the step can never change a field.
    pub fn is_noop(&self) -> bool {
        self.sources.is_empty() && !self.strategy.zeroes_sponge() && !self.strategy.normalizes()
    }

    /// Apply the strategy to `field` (canonical flat order).
    ///
    /// # Panics
    ///
    /// Panics if `field.len()` differs from the grid's cell count.
    pub fn apply(&self, field: &mut [f64]) {
        assert_eq!(
            field.len(),
            self.grid.cell_count(),
            "meltwater field length must match grid cell count"
        );
        self.pin_sources(field);
        match self.strategy {
            MaintenanceStrategy::PinOnly => {}
            MaintenanceStrategy::PinAndZeroSponge => self.zero_sponge(field),
            MaintenanceStrategy::PinAndNormalize => self.normalize(field),
            MaintenanceStrategy::PinZeroSpongeThenNormalize => {
                self.zero_sponge(field);
                self.normalize(field);
            }
            MaintenanceStrategy::PinNormalizeThenZeroSponge => {
                self.normalize(field);
                self.zero_sponge(field);
            }
        }
    }

    fn pin_sources(&self, field: &mut [f64]) {
        for region in &self.sources {
            fill_region(&self.grid, region, field, 1.0);
        }
    }

    fn zero_sponge(&self, field: &mut [f64]) {
        if let Some(band) = &self.sponge {
            fill_region(&self.grid, band, field, 0.0);
        }
    }

    fn normalize(&self, field: &mut [f64]) {
        if !normalize_unit_interval(field) {
            tracing::debug!("meltwater maximum is zero, normalization skipped");
        }
    }
}

fn fill_region(grid: &GridDescriptor, region: &Region, field: &mut [f64], value: f64) {
    for cell in region.cells(grid) {
        field[grid.flat_index(cell)] = value;
    }
}
