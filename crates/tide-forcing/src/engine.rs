//! The per-cell relaxation forcing evaluator.

use serde::{Deserialize, Serialize};
use tide_core::{ConfigError, Tracer};
use tide_grid::{CellIndex, GridDescriptor, Region};

use crate::relaxation::RelaxationRegion;
use crate::sponge::SpongeLayer;

/// How the sponge term combines with source terms in cells both cover.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Every matching term is summed.
    #[default]
    Additive,
    /// Inside the sponge band only the sponge term applies.
    SpongeOverrides,
}

/// Evaluates `F_X(i,j,k)` for the configured regions and sponge.
///
/// Built once at setup and read-only afterwards. [`evaluate`] is called by
/// the solver for every cell of every sub-step, so it walks a fixed slice
/// of regions and never allocates.
///
/// [`evaluate`]: ForcingEngine::evaluate
#[derive(Clone, Debug)]
pub struct ForcingEngine {
    grid: GridDescriptor,
    regions: Vec<RelaxationRegion>,
    sponge: Option<(SpongeLayer, Region)>,
    policy: OverlapPolicy,
}

impl ForcingEngine {
    /// Validate every region and the sponge against `grid` and build the
    /// engine.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] raised by a region or the sponge.
    pub fn new(
        grid: &GridDescriptor,
        regions: Vec<RelaxationRegion>,
        sponge: Option<SpongeLayer>,
        policy: OverlapPolicy,
    ) -> Result<Self, ConfigError> {
        for region in &regions {
            region.validate(grid)?;
        }
        let sponge = match sponge {
            Some(layer) => {
                layer.validate(grid)?;
                let band = layer.region(grid)?;
                Some((layer, band))
            }
            None => None,
        };
        tracing::debug!(
            regions = regions.len(),
            sponge = sponge.is_some(),
            ?policy,
            "forcing engine built"
        );
        Ok(Self {
            grid: grid.clone(),
            regions,
            sponge,
            policy,
        })
    }

    /// An engine with no forcing at all.
    pub fn empty(grid: &GridDescriptor) -> Self {
        Self {
            grid: grid.clone(),
            regions: Vec::new(),
            sponge: None,
            policy: OverlapPolicy::default(),
        }
    }

    /// Forcing tendency for `tracer` at `cell`, whose current value is
    /// `value`.
    ///
    /// Returns exactly `0.0` for a cell outside every region and outside
    /// the sponge band.
    #[inline]
    pub fn evaluate(&self, tracer: Tracer, cell: CellIndex, value: f64) -> f64 {
        let mut total = 0.0;
        if let Some((layer, band)) = &self.sponge {
            if band.matches(cell) {
                let sponge = layer.contribution(tracer, cell, value);
                if self.policy == OverlapPolicy::SpongeOverrides {
                    return sponge;
                }
                total += sponge;
            }
        }
        for r in &self.regions {
            if r.region.matches(cell) {
                total += r.contribution(tracer, value);
            }
        }
        total
    }

    /// Fill `out` with the forcing tendency of every cell of `field`.
    ///
    /// Both slices are in canonical flat order. Existing contents of `out`
    /// are overwritten.
    ///
    /// # Panics
    ///
    /// Panics if either slice length differs from the grid's cell count.
    pub fn tendency(&self, tracer: Tracer, field: &[f64], out: &mut [f64]) {
        let n = self.grid.cell_count();
        assert_eq!(field.len(), n, "field length must match grid cell count");
        assert_eq!(out.len(), n, "output length must match grid cell count");
        for (flat, (slot, &value)) in out.iter_mut().zip(field).enumerate() {
            *slot = self.evaluate(tracer, self.grid.cell_at(flat), value);
        }
    }

    /// The grid the engine was validated against.
    pub fn grid(&self) -> &GridDescriptor {
        &self.grid
    }

    /// Source regions in configuration order.
    pub fn regions(&self) -> &[RelaxationRegion] {
        &self.regions
    }

    /// The sponge layer, if configured.
    pub fn sponge(&self) -> Option<&SpongeLayer> {
        self.sponge.as_ref().map(|(layer, _)| layer)
    }

    /// The sponge band as a region, if configured.
    pub fn sponge_region(&self) -> Option<Region> {
        self.sponge.as_ref().map(|(_, band)| *band)
    }

    /// The overlap policy.
    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    /// Whether the engine contributes nothing anywhere.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.sponge.is_none()
    }
}
