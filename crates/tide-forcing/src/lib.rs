//! Localized relaxation forcing for Tide simulations.
//!
//! The [`ForcingEngine`] evaluates the per-cell restoring tendency
//! `F_X = Σ −λ_r · (X − X_target,r)` over a fixed set of
//! [`RelaxationRegion`]s plus an optional [`SpongeLayer`]. The solver
//! consumes it as a source term inside `advance()`; evaluation is pure
//! and never allocates.
//!
//! [`MeltwaterMaintenance`] is the companion step that runs once per
//! outer iteration, outside `advance()`, and directly mutates the passive
//! meltwater tracer.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod engine;
pub mod maintenance;
pub mod relaxation;
pub mod sponge;

pub use engine::{ForcingEngine, OverlapPolicy};
pub use maintenance::{normalize_unit_interval, MaintenanceStrategy, MeltwaterMaintenance};
pub use relaxation::{RelaxationRegion, TracerTargets};
pub use sponge::{ReferenceProfile, SpongeLayer};
