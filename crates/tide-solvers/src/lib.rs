//! Reference solvers for the Tide simulation driver.
//!
//! [`KinematicSolver`] implements the [`OceanSolver`] contract with a
//! prescribed velocity field and constant closure coefficients. Tracers
//! are advected (first-order upwind) and diffused explicitly, with the
//! [`ForcingEngine`] consumed as a per-cell source term. It exists so the
//! driver, output, and forcing pipeline can run end to end; it does not
//! solve the momentum equations.
//!
//! [`OceanSolver`]: tide_core::OceanSolver
//! [`ForcingEngine`]: tide_forcing::ForcingEngine

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod fields;
pub mod kinematic;

pub use fields::SolverFields;
pub use kinematic::{KinematicSolver, KinematicSolverBuilder};
