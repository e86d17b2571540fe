//! Structured-grid geometry for Tide simulations.
//!
//! This crate defines the immutable [`GridDescriptor`] through which all
//! forcing, output selection, and stability monitoring see the domain,
//! along with cell indexing and the [`Region`] membership predicates used
//! to place relaxation forcing.
//!
//! # Index convention
//!
//! Cell indices are 0-based: `0 <= i < Nx`, `0 <= j < Ny`, `0 <= k < Nz`.
//! Vertical level `k = 0` is the bottom of the domain. Flat indices use
//! x-fastest ordering, `i + Nx * (j + Ny * k)`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod axis;
pub mod grid;
pub mod region;

pub use axis::{Axis, Side};
pub use grid::{CellIndex, GridDescriptor};
pub use region::Region;
