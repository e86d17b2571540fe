//! Core types and traits for the Tide ocean simulation driver.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Tide workspace:
//! field identifiers and attributes, the solver collaborator contract,
//! field access traits, and error types.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod stats;
pub mod traits;

pub use error::{ConfigError, OutputError, SolverFault};
pub use field::{Attributes, DiffusivityComponent, Field, Tracer, VelocityComponent};
pub use stats::{max_abs, max_value};
pub use traits::{FieldReader, FieldWriter, OceanSolver};
