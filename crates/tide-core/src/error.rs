//! Error types for the Tide simulation driver.
//!
//! Organized by subsystem: setup-time configuration, the external solver
//! collaborator, and output persistence. The driver wraps all three in
//! its own `RunError`.

use std::io;

use crate::field::Field;

/// Invalid setup detected before the simulation loop starts.
///
/// Every variant is raised eagerly during construction or validation;
/// none can occur once the driver is running.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Grid dimensions or extents are unusable.
    #[error("invalid grid: {reason}")]
    InvalidGrid {
        /// Description of the violated constraint.
        reason: String,
    },
    /// A relaxation region or sponge band lies outside the grid.
    #[error("region {region} out of bounds: {reason}")]
    RegionOutOfBounds {
        /// Debug rendering of the offending region.
        region: String,
        /// Description of the valid range.
        reason: String,
    },
    /// An output slice index exceeds the grid extent along its axis.
    #[error("slice index {index} along {axis} out of range 0..{len}")]
    SliceOutOfBounds {
        /// Axis name (`x`, `y`, or `z`).
        axis: &'static str,
        /// Requested index.
        index: usize,
        /// Grid size along that axis.
        len: usize,
    },
    /// A quantity that must be finite and strictly positive is not.
    #[error("{name} must be finite and positive, got {value}")]
    NonPositive {
        /// Parameter name, e.g. `"relaxation rate"`.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A parameter violates a constraint other than positivity.
    #[error("invalid {name}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the violated constraint.
        reason: String,
    },
    /// A reference profile does not have one value per vertical level.
    #[error("reference profile for {tracer} has {found} levels, grid has {expected}")]
    ProfileLength {
        /// Tracer whose profile is malformed.
        tracer: &'static str,
        /// Number of values supplied.
        found: usize,
        /// Number of vertical levels in the grid.
        expected: usize,
    },
    /// The meltwater strategy zeroes a sponge band but none is configured.
    #[error("maintenance strategy {strategy} requires a sponge layer")]
    MissingSponge {
        /// Name of the strategy.
        strategy: String,
    },
    /// Two output schedules, or two entries in one schedule, share a name.
    #[error("duplicate output name '{name}'")]
    DuplicateName {
        /// The repeated name.
        name: String,
    },
    /// An output schedule has no entries.
    #[error("output schedule '{name}' has no entries")]
    EmptyOutput {
        /// Schedule name.
        name: String,
    },
    /// A configuration file could not be read.
    #[error("cannot read config {path}: {reason}")]
    Unreadable {
        /// Path that was requested.
        path: String,
        /// Underlying I/O error message.
        reason: String,
    },
    /// A configuration document could not be parsed or serialized.
    #[error("malformed config: {reason}")]
    Malformed {
        /// Parser error message.
        reason: String,
    },
}

/// Faults surfaced by the external physics solver.
///
/// Always fatal: the driver never retries after a fault. It closes every
/// writer to preserve partial output and then returns the fault.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SolverFault {
    /// NaN or infinity found in a solver field.
    #[error("non-finite value in field {field}{}", .cell_index.map(|i| format!(" at cell {i}")).unwrap_or_default())]
    NanDetected {
        /// The field containing the value.
        field: Field,
        /// Flat index of the first offending cell, if known.
        cell_index: Option<usize>,
    },
    /// A reported extremum (velocity, diffusivity, timescale) is not finite.
    #[error("non-finite {quantity}: {value}")]
    NonFinite {
        /// Name of the quantity, e.g. `"max |u|"`.
        quantity: &'static str,
        /// The reported value.
        value: f64,
    },
    /// The solver does not expose a field the driver needs.
    #[error("solver does not expose field {field}")]
    MissingField {
        /// The absent field.
        field: Field,
    },
    /// Any other unrecoverable solver failure.
    #[error("solver diverged: {reason}")]
    Diverged {
        /// Human-readable description.
        reason: String,
    },
}

/// Errors from output selection and persistence.
///
/// Writer failures are fatal: partial or corrupt output is worse than a
/// visible crash for a scientific run.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// An I/O error occurred while writing or reading output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A selector referenced a field the solver state does not expose.
    #[error("field {field} not available from solver state")]
    MissingField {
        /// The requested field.
        field: Field,
    },
    /// A field array does not match the grid's cell count.
    #[error("field {field} has {found} values, grid has {expected} cells")]
    FieldLength {
        /// The mismatched field.
        field: Field,
        /// Values present in the array.
        found: usize,
        /// Cells in the grid.
        expected: usize,
    },
    /// Write attempted on a sink that has already been closed.
    #[error("sink for '{name}' is closed")]
    Closed {
        /// Schedule name of the closed sink.
        name: String,
    },
    /// The output file does not start with the expected magic bytes.
    #[error("invalid magic bytes (expected b\"TIDE\")")]
    InvalidMagic,
    /// The output format version is not supported by this build.
    #[error("unsupported format version {found}")]
    UnsupportedVersion {
        /// Version byte found in the file.
        found: u8,
    },
    /// A frame could not be encoded or decoded.
    #[error("malformed frame: {detail}")]
    MalformedFrame {
        /// Description of what went wrong.
        detail: String,
    },
}
