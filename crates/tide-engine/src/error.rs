//! Errors surfaced by the simulation driver.

use tide_core::{ConfigError, OutputError, SolverFault};

/// Any failure that ends a run.
///
/// None of these are retried. When a run aborts with
/// [`Solver`](RunError::Solver) or [`Output`](RunError::Output), every
/// writer has already been closed.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Invalid setup, detected before the loop starts.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The solver failed or reported non-finite state.
    #[error(transparent)]
    Solver(#[from] SolverFault),
    /// Selecting or persisting output failed.
    #[error(transparent)]
    Output(#[from] OutputError),
    /// `step` was called after the run ended.
    #[error("simulation has terminated")]
    Terminated,
}
