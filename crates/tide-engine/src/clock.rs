//! Simulation time and iteration count.

/// Seconds per day, for progress reporting.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Monotone simulation clock.
///
/// Advanced only after a successful solver `advance()`; `iteration`
/// counts solver sub-steps, not outer iterations.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimulationClock {
    time: f64,
    iteration: u64,
}

impl SimulationClock {
    /// A clock at `t = 0`, iteration 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulation time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Sub-steps taken so far.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Simulation time in days.
    pub fn days(&self) -> f64 {
        self.time / SECONDS_PER_DAY
    }

    /// Account for `n_steps` sub-steps of `dt` seconds.
    pub fn tick(&mut self, dt: f64, n_steps: u32) {
        debug_assert!(dt > 0.0, "clock must advance");
        self.time += dt * f64::from(n_steps);
        self.iteration += u64::from(n_steps);
    }
}
