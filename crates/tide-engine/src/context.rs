//! Run-wide state threaded through the driver.

use tide_grid::GridDescriptor;

use crate::clock::SimulationClock;
use crate::wizard::TimeStepWizard;

/// The grid, clock, and step-size controller for one run.
///
/// Owned by the [`Simulation`](crate::Simulation) and passed by reference
/// to each component; there is no global simulation state.
#[derive(Clone, Debug)]
pub struct SimulationContext {
    /// Immutable grid geometry.
    pub grid: GridDescriptor,
    /// Simulation clock.
    pub clock: SimulationClock,
    /// Step-size controller.
    pub wizard: TimeStepWizard,
    /// Stop once `clock.time() >= end_time` (seconds).
    pub end_time: f64,
    /// Solver sub-steps per outer iteration.
    pub inner_steps: u32,
}

impl SimulationContext {
    /// Fraction of the run completed, as a percentage capped at 100.
    pub fn percent_complete(&self) -> f64 {
        (100.0 * self.clock.time() / self.end_time).min(100.0)
    }

    /// Whether the clock has reached the end time.
    pub fn is_finished(&self) -> bool {
        self.clock.time() >= self.end_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_and_finish() {
        let mut ctx = SimulationContext {
            grid: GridDescriptor::new([2, 2, 2], [2.0, 2.0, 2.0]).unwrap(),
            clock: SimulationClock::new(),
            wizard: TimeStepWizard::new(1.0, 0.5, 1.1, 10.0).unwrap(),
            end_time: 200.0,
            inner_steps: 10,
        };
        ctx.clock.tick(5.0, 10);
        assert_eq!(ctx.percent_complete(), 25.0);
        assert!(!ctx.is_finished());
        ctx.clock.tick(15.0, 10);
        assert!(ctx.is_finished());
        assert_eq!(ctx.percent_complete(), 100.0);
    }
}
