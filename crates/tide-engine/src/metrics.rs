//! Per-iteration timing metrics for the driver.

use std::time::Duration;

/// Wall-clock timings collected during one outer iteration.
///
/// All durations are in microseconds. The driver populates these after
/// each `step()` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepMetrics {
    /// Wall-clock time for the whole iteration, in microseconds.
    pub total_us: u64,
    /// Time inside the solver's `advance()`, in microseconds.
    pub advance_us: u64,
    /// Time spent on meltwater maintenance, in microseconds.
    pub maintenance_us: u64,
    /// Time spent polling output schedules, in microseconds.
    pub output_us: u64,
    /// Time spent sampling monitors and updating the step size.
    pub monitor_us: u64,
    /// Number of output schedules fired this iteration.
    pub outputs_fired: usize,
    /// Solver sub-steps in the batch.
    pub sub_steps: u32,
}

impl StepMetrics {
    /// Average wall time per solver sub-step.
    pub fn wall_per_substep(&self) -> Duration {
        if self.sub_steps == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(self.advance_us / u64::from(self.sub_steps))
    }
}

pub(crate) fn micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.outputs_fired, 0);
        assert_eq!(m.wall_per_substep(), Duration::ZERO);
    }

    #[test]
    fn per_substep_divides_advance_time() {
        let m = StepMetrics {
            advance_us: 5_000,
            sub_steps: 10,
            ..Default::default()
        };
        assert_eq!(m.wall_per_substep(), Duration::from_micros(500));
    }
}
