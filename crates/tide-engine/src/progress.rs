//! Human-readable progress reports.

use std::fmt;
use std::time::Duration;

use crate::cfl::{CflNumbers, Extrema};

/// Snapshot of run progress emitted after every outer iteration.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressReport {
    /// Percentage of `end_time` reached.
    pub percent: f64,
    /// Solver sub-steps taken.
    pub iteration: u64,
    /// Simulation time in seconds.
    pub time: f64,
    /// Simulation time in days.
    pub days: f64,
    /// Solver extrema after the batch.
    pub extrema: Extrema,
    /// Courant numbers at the step size just used.
    pub cfl: CflNumbers,
    /// Step size for the next batch.
    pub next_dt: f64,
    /// Average wall time per sub-step.
    pub wall_per_substep: Duration,
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:5.1}%] i: {}, t: {:.3} days, max(|u|, |v|, |w|): ({:.2e}, {:.2e}, {:.2e}) m/s, \
             max(ν, κ): ({:.2e}, {:.2e}) m²/s, CFL adv: {:.3}, diff: {:.3}, next Δt: {:.3} s, \
             wall: {:?}/step",
            self.percent,
            self.iteration,
            self.days,
            self.extrema.max_u,
            self.extrema.max_v,
            self.extrema.max_w,
            self.extrema.max_viscosity,
            self.extrema.max_diffusivity,
            self.cfl.advective,
            self.cfl.diffusive,
            self.next_dt,
            self.wall_per_substep,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_contains_key_quantities() {
        let r = ProgressReport {
            percent: 50.0,
            iteration: 200,
            time: 43_200.0,
            days: 0.5,
            extrema: Extrema {
                max_u: 0.1,
                max_v: 0.0,
                max_w: 1e-3,
                max_viscosity: 1e-4,
                max_diffusivity: 1e-5,
                advection_timescale: 100.0,
            },
            cfl: CflNumbers {
                advective: 0.25,
                diffusive: 0.01,
            },
            next_dt: 12.5,
            wall_per_substep: Duration::from_micros(1500),
        };
        let s = r.to_string();
        assert!(s.starts_with("[ 50.0%]"), "{s}");
        assert!(s.contains("i: 200"));
        assert!(s.contains("0.500 days"));
        assert!(s.contains("CFL adv: 0.250"));
        assert!(s.contains("next Δt: 12.500 s"));
    }
}
