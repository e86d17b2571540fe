//! The adaptive step-size controller.
//!
//! Each outer iteration the wizard rescales `Δt` so the advective Courant
//! number approaches `cfl_target`, bounding the change by `max_change` in
//! either direction and capping the result at `max_dt`.

use tide_core::ConfigError;

use crate::cfl::CflNumbers;

/// Courant numbers at or below this are treated as zero.
///
/// With the fluid at rest there is no stability constraint to track, so
/// the step is left unchanged instead of dividing by zero.
pub const CFL_EPSILON: f64 = 1e-12;

/// Owns the current step size and the rules for changing it.
///
/// # Examples
///
/// ```
/// use tide_engine::{CflNumbers, TimeStepWizard};
///
/// let mut wizard = TimeStepWizard::new(10.0, 0.5, 1.1, 60.0).unwrap();
///
/// // CFL of 0.25 wants Δt = 20 s, but growth is capped at 10%.
/// let dt = wizard.update(CflNumbers { advective: 0.25, diffusive: 0.0 });
/// assert!((dt - 11.0).abs() < 1e-12);
///
/// // At rest the step is left alone.
/// let before = wizard.dt();
/// assert_eq!(wizard.update(CflNumbers::default()), before);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TimeStepWizard {
    dt: f64,
    cfl_target: f64,
    max_change: f64,
    max_dt: f64,
    diffusive_cfl_target: Option<f64>,
}

fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

impl TimeStepWizard {
    /// A wizard starting at `initial_dt`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NonPositive`] for a non-finite or non-positive
    /// argument, [`ConfigError::InvalidParameter`] if `max_change <= 1` or
    /// `initial_dt > max_dt`.
    pub fn new(
        initial_dt: f64,
        cfl_target: f64,
        max_change: f64,
        max_dt: f64,
    ) -> Result<Self, ConfigError> {
        let dt = positive("initial time step", initial_dt)?;
        let cfl_target = positive("CFL target", cfl_target)?;
        let max_dt = positive("maximum time step", max_dt)?;
        if !(max_change.is_finite() && max_change > 1.0) {
            return Err(ConfigError::InvalidParameter {
                name: "max_change",
                reason: format!("must be finite and greater than 1, got {max_change}"),
            });
        }
        if dt > max_dt {
            return Err(ConfigError::InvalidParameter {
                name: "initial time step",
                reason: format!("{dt} s exceeds the maximum time step {max_dt} s"),
            });
        }
        Ok(Self {
            dt,
            cfl_target,
            max_change,
            max_dt,
            diffusive_cfl_target: None,
        })
    }

    /// Also limit the step by a diffusive Courant target.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NonPositive`] if `target` is not finite and positive.
    pub fn with_diffusive_cfl_target(mut self, target: f64) -> Result<Self, ConfigError> {
        self.diffusive_cfl_target = Some(positive("diffusive CFL target", target)?);
        Ok(self)
    }

    /// The committed step size in seconds.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Target advective Courant number.
    pub fn cfl_target(&self) -> f64 {
        self.cfl_target
    }

    /// Bound on the per-iteration ratio `Δt'/Δt`.
    pub fn max_change(&self) -> f64 {
        self.max_change
    }

    /// Hard ceiling on `Δt`.
    pub fn max_dt(&self) -> f64 {
        self.max_dt
    }

    /// Target diffusive Courant number, if enabled.
    pub fn diffusive_cfl_target(&self) -> Option<f64> {
        self.diffusive_cfl_target
    }

    /// The step that [`update`](Self::update) would commit for `cfl`,
    /// measured at the current step size.
    pub fn propose(&self, cfl: CflNumbers) -> f64 {
        let advective = (cfl.advective > CFL_EPSILON)
            .then(|| self.dt * self.cfl_target / cfl.advective);
        let diffusive = match self.diffusive_cfl_target {
            Some(target) if cfl.diffusive > CFL_EPSILON => Some(self.dt * target / cfl.diffusive),
            _ => None,
        };
        let raw = match (advective, diffusive) {
            (Some(a), Some(d)) => a.min(d),
            (Some(a), None) => a,
            (None, Some(d)) => d,
            (None, None) => return self.dt,
        };
        let ratio = (raw / self.dt).clamp(1.0 / self.max_change, self.max_change);
        (self.dt * ratio).min(self.max_dt)
    }

    /// Commit and return the next step size.
    pub fn update(&mut self, cfl: CflNumbers) -> f64 {
        let next = self.propose(cfl);
        tracing::trace!(from = self.dt, to = next, cfl = cfl.advective, "time step updated");
        self.dt = next;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn adv(c: f64) -> CflNumbers {
        CflNumbers {
            advective: c,
            diffusive: 0.0,
        }
    }

    #[test]
    fn shrink_is_bounded() {
        let mut w = TimeStepWizard::new(10.0, 0.5, 2.0, 100.0).unwrap();
        assert_eq!(w.update(adv(50.0)), 5.0);
    }

    #[test]
    fn exact_rescale_within_bounds() {
        let mut w = TimeStepWizard::new(10.0, 0.5, 2.0, 100.0).unwrap();
        assert_eq!(w.update(adv(0.3125)), 16.0);
    }

    #[test]
    fn capped_at_max_dt() {
        let mut w = TimeStepWizard::new(10.0, 0.5, 2.0, 15.0).unwrap();
        assert_eq!(w.update(adv(0.1)), 15.0);
        assert_eq!(w.update(adv(0.1)), 15.0);
    }

    #[test]
    fn zero_velocity_leaves_dt_unchanged() {
        let mut w = TimeStepWizard::new(7.0, 0.5, 1.5, 100.0).unwrap();
        assert_eq!(w.update(adv(0.0)), 7.0);
        assert_eq!(w.update(adv(CFL_EPSILON)), 7.0);
    }

    #[test]
    fn infinite_cfl_shrinks_by_max_change() {
        let mut w = TimeStepWizard::new(10.0, 0.5, 2.0, 100.0).unwrap();
        assert_eq!(w.update(adv(f64::INFINITY)), 5.0);
    }

    #[test]
    fn diffusive_target_takes_smaller_step() {
        let w = TimeStepWizard::new(10.0, 0.5, 4.0, 100.0)
            .unwrap()
            .with_diffusive_cfl_target(0.1)
            .unwrap();
        // Advective wants 20 s, diffusive wants 5 s.
        let dt = w.propose(CflNumbers {
            advective: 0.25,
            diffusive: 0.2,
        });
        assert_eq!(dt, 5.0);
    }

    #[test]
    fn diffusive_target_alone_applies_at_rest() {
        let w = TimeStepWizard::new(10.0, 0.5, 4.0, 100.0)
            .unwrap()
            .with_diffusive_cfl_target(0.2)
            .unwrap();
        assert_eq!(w.propose(CflNumbers { advective: 0.0, diffusive: 0.1 }), 20.0);
    }

    #[test]
    fn validation() {
        assert!(matches!(
            TimeStepWizard::new(0.0, 0.5, 1.1, 10.0),
            Err(ConfigError::NonPositive { .. })
        ));
        assert!(matches!(
            TimeStepWizard::new(1.0, -0.5, 1.1, 10.0),
            Err(ConfigError::NonPositive { .. })
        ));
        assert!(matches!(
            TimeStepWizard::new(1.0, 0.5, 1.0, 10.0),
            Err(ConfigError::InvalidParameter { name: "max_change", .. })
        ));
        assert!(matches!(
            TimeStepWizard::new(20.0, 0.5, 1.1, 10.0),
            Err(ConfigError::InvalidParameter { .. })
        ));
        assert!(matches!(
            TimeStepWizard::new(1.0, 0.5, 1.1, f64::INFINITY),
            Err(ConfigError::NonPositive { .. })
        ));
    }

    proptest! {
        #[test]
        fn ratio_stays_within_max_change(
            dt in 1e-3f64..1e3,
            headroom in 1.0f64..100.0,
            target in 0.01f64..2.0,
            max_change in 1.0001f64..10.0,
            cfl in 0.0f64..1e3,
        ) {
            let max_dt = dt * headroom;
            let mut w = TimeStepWizard::new(dt, target, max_change, max_dt).unwrap();
            let next = w.update(adv(cfl));
            let ratio = next / dt;
            prop_assert!(next > 0.0);
            prop_assert!(next <= max_dt);
            prop_assert!(ratio <= max_change * (1.0 + 1e-12));
            prop_assert!(ratio >= (1.0 / max_change) * (1.0 - 1e-12));
        }
    }
}
