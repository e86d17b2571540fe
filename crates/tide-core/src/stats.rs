//! Field reductions shared by solvers, monitors, and output selectors.

/// Maximum absolute value of a slice; `0.0` for an empty slice.
///
/// NaN entries propagate: if any value is NaN the result is NaN, so that
/// callers checking `is_finite()` on the extremum see the fault.
pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |acc, &v| {
        if v.is_nan() || acc.is_nan() {
            f64::NAN
        } else {
            acc.max(v.abs())
        }
    })
}

/// Maximum value of a slice; `f64::NEG_INFINITY` for an empty slice.
///
/// NaN entries propagate the same way as in [`max_abs`].
pub fn max_value(values: &[f64]) -> f64 {
    values.iter().fold(f64::NEG_INFINITY, |acc, &v| {
        if v.is_nan() || acc.is_nan() {
            f64::NAN
        } else {
            acc.max(v)
        }
    })
}
