//! Changepoint prior scale grid.
//!
//! The trend flexibility is chosen by a deterministic grid search rather than
//! a nonlinear optimiser, so the same input always selects the same scale.

use crate::error::AppError;

/// Smallest prior scale tried (very stiff trend).
pub const PRIOR_SCALE_MIN: f64 = 0.001;
/// Largest prior scale tried (very flexible trend).
pub const PRIOR_SCALE_MAX: f64 = 0.5;
pub const PRIOR_SCALE_STEPS: usize = 6;
/// Used when the history is too short to hold out a validation window.
pub const DEFAULT_PRIOR_SCALE: f64 = 0.05;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, AppError> {
    if !(min.is_finite() && max.is_finite() && min > 0.0 && max > 0.0 && max > min) {
        return Err(AppError::Config(format!(
            "invalid grid range: min={min}, max={max} (must be finite, >0, and max>min)"
        )));
    }
    if steps < 2 {
        return Err(AppError::Config("grid steps must be >= 2".to_string()));
    }

    let ln_min = min.ln();
    let step = (max.ln() - ln_min) / (steps as f64 - 1.0);
    Ok((0..steps).map(|i| (ln_min + step * i as f64).exp()).collect())
}

/// The candidate changepoint prior scales, stiffest first.
pub fn prior_scale_grid() -> Result<Vec<f64>, AppError> {
    log_space(PRIOR_SCALE_MIN, PRIOR_SCALE_MAX, PRIOR_SCALE_STEPS)
}
