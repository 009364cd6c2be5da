//! Changepoint prior scale selection by holdout error.
//!
//! Rules:
//! 1. Hold out the last ~20 % of the history (at least one period).
//! 2. Fit each grid candidate on the remaining history, in parallel.
//! 3. Pick the candidate with the lowest mean absolute holdout error; break
//!    ties by grid index so the choice is deterministic.
//!
//! Histories too short to leave a useful training window fall back to
//! [`DEFAULT_PRIOR_SCALE`].

use rayon::prelude::*;
use tracing::debug;

use crate::domain::SeasonalityMode;
use crate::fit::fitter::{FitInput, fit_components};
use crate::fit::grid::DEFAULT_PRIOR_SCALE;

/// Share of the history used for validation.
pub const HOLDOUT_SHARE: f64 = 0.2;
/// Minimum periods left for training after the holdout is removed.
pub const MIN_TRAIN_PERIODS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorSelection {
    pub prior_scale: f64,
    /// Mean absolute holdout error, when a holdout was evaluated.
    pub holdout_mae: Option<f64>,
    pub candidates_evaluated: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    idx: usize,
    prior_scale: f64,
    mae: f64,
}

pub fn select_prior_scale(input: &FitInput<'_>, mode: SeasonalityMode, grid: &[f64]) -> PriorSelection {
    let fallback = PriorSelection {
        prior_scale: DEFAULT_PRIOR_SCALE,
        holdout_mae: None,
        candidates_evaluated: 0,
    };

    let n = input.dates.len();
    let holdout = ((n as f64 * HOLDOUT_SHARE).round() as usize).max(1);
    let train = n.saturating_sub(holdout);
    if train < MIN_TRAIN_PERIODS || grid.is_empty() {
        debug!(n, "history too short for prior selection; using default");
        return fallback;
    }

    let training = input.head(train);
    let test_dates = &input.dates[train..];
    let test_values = &input.values[train..];

    // Evaluate each prior scale independently (parallel).
    let candidates: Vec<Candidate> = grid
        .par_iter()
        .enumerate()
        .filter_map(|(idx, &prior_scale)| {
            let fit = fit_components(&training, mode, prior_scale).ok()?;
            let mae = test_dates
                .iter()
                .zip(test_values)
                .map(|(d, y)| (fit.predict(*d) - y).abs())
                .sum::<f64>()
                / test_dates.len() as f64;
            mae.is_finite().then_some(Candidate { idx, prior_scale, mae })
        })
        .collect();

    // Deterministic selection: minimum error; ties go to the lower grid index.
    let Some(best) = candidates
        .iter()
        .copied()
        .min_by(|a, b| a.mae.total_cmp(&b.mae).then(a.idx.cmp(&b.idx)))
    else {
        debug!("no prior scale candidate could be fitted; using default");
        return fallback;
    };

    debug!(
        prior_scale = best.prior_scale,
        holdout_mae = best.mae,
        candidates = candidates.len(),
        "selected changepoint prior scale"
    );
    PriorSelection {
        prior_scale: best.prior_scale,
        holdout_mae: Some(best.mae),
        candidates_evaluated: candidates.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Cadence, CleanedSeries, SeriesPoint};
    use crate::fit::grid::prior_scale_grid;
    use crate::models::{HolidayColumns, ModelSettings};
    use chrono::{Months, NaiveDate};

    fn fixture(n: usize, f: impl Fn(usize) -> f64) -> (Vec<NaiveDate>, Vec<f64>, ModelSettings) {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..n).map(|i| start.checked_add_months(Months::new(i as u32)).unwrap()).collect();
        let values: Vec<f64> = (0..n).map(f).collect();
        let series = CleanedSeries::from_points(
            dates
                .iter()
                .zip(&values)
                .map(|(d, v)| SeriesPoint { date: *d, value: *v })
                .collect(),
        );
        let settings = ModelSettings::for_series(&series, Cadence::Monthly);
        (dates, values, settings)
    }

    #[test]
    fn selection_is_deterministic_and_from_grid() {
        let (dates, values, settings) = fixture(36, |i| 100.0 + 3.0 * i as f64 + (i % 12) as f64);
        let holidays = HolidayColumns::default();
        let input = FitInput {
            dates: &dates,
            values: &values,
            cadence: Cadence::Monthly,
            settings: &settings,
            holidays: &holidays,
        };
        let grid = prior_scale_grid().unwrap();
        let a = select_prior_scale(&input, SeasonalityMode::Additive, &grid);
        let b = select_prior_scale(&input, SeasonalityMode::Additive, &grid);
        assert_eq!(a, b);
        assert!(grid.contains(&a.prior_scale));
        assert_eq!(a.candidates_evaluated, grid.len());
        assert!(a.holdout_mae.is_some());
    }

    #[test]
    fn short_history_uses_default() {
        let (dates, values, settings) = fixture(9, |i| 10.0 + i as f64);
        let holidays = HolidayColumns::default();
        let input = FitInput {
            dates: &dates,
            values: &values,
            cadence: Cadence::Monthly,
            settings: &settings,
            holidays: &holidays,
        };
        let grid = prior_scale_grid().unwrap();
        let sel = select_prior_scale(&input, SeasonalityMode::Additive, &grid);
        assert_eq!(sel.prior_scale, DEFAULT_PRIOR_SCALE);
        assert_eq!(sel.holdout_mae, None);
    }
}
