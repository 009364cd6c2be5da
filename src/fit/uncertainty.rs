//! Monte-Carlo prediction intervals.
//!
//! Each sample simulates:
//! - future trend changes: a Poisson number of changepoints after the end of
//!   the history, at the historical changepoint rate, each with a
//!   Laplace-distributed slope change scaled to the mean absolute historical
//!   change
//! - observation noise: Gaussian with the in-sample residual standard deviation
//!
//! Historical periods only carry observation noise. The RNG is seeded from the
//! caller so identical inputs produce identical intervals.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal, Poisson};

use crate::domain::{Cadence, CleanedSeries};
use crate::error::AppError;
use crate::fit::fitter::FittedComponents;
use crate::math::{quantile_sorted, sample_std};

/// Lower/upper bounds for each requested date, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalBand {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Seed derived from the series contents and the request shape.
pub fn interval_seed(series: &CleanedSeries, cadence: Cadence, horizon: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    for point in series.points() {
        point.date.hash(&mut hasher);
        point.value.to_bits().hash(&mut hasher);
    }
    cadence.code().hash(&mut hasher);
    horizon.hash(&mut hasher);
    hasher.finish()
}

/// A simulated set of future trend changes for one sample.
struct TrendPath {
    /// `(scaled time, slope change in target units per unit time)`.
    changes: Vec<(f64, f64)>,
}

impl TrendPath {
    fn deviation(&self, t: f64) -> f64 {
        self.changes.iter().map(|(tc, delta)| delta * (t - tc).max(0.0)).sum()
    }
}

/// Simulate `samples` paths and return the central `width` interval for
/// `history` (observed) and `future` dates.
///
/// Bounds always contain the point prediction.
pub fn simulate_intervals(
    fit: &FittedComponents,
    history: &CleanedSeries,
    future: &[NaiveDate],
    width: f64,
    samples: usize,
    seed: u64,
) -> Result<IntervalBand, AppError> {
    if samples == 0 || !(width > 0.0 && width < 1.0) {
        return Err(AppError::ModelTraining(format!(
            "invalid interval settings: width={width}, samples={samples}"
        )));
    }

    let residuals: Vec<f64> = history.points().iter().map(|p| p.value - fit.predict(p.date)).collect();
    let sigma = sample_std(&residuals).filter(|s| s.is_finite()).unwrap_or(0.0);
    let noise = if sigma > 0.0 {
        Some(Normal::new(0.0, sigma).map_err(|e| AppError::ModelTraining(format!("noise distribution: {e}")))?)
    } else {
        None
    };

    let scale = fit.time_scale();
    let future_t: Vec<f64> = future.iter().map(|d| scale.scaled(*d)).collect();
    let t_max = future_t.iter().copied().fold(1.0_f64, f64::max);

    let deltas = fit.changepoint_deltas();
    let mean_abs_delta = if deltas.is_empty() {
        0.0
    } else {
        deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len() as f64
    };
    // Changepoints per unit of scaled time over the history.
    let rate = fit.changepoints().len() as f64;
    let expected_changes = rate * (t_max - 1.0);

    let change_count = if expected_changes > 0.0 && mean_abs_delta > 0.0 {
        Some(Poisson::new(expected_changes).map_err(|e| AppError::ModelTraining(format!("change distribution: {e}")))?)
    } else {
        None
    };
    let change_size = if mean_abs_delta > 0.0 {
        Some(Exp::new(1.0 / mean_abs_delta).map_err(|e| AppError::ModelTraining(format!("change distribution: {e}")))?)
    } else {
        None
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let dates: Vec<NaiveDate> = history.dates().into_iter().chain(future.iter().copied()).collect();
    let base_trend: Vec<f64> = dates.iter().map(|d| fit.trend(*d)).collect();
    let t: Vec<f64> = dates.iter().map(|d| scale.scaled(*d)).collect();
    let mut draws: Vec<Vec<f64>> = vec![Vec::with_capacity(samples); dates.len()];

    for _ in 0..samples {
        let path = match (&change_count, &change_size) {
            (Some(count), Some(size)) => {
                let n_changes = count.sample(&mut rng) as usize;
                let changes = (0..n_changes)
                    .map(|_| {
                        let at = rng.gen_range(1.0..t_max);
                        let magnitude = size.sample(&mut rng);
                        let delta = if rng.gen_bool(0.5) { magnitude } else { -magnitude };
                        (at, delta * fit.y_scale())
                    })
                    .collect();
                TrendPath { changes }
            }
            _ => TrendPath { changes: Vec::new() },
        };

        for (i, date) in dates.iter().enumerate() {
            let trend = base_trend[i] + path.deviation(t[i]);
            let mut value = fit.combine(trend, *date);
            if let Some(noise) = &noise {
                value += noise.sample(&mut rng);
            }
            draws[i].push(value);
        }
    }

    let lower_q = (1.0 - width) / 2.0;
    let upper_q = 1.0 - lower_q;
    let mut lower = Vec::with_capacity(dates.len());
    let mut upper = Vec::with_capacity(dates.len());
    for (i, mut values) in draws.into_iter().enumerate() {
        values.sort_by(f64::total_cmp);
        let point = fit.combine(base_trend[i], dates[i]);
        let lo = quantile_sorted(&values, lower_q).unwrap_or(point);
        let hi = quantile_sorted(&values, upper_q).unwrap_or(point);
        if !(lo.is_finite() && hi.is_finite()) {
            return Err(AppError::ModelTraining("non-finite prediction interval".to_string()));
        }
        lower.push(lo.min(point));
        upper.push(hi.max(point));
    }

    Ok(IntervalBand { lower, upper })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SeasonalityMode, SeriesPoint};
    use crate::fit::fitter::{FitInput, fit_components};
    use crate::models::{HolidayColumns, ModelSettings};
    use chrono::Months;

    fn noisy_monthly(n: usize) -> CleanedSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        CleanedSeries::from_points(
            (0..n)
                .map(|i| SeriesPoint {
                    date: start.checked_add_months(Months::new(i as u32)).unwrap(),
                    value: 200.0 + 4.0 * i as f64 + if i % 3 == 0 { 9.0 } else { -4.0 } + (i % 7) as f64,
                })
                .collect(),
        )
    }

    fn fitted(series: &CleanedSeries) -> FittedComponents {
        let dates = series.dates();
        let values = series.values();
        let settings = ModelSettings::for_series(series, Cadence::Monthly);
        let holidays = HolidayColumns::default();
        let input = FitInput {
            dates: &dates,
            values: &values,
            cadence: Cadence::Monthly,
            settings: &settings,
            holidays: &holidays,
        };
        fit_components(&input, SeasonalityMode::Additive, 0.05).unwrap()
    }

    #[test]
    fn bands_contain_point_and_widen_with_horizon() {
        let series = noisy_monthly(36);
        let fit = fitted(&series);
        let last = series.last_date().unwrap();
        let future = Cadence::Monthly.future_dates(last, 12).unwrap();
        let seed = interval_seed(&series, Cadence::Monthly, 12);

        let band = simulate_intervals(&fit, &series, &future, 0.8, 100, seed).unwrap();
        assert_eq!(band.lower.len(), series.len() + 12);

        let dates: Vec<NaiveDate> = series.dates().into_iter().chain(future.iter().copied()).collect();
        for (i, d) in dates.iter().enumerate() {
            let point = fit.predict(*d);
            assert!(band.lower[i] <= point && point <= band.upper[i]);
        }
        let first_width = band.upper[series.len()] - band.lower[series.len()];
        let last_width = band.upper[dates.len() - 1] - band.lower[dates.len() - 1];
        assert!(first_width > 0.0);
        assert!(last_width >= first_width * 0.5);
    }

    #[test]
    fn same_seed_same_band() {
        let series = noisy_monthly(24);
        let fit = fitted(&series);
        let future = Cadence::Monthly.future_dates(series.last_date().unwrap(), 6).unwrap();
        let seed = interval_seed(&series, Cadence::Monthly, 6);
        let a = simulate_intervals(&fit, &series, &future, 0.8, 100, seed).unwrap();
        let b = simulate_intervals(&fit, &series, &future, 0.8, 100, seed).unwrap();
        assert_eq!(a, b);
        assert_ne!(seed, interval_seed(&series, Cadence::Monthly, 7));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let series = noisy_monthly(24);
        let fit = fitted(&series);
        assert!(simulate_intervals(&fit, &series, &[], 0.8, 0, 1).is_err());
        assert!(simulate_intervals(&fit, &series, &[], 1.5, 10, 1).is_err());
    }
}
