//! Piecewise-linear trend + Fourier seasonality + holiday regression.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::{Cadence, CleanedSeries, ForecastPoint, HolidayEvent, ModelForecast, SeasonalityMode};
use crate::error::AppError;
use crate::fit::{
    FitInput, FittedComponents, PriorSelection, fit_components, interval_seed, prior_scale_grid, select_prior_scale,
    simulate_intervals,
};
use crate::math::sample_std;
use crate::models::{ForecastModel, HolidayColumns, ModelSettings};

/// Largest accepted forecast horizon, in periods.
pub const MAX_HORIZON: usize = 365;

/// The shipped [`ForecastModel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendSeasonalModel;

impl TrendSeasonalModel {
    pub fn new() -> Self {
        Self
    }
}

fn validate(series: &CleanedSeries, horizon: usize) -> Result<(), AppError> {
    if horizon == 0 || horizon > MAX_HORIZON {
        return Err(AppError::InvalidHorizon(horizon as i64));
    }
    if series.is_empty() {
        return Err(AppError::ModelTraining("series is empty".to_string()));
    }
    let values = series.values();
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AppError::ModelTraining("series contains non-finite values".to_string()));
    }
    match sample_std(&values) {
        Some(s) if s > 0.0 => Ok(()),
        _ => Err(AppError::ModelTraining(
            "series has zero variance; nothing to model".to_string(),
        )),
    }
}

impl ForecastModel for TrendSeasonalModel {
    fn fit_predict(
        &self,
        series: &CleanedSeries,
        cadence: Cadence,
        horizon: usize,
        holidays: &[HolidayEvent],
    ) -> Result<ModelForecast, AppError> {
        validate(series, horizon)?;

        let settings = ModelSettings::for_series(series, cadence);
        let columns = HolidayColumns::new(holidays, cadence);
        let dates = series.dates();
        let values = series.values();
        let input = FitInput {
            dates: &dates,
            values: &values,
            cadence,
            settings: &settings,
            holidays: &columns,
        };

        let last = series
            .last_date()
            .ok_or_else(|| AppError::ModelTraining("series is empty".to_string()))?;
        let future = cadence.future_dates(last, horizon)?;
        let cutover = *future
            .first()
            .ok_or_else(|| AppError::ModelTraining("no future periods generated".to_string()))?;

        let grid = prior_scale_grid()?;
        let (fit, selection) = match fit_in_mode(&input, settings.mode, &grid, &future) {
            Ok(found) => found,
            Err(err) if settings.mode == SeasonalityMode::Multiplicative => {
                warn!(reason = %err, "multiplicative fit unusable; refitting additive");
                fit_in_mode(&input, SeasonalityMode::Additive, &grid, &future)?
            }
            Err(err) => return Err(err),
        };
        let mode = fit.mode();

        let seed = interval_seed(series, cadence, horizon);
        let band = simulate_intervals(
            &fit,
            series,
            &future,
            settings.interval_width,
            settings.uncertainty_samples,
            seed,
        )?;

        let points: Vec<ForecastPoint> = dates
            .iter()
            .chain(future.iter())
            .zip(band.lower.iter().zip(&band.upper))
            .map(|(date, (lower, upper))| ForecastPoint {
                date: *date,
                yhat: fit.predict(*date),
                yhat_lower: *lower,
                yhat_upper: *upper,
            })
            .collect();

        if points
            .iter()
            .any(|p| !(p.yhat.is_finite() && p.yhat_lower.is_finite() && p.yhat_upper.is_finite()))
        {
            return Err(AppError::ModelTraining("model produced non-finite predictions".to_string()));
        }

        info!(
            periods = series.len(),
            horizon,
            mode = ?mode,
            prior_scale = selection.prior_scale,
            holiday_columns = columns.len(),
            "model fitted"
        );

        Ok(ModelForecast { points, cutover, mode })
    }
}

/// Select the prior scale and refit on the full history in `mode`.
///
/// Multiplicative fits also require a strictly positive trend over the horizon.
fn fit_in_mode(
    input: &FitInput<'_>,
    mode: SeasonalityMode,
    grid: &[f64],
    future: &[NaiveDate],
) -> Result<(FittedComponents, PriorSelection), AppError> {
    let selection = select_prior_scale(input, mode, grid);
    let fit = fit_components(input, mode, selection.prior_scale)?;
    if mode == SeasonalityMode::Multiplicative && future.iter().any(|d| !(fit.trend(*d) > 0.0)) {
        return Err(AppError::ModelTraining(
            "multiplicative trend crosses zero within the horizon".to_string(),
        ));
    }
    Ok((fit, selection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesPoint;
    use chrono::{Datelike, Days, Months, Weekday};

    fn monthly(values: &[f64]) -> CleanedSeries {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        CleanedSeries::from_points(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| SeriesPoint {
                    date: start.checked_add_months(Months::new(i as u32)).unwrap(),
                    value: *v,
                })
                .collect(),
        )
    }

    #[test]
    fn linear_series_is_extrapolated() {
        let values: Vec<f64> = (0..24).map(|i| 500.0 + 10.0 * i as f64).collect();
        let series = monthly(&values);
        let out = TrendSeasonalModel::new()
            .fit_predict(&series, Cadence::Monthly, 3, &[])
            .unwrap();

        assert_eq!(out.points.len(), 27);
        assert_eq!(out.cutover, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(out.mode, SeasonalityMode::Additive);
        for (k, p) in out.points[24..].iter().enumerate() {
            let expected = 500.0 + 10.0 * (24 + k) as f64;
            assert!((p.yhat - expected).abs() / expected < 0.02, "{} vs {expected}", p.yhat);
        }
    }

    #[test]
    fn intervals_contain_point_estimates() {
        let values: Vec<f64> = (0..30)
            .map(|i| 80.0 + 2.0 * i as f64 + if i % 12 == 11 { 25.0 } else { 0.0 } + (i % 5) as f64)
            .collect();
        let out = TrendSeasonalModel::new()
            .fit_predict(&monthly(&values), Cadence::Monthly, 6, &[])
            .unwrap();
        for p in &out.points {
            assert!(p.yhat_lower <= p.yhat && p.yhat <= p.yhat_upper, "{p:?}");
        }
    }

    #[test]
    fn future_dates_follow_cadence() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let weekly = CleanedSeries::from_points(
            (0..20)
                .map(|i| SeriesPoint {
                    date: start.checked_add_days(Days::new(7 * i)).unwrap(),
                    value: 50.0 + (i % 4) as f64 * 3.0 + i as f64,
                })
                .collect(),
        );
        let out = TrendSeasonalModel::new()
            .fit_predict(&weekly, Cadence::Weekly, 4, &[])
            .unwrap();
        let future: Vec<_> = out.points.iter().filter(|p| p.date >= out.cutover).collect();
        assert_eq!(future.len(), 4);
        assert!(future.iter().all(|p| p.date.weekday() == Weekday::Mon));
        assert!(future.windows(2).all(|w| (w[1].date - w[0].date).num_days() == 7));

        let daily = CleanedSeries::from_points(
            (0..40)
                .map(|i| SeriesPoint {
                    date: start.checked_add_days(Days::new(i)).unwrap(),
                    value: 20.0 + (i % 7) as f64 + 0.1 * i as f64,
                })
                .collect(),
        );
        let out = TrendSeasonalModel::new()
            .fit_predict(&daily, Cadence::Daily, 5, &[])
            .unwrap();
        assert_eq!(out.cutover, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        assert_eq!(out.points.len(), 45);
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let values: Vec<f64> = (0..24).map(|i| 100.0 + ((i * 7) % 11) as f64 * 4.0).collect();
        let series = monthly(&values);
        let a = TrendSeasonalModel::new().fit_predict(&series, Cadence::Monthly, 6, &[]).unwrap();
        let b = TrendSeasonalModel::new().fit_predict(&series, Cadence::Monthly, 6, &[]).unwrap();
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn zero_variance_and_bad_horizon_are_rejected() {
        let flat = monthly(&[42.0; 12]);
        let err = TrendSeasonalModel::new().fit_predict(&flat, Cadence::Monthly, 3, &[]).unwrap_err();
        assert!(matches!(err, AppError::ModelTraining(_)));

        let values: Vec<f64> = (0..12).map(|i| i as f64 + 1.0).collect();
        let series = monthly(&values);
        for horizon in [0, 366] {
            let err = TrendSeasonalModel::new()
                .fit_predict(&series, Cadence::Monthly, horizon, &[])
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidHorizon(_)));
        }

        let err = TrendSeasonalModel::new()
            .fit_predict(&CleanedSeries::default(), Cadence::Monthly, 3, &[])
            .unwrap_err();
        assert!(matches!(err, AppError::ModelTraining(_)));
    }

    #[test]
    fn non_positive_multiplicative_trend_falls_back_to_additive() {
        // Steep decline: high CV selects multiplicative, but the trend crosses zero.
        let declining: Vec<f64> = (0..24).map(|i| 2000.0 - 85.0 * i as f64).collect();
        for horizon in [3, 12] {
            let out = TrendSeasonalModel::new()
                .fit_predict(&monthly(&declining), Cadence::Monthly, horizon, &[])
                .unwrap();
            assert_eq!(out.mode, SeasonalityMode::Additive);
            assert_eq!(out.points.len(), 24 + horizon);
        }

        // Launch from zero.
        let launch: Vec<f64> = (0..24).map(|i| if i < 6 { 0.0 } else { 100.0 * (i - 5) as f64 }).collect();
        let out = TrendSeasonalModel::new()
            .fit_predict(&monthly(&launch), Cadence::Monthly, 6, &[])
            .unwrap();
        assert_eq!(out.points.len(), 30);
        assert!(out.points.iter().all(|p| p.yhat.is_finite()));
    }

    #[test]
    fn holidays_in_window_are_used() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let promo = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let series = CleanedSeries::from_points(
            (0..90)
                .map(|i| {
                    let date = start.checked_add_days(Days::new(i)).unwrap();
                    SeriesPoint {
                        date,
                        value: if date == promo { 400.0 } else { 100.0 + (i % 7) as f64 },
                    }
                })
                .collect(),
        );
        let holidays = [HolidayEvent {
            date: promo,
            name: "Promo".into(),
        }];
        let out = TrendSeasonalModel::new()
            .fit_predict(&series, Cadence::Daily, 7, &holidays)
            .unwrap();
        let fitted = out.points.iter().find(|p| p.date == promo).unwrap();
        assert!(fitted.yhat > 300.0);
    }
}
