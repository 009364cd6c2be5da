//! Low-level fitting routine for one changepoint prior scale.
//!
//! Given:
//! - observation dates and values
//! - the enabled seasonal terms and holiday columns
//! - a changepoint prior scale `τ`
//!
//! we build the design matrix, solve the ridge-regularised least squares
//! problem and return the fitted components. Additive models are solved in one
//! pass; multiplicative models first fit the trend, then fit seasonality and
//! holidays on the relative deviation `y / trend - 1`.

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};

use crate::domain::{Cadence, SeasonalityMode};
use crate::error::AppError;
use crate::math::solve_ridge;
use crate::models::{
    FourierTerm, HolidayColumns, ModelSettings, TimeScale, changepoint_locations, fill_fourier, fill_trend,
    seasonal_terms, trend_value, trend_width,
};

/// Nominal residual variance of the scaled target, used to turn prior scales
/// into ridge penalties (`λ = σ² / scale²`).
const NOMINAL_NOISE_VAR: f64 = 0.01;

/// Prior scale for seasonality coefficients.
pub const SEASONALITY_PRIOR_SCALE: f64 = 10.0;
/// Prior scale for holiday coefficients.
pub const HOLIDAYS_PRIOR_SCALE: f64 = 10.0;

/// Everything needed to fit one series.
#[derive(Debug, Clone, Copy)]
pub struct FitInput<'a> {
    pub dates: &'a [NaiveDate],
    pub values: &'a [f64],
    pub cadence: Cadence,
    pub settings: &'a ModelSettings,
    pub holidays: &'a HolidayColumns,
}

impl FitInput<'_> {
    /// The first `n` observations, same configuration.
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.dates.len());
        Self {
            dates: &self.dates[..n],
            values: &self.values[..n],
            ..*self
        }
    }
}

/// A fitted decomposition that can be evaluated at any date.
#[derive(Debug, Clone)]
pub struct FittedComponents {
    mode: SeasonalityMode,
    cadence: Cadence,
    scale: TimeScale,
    y_scale: f64,
    changepoints: Vec<f64>,
    terms: Vec<FourierTerm>,
    holidays: HolidayColumns,
    trend_beta: Vec<f64>,
    /// Seasonal coefficients followed by holiday coefficients.
    effect_beta: Vec<f64>,
    prior_scale: f64,
}

impl FittedComponents {
    pub fn mode(&self) -> SeasonalityMode {
        self.mode
    }

    pub fn prior_scale(&self) -> f64 {
        self.prior_scale
    }

    pub fn time_scale(&self) -> TimeScale {
        self.scale
    }

    /// Target scaling factor (max |y| of the fitted history).
    pub fn y_scale(&self) -> f64 {
        self.y_scale
    }

    /// Changepoint locations in scaled time.
    pub fn changepoints(&self) -> &[f64] {
        &self.changepoints
    }

    /// Slope changes at each changepoint, in scaled-target units per unit time.
    pub fn changepoint_deltas(&self) -> &[f64] {
        &self.trend_beta[2..]
    }

    /// Trend in original units.
    pub fn trend(&self, date: NaiveDate) -> f64 {
        trend_value(self.scale.scaled(date), &self.changepoints, &self.trend_beta) * self.y_scale
    }

    /// Seasonal + holiday effect: original units (additive) or a fraction of
    /// the trend (multiplicative).
    pub fn effect(&self, date: NaiveDate) -> f64 {
        if self.effect_beta.is_empty() {
            return 0.0;
        }
        let mut row = vec![0.0; self.effect_beta.len()];
        fill_effects(date, self.cadence, &self.terms, &self.holidays, &mut row);
        let dot: f64 = row.iter().zip(&self.effect_beta).map(|(x, b)| x * b).sum();
        match self.mode {
            SeasonalityMode::Additive => dot * self.y_scale,
            SeasonalityMode::Multiplicative => dot,
        }
    }

    /// Combine a trend value with the effect at `date`.
    pub fn combine(&self, trend: f64, date: NaiveDate) -> f64 {
        match self.mode {
            SeasonalityMode::Additive => trend + self.effect(date),
            SeasonalityMode::Multiplicative => trend * (1.0 + self.effect(date)),
        }
    }

    /// Point prediction.
    pub fn predict(&self, date: NaiveDate) -> f64 {
        self.combine(self.trend(date), date)
    }
}

fn fill_effects(date: NaiveDate, cadence: Cadence, terms: &[FourierTerm], holidays: &HolidayColumns, out: &mut [f64]) {
    let seasonal_width: usize = terms.iter().map(FourierTerm::width).sum();
    fill_fourier(date, terms, &mut out[..seasonal_width]);
    holidays.fill(cadence.bucket_start(date), &mut out[seasonal_width..]);
}

fn effect_penalties(terms: &[FourierTerm], holidays: &HolidayColumns) -> Vec<f64> {
    let seasonal_width: usize = terms.iter().map(FourierTerm::width).sum();
    let seasonal = NOMINAL_NOISE_VAR / SEASONALITY_PRIOR_SCALE.powi(2);
    let holiday = NOMINAL_NOISE_VAR / HOLIDAYS_PRIOR_SCALE.powi(2);
    std::iter::repeat_n(seasonal, seasonal_width)
        .chain(std::iter::repeat_n(holiday, holidays.len()))
        .collect()
}

/// Fit the decomposition with changepoint prior scale `prior_scale`.
pub fn fit_components(input: &FitInput<'_>, mode: SeasonalityMode, prior_scale: f64) -> Result<FittedComponents, AppError> {
    let n = input.dates.len();
    if n == 0 || n != input.values.len() {
        return Err(AppError::ModelTraining("no observations to fit".to_string()));
    }
    if !(prior_scale.is_finite() && prior_scale > 0.0) {
        return Err(AppError::ModelTraining(format!("invalid changepoint prior scale {prior_scale}")));
    }
    let (first, last) = (input.dates[0], input.dates[n - 1]);
    let scale = TimeScale::new(first, last)
        .ok_or_else(|| AppError::ModelTraining("history must span more than one day".to_string()))?;

    let y_scale = input.values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if !(y_scale.is_finite() && y_scale > 0.0) {
        return Err(AppError::ModelTraining("target is all zeros or non-finite".to_string()));
    }
    let y: Vec<f64> = input.values.iter().map(|v| v / y_scale).collect();
    let t: Vec<f64> = input.dates.iter().map(|d| scale.scaled(*d)).collect();

    let changepoints = changepoint_locations(&t, input.settings.max_changepoints, input.settings.changepoint_range);
    let terms = seasonal_terms(input.settings, input.cadence);
    let holidays = input.holidays.clone();

    let p_trend = trend_width(&changepoints);
    let p_effect: usize = terms.iter().map(FourierTerm::width).sum::<usize>() + holidays.len();

    let cp_penalty = NOMINAL_NOISE_VAR / prior_scale.powi(2);
    let mut trend_penalties = vec![0.0, 0.0];
    trend_penalties.extend(std::iter::repeat_n(cp_penalty, changepoints.len()));

    let mut trend_row = vec![0.0; p_trend];
    let mut effect_row = vec![0.0; p_effect];

    let (trend_beta, effect_beta) = match mode {
        SeasonalityMode::Additive => {
            let p = p_trend + p_effect;
            let mut x = DMatrix::<f64>::zeros(n, p);
            for i in 0..n {
                fill_trend(t[i], &changepoints, &mut trend_row);
                fill_effects(input.dates[i], input.cadence, &terms, &holidays, &mut effect_row);
                for (j, v) in trend_row.iter().chain(&effect_row).enumerate() {
                    x[(i, j)] = *v;
                }
            }
            let mut penalties = trend_penalties;
            penalties.extend(effect_penalties(&terms, &holidays));

            let beta = solve_ridge(&x, &DVector::from_vec(y), &penalties)
                .ok_or_else(|| AppError::ModelTraining("least squares solve failed".to_string()))?;
            let beta: Vec<f64> = beta.iter().copied().collect();
            (beta[..p_trend].to_vec(), beta[p_trend..].to_vec())
        }
        SeasonalityMode::Multiplicative => {
            // Stage 1: trend alone.
            let mut xt = DMatrix::<f64>::zeros(n, p_trend);
            for i in 0..n {
                fill_trend(t[i], &changepoints, &mut trend_row);
                for (j, v) in trend_row.iter().enumerate() {
                    xt[(i, j)] = *v;
                }
            }
            let trend_beta: Vec<f64> = solve_ridge(&xt, &DVector::from_vec(y.clone()), &trend_penalties)
                .ok_or_else(|| AppError::ModelTraining("trend solve failed".to_string()))?
                .iter()
                .copied()
                .collect();

            let fitted_trend: Vec<f64> = t.iter().map(|ti| trend_value(*ti, &changepoints, &trend_beta)).collect();
            if fitted_trend.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
                return Err(AppError::ModelTraining(
                    "multiplicative trend is not positive over the history".to_string(),
                ));
            }

            // Stage 2: relative deviation from the trend.
            let effect_beta = if p_effect == 0 {
                Vec::new()
            } else {
                let mut xe = DMatrix::<f64>::zeros(n, p_effect);
                let mut z = DVector::<f64>::zeros(n);
                for i in 0..n {
                    fill_effects(input.dates[i], input.cadence, &terms, &holidays, &mut effect_row);
                    for (j, v) in effect_row.iter().enumerate() {
                        xe[(i, j)] = *v;
                    }
                    z[i] = y[i] / fitted_trend[i] - 1.0;
                }
                solve_ridge(&xe, &z, &effect_penalties(&terms, &holidays))
                    .ok_or_else(|| AppError::ModelTraining("seasonality solve failed".to_string()))?
                    .iter()
                    .copied()
                    .collect()
            };
            (trend_beta, effect_beta)
        }
    };

    Ok(FittedComponents {
        mode,
        cadence: input.cadence,
        scale,
        y_scale,
        changepoints,
        terms,
        holidays,
        trend_beta,
        effect_beta,
        prior_scale,
    })
}
