//! Baseline forecasting model.
//!
//! The pipeline depends only on [`ForecastModel`]; the shipped implementation
//! is [`TrendSeasonalModel`], a linear-basis regression built from the pure
//! feature functions in [`features`].

pub mod features;
pub mod settings;
pub mod trend_seasonal;

pub use features::*;
pub use settings::*;
pub use trend_seasonal::*;

use crate::domain::{Cadence, CleanedSeries, HolidayEvent, ModelForecast};
use crate::error::AppError;

/// Decomposable trend + seasonality + holiday forecaster.
pub trait ForecastModel: Send + Sync {
    /// Fit on `series` and predict every historical period plus `horizon`
    /// future periods.
    fn fit_predict(
        &self,
        series: &CleanedSeries,
        cadence: Cadence,
        horizon: usize,
        holidays: &[HolidayEvent],
    ) -> Result<ModelForecast, AppError>;
}
