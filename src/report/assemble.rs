//! Combine the baseline forecast and the macro adjustment into a result.

use tracing::debug;

use crate::domain::{
    AiAdjustment, BaseForecastPoint, Cadence, CleanedSeries, FinalForecastPoint, ForecastMeta, ForecastPoint,
    ForecastResult, HistoryPoint, ModelForecast,
};
use crate::error::AppError;
use crate::io::ingest::ValidatedSeries;
use crate::math::round_to;

/// Decimal places of every reported value.
pub const REPORT_DECIMALS: i32 = 2;

/// Row accounting and request shape needed for [`ForecastMeta`].
#[derive(Debug, Clone)]
pub struct AssemblyContext<'a> {
    pub cadence: Cadence,
    pub horizon: usize,
    pub holidays_used: Vec<String>,
    pub validated: &'a ValidatedSeries,
}

fn r(v: f64) -> f64 {
    round_to(v, REPORT_DECIMALS)
}

/// Split model output at its cutover and apply the adjustment factor to
/// future point estimates. Interval bounds are left untouched.
pub fn assemble(
    aggregated: &CleanedSeries,
    forecast: &ModelForecast,
    adjustment: AiAdjustment,
    ctx: AssemblyContext<'_>,
) -> Result<ForecastResult, AppError> {
    let cutover = forecast.cutover;
    let (past, future): (Vec<ForecastPoint>, Vec<ForecastPoint>) =
        forecast.points.iter().copied().partition(|p| p.date < cutover);

    if past.len() != aggregated.len() {
        return Err(AppError::ModelTraining(format!(
            "history length mismatch: model returned {} fitted periods for {} observed",
            past.len(),
            aggregated.len()
        )));
    }
    if future.len() != ctx.horizon {
        return Err(AppError::ModelTraining(format!(
            "forecast length mismatch: expected {} periods, got {}",
            ctx.horizon,
            future.len()
        )));
    }

    let mut history = Vec::with_capacity(past.len());
    for (fitted, observed) in past.iter().zip(aggregated.points()) {
        if fitted.date != observed.date {
            return Err(AppError::ModelTraining(format!(
                "fitted date {} does not match observed date {}",
                fitted.date, observed.date
            )));
        }
        history.push(HistoryPoint {
            ds: observed.date,
            y: r(observed.value),
            yhat: r(fitted.yhat),
            yhat_lower: r(fitted.yhat_lower),
            yhat_upper: r(fitted.yhat_upper),
        });
    }

    let factor = adjustment.factor();
    let forecast_base: Vec<BaseForecastPoint> = future
        .iter()
        .map(|p| BaseForecastPoint {
            ds: p.date,
            yhat: r(p.yhat),
            yhat_lower: r(p.yhat_lower),
            yhat_upper: r(p.yhat_upper),
        })
        .collect();
    let forecast_final: Vec<FinalForecastPoint> = future
        .iter()
        .map(|p| FinalForecastPoint {
            ds: p.date,
            yhat_final: r(p.yhat * factor),
        })
        .collect();

    let (train_start, train_end) = aggregated
        .first_date()
        .zip(aggregated.last_date())
        .ok_or_else(|| AppError::ModelTraining("aggregated series is empty".to_string()))?;

    debug!(
        history = history.len(),
        horizon = forecast_final.len(),
        factor,
        "assembled forecast result"
    );

    Ok(ForecastResult {
        meta: ForecastMeta {
            freq: ctx.cadence,
            train_start,
            train_end,
            cutover_date: cutover,
            horizon: ctx.horizon,
            seasonality_mode: forecast.mode,
            holidays_used: ctx.holidays_used,
            original_rows: ctx.validated.original_rows,
            processed_rows: aggregated.len(),
            null_dates: ctx.validated.null_dates,
            null_targets: ctx.validated.null_targets,
        },
        ai_adjustment: adjustment,
        history,
        forecast_base,
        forecast_final,
    })
}
