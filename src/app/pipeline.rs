//! The forecast and adjustment operations, shared by the CLI and library
//! callers.
//!
//! Keeping the workflow in one place avoids duplicating it across front-ends:
//! upload -> table -> cleaned series -> resampled series -> holidays -> model
//! -> macro adjustment -> result
//!
//! Collaborators (holiday calendar, adjuster, model) are injected so tests can
//! substitute them and nothing is shared between requests.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::data::{HolidayCalendar, MacroAdjuster};
use crate::domain::{
    AdjustmentRequest, AiAdjustment, Cadence, CleanedSeries, ForecastRequest, ForecastResult, HolidayEvent, Upload,
};
use crate::error::AppError;
use crate::io::{check_upload, read_table, validate_series};
use crate::models::{ForecastModel, MAX_HORIZON};
use crate::report::{AssemblyContext, assemble};
use crate::series::{aggregate_checked, summarize};

/// Number of upcoming holiday names sent with an adjustment request.
pub const TOP_HOLIDAYS: usize = 5;

/// Borrowed collaborators for one or more runs.
#[derive(Clone, Copy)]
pub struct ForecastPipeline<'a> {
    calendar: &'a HolidayCalendar,
    adjuster: &'a dyn MacroAdjuster,
    model: &'a dyn ForecastModel,
    today: NaiveDate,
}

impl<'a> ForecastPipeline<'a> {
    pub fn new(
        calendar: &'a HolidayCalendar,
        adjuster: &'a dyn MacroAdjuster,
        model: &'a dyn ForecastModel,
        today: NaiveDate,
    ) -> Self {
        Self {
            calendar,
            adjuster,
            model,
            today,
        }
    }

    /// Run the forecast operation end to end.
    pub async fn run(&self, upload: &Upload, request: &ForecastRequest) -> Result<ForecastResult, AppError> {
        validate_request(request)?;
        check_upload(&upload.file_name, upload.bytes.len())?;

        info!(
            file = %upload.file_name,
            freq = %request.freq,
            horizon = request.horizon,
            "forecast started"
        );

        let table = read_table(&upload.bytes, &upload.file_name)?;
        let validated = validate_series(&table, &request.date_col, &request.target_col)?;
        let aggregated = aggregate_checked(&validated.series, request.freq)?;

        let holidays = if request.apply_holidays {
            self.model_holidays(&aggregated, request)?
        } else {
            Vec::new()
        };
        let holidays_used: Vec<String> = holidays
            .iter()
            .map(|e| e.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let forecast = self
            .model
            .fit_predict(&aggregated, request.freq, request.horizon, &holidays)?;

        let adjustment = if request.apply_ai_adjustment {
            let adjustment_request = self.adjustment_request(&aggregated, request);
            self.adjuster.adjust(&adjustment_request).await.into_adjustment()
        } else {
            AiAdjustment::not_requested()
        };

        let result = assemble(
            &aggregated,
            &forecast,
            adjustment,
            AssemblyContext {
                cadence: request.freq,
                horizon: request.horizon,
                holidays_used,
                validated: &validated,
            },
        )?;

        info!(
            processed_rows = result.meta.processed_rows,
            adjustment_pct = result.ai_adjustment.adjustment_pct,
            applied = result.ai_adjustment.applied,
            "forecast finished"
        );
        Ok(result)
    }

    /// Holidays from the start of training to the end of the last forecast
    /// period.
    fn model_holidays(&self, series: &CleanedSeries, request: &ForecastRequest) -> Result<Vec<HolidayEvent>, AppError> {
        let (Some(first), Some(last)) = (series.first_date(), series.last_date()) else {
            return Ok(Vec::new());
        };
        let future = request.freq.future_dates(last, request.horizon)?;
        let last_period = future.last().copied().unwrap_or(last);
        let end = request
            .freq
            .step(last_period)
            .and_then(|next| next.pred_opt())
            .unwrap_or(last_period);

        let events = self
            .calendar
            .holidays_between(&request.country, request.state.as_deref(), first, end);
        debug!(count = events.len(), start = %first, end = %end, "holidays in model window");
        Ok(events)
    }

    fn adjustment_request(&self, series: &CleanedSeries, request: &ForecastRequest) -> AdjustmentRequest {
        let weeks = lookahead_weeks(request.freq, request.horizon);
        let mut upcoming = self
            .calendar
            .upcoming_holidays(&request.country, request.state.as_deref(), weeks, self.today);
        upcoming.truncate(TOP_HOLIDAYS);

        AdjustmentRequest {
            industry: request.industry.trim().to_string(),
            country: request.country.trim().to_string(),
            state: request.state.clone(),
            city: request.city.clone(),
            freq: request.freq,
            horizon: request.horizon,
            recent_summary: summarize(series, request.freq),
            holidays_window: upcoming,
        }
    }
}

/// Weeks of upcoming holidays covering `horizon` periods.
pub fn lookahead_weeks(cadence: Cadence, horizon: usize) -> u32 {
    let weeks = match cadence {
        Cadence::Daily => horizon.div_ceil(7),
        Cadence::Weekly => horizon,
        Cadence::Monthly => (horizon * 30).div_ceil(7),
    };
    u32::try_from(weeks).unwrap_or(u32::MAX)
}

fn validate_horizon(horizon: usize) -> Result<(), AppError> {
    if horizon == 0 || horizon > MAX_HORIZON {
        return Err(AppError::InvalidHorizon(horizon as i64));
    }
    Ok(())
}

fn validate_request(request: &ForecastRequest) -> Result<(), AppError> {
    if request.industry.trim().is_empty() {
        return Err(AppError::InvalidInput("Industry is required".to_string()));
    }
    if request.country.trim().is_empty() {
        return Err(AppError::InvalidInput("Country is required".to_string()));
    }
    validate_horizon(request.horizon)
}

/// The standalone adjustment operation.
pub async fn adjust_operation(
    request: &AdjustmentRequest,
    adjuster: &dyn MacroAdjuster,
) -> Result<AiAdjustment, AppError> {
    validate_horizon(request.horizon)?;
    Ok(adjuster.adjust(request).await.into_adjustment())
}
