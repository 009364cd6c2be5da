//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds the collaborators (holiday calendar, adjustment client, model)
//! - runs the requested operation
//! - prints results and writes optional exports

use std::path::Path;

use chrono::{Days, Local, NaiveDate};
use clap::Parser;
use tracing::warn;

use crate::cli::{AdjustArgs, Cli, Command, ForecastArgs, HolidayArgs, OutputFormat};
use crate::config::Settings;
use crate::data::{HolidayCalendar, SonarClient};
use crate::domain::{AdjustmentRequest, ForecastRequest, RecentSummary, Upload};
use crate::error::AppError;
use crate::io::check_upload;
use crate::models::TrendSeasonalModel;

pub mod pipeline;

pub use pipeline::{ForecastPipeline, adjust_operation};

/// Entry point for the `salesforecast` binary.
pub async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Forecast(args) => handle_forecast(args).await,
        Command::Adjust(args) => handle_adjust(args).await,
        Command::Holidays(args) => handle_holidays(args),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn handle_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let settings = Settings::from_env()?;
    let calendar = HolidayCalendar::new()?;
    let adjuster = SonarClient::new(&settings)?;
    let model = TrendSeasonalModel::new();
    let pipeline = ForecastPipeline::new(&calendar, &adjuster, &model, today());

    let upload = read_upload(&args.file)?;
    let request = forecast_request_from_args(&args);
    let result = pipeline.run(&upload, &request).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print!("{}", crate::report::format_forecast(&result)),
    }

    if let Some(path) = &args.export_csv {
        crate::io::write_forecast_csv(path, &result)?;
    }
    Ok(())
}

async fn handle_adjust(args: AdjustArgs) -> Result<(), AppError> {
    if !(args.volatility.is_finite() && (0.0..=1.0).contains(&args.volatility)) {
        return Err(AppError::InvalidInput(format!(
            "Volatility must be between 0 and 1 (got {})",
            args.volatility
        )));
    }
    if !(args.last4_growth.is_finite() && args.yoy.is_finite()) {
        return Err(AppError::InvalidInput("Growth figures must be finite".to_string()));
    }

    let settings = Settings::from_env()?;
    let adjuster = SonarClient::new(&settings)?;
    let ctx = args.context;
    let request = AdjustmentRequest {
        industry: ctx.industry,
        country: ctx.country,
        state: ctx.state,
        city: ctx.city,
        freq: ctx.freq,
        horizon: ctx.horizon,
        recent_summary: RecentSummary {
            last4_growth_pct: args.last4_growth,
            yoy_last_period_pct: args.yoy,
            volatility_index: args.volatility,
        },
        holidays_window: args.holidays,
    };

    let adjustment = adjust_operation(&request, &adjuster).await?;
    println!("{}", serde_json::to_string_pretty(&adjustment)?);
    Ok(())
}

fn handle_holidays(args: HolidayArgs) -> Result<(), AppError> {
    let calendar = HolidayCalendar::new()?;
    let from = args.from.unwrap_or_else(today);
    let to = match args.to {
        Some(to) => to,
        None => from
            .checked_add_days(Days::new(365))
            .ok_or_else(|| AppError::InvalidInput(format!("Date out of range: {from}")))?,
    };
    if to < from {
        return Err(AppError::InvalidInput(format!("--to ({to}) is before --from ({from})")));
    }
    if calendar.resolve(&args.country, args.state.as_deref()).is_none() {
        warn!(country = %args.country, "no holiday calendar; supported: {}", supported_codes(&calendar));
    }

    let events = calendar.holidays_between(&args.country, args.state.as_deref(), from, to);
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&events)?),
        OutputFormat::Text => print!("{}", crate::report::format_holidays(&args.country, &events)),
    }
    Ok(())
}

fn supported_codes(calendar: &HolidayCalendar) -> String {
    calendar
        .supported_countries()
        .into_iter()
        .map(|(code, _)| code)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Size and extension are checked from metadata before the file is read.
fn read_upload(path: &Path) -> Result<Upload, AppError> {
    let read_err = |e: std::io::Error| AppError::FileRead(format!("'{}': {e}", path.display()));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let len = std::fs::metadata(path).map_err(read_err)?.len();
    check_upload(&file_name, usize::try_from(len).unwrap_or(usize::MAX))?;

    let bytes = std::fs::read(path).map_err(read_err)?;
    Ok(Upload { file_name, bytes })
}

pub fn forecast_request_from_args(args: &ForecastArgs) -> ForecastRequest {
    let ctx = &args.context;
    ForecastRequest {
        industry: ctx.industry.clone(),
        country: ctx.country.clone(),
        state: ctx.state.clone(),
        city: ctx.city.clone(),
        freq: ctx.freq,
        horizon: ctx.horizon,
        date_col: args.date_col.clone(),
        target_col: args.target_col.clone(),
        apply_holidays: !args.no_holidays,
        apply_ai_adjustment: !args.no_ai_adjustment,
    }
}
