//! Command-line parsing for the sales forecaster.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline; dispatch lives in `app`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::Cadence;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "salesforecast",
    version,
    about = "Sales forecasting with holiday effects and a bounded macro adjustment"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Forecast a sales series from a CSV or spreadsheet file.
    Forecast(ForecastArgs),
    /// Request a macro adjustment from summary features only.
    Adjust(AdjustArgs),
    /// List holidays for a country (and optional subdivision).
    Holidays(HolidayArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

/// Location and industry shared by `forecast` and `adjust`.
#[derive(Debug, Clone, clap::Args)]
pub struct ContextArgs {
    /// Industry or sector, e.g. "Retail".
    #[arg(long)]
    pub industry: String,

    /// Country name, code or alias (e.g. "US", "India", "uk").
    #[arg(long)]
    pub country: String,

    /// State / province / region.
    #[arg(long)]
    pub state: Option<String>,

    #[arg(long)]
    pub city: Option<String>,

    /// Forecast cadence: D, W or M.
    #[arg(long, default_value = "M")]
    pub freq: Cadence,

    /// Number of periods to forecast (1-365).
    #[arg(long)]
    pub horizon: usize,
}

#[derive(Debug, Clone, Parser)]
pub struct ForecastArgs {
    /// Input file (.csv, .xlsx, .xls).
    #[arg(long, value_name = "PATH")]
    pub file: PathBuf,

    #[command(flatten)]
    pub context: ContextArgs,

    /// Name of the date column.
    #[arg(long)]
    pub date_col: String,

    /// Name of the sales/target column.
    #[arg(long)]
    pub target_col: String,

    /// Skip holiday regressors.
    #[arg(long)]
    pub no_holidays: bool,

    /// Skip the macro adjustment.
    #[arg(long)]
    pub no_ai_adjustment: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Also write history and forecast rows to CSV.
    #[arg(long, value_name = "PATH")]
    pub export_csv: Option<PathBuf>,
}

#[derive(Debug, Clone, Parser)]
pub struct AdjustArgs {
    #[command(flatten)]
    pub context: ContextArgs,

    /// Growth of the last 4 periods vs the prior 4, in percent.
    #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
    pub last4_growth: f64,

    /// Year-over-year change of the latest period, in percent.
    #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
    pub yoy: f64,

    /// Volatility index in [0, 1].
    #[arg(long, default_value_t = 0.5)]
    pub volatility: f64,

    /// Upcoming holiday name (repeatable).
    #[arg(long = "holiday", value_name = "NAME")]
    pub holidays: Vec<String>,
}

#[derive(Debug, Clone, Parser)]
pub struct HolidayArgs {
    #[arg(long)]
    pub country: String,

    #[arg(long)]
    pub state: Option<String>,

    /// First date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last date (YYYY-MM-DD); defaults to one year after `--from`.
    #[arg(long)]
    pub to: Option<NaiveDate>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_flags_parse() {
        let cli = Cli::parse_from([
            "salesforecast",
            "forecast",
            "--file",
            "sales.csv",
            "--industry",
            "Retail",
            "--country",
            "US",
            "--freq",
            "W",
            "--horizon",
            "8",
            "--date-col",
            "Date",
            "--target-col",
            "Sales",
            "--no-holidays",
        ]);
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.context.freq, Cadence::Weekly);
        assert_eq!(args.context.horizon, 8);
        assert!(args.no_holidays);
        assert!(!args.no_ai_adjustment);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn adjust_accepts_negative_growth_and_repeated_holidays() {
        let cli = Cli::parse_from([
            "salesforecast",
            "adjust",
            "--industry",
            "Retail",
            "--country",
            "India",
            "--horizon",
            "3",
            "--last4-growth",
            "-3.5",
            "--holiday",
            "Diwali",
            "--holiday",
            "Christmas",
        ]);
        let Command::Adjust(args) = cli.command else {
            panic!("expected adjust");
        };
        assert_eq!(args.last4_growth, -3.5);
        assert_eq!(args.context.freq, Cadence::Monthly);
        assert_eq!(args.holidays, vec!["Diwali", "Christmas"]);
    }

    #[test]
    fn invalid_cadence_is_rejected() {
        let res = Cli::try_parse_from([
            "salesforecast",
            "adjust",
            "--industry",
            "Retail",
            "--country",
            "US",
            "--horizon",
            "3",
            "--freq",
            "Q",
        ]);
        assert!(res.is_err());
    }
}
