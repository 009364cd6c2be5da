//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - passed between pipeline stages without conversion
//! - returned to callers as the forecast/adjustment wire format
//! - exported to CSV by the CLI

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Resampling granularity of the series and of the forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cadence {
    #[serde(rename = "D")]
    Daily,
    #[serde(rename = "W")]
    Weekly,
    #[serde(rename = "M")]
    Monthly,
}

impl Cadence {
    pub const ALL: [Cadence; 3] = [Cadence::Daily, Cadence::Weekly, Cadence::Monthly];

    /// Single-letter wire code (`D`, `W`, `M`).
    pub fn code(self) -> &'static str {
        match self {
            Cadence::Daily => "D",
            Cadence::Weekly => "W",
            Cadence::Monthly => "M",
        }
    }

    /// Plural unit used in prompts and reports.
    pub fn units(self) -> &'static str {
        match self {
            Cadence::Daily => "days",
            Cadence::Weekly => "weeks",
            Cadence::Monthly => "months",
        }
    }

    /// Number of periods that make up one year at this cadence.
    pub fn periods_per_year(self) -> usize {
        match self {
            Cadence::Daily => 365,
            Cadence::Weekly => 52,
            Cadence::Monthly => 12,
        }
    }

    /// Approximate period length in days.
    pub fn period_days(self) -> f64 {
        match self {
            Cadence::Daily => 1.0,
            Cadence::Weekly => 7.0,
            Cadence::Monthly => 365.25 / 12.0,
        }
    }

    /// Label of the bucket containing `date`.
    ///
    /// Weekly buckets start on Monday; monthly buckets on the first of the month.
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Cadence::Daily => date,
            Cadence::Weekly => {
                let back = u64::from(date.weekday().num_days_from_monday());
                date.checked_sub_days(Days::new(back)).unwrap_or(date)
            }
            Cadence::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    /// Start of the bucket following the one that starts at `bucket`.
    pub fn step(self, bucket: NaiveDate) -> Option<NaiveDate> {
        match self {
            Cadence::Daily => bucket.checked_add_days(Days::new(1)),
            Cadence::Weekly => bucket.checked_add_days(Days::new(7)),
            Cadence::Monthly => self.bucket_start(bucket).checked_add_months(Months::new(1)),
        }
    }

    /// The `horizon` bucket starts that follow `last`.
    pub fn future_dates(self, last: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>, AppError> {
        let mut out = Vec::with_capacity(horizon);
        let mut current = self.bucket_start(last);
        for _ in 0..horizon {
            current = self
                .step(current)
                .ok_or_else(|| AppError::InvalidInput(format!("Forecast date overflow after {current}")))?;
            out.push(current);
        }
        Ok(out)
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Cadence {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "D" | "d" => Ok(Cadence::Daily),
            "W" | "w" => Ok(Cadence::Weekly),
            "M" | "m" => Ok(Cadence::Monthly),
            other => Err(AppError::InvalidCadence(other.to_string())),
        }
    }
}

/// How seasonal/holiday effects combine with the trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalityMode {
    Additive,
    Multiplicative,
}

/// One observation of the cleaned series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Date-ordered `(date, value)` series owned by a single pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedSeries {
    points: Vec<SeriesPoint>,
}

impl CleanedSeries {
    /// Build a series, sorting by date (stable, so equal dates keep input order).
    pub fn from_points(mut points: Vec<SeriesPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.value).sum()
    }
}

/// Anonymized recent-performance features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecentSummary {
    pub last4_growth_pct: f64,
    pub yoy_last_period_pct: f64,
    pub volatility_index: f64,
}

impl RecentSummary {
    /// Used when the features cannot be derived at all.
    pub fn unknown() -> Self {
        Self {
            last4_growth_pct: 0.0,
            yoy_last_period_pct: 0.0,
            volatility_index: 0.5,
        }
    }
}

/// A dated holiday inside a queried window.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HolidayEvent {
    pub date: NaiveDate,
    pub name: String,
}

/// Model output for one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// Everything the baseline model produced for one series.
#[derive(Debug, Clone)]
pub struct ModelForecast {
    /// Historical (fitted) periods followed by future periods, ascending by date.
    pub points: Vec<ForecastPoint>,
    /// First future date; every point with `date >= cutover` is a prediction.
    pub cutover: NaiveDate,
    pub mode: SeasonalityMode,
}

/// The bounded macro adjustment, always present in a forecast result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAdjustment {
    pub applied: bool,
    pub adjustment_pct: f64,
    pub rationale: String,
    pub sources: Vec<String>,
}

impl AiAdjustment {
    pub fn not_requested() -> Self {
        Self {
            applied: false,
            adjustment_pct: 0.0,
            rationale: "Macro adjustment not requested".to_string(),
            sources: Vec::new(),
        }
    }

    /// Multiplier applied to baseline point estimates.
    pub fn factor(&self) -> f64 {
        if self.applied {
            1.0 + self.adjustment_pct / 100.0
        } else {
            1.0
        }
    }
}

/// A raw uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Parameters of the forecast operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub industry: String,
    pub country: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub freq: Cadence,
    pub horizon: usize,
    pub date_col: String,
    pub target_col: String,
    #[serde(default = "default_true")]
    pub apply_holidays: bool,
    #[serde(default = "default_true")]
    pub apply_ai_adjustment: bool,
}

fn default_true() -> bool {
    true
}

/// Parameters of the adjustment operation (anonymized; no raw values).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    pub industry: String,
    pub country: String,
    pub state: Option<String>,
    pub city: Option<String>,
    pub freq: Cadence,
    pub horizon: usize,
    pub recent_summary: RecentSummary,
    pub holidays_window: Vec<String>,
}

impl AdjustmentRequest {
    /// Human-readable location: `city, state, country` with blanks skipped.
    pub fn location(&self) -> String {
        [self.city.as_deref(), self.state.as_deref(), Some(self.country.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Observed value plus the model's in-sample fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub ds: NaiveDate,
    pub y: f64,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseForecastPoint {
    pub ds: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalForecastPoint {
    pub ds: NaiveDate,
    pub yhat_final: f64,
}

/// Run metadata reported alongside the forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastMeta {
    pub freq: Cadence,
    pub train_start: NaiveDate,
    pub train_end: NaiveDate,
    pub cutover_date: NaiveDate,
    pub horizon: usize,
    pub seasonality_mode: SeasonalityMode,
    pub holidays_used: Vec<String>,
    pub original_rows: usize,
    pub processed_rows: usize,
    pub null_dates: usize,
    pub null_targets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub meta: ForecastMeta,
    pub ai_adjustment: AiAdjustment,
    pub history: Vec<HistoryPoint>,
    pub forecast_base: Vec<BaseForecastPoint>,
    pub forecast_final: Vec<FinalForecastPoint>,
}
