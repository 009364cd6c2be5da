//! Design-matrix features for the trend + seasonality + holiday regression.
//!
//! The fitter relies on three primitive row builders:
//! - trend: intercept, scaled time, and hinge terms at each changepoint
//! - seasonality: Fourier pairs for each enabled period
//! - holidays: one indicator per holiday name
//!
//! They are kept as small, pure functions so fitting and simulation code can
//! evaluate the same basis for history and future dates.

use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;

use chrono::NaiveDate;

use crate::domain::{Cadence, HolidayEvent};
use crate::models::ModelSettings;

pub const YEARLY_PERIOD_DAYS: f64 = 365.25;
pub const WEEKLY_PERIOD_DAYS: f64 = 7.0;
pub const DAILY_PERIOD_DAYS: f64 = 1.0;

pub const YEARLY_ORDER: usize = 10;
pub const WEEKLY_ORDER: usize = 3;
pub const DAILY_ORDER: usize = 4;

/// One Fourier seasonality component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FourierTerm {
    pub period_days: f64,
    pub order: usize,
}

impl FourierTerm {
    pub fn width(&self) -> usize {
        2 * self.order
    }
}

/// Highest Fourier order strictly below the Nyquist limit of the cadence.
///
/// Terms at or above the limit are aliased (constant or duplicated) when the
/// series is sampled once per period.
pub fn max_fourier_order(period_days: f64, cadence: Cadence) -> usize {
    let limit = period_days / (2.0 * cadence.period_days());
    (limit - 1e-9).floor().max(0.0) as usize
}

/// Enabled seasonal components, with orders capped for the cadence.
pub fn seasonal_terms(settings: &ModelSettings, cadence: Cadence) -> Vec<FourierTerm> {
    [
        (settings.yearly, YEARLY_PERIOD_DAYS, YEARLY_ORDER),
        (settings.weekly, WEEKLY_PERIOD_DAYS, WEEKLY_ORDER),
        (settings.daily, DAILY_PERIOD_DAYS, DAILY_ORDER),
    ]
    .into_iter()
    .filter(|(enabled, _, _)| *enabled)
    .map(|(_, period_days, order)| FourierTerm {
        period_days,
        order: order.min(max_fourier_order(period_days, cadence)),
    })
    .filter(|term| term.order > 0)
    .collect()
}

fn epoch_days(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
    (date - epoch).num_days() as f64
}

/// Fill `[sin(2πkd/P), cos(2πkd/P)]` pairs for every term, in order.
///
/// `out` must have length `Σ term.width()`.
pub fn fill_fourier(date: NaiveDate, terms: &[FourierTerm], out: &mut [f64]) {
    let d = epoch_days(date);
    let mut j = 0;
    for term in terms {
        for k in 1..=term.order {
            let x = 2.0 * PI * k as f64 * d / term.period_days;
            out[j] = x.sin();
            out[j + 1] = x.cos();
            j += 2;
        }
    }
}

/// Maps dates onto model time: 0 at the first observation, 1 at the last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    start: NaiveDate,
    span_days: f64,
}

impl TimeScale {
    /// `None` when the history covers a single day.
    pub fn new(first: NaiveDate, last: NaiveDate) -> Option<Self> {
        let span_days = (last - first).num_days() as f64;
        (span_days > 0.0).then_some(Self { start: first, span_days })
    }

    pub fn scaled(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.span_days
    }
}

/// Changepoint locations (in scaled time) spread evenly over the first
/// `range` share of the history.
///
/// `t` must be ascending. Fewer points than `max_changepoints + 1` inside the
/// range reduces the count accordingly.
pub fn changepoint_locations(t: &[f64], max_changepoints: usize, range: f64) -> Vec<f64> {
    let hist = ((t.len() as f64) * range).floor() as usize;
    if hist < 2 {
        return Vec::new();
    }
    let count = max_changepoints.min(hist - 1);
    if count == 0 {
        return Vec::new();
    }
    // Evenly spaced indices over [0, hist - 1]; the first index is the origin
    // and is not a changepoint.
    let step = (hist - 1) as f64 / count as f64;
    let mut out: Vec<f64> = (1..=count)
        .map(|i| t[((i as f64) * step).round() as usize])
        .collect();
    out.dedup();
    out
}

/// Width of a trend row for `changepoints` hinges.
pub fn trend_width(changepoints: &[f64]) -> usize {
    2 + changepoints.len()
}

/// Fill a trend row: `[1, t, (t - c_1)+, ..., (t - c_k)+]`.
pub fn fill_trend(t: f64, changepoints: &[f64], out: &mut [f64]) {
    out[0] = 1.0;
    out[1] = t;
    for (j, c) in changepoints.iter().enumerate() {
        out[2 + j] = (t - c).max(0.0);
    }
}

/// Piecewise-linear trend value for a coefficient vector laid out like
/// [`fill_trend`].
pub fn trend_value(t: f64, changepoints: &[f64], beta: &[f64]) -> f64 {
    let mut y = beta[0] + beta[1] * t;
    for (j, c) in changepoints.iter().enumerate() {
        y += beta[2 + j] * (t - c).max(0.0);
    }
    y
}

/// Holiday indicator columns, one per distinct holiday name.
///
/// A column fires for a period when any occurrence of that holiday falls in
/// the period's bucket at the series' cadence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolidayColumns {
    names: Vec<String>,
    buckets: Vec<BTreeSet<NaiveDate>>,
}

impl HolidayColumns {
    pub fn new(holidays: &[HolidayEvent], cadence: Cadence) -> Self {
        let mut by_name: BTreeMap<&str, BTreeSet<NaiveDate>> = BTreeMap::new();
        for event in holidays {
            by_name
                .entry(event.name.as_str())
                .or_default()
                .insert(cadence.bucket_start(event.date));
        }
        let (names, buckets): (Vec<String>, Vec<BTreeSet<NaiveDate>>) = by_name
            .into_iter()
            .map(|(name, dates)| (name.to_string(), dates))
            .unzip();
        Self { names, buckets }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Fill indicators for the period starting at `bucket`.
    pub fn fill(&self, bucket: NaiveDate, out: &mut [f64]) {
        for (j, dates) in self.buckets.iter().enumerate() {
            out[j] = if dates.contains(&bucket) { 1.0 } else { 0.0 };
        }
    }
}
