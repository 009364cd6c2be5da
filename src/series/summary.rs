//! Recent-performance features derived from the aggregated series.
//!
//! These three numbers are the only description of the data that ever leaves
//! the process (they feed the macro-adjustment prompt), so they are rounded to
//! a fixed precision and always finite.

use tracing::debug;

use crate::domain::{Cadence, CleanedSeries, RecentSummary};
use crate::math::{mean, round_to, sample_std};

/// Volatility reported when it cannot be computed ("moderate, unknown").
pub const UNKNOWN_VOLATILITY: f64 = 0.5;

pub fn summarize(series: &CleanedSeries, cadence: Cadence) -> RecentSummary {
    let values = series.values();

    let summary = RecentSummary {
        last4_growth_pct: round_to(finite_or_zero(last4_growth_pct(&values)), 2),
        yoy_last_period_pct: round_to(finite_or_zero(yoy_pct(&values, cadence.periods_per_year())), 2),
        volatility_index: round_to(volatility_index(&values), 3),
    };
    debug!(?summary, "recent summary");
    summary
}

/// Mean of the last 4 periods vs the 4 before them, in percent.
fn last4_growth_pct(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 8 {
        return 0.0;
    }
    let (Some(last), Some(prev)) = (mean(&values[n - 4..]), mean(&values[n - 8..n - 4])) else {
        return 0.0;
    };
    if prev <= 0.0 {
        return 0.0;
    }
    (last - prev) / prev * 100.0
}

/// Latest period vs the period one year earlier, in percent.
fn yoy_pct(values: &[f64], periods_back: usize) -> f64 {
    let n = values.len();
    if n <= periods_back {
        return 0.0;
    }
    let current = values[n - 1];
    let base = values[n - 1 - periods_back];
    if base <= 0.0 {
        return 0.0;
    }
    (current - base) / base * 100.0
}

/// Coefficient of variation of the last 12 values, clamped to [0, 1].
fn volatility_index(values: &[f64]) -> f64 {
    let recent = &values[values.len().saturating_sub(12)..];
    let (Some(m), Some(s)) = (mean(recent), sample_std(recent)) else {
        return UNKNOWN_VOLATILITY;
    };
    if m <= 0.0 {
        return UNKNOWN_VOLATILITY;
    }
    let cv = s / m;
    if !cv.is_finite() {
        return UNKNOWN_VOLATILITY;
    }
    cv.clamp(0.0, 1.0)
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesPoint;
    use chrono::{Months, NaiveDate};

    fn monthly(values: &[f64]) -> CleanedSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
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
    fn growth_compares_last_two_blocks_of_four() {
        let s = monthly(&[100.0, 100.0, 100.0, 100.0, 110.0, 110.0, 110.0, 110.0]);
        let summary = summarize(&s, Cadence::Monthly);
        assert_eq!(summary.last4_growth_pct, 10.0);
        // Not enough history for a year-over-year comparison.
        assert_eq!(summary.yoy_last_period_pct, 0.0);
    }

    #[test]
    fn growth_is_zero_with_short_history_or_non_positive_base() {
        assert_eq!(last4_growth_pct(&[1.0; 7]), 0.0);
        assert_eq!(last4_growth_pct(&[0.0, 0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn yoy_uses_cadence_period_count() {
        let mut values = vec![50.0; 13];
        values[0] = 40.0;
        values[12] = 60.0;
        let summary = summarize(&monthly(&values), Cadence::Monthly);
        assert_eq!(summary.yoy_last_period_pct, 50.0);
    }

    #[test]
    fn volatility_is_clamped_and_falls_back() {
        assert_eq!(volatility_index(&[5.0; 12]), 0.0);
        assert_eq!(volatility_index(&[0.0, 0.0, 0.0]), UNKNOWN_VOLATILITY);
        assert_eq!(volatility_index(&[7.0]), UNKNOWN_VOLATILITY);
        assert_eq!(volatility_index(&[1.0, 100.0, 1.0, 100.0]), 1.0);
    }

    #[test]
    fn features_are_always_finite_and_bounded() {
        let cases: Vec<Vec<f64>> = vec![
            vec![0.0; 20],
            vec![-5.0, 3.0, -2.0, 9.0, 0.0, 1.0, 1e300, -1e300, 4.0, 2.0, 1.0, 0.5, 3.0],
            (0..400).map(|i| (i as f64).sin() * 10.0 + 11.0).collect(),
            vec![1e-12; 14],
        ];
        for values in cases {
            for cadence in Cadence::ALL {
                let s = summarize(&monthly(&values), cadence);
                assert!(s.last4_growth_pct.is_finite());
                assert!(s.yoy_last_period_pct.is_finite());
                assert!((0.0..=1.0).contains(&s.volatility_index));
            }
        }
    }

    #[test]
    fn values_are_rounded() {
        let s = monthly(&[3.0, 3.0, 3.0, 3.0, 3.1, 3.2, 3.3, 3.7]);
        let summary = summarize(&s, Cadence::Monthly);
        assert_eq!(summary.last4_growth_pct, 10.83);
    }
}
