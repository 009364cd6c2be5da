//! Resampling a cleaned series to daily/weekly/monthly buckets.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::{Cadence, CleanedSeries, SeriesPoint};
use crate::error::AppError;
use crate::io::ingest::MIN_PERIODS;

/// Sum values into cadence buckets labeled by bucket start date.
///
/// Only observed dates produce buckets; gaps stay gaps.
pub fn aggregate(series: &CleanedSeries, cadence: Cadence) -> CleanedSeries {
    let mut buckets: BTreeMap<chrono::NaiveDate, f64> = BTreeMap::new();
    for p in series.points() {
        *buckets.entry(cadence.bucket_start(p.date)).or_insert(0.0) += p.value;
    }

    debug!(cadence = %cadence, input = series.len(), buckets = buckets.len(), "aggregated series");

    CleanedSeries::from_points(
        buckets
            .into_iter()
            .map(|(date, value)| SeriesPoint { date, value })
            .collect(),
    )
}

/// Aggregate and enforce the minimum period count on the result.
pub fn aggregate_checked(series: &CleanedSeries, cadence: Cadence) -> Result<CleanedSeries, AppError> {
    let out = aggregate(series, cadence);
    if out.len() < MIN_PERIODS {
        return Err(AppError::InsufficientData {
            required: MIN_PERIODS,
            actual: out.len(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Days, NaiveDate};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn daily(start: NaiveDate, n: u64) -> CleanedSeries {
        CleanedSeries::from_points(
            (0..n)
                .map(|i| SeriesPoint {
                    date: start.checked_add_days(Days::new(i)).unwrap(),
                    value: (i % 7) as f64 + 0.5,
                })
                .collect(),
        )
    }

    #[test]
    fn sums_are_preserved_for_every_cadence() {
        let series = daily(d(2023, 1, 3), 400);
        for cadence in Cadence::ALL {
            let out = aggregate(&series, cadence);
            assert!((out.total() - series.total()).abs() < 1e-9, "{cadence}");
        }
    }

    #[test]
    fn daily_groups_duplicate_dates() {
        let series = CleanedSeries::from_points(vec![
            SeriesPoint { date: d(2024, 1, 2), value: 1.0 },
            SeriesPoint { date: d(2024, 1, 1), value: 2.0 },
            SeriesPoint { date: d(2024, 1, 2), value: 3.0 },
        ]);
        let out = aggregate(&series, Cadence::Daily);
        assert_eq!(out.len(), 2);
        assert_eq!(out.points()[0], SeriesPoint { date: d(2024, 1, 1), value: 2.0 });
        assert_eq!(out.points()[1], SeriesPoint { date: d(2024, 1, 2), value: 4.0 });
    }

    #[test]
    fn weekly_buckets_are_labeled_by_monday() {
        let out = aggregate(&daily(d(2024, 1, 1), 28), Cadence::Weekly);
        assert_eq!(out.len(), 4);
        for p in out.points() {
            assert_eq!(p.date.weekday(), chrono::Weekday::Mon);
        }
    }

    #[test]
    fn monthly_buckets_skip_unobserved_months() {
        let series = CleanedSeries::from_points(vec![
            SeriesPoint { date: d(2024, 1, 15), value: 1.0 },
            SeriesPoint { date: d(2024, 3, 2), value: 2.0 },
            SeriesPoint { date: d(2024, 3, 30), value: 3.0 },
        ]);
        let out = aggregate(&series, Cadence::Monthly);
        assert_eq!(out.dates(), vec![d(2024, 1, 1), d(2024, 3, 1)]);
        assert_eq!(out.values(), vec![1.0, 5.0]);
    }

    #[test]
    fn aggregation_is_deterministic() {
        let series = daily(d(2022, 6, 1), 200);
        assert_eq!(aggregate(&series, Cadence::Weekly), aggregate(&series, Cadence::Weekly));
    }

    #[test]
    fn too_few_buckets_after_aggregation_fail() {
        let series = daily(d(2024, 1, 1), 60);
        let err = aggregate_checked(&series, Cadence::Monthly).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData { actual: 2, .. }));
        assert!(aggregate_checked(&series, Cadence::Daily).is_ok());
    }
}
