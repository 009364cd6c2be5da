//! Per-series model configuration.

use tracing::debug;

use crate::domain::{Cadence, CleanedSeries, SeasonalityMode};
use crate::math::coefficient_of_variation;

/// Coefficient of variation above which seasonality is modelled multiplicatively.
pub const MULTIPLICATIVE_CV_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub yearly: bool,
    pub weekly: bool,
    pub daily: bool,
    pub mode: SeasonalityMode,
    /// Central coverage of the reported interval.
    pub interval_width: f64,
    /// Monte-Carlo draws used for the interval.
    pub uncertainty_samples: usize,
    /// Upper bound on trend changepoints.
    pub max_changepoints: usize,
    /// Share of history in which changepoints may be placed.
    pub changepoint_range: f64,
}

impl ModelSettings {
    /// Settings derived from the series' cadence and dispersion.
    pub fn for_series(series: &CleanedSeries, cadence: Cadence) -> Self {
        let cv = coefficient_of_variation(&series.values());
        let mode = if cv > MULTIPLICATIVE_CV_THRESHOLD {
            SeasonalityMode::Multiplicative
        } else {
            SeasonalityMode::Additive
        };
        debug!(cv, ?mode, %cadence, "model settings");

        Self {
            yearly: true,
            weekly: matches!(cadence, Cadence::Daily | Cadence::Weekly),
            daily: cadence == Cadence::Daily,
            mode,
            interval_width: 0.8,
            uncertainty_samples: 100,
            max_changepoints: 25,
            changepoint_range: 0.8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesPoint;
    use chrono::{Days, NaiveDate};

    fn series(values: &[f64]) -> CleanedSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        CleanedSeries::from_points(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| SeriesPoint {
                    date: start.checked_add_days(Days::new(i as u64)).unwrap(),
                    value: *v,
                })
                .collect(),
        )
    }

    #[test]
    fn seasonality_flags_follow_cadence() {
        let s = series(&[10.0, 11.0, 12.0]);
        let d = ModelSettings::for_series(&s, Cadence::Daily);
        assert!(d.yearly && d.weekly && d.daily);
        let w = ModelSettings::for_series(&s, Cadence::Weekly);
        assert!(w.yearly && w.weekly && !w.daily);
        let m = ModelSettings::for_series(&s, Cadence::Monthly);
        assert!(m.yearly && !m.weekly && !m.daily);
    }

    #[test]
    fn mode_depends_on_dispersion() {
        let calm = series(&[10.0, 11.0, 9.0, 10.0]);
        assert_eq!(ModelSettings::for_series(&calm, Cadence::Daily).mode, SeasonalityMode::Additive);

        let spiky = series(&[1.0, 20.0, 1.0, 30.0]);
        assert_eq!(
            ModelSettings::for_series(&spiky, Cadence::Daily).mode,
            SeasonalityMode::Multiplicative
        );

        // Non-positive mean counts as zero dispersion.
        let negative = series(&[-5.0, 5.0, -20.0]);
        assert_eq!(ModelSettings::for_series(&negative, Cadence::Daily).mode, SeasonalityMode::Additive);
    }
}
