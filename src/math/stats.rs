//! Small descriptive statistics helpers.

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n-1 denominator); `None` for fewer than 2 values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let n = values.len() as f64;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Coefficient of variation (`std / mean`), or 0 when the mean is not positive.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    match (mean(values), sample_std(values)) {
        (Some(m), Some(s)) if m > 0.0 && s.is_finite() => s / m,
        _ => 0.0,
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Linear-interpolated quantile of an already sorted slice (`q` in [0,1]).
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_matches_sample_definition() {
        let s = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((s - 2.138_089_935).abs() < 1e-9);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn cv_is_zero_for_non_positive_mean() {
        assert_eq!(coefficient_of_variation(&[-1.0, 1.0]), 0.0);
        assert!(coefficient_of_variation(&[1.0, 3.0]) > 0.0);
    }

    #[test]
    fn rounding_and_quantiles() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(-2.5, 0), -3.0);
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile_sorted(&v, 0.5), Some(3.0));
        assert!((quantile_sorted(&v, 0.1).unwrap() - 1.4).abs() < 1e-12);
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }
}
