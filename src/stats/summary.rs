//! Sample statistics over slices of present (non-missing) values.
//!
//! All functions return NaN for inputs too small to define the statistic,
//! the same convention pandas uses for a column of missing values.

use std::cmp::Ordering;

use statrs::statistics::{Data, OrderStatistics, Statistics};

pub fn mean(values: &[f64]) -> f64 {
    Statistics::mean(values)
}

/// Sample standard deviation (n − 1 denominator).
pub fn sample_std_dev(values: &[f64]) -> f64 {
    Statistics::std_dev(values)
}

pub fn min(values: &[f64]) -> f64 {
    Statistics::min(values)
}

pub fn max(values: &[f64]) -> f64 {
    Statistics::max(values)
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    Data::new(values.to_vec()).median()
}

/// Percentile with linear interpolation between nearest ranks, as pandas
/// `quantile` does. `OrderStatistics::quantile` uses a different estimator.
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let sorted = sorted(values);
    percentile_of_sorted(&sorted, pct)
}

pub(crate) fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

pub(crate) fn percentile_of_sorted(sorted: &[f64], pct: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = pct / 100.0 * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = (lower + 1).min(n - 1);
            let fraction = rank - lower as f64;
            sorted[lower] + fraction * (sorted[upper] - sorted[lower])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_moments() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&v) - 5.0).abs() < 1e-12);
        assert!((sample_std_dev(&v) - 2.138_089_935).abs() < 1e-6);
        assert_eq!(min(&v), 2.0);
        assert_eq!(max(&v), 9.0);
    }

    #[test]
    fn median_interpolates_even_lengths() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    }

    #[test]
    fn quartiles() {
        let v: Vec<f64> = (1..=9).map(f64::from).collect();
        assert_eq!(percentile(&v, 25.0), 3.0);
        assert_eq!(percentile(&v, 75.0), 7.0);
    }

    #[test]
    fn degenerate_inputs_are_nan() {
        assert!(mean(&[]).is_nan());
        assert!(median(&[]).is_nan());
        assert!(sample_std_dev(&[1.0]).is_nan());
        assert!(max(&[]).is_nan());
        assert!(min(&[]).is_nan());
        assert!(sample_std_dev(&[]).is_nan());
    }
}
