//! Descriptive statistics over a slice of observations.
//!
//! The standard deviation is the population form (divide by `n`), matching
//! what the per-stage diagnostics have always reported.

use serde::{Deserialize, Serialize};

use super::rounding::round_to;

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of the values; the mean of the two middle values for even lengths.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Largest value, ignoring NaN.
pub fn max(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
}

/// Summary of one stage's values, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub max: f64,
}

impl Summary {
    /// Summarize `values`; `None` when there is nothing to summarize.
    pub fn of(values: &[f64]) -> Option<Self> {
        Some(Self {
            count: values.len(),
            mean: round_to(mean(values)?, 2),
            median: round_to(median(values)?, 2),
            std_dev: round_to(std_dev(values)?, 2),
            max: round_to(max(values)?, 2),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_input_has_no_summary() {
        assert!(Summary::of(&[]).is_none());
        assert!(median(&[]).is_none());
    }

    #[test]
    fn summary_of_small_series() {
        let s = Summary::of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(s.count, 8);
        assert_eq!(s.mean, 5.0);
        assert_eq!(s.median, 4.5);
        assert_eq!(s.std_dev, 2.0);
        assert_eq!(s.max, 9.0);
    }

    #[test]
    fn median_of_odd_length_is_middle() {
        assert_eq!(median(&[9.0, 1.0, 5.0]), Some(5.0));
    }

    #[test]
    fn max_skips_nan() {
        assert_eq!(max(&[f64::NAN, 1.0, 3.0]), Some(3.0));
    }

    proptest! {
        #[test]
        fn mean_lies_between_extremes(values in prop::collection::vec(-1e6f64..1e6, 1..50)) {
            let m = mean(&values).unwrap();
            let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = max(&values).unwrap();
            prop_assert!(m >= lo - 1e-6 && m <= hi + 1e-6);
        }

        #[test]
        fn std_dev_is_non_negative(values in prop::collection::vec(-1e3f64..1e3, 1..50)) {
            prop_assert!(std_dev(&values).unwrap() >= 0.0);
        }
    }
}
