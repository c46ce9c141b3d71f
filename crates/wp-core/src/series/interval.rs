//! Sampling interval estimation.
//!
//! Monitors are configured with a nominal collection interval, but missed
//! collections and tool restarts leave gaps. The estimate is the mean of the
//! plausible gaps among the first samples of a series.

use wp_common::sample::seconds_between;
use wp_common::Sample;

/// Only the head of a series is inspected.
pub const MAX_SAMPLES_INSPECTED: usize = 200;

/// Consecutive rejected gaps before the window is abandoned as a bound.
pub const MISS_LIMIT: usize = 10;

/// Fallback upper bound, in seconds, once the window is abandoned.
pub const FALLBACK_CEILING_SECS: f64 = 3600.0;

/// Outcome of estimating a series' sampling interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntervalEstimate {
    /// Mean of the accepted gaps, in seconds.
    Interval(f64),
    /// Fewer than two samples; there is no gap to measure.
    NoData,
    /// Gaps exist but none is plausible.
    NoUsableDelta,
}

impl IntervalEstimate {
    pub fn seconds(self) -> Option<f64> {
        match self {
            IntervalEstimate::Interval(s) => Some(s),
            _ => None,
        }
    }
}

/// Estimate the sampling interval of `series` against a `window_secs` bound.
///
/// A gap is accepted when `0 < gap < bound`. The bound starts at the
/// window and widens to [`FALLBACK_CEILING_SECS`] after [`MISS_LIMIT`]
/// consecutive rejections.
pub fn estimate_interval(series: &[Sample], window_secs: u32) -> IntervalEstimate {
    let head = &series[..series.len().min(MAX_SAMPLES_INSPECTED)];
    if head.len() < 2 {
        return IntervalEstimate::NoData;
    }

    let mut bound = f64::from(window_secs);
    let mut misses = 0usize;
    let mut total = 0.0;
    let mut accepted = 0usize;

    for pair in head.windows(2) {
        let gap = seconds_between(pair[0].timestamp, pair[1].timestamp);
        if gap > 0.0 && gap < bound {
            total += gap;
            accepted += 1;
            misses = 0;
        } else {
            misses += 1;
            if misses >= MISS_LIMIT {
                bound = FALLBACK_CEILING_SECS;
            }
        }
    }

    if accepted == 0 {
        IntervalEstimate::NoUsableDelta
    } else {
        IntervalEstimate::Interval(total / accepted as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn series_with_gaps(gaps: &[i64]) -> Vec<Sample> {
        let mut t = base();
        let mut out = vec![Sample::new(t, 1.0)];
        for g in gaps {
            t += Duration::seconds(*g);
            out.push(Sample::new(t, 1.0));
        }
        out
    }

    #[test]
    fn empty_and_single_sample_have_no_data() {
        assert_eq!(estimate_interval(&[], 100), IntervalEstimate::NoData);
        assert_eq!(
            estimate_interval(&series_with_gaps(&[]), 100),
            IntervalEstimate::NoData
        );
    }

    #[test]
    fn regular_series_yields_its_spacing() {
        let s = series_with_gaps(&[30; 20]);
        assert_eq!(estimate_interval(&s, 100), IntervalEstimate::Interval(30.0));
    }

    #[test]
    fn implausible_gaps_are_ignored() {
        let s = series_with_gaps(&[30, 30, 500, -20, 0, 30]);
        assert_eq!(estimate_interval(&s, 100), IntervalEstimate::Interval(30.0));
    }

    #[test]
    fn window_is_abandoned_after_ten_misses() {
        // Collection every 200s never fits a 100s window; after ten misses the
        // bound widens and the remaining gaps are accepted.
        let s = series_with_gaps(&[200; 15]);
        assert_eq!(estimate_interval(&s, 100), IntervalEstimate::Interval(200.0));
    }

    #[test]
    fn no_plausible_gap_is_distinct_from_no_data() {
        let s = series_with_gaps(&[500, 500, 500]);
        assert_eq!(estimate_interval(&s, 100), IntervalEstimate::NoUsableDelta);
    }

    #[test]
    fn only_the_head_is_inspected() {
        let mut gaps = vec![10; MAX_SAMPLES_INSPECTED - 1];
        gaps.extend([50; 100]);
        let s = series_with_gaps(&gaps);
        assert_eq!(estimate_interval(&s, 100), IntervalEstimate::Interval(10.0));
    }

    #[test]
    fn estimation_is_repeatable() {
        let s = series_with_gaps(&[29, 31, 30, 600, 30]);
        assert_eq!(estimate_interval(&s, 100), estimate_interval(&s, 100));
    }
}
