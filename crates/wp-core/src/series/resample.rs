//! Sliding-window resampling with carry-over of partial intervals.
//!
//! Each raw sample is treated as the average over the gap since the previous
//! sample. Its contribution to a window is `value * gap / window`; when a gap
//! straddles a window boundary the part past the boundary seeds the next
//! window. Windows are exactly `window` seconds wide and the trailing partial
//! window is dropped.

use chrono::{Duration, NaiveDateTime, Timelike};
use wp_common::sample::{duration_from_secs, seconds_between};
use wp_common::{Sample, WindowedSample};
use wp_math::round1;

/// Minimum number of samples for resampling.
pub const MIN_SAMPLES: usize = 3;

/// Result of resampling one series.
#[derive(Debug, Clone, PartialEq)]
pub enum Resampled {
    Windowed(Vec<WindowedSample>),
    /// Too little data for one window; the repaired series is passed through.
    Unaggregated(Vec<Sample>),
}

impl Resampled {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Resampled::Unaggregated(_))
    }

    pub fn values(&self) -> Vec<f64> {
        match self {
            Resampled::Windowed(w) => w.iter().map(|s| s.value).collect(),
            Resampled::Unaggregated(s) => s.iter().map(|s| s.value).collect(),
        }
    }
}

/// Whether `series` can fill at least one window of `window_secs`.
pub fn has_enough_data(series: &[Sample], window_secs: u32) -> bool {
    match (series.first(), series.last()) {
        (Some(first), Some(last)) if series.len() >= MIN_SAMPLES => {
            seconds_between(first.timestamp, last.timestamp) >= f64::from(window_secs)
        }
        _ => false,
    }
}

fn truncate_to_second(t: NaiveDateTime) -> NaiveDateTime {
    t.with_nanosecond(0).unwrap_or(t)
}

/// Resample a repaired series sampled every `interval` seconds.
pub fn resample(series: Vec<Sample>, interval: f64, window_secs: u32) -> Resampled {
    if !has_enough_data(&series, window_secs) || window_secs == 0 {
        return Resampled::Unaggregated(series);
    }
    let window = f64::from(window_secs);
    let width = Duration::seconds(i64::from(window_secs));

    // The first sample covers the interval before it.
    let mut window_start =
        truncate_to_second(series[1].timestamp - duration_from_secs(2.0 * interval));
    let mut prev = window_start;
    let mut running = 0.0;
    let mut out = Vec::new();

    for sample in &series {
        let dt = seconds_between(prev, sample.timestamp);
        let weighted = sample.value * dt / window;
        running += weighted;
        prev = sample.timestamp;

        let mut elapsed = seconds_between(window_start, sample.timestamp);
        while elapsed >= window {
            let overshoot = elapsed - window;
            let remainder = if dt > 0.0 {
                weighted * overshoot / dt
            } else {
                0.0
            };
            window_start += width;
            out.push(WindowedSample {
                window_end: window_start,
                value: round1(running - remainder),
            });
            running = remainder;
            elapsed = overshoot;
        }
    }
    Resampled::Windowed(out)
}
