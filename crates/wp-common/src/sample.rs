//! Time-series sample types shared by the parsing and resampling stages.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Timestamp format used for every rendered time label.
pub const TIME_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One parsed `(timestamp, value)` record from a monitor log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// One aggregated value covering a fixed window that ends at `window_end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowedSample {
    pub window_end: NaiveDateTime,
    pub value: f64,
}

/// Signed gap between two timestamps in fractional seconds.
pub fn seconds_between(earlier: NaiveDateTime, later: NaiveDateTime) -> f64 {
    let delta = later - earlier;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1000.0,
    }
}

/// Converts fractional seconds into a chrono duration at microsecond precision.
pub fn duration_from_secs(secs: f64) -> Duration {
    Duration::microseconds((secs * 1_000_000.0).round() as i64)
}
