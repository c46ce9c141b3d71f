//! Timestamp repair for series with isolated corrupt or out-of-order stamps.
//!
//! The repairer walks the series as a small state machine:
//!
//! | state     | gap in bounds | gap out of bounds              |
//! |-----------|---------------|--------------------------------|
//! | Normal    | Normal        | synthesize, go Anomalous       |
//! | Anomalous | Normal        | fatal                          |
//!
//! A gap is in bounds when `0 <= gap < 10 * interval`. A synthesized stamp is
//! `previous + interval`.

use tracing::warn;
use wp_common::sample::{duration_from_secs, seconds_between};
use wp_common::{Sample, TIME_LABEL_FORMAT};

/// Gaps at or above this many intervals are anomalous.
pub const ANOMALY_FACTOR: f64 = 10.0;

/// When the very first stamp is bad, the next gap must be within this many intervals.
pub const LEADING_REPAIR_FACTOR: f64 = 3.0;

/// Errors from timestamp repair.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RepairError {
    /// Two anomalies in a row, or a bad first stamp with nothing to anchor on.
    #[error("consecutive anomalous gaps at sample {index} ({timestamp})")]
    FatalTimestampCorruption { index: usize, timestamp: String },
    /// Repair needs a positive interval.
    #[error("invalid sampling interval {0}")]
    InvalidInterval(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Anomalous,
}

fn is_anomalous(gap: f64, interval: f64) -> bool {
    gap < 0.0 || gap >= ANOMALY_FACTOR * interval
}

fn corruption(series: &[Sample], index: usize) -> RepairError {
    RepairError::FatalTimestampCorruption {
        index,
        timestamp: series[index].timestamp.format(TIME_LABEL_FORMAT).to_string(),
    }
}

/// Repair `series` in place against the estimated `interval` (seconds).
pub fn repair(mut series: Vec<Sample>, interval: f64) -> Result<Vec<Sample>, RepairError> {
    if !(interval > 0.0 && interval.is_finite()) {
        return Err(RepairError::InvalidInterval(interval));
    }
    if series.len() < 2 {
        return Ok(series);
    }
    let step = duration_from_secs(interval);

    // A bad first stamp has no predecessor; anchor it on the following pair.
    let first_gap = seconds_between(series[0].timestamp, series[1].timestamp);
    if is_anomalous(first_gap, interval) {
        let next_gap = series
            .get(2)
            .map(|s| seconds_between(series[1].timestamp, s.timestamp));
        match next_gap {
            Some(g) if (0.0..=LEADING_REPAIR_FACTOR * interval).contains(&g) => {
                warn!(
                    original = %series[0].timestamp,
                    "repairing leading timestamp from its successor"
                );
                series[0].timestamp = series[1].timestamp - step;
            }
            _ => return Err(corruption(&series, 0)),
        }
    }

    let mut state = State::Normal;
    for i in 1..series.len() {
        let gap = seconds_between(series[i - 1].timestamp, series[i].timestamp);
        if !is_anomalous(gap, interval) {
            state = State::Normal;
            continue;
        }
        if state == State::Anomalous {
            return Err(corruption(&series, i));
        }
        let repaired = series[i - 1].timestamp + step;
        warn!(
            index = i,
            original = %series[i].timestamp,
            repaired = %repaired,
            gap_secs = gap,
            "repairing anomalous timestamp"
        );
        series[i].timestamp = repaired;
        state = State::Anomalous;
    }
    Ok(series)
}
