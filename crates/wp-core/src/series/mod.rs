//! Series conditioning: interval estimation, timestamp repair, resampling.

pub mod interval;
pub mod repair;
pub mod resample;

pub use interval::{estimate_interval, IntervalEstimate};
pub use repair::{repair, RepairError};
pub use resample::{has_enough_data, resample, Resampled};

use tracing::{debug, warn};
use wp_common::Sample;

/// A conditioned series plus the interval it was conditioned with.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub resampled: Resampled,
    pub interval: IntervalEstimate,
}

/// Estimate, repair, and resample one raw series.
///
/// Series that cannot fill a window, or whose interval cannot be estimated,
/// come back unaggregated; only unrepairable timestamps are an error.
pub fn process(series: Vec<Sample>, window_secs: u32) -> Result<Processed, RepairError> {
    let interval = estimate_interval(&series, window_secs);
    debug!(?interval, samples = series.len(), "estimated sampling interval");

    let Some(secs) = interval.seconds() else {
        warn!(
            ?interval,
            samples = series.len(),
            "insufficient series data: no usable sampling interval, emitting raw samples"
        );
        return Ok(Processed {
            resampled: Resampled::Unaggregated(series),
            interval,
        });
    };

    let repaired = repair(series, secs)?;
    let resampled = resample(repaired, secs, window_secs);
    if let Resampled::Unaggregated(raw) = &resampled {
        warn!(
            samples = raw.len(),
            window_secs,
            "insufficient series data: fewer than 3 samples or span shorter than the window, emitting raw samples"
        );
    }
    Ok(Processed {
        resampled,
        interval,
    })
}
