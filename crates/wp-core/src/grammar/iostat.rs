//! `iostat -x -t` grammar: summed per-device await time.
//!
//! Each report starts with a full `mm/dd/yyyy hh:mm:ss AM` stamp, followed
//! by a block of device lines. The await column of every device in a block is
//! summed into one value per report.

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

use super::clock::{date_from_mdy, to_24_hour};
use super::{GrammarError, MetricGrammar};

static STAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+).(\d+).(\d+)\s(\d+):(\d+):(\d+)\s(\w+)").expect("iostat stamp regex")
});

// Device name, eight decimal columns, then the integer part of await.
static DEVICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\S+\s+(?:\d+\.\d+\s+){8}(\d+)").expect("iostat device regex")
});

/// Readings above this are counter garbage and replaced by the previous device's value.
const AWAIT_CEILING: u64 = 1_000_000_000;

#[derive(Debug, Default, Clone, Copy)]
pub struct IostatGrammar;

impl MetricGrammar for IostatGrammar {
    fn parse_timestamps(&self, lines: &[String]) -> Result<Vec<NaiveDateTime>, GrammarError> {
        Ok(lines.iter().filter_map(|line| parse_stamp(line)).collect())
    }

    fn parse_values(&self, lines: &[String]) -> Vec<f64> {
        let mut out = Vec::new();
        let mut in_block = false;
        let mut block_sum: u64 = 0;
        let mut prev_await: u64 = 0;

        for line in lines {
            match DEVICE_RE.captures(line).and_then(|c| c[1].parse::<u64>().ok()) {
                Some(mut await_ms) => {
                    in_block = true;
                    if await_ms > AWAIT_CEILING {
                        trace!(await_ms, "discarding implausible await reading");
                        await_ms = prev_await;
                    }
                    block_sum += await_ms;
                    prev_await = await_ms;
                }
                None if in_block => {
                    in_block = false;
                    out.push(block_sum as f64);
                    block_sum = 0;
                }
                None => {}
            }
        }
        if in_block {
            out.push(block_sum as f64);
        }
        out
    }

    fn label(&self) -> &'static str {
        "time waiting on io"
    }
}

fn parse_stamp(line: &str) -> Option<NaiveDateTime> {
    let caps = STAMP_RE.captures(line)?;
    let date = date_from_mdy(&caps[1], &caps[2], &caps[3])?;
    let hour: u32 = caps[4].parse().ok()?;
    date.and_hms_opt(
        to_24_hour(hour, &caps[7]),
        caps[5].parse().ok()?,
        caps[6].parse().ok()?,
    )
}
