//! `mpstat -P ALL` grammar: per-sample reduction over individual cores.

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

use super::clock::{find_date_anchor, RolloverClock};
use super::{GrammarError, MetricGrammar};

// Only core 0's row is stamped; every block has exactly one.
static CORE0_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+):(\d+):(\d+)\s(\w+)\s\s\s\s0\s").expect("mpstat core0 regex")
});

static CORE_ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+:\d+:\d+\s.M\s+(\d+)\s+(\d+\.\d+)").expect("mpstat core row regex")
});

/// How the per-core `%usr` readings of one block collapse into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpstatMode {
    MostActiveCore,
    AllCoresSummed,
}

#[derive(Debug, Clone, Copy)]
pub struct MpstatGrammar {
    mode: MpstatMode,
}

impl MpstatGrammar {
    pub const fn new(mode: MpstatMode) -> Self {
        Self { mode }
    }

    fn fold(&self, acc: f64, usage: f64) -> f64 {
        match self.mode {
            MpstatMode::MostActiveCore => acc.max(usage),
            MpstatMode::AllCoresSummed if usage > 0.0 => acc + usage,
            MpstatMode::AllCoresSummed => acc,
        }
    }
}

impl MetricGrammar for MpstatGrammar {
    fn parse_timestamps(&self, lines: &[String]) -> Result<Vec<NaiveDateTime>, GrammarError> {
        let anchor = find_date_anchor(lines).ok_or(GrammarError::MissingDateAnchor)?;
        let mut clock = RolloverClock::new(anchor);
        Ok(lines
            .iter()
            .filter_map(|line| {
                let caps = CORE0_TIME_RE.captures(line)?;
                clock.stamp(
                    caps[1].parse().ok()?,
                    caps[2].parse().ok()?,
                    caps[3].parse().ok()?,
                    &caps[4],
                )
            })
            .collect())
    }

    // Idle blocks still yield 0.0. Each block carries exactly one core-0
    // stamp, so skipping one would shift later values onto earlier stamps.
    fn parse_values(&self, lines: &[String]) -> Vec<f64> {
        let mut out = Vec::new();
        let mut block: Option<f64> = None;
        for line in lines {
            let usage = CORE_ROW_RE
                .captures(line)
                .and_then(|c| c[2].parse::<f64>().ok());
            match (usage, block) {
                (Some(u), acc) => block = Some(self.fold(acc.unwrap_or(0.0), u)),
                (None, Some(acc)) => {
                    out.push(acc);
                    block = None;
                }
                (None, None) => {}
            }
        }
        if let Some(acc) = block {
            out.push(acc);
        }
        out
    }

    fn label(&self) -> &'static str {
        match self.mode {
            MpstatMode::MostActiveCore => "cpu load on most active core (%)",
            MpstatMode::AllCoresSummed => "cpu load on all cores summed up",
        }
    }
}
