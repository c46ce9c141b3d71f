//! Metric grammars: per-format extraction of timestamps and values.
//!
//! Each supported metric is a variant of the closed [`Metric`] enum. A variant
//! maps to a static grammar object implementing [`MetricGrammar`]; the
//! pipeline never needs to know which concrete grammar it is driving.

pub mod clock;
pub mod iostat;
pub mod mpstat;
pub mod sar;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::warn;
use wp_common::Sample;

use iostat::IostatGrammar;
use mpstat::{MpstatGrammar, MpstatMode};
use sar::{SarCpuGrammar, SarIoGrammar, SarMemoryGrammar};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from timestamp extraction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarError {
    #[error("no mm/dd/yyyy date anchor found in log")]
    MissingDateAnchor,
}

// ---------------------------------------------------------------------------
// Grammar interface
// ---------------------------------------------------------------------------

/// Capability interface shared by every metric format.
pub trait MetricGrammar: Send + Sync {
    /// Timestamps of every record, in file order.
    fn parse_timestamps(&self, lines: &[String]) -> Result<Vec<NaiveDateTime>, GrammarError>;

    /// Values of every record, in file order.
    fn parse_values(&self, lines: &[String]) -> Vec<f64>;

    /// Human-readable description of the value, used in column headers.
    fn label(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Metric variants
// ---------------------------------------------------------------------------

/// Every metric the pipeline knows how to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Disk wait time from `iostat -x`.
    Iostat,
    /// CPU utilization across all cores from `sar -u`.
    Sar,
    /// Disk read bandwidth from `sar -b`.
    SarReads,
    /// Disk write bandwidth from `sar -b`.
    SarWrites,
    /// Committed memory from `sar -r`.
    ActiveMem,
    /// Busiest core per sample from `mpstat -P ALL`.
    MpstatActiveCore,
    /// Sum of all cores per sample from `mpstat -P ALL`.
    MpstatTotalCore,
}

static IOSTAT: IostatGrammar = IostatGrammar;
static SAR_CPU: SarCpuGrammar = SarCpuGrammar;
static SAR_READS: SarIoGrammar = SarIoGrammar::READS;
static SAR_WRITES: SarIoGrammar = SarIoGrammar::WRITES;
static SAR_MEMORY: SarMemoryGrammar = SarMemoryGrammar;
static MPSTAT_ACTIVE: MpstatGrammar = MpstatGrammar::new(MpstatMode::MostActiveCore);
static MPSTAT_TOTAL: MpstatGrammar = MpstatGrammar::new(MpstatMode::AllCoresSummed);

impl Metric {
    /// Metrics enabled by `--sar`.
    pub const SAR_FAMILY: [Metric; 4] = [
        Metric::Sar,
        Metric::SarReads,
        Metric::SarWrites,
        Metric::ActiveMem,
    ];

    /// Metrics enabled by `--mpstat`.
    pub const MPSTAT_FAMILY: [Metric; 2] = [Metric::MpstatActiveCore, Metric::MpstatTotalCore];

    /// The grammar implementing this metric.
    pub fn grammar(self) -> &'static dyn MetricGrammar {
        match self {
            Metric::Iostat => &IOSTAT,
            Metric::Sar => &SAR_CPU,
            Metric::SarReads => &SAR_READS,
            Metric::SarWrites => &SAR_WRITES,
            Metric::ActiveMem => &SAR_MEMORY,
            Metric::MpstatActiveCore => &MPSTAT_ACTIVE,
            Metric::MpstatTotalCore => &MPSTAT_TOTAL,
        }
    }

    /// Name used in output file names and log fields.
    pub fn name(self) -> &'static str {
        match self {
            Metric::Iostat => "iostat",
            Metric::Sar => "sar",
            Metric::SarReads => "sar_reads",
            Metric::SarWrites => "sar_writes",
            Metric::ActiveMem => "active_mem",
            Metric::MpstatActiveCore => "mpstat_active_core",
            Metric::MpstatTotalCore => "mpstat_total_core",
        }
    }

    /// Substring identifying this metric's raw log file in a stage directory.
    pub fn search_token(self) -> &'static str {
        match self {
            Metric::Iostat => "iostat",
            Metric::Sar | Metric::SarReads | Metric::SarWrites | Metric::ActiveMem => "sar",
            Metric::MpstatActiveCore | Metric::MpstatTotalCore => "mpstat",
        }
    }

    /// Flags for the binary log decoder, or `None` if the log is plain text.
    pub fn decode_flags(self) -> Option<&'static [&'static str]> {
        match self {
            Metric::Sar => Some(&[]),
            Metric::SarReads | Metric::SarWrites => Some(&["-b"]),
            Metric::ActiveMem => Some(&["-r"]),
            Metric::Iostat | Metric::MpstatActiveCore | Metric::MpstatTotalCore => None,
        }
    }

    /// Pattern matching this metric's plot template file name.
    pub fn template_pattern(self) -> &'static str {
        match self {
            Metric::Iostat => r"_iostat\.plt$",
            Metric::Sar => r"_sar\.plt$",
            Metric::SarReads => r"_sar_reads\.plt$",
            Metric::SarWrites => r"_sar_writes\.plt$",
            Metric::ActiveMem => r"committed_mem\.plt$",
            Metric::MpstatActiveCore => r"active_core_mpstat\.plt$",
            Metric::MpstatTotalCore => r"_total_core_mpstat\.plt$",
        }
    }

    /// Title row written at the top of the metric's CSV.
    pub fn title(self) -> String {
        format!("{}: {}", self.name().to_uppercase(), self.grammar().label())
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Pairing
// ---------------------------------------------------------------------------

/// Run `metric`'s grammar over `lines` and zip timestamps with values.
///
/// Mismatched lengths are truncated to the shorter side with a warning.
pub fn parse_series(metric: Metric, lines: &[String]) -> Result<Vec<Sample>, GrammarError> {
    let grammar = metric.grammar();
    let timestamps = grammar.parse_timestamps(lines)?;
    let values = grammar.parse_values(lines);
    if timestamps.len() != values.len() {
        warn!(
            metric = %metric,
            timestamps = timestamps.len(),
            values = values.len(),
            "timestamp and value counts differ; truncating to the shorter"
        );
    }
    Ok(timestamps
        .into_iter()
        .zip(values)
        .map(|(t, v)| Sample::new(t, v))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sar_family_shares_the_search_token() {
        for m in Metric::SAR_FAMILY {
            assert_eq!(m.search_token(), "sar");
            assert!(m.decode_flags().is_some());
        }
        assert!(Metric::Iostat.decode_flags().is_none());
    }

    #[test]
    fn titles_use_upper_case_names() {
        assert_eq!(Metric::Iostat.title(), "IOSTAT: time waiting on io");
        assert_eq!(Metric::ActiveMem.title(), "ACTIVE_MEM: committed memory (gb)");
    }

    #[test]
    fn template_patterns_do_not_overlap() {
        let sar = regex::Regex::new(Metric::Sar.template_pattern()).unwrap();
        assert!(sar.is_match("template_sar.plt"));
        assert!(!sar.is_match("template_sar_reads.plt"));
    }

    #[test]
    fn parse_series_truncates_to_shorter_side() {
        let lines: Vec<String> = [
            "01/15/2014 11:58:00 PM",
            "sda 0.00 1.00 0.50 2.00 10.00 30.00 16.00 0.01 5.00 1.00 0.20",
            "",
            "01/15/2014 11:58:30 PM",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let series = parse_series(Metric::Iostat, &lines).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].value, 5.0);
    }
}
