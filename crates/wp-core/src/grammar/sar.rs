//! Grammars for `sar --legacy` text output (CPU, block I/O, memory).
//!
//! All three reports share the timestamp layout: a banner carrying the
//! date, then `hh:mm:ss AM` on every record. The first stamped line is the
//! column header, so its timestamp is dropped.

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;
use wp_math::round_to;

use super::clock::{find_date_anchor, RolloverClock};
use super::{GrammarError, MetricGrammar};

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d+):(\d+)\s+(\w+)").expect("sar time regex"));

static CPU_ALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+:\d+.+all\s+(\d+\.\d+)").expect("sar cpu regex"));

static READS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+:\d+.+?\wM\s+(?:\S+\s+){3}(\d+\.\d+)").expect("sar reads regex")
});

static WRITES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+:\d+.+?\wM\s+(?:\S+\s+){4}(\d+\.\d+)").expect("sar writes regex")
});

static COMMIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+:\d+.+M\s+(?:\S+\s+){5}(\d+)").expect("sar memory regex")
});

/// 512-byte blocks per megabyte.
const BLOCKS_PER_MB: f64 = 2048.0;

/// Kilobytes per gigabyte.
const KB_PER_GB: f64 = 1_048_576.0;

/// Timestamps of every record after the header, carried across midnight.
fn sar_timestamps(lines: &[String]) -> Result<Vec<NaiveDateTime>, GrammarError> {
    let anchor = find_date_anchor(lines).ok_or(GrammarError::MissingDateAnchor)?;
    let mut clock = RolloverClock::new(anchor);
    let mut stamps: Vec<NaiveDateTime> = lines
        .iter()
        .filter_map(|line| {
            let caps = TIME_RE.captures(line)?;
            clock.stamp(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
                &caps[4],
            )
        })
        .collect();
    if !stamps.is_empty() {
        stamps.remove(0);
    }
    Ok(stamps)
}

fn capture_values(lines: &[String], re: &Regex, scale: f64) -> Vec<f64> {
    lines
        .iter()
        .filter_map(|line| re.captures(line)?.get(1)?.as_str().parse::<f64>().ok())
        .map(|v| if scale == 1.0 { v } else { round_to(v / scale, 2) })
        .collect()
}

// ---------------------------------------------------------------------------
// CPU
// ---------------------------------------------------------------------------

/// `sar -u`: the `all` row's first utilization column.
#[derive(Debug, Default, Clone, Copy)]
pub struct SarCpuGrammar;

impl MetricGrammar for SarCpuGrammar {
    fn parse_timestamps(&self, lines: &[String]) -> Result<Vec<NaiveDateTime>, GrammarError> {
        sar_timestamps(lines)
    }

    fn parse_values(&self, lines: &[String]) -> Vec<f64> {
        capture_values(lines, &CPU_ALL_RE, 1.0)
    }

    fn label(&self) -> &'static str {
        "cpu load (all cores)"
    }
}

// ---------------------------------------------------------------------------
// Block I/O
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Read,
    Write,
}

/// `sar -b`: blocks read or written per second, in MB/s.
#[derive(Debug, Clone, Copy)]
pub struct SarIoGrammar {
    direction: Direction,
}

impl SarIoGrammar {
    pub const READS: SarIoGrammar = SarIoGrammar {
        direction: Direction::Read,
    };
    pub const WRITES: SarIoGrammar = SarIoGrammar {
        direction: Direction::Write,
    };
}

impl MetricGrammar for SarIoGrammar {
    fn parse_timestamps(&self, lines: &[String]) -> Result<Vec<NaiveDateTime>, GrammarError> {
        sar_timestamps(lines)
    }

    fn parse_values(&self, lines: &[String]) -> Vec<f64> {
        let re: &Regex = match self.direction {
            Direction::Read => &READS_RE,
            Direction::Write => &WRITES_RE,
        };
        capture_values(lines, re, BLOCKS_PER_MB)
    }

    fn label(&self) -> &'static str {
        match self.direction {
            Direction::Read => "io reads in mb/sec",
            Direction::Write => "io writes in mb/sec",
        }
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

/// `sar -r`: committed memory (`kbcommit`) in GB.
#[derive(Debug, Default, Clone, Copy)]
pub struct SarMemoryGrammar;

impl MetricGrammar for SarMemoryGrammar {
    fn parse_timestamps(&self, lines: &[String]) -> Result<Vec<NaiveDateTime>, GrammarError> {
        sar_timestamps(lines)
    }

    fn parse_values(&self, lines: &[String]) -> Vec<f64> {
        capture_values(lines, &COMMIT_RE, KB_PER_GB)
    }

    fn label(&self) -> &'static str {
        "committed memory (gb)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    const CPU: &str = "\
Linux 2.6.32-358.el6.x86_64 (node7) \t01/01/2024 \t_x86_64_\t(16 CPU)

11:58:00 PM     CPU     %user     %nice   %system   %iowait    %steal     %idle
11:58:30 PM     all     12.50      0.00      1.00      0.50      0.00     86.00
11:59:00 PM     all     20.00      0.00      1.00      0.50      0.00     78.50
12:00:30 AM     all      3.25      0.00      1.00      0.50      0.00     95.25
Average:        all     11.92      0.00      1.00      0.50      0.00     86.58
";

    const IO: &str = "\
Linux 2.6.32-358.el6.x86_64 (node7) \t01/01/2024 \t_x86_64_\t(16 CPU)

10:00:00 AM       tps      rtps      wtps   bread/s   bwrtn/s
10:00:30 AM     40.00     10.00     30.00   4096.00   1024.00
10:01:00 AM     20.00     10.00     10.00   2048.00    512.00
";

    const MEM: &str = "\
Linux 2.6.32-358.el6.x86_64 (node7) \t01/01/2024 \t_x86_64_\t(16 CPU)

10:00:00 AM kbmemfree kbmemused  %memused kbbuffers  kbcached  kbcommit   %commit
10:00:30 AM   1000000   2000000     66.67    100000    500000   3145728     50.00
";

    #[test]
    fn cpu_header_timestamp_is_dropped_and_midnight_rolls() {
        let ts = SarCpuGrammar.parse_timestamps(&lines(CPU)).unwrap();
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(
            ts,
            vec![
                d1.and_hms_opt(23, 58, 30).unwrap(),
                d1.and_hms_opt(23, 59, 0).unwrap(),
                d2.and_hms_opt(0, 0, 30).unwrap(),
            ]
        );
    }

    #[test]
    fn cpu_values_skip_header_and_average() {
        assert_eq!(
            SarCpuGrammar.parse_values(&lines(CPU)),
            vec![12.5, 20.0, 3.25]
        );
    }

    #[test]
    fn io_reads_and_writes_are_converted_to_mb() {
        let l = lines(IO);
        assert_eq!(SarIoGrammar::READS.parse_values(&l), vec![2.0, 1.0]);
        assert_eq!(SarIoGrammar::WRITES.parse_values(&l), vec![0.5, 0.25]);
        assert_eq!(SarIoGrammar::READS.parse_timestamps(&l).unwrap().len(), 2);
    }

    #[test]
    fn committed_memory_is_converted_to_gb() {
        assert_eq!(SarMemoryGrammar.parse_values(&lines(MEM)), vec![3.0]);
    }

    #[test]
    fn missing_banner_date_is_an_error() {
        let l = lines("10:00:30 AM     all     12.50\n");
        assert_eq!(
            SarCpuGrammar.parse_timestamps(&l),
            Err(GrammarError::MissingDateAnchor)
        );
    }
}
