//! CLI E2E tests for `wp-core parse`.
//!
//! Validates:
//! - Missing metric flags, unknown workflows, and bad windows exit 10
//! - Missing stage directories exit 11, missing logs exit 12
//! - A clean run writes the CSV and parser.log and exits 0
//! - `--json` prints the run report
//! - A short stage degrades the run to exit 1

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use chrono::{Duration, NaiveDate};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

// ============================================================================
// Helpers
// ============================================================================

/// A `wp-core` command isolated from the caller's registry and log settings.
fn wp_core(config_home: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("wp-core");
    cmd.timeout(std::time::Duration::from_secs(60))
        .env_remove("WP_WORKFLOWS")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home);
    cmd
}

fn iostat_log(samples: usize) -> String {
    let start = NaiveDate::from_ymd_opt(2014, 1, 15)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    let mut out = String::new();
    for i in 0..samples as i64 {
        let t = start + Duration::seconds(i * 30);
        out.push_str(&format!("{}\n", t.format("%m/%d/%Y %I:%M:%S %p")));
        out.push_str("Device:         rrqm/s   wrqm/s     r/s     w/s   rsec/s   wsec/s avgrq-sz avgqu-sz   await  svctm  %util\n");
        out.push_str("sda               0.00     1.00    0.50    2.00    10.00    30.00    16.00     0.01    4.00   1.00   0.20\n");
        out.push('\n');
    }
    out
}

struct Fixture {
    tmp: TempDir,
    root: PathBuf,
    output: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("NA12878_run");
        fs::create_dir_all(&root).unwrap();
        let output = tmp.path().join("stats");
        Self { tmp, root, output }
    }

    fn with_stages(self, samples: [usize; 3]) -> Self {
        for (i, n) in samples.iter().enumerate() {
            let dir = self.root.join(format!("2014..stage{}.1", i + 1));
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("node1_iostat.log"), iostat_log(*n)).unwrap();
        }
        self
    }

    fn config_home(&self) -> PathBuf {
        self.tmp.path().join("config")
    }

    fn parse(&self) -> Command {
        let mut cmd = wp_core(&self.config_home());
        cmd.arg("parse")
            .arg(&self.root)
            .arg("-o")
            .arg(&self.output)
            .arg("--no-decode");
        cmd
    }

    fn csv_files(&self) -> Vec<PathBuf> {
        fs::read_dir(&self.output)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|x| x == "csv"))
            .collect()
    }
}

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn test_parse_without_metric_exits_10() {
    let fx = Fixture::new().with_stages([40, 40, 40]);
    fx.parse()
        .assert()
        .code(10)
        .stderr(predicate::str::contains("at least one metric flag"));
}

#[test]
fn test_unknown_workflow_exits_10() {
    let fx = Fixture::new().with_stages([40, 40, 40]);
    fx.parse()
        .args(["-i", "-N", "bwa_pipeline"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("unknown workflow 'bwa_pipeline'"));
}

#[test]
fn test_invalid_single_step_exits_10() {
    let fx = Fixture::new().with_stages([40, 40, 40]);
    fx.parse().args(["-i", "-S", "stage"]).assert().code(10);
}

#[test]
fn test_zero_window_exits_10() {
    let fx = Fixture::new().with_stages([40, 40, 40]);
    fx.parse().args(["-i", "-w", "0"]).assert().code(10);
}

#[test]
fn test_custom_workflow_from_registry_file() {
    let fx = Fixture::new().with_stages([40, 40, 40]);
    let registry = fx.tmp.path().join("workflows.toml");
    fs::write(
        &registry,
        "[workflows.align]\nstages = [\n  { label = \"Map\", pattern = \"stage1\" },\n  { label = \"Sort\", pattern = \"stage3\" },\n]\n",
    )
    .unwrap();

    fx.parse()
        .args(["-i", "-N", "align", "--workflows"])
        .arg(&registry)
        .assert()
        .success()
        .code(0);

    let csv = fs::read_to_string(&fx.csv_files()[0]).unwrap();
    assert_eq!(csv.lines().nth(1), Some("Map,,Sort,"));
}

// ============================================================================
// Discovery errors
// ============================================================================

#[test]
fn test_missing_stage_exits_11() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.root.join("stage1")).unwrap();
    fx.parse()
        .arg("-i")
        .assert()
        .code(11)
        .stderr(predicate::str::contains("stage2, stage3"));
}

#[test]
fn test_missing_log_exits_12() {
    let fx = Fixture::new();
    for i in 1..=3 {
        fs::create_dir_all(fx.root.join(format!("stage{i}"))).unwrap();
    }
    fx.parse().arg("-i").assert().code(12);
}

#[test]
fn test_output_parent_must_exist() {
    let fx = Fixture::new().with_stages([40, 40, 40]);
    let mut cmd = wp_core(&fx.config_home());
    cmd.arg("parse")
        .arg(&fx.root)
        .arg("-i")
        .arg("-o")
        .arg(fx.tmp.path().join("missing").join("stats"))
        .assert()
        .code(10);
}

// ============================================================================
// Successful runs
// ============================================================================

#[test]
fn test_clean_run_writes_csv_and_log() {
    let fx = Fixture::new().with_stages([40, 40, 40]);
    fx.parse().arg("-i").assert().success().code(0);

    let csvs = fx.csv_files();
    assert_eq!(csvs.len(), 1);
    let name = csvs[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.ends_with("_iostat.csv"), "{name}");

    let text = fs::read_to_string(&csvs[0]).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("IOSTAT: time waiting on io"));
    assert_eq!(lines.next(), Some("Stage1,,Stage2,,Stage3,"));
    assert!(lines.skip(1).all(|l| l.split(',').skip(1).step_by(2).all(|v| v == "4.0")));

    let log = fs::read_to_string(fx.output.join("parser.log")).unwrap();
    assert!(log.contains("stage statistics"));
}

#[test]
fn test_json_report_lists_outputs() {
    let fx = Fixture::new().with_stages([40, 40, 40]);
    let output = fx
        .parse()
        .args(["-i", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: Value = serde_json::from_slice(&output).expect("parse JSON");
    let csvs = json["csv_files"].as_array().expect("csv_files array");
    assert_eq!(csvs.len(), 1);
    assert!(json["degraded"].as_array().unwrap().is_empty());
}

#[test]
fn test_short_stage_degrades_to_exit_1() {
    let fx = Fixture::new().with_stages([40, 2, 40]);
    fx.parse()
        .arg("-i")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("insufficient series data"));
    assert_eq!(fx.csv_files().len(), 1);
}

#[test]
fn test_single_step_writes_one_column() {
    let fx = Fixture::new().with_stages([40, 40, 40]);
    fx.parse().args(["-i", "-S", "stage2"]).assert().success();
    let text = fs::read_to_string(&fx.csv_files()[0]).unwrap();
    assert_eq!(text.lines().nth(1), Some("Stage2,"));
}
