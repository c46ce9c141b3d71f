//! Launch a profiled workflow run and prepare it for post-processing.
//!
//! The workflow program is an external script. It receives the run directory
//! and, when profiling, the collector script and the monitors to start. Each
//! stage of the workflow then leaves its logs in a sub-directory of the run
//! directory.

use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};
use wp_common::{Error, Result};
use wp_config::{sampling_warnings, validate_output_root, validate_window};

use crate::grammar::Metric;

/// Timestamp suffix of run directory names.
pub const RUN_DIR_STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Default collector script handed to the workflow program.
pub const DEFAULT_COLLECTOR: &str = "./collect_stats.ksh";

/// Name of the post-processing output directory inside a run directory.
pub const POST_PROCESSED_DIR: &str = "post_processed_stats";

/// One `profile` invocation.
#[derive(Debug, Clone)]
pub struct ProfileRequest {
    pub script: PathBuf,
    pub workflow: String,
    pub sample: String,
    pub threads: u32,
    pub input: PathBuf,
    pub output: PathBuf,
    pub profiling: bool,
    pub post_processing: bool,
    pub sampling_interval: u32,
    pub window_secs: u32,
    pub metrics: Vec<Metric>,
    /// Monitor flags for the collector, e.g. `--sar --iostat`.
    pub collector_flags: String,
    pub collector: PathBuf,
}

impl ProfileRequest {
    /// Check the request; returns advisory warnings on success.
    pub fn validate(&self) -> Result<Vec<String>> {
        if !self.script.is_file() {
            return Err(Error::Config(format!(
                "workflow script '{}' is not a file",
                self.script.display()
            )));
        }
        if !self.input.is_dir() {
            return Err(Error::Config(format!(
                "input '{}' is not a directory",
                self.input.display()
            )));
        }
        validate_output_root(&self.output)?;
        validate_window(self.window_secs)?;
        if (self.profiling || self.post_processing) && self.metrics.is_empty() {
            return Err(Error::Config(
                "at least one metric flag (-i, -s, -m, -A) is required when profiling or post-processing"
                    .into(),
            ));
        }
        Ok(sampling_warnings(self.sampling_interval, self.window_secs))
    }

    /// `{SAMPLE}_{WORKFLOW}_{THREADS}t_{INTERVAL}s_{stamp}`
    pub fn run_dir_name(&self, now: NaiveDateTime) -> String {
        format!(
            "{}_{}_{}t_{}s_{}",
            self.sample,
            self.workflow,
            self.threads,
            self.sampling_interval,
            now.format(RUN_DIR_STAMP_FORMAT)
        )
    }

    /// Arguments passed to the workflow script.
    pub fn script_args(&self, run_dir: &Path) -> Vec<String> {
        let mut args = vec![
            self.sample.clone(),
            self.threads.to_string(),
            self.input.display().to_string(),
            run_dir.display().to_string(),
        ];
        if self.profiling {
            args.extend([
                "1".to_string(),
                self.collector.display().to_string(),
                self.sampling_interval.to_string(),
                self.collector_flags.clone(),
            ]);
        } else {
            args.push("0".to_string());
        }
        args
    }

    /// Create the run directory under the output root.
    pub fn create_run_dir(&self, now: NaiveDateTime) -> Result<PathBuf> {
        let run_dir = self.output.join(self.run_dir_name(now));
        fs::create_dir_all(&run_dir)?;
        Ok(run_dir)
    }
}

/// Runs the workflow program to completion.
pub trait WorkflowLauncher {
    fn launch(&self, script: &Path, args: &[String]) -> Result<()>;
}

/// Executes the script directly and waits for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptLauncher;

impl WorkflowLauncher for ScriptLauncher {
    fn launch(&self, script: &Path, args: &[String]) -> Result<()> {
        info!(script = %script.display(), ?args, "launching workflow");
        let status = Command::new(script)
            .args(args)
            .status()
            .map_err(|e| Error::WorkflowFailed(format!("{}: {e}", script.display())))?;
        if !status.success() {
            return Err(Error::WorkflowFailed(format!(
                "{} exited with {status}",
                script.display()
            )));
        }
        Ok(())
    }
}

/// A validated request with its run directory in place.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub run_dir: PathBuf,
    pub warnings: Vec<String>,
}

impl PreparedRun {
    /// Where `parse` writes its outputs for this run.
    pub fn post_processed_dir(&self) -> PathBuf {
        self.run_dir.join(POST_PROCESSED_DIR)
    }
}

/// Validate `req` and create its run directory.
pub fn prepare(req: &ProfileRequest, now: NaiveDateTime) -> Result<PreparedRun> {
    let warnings = req.validate()?;
    let run_dir = req.create_run_dir(now)?;
    Ok(PreparedRun { run_dir, warnings })
}

/// Report validation warnings and run the workflow into the prepared directory.
pub fn launch(
    req: &ProfileRequest,
    launcher: &dyn WorkflowLauncher,
    prepared: &PreparedRun,
) -> Result<()> {
    for warning in &prepared.warnings {
        warn!("{warning}");
    }
    launcher.launch(&req.script, &req.script_args(&prepared.run_dir))?;
    info!(run_dir = %prepared.run_dir.display(), "workflow finished");
    Ok(())
}
