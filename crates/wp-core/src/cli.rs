//! Command-line interface: argument definitions and command handlers.

use chrono::Local;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use wp_common::{Error, Result};
use wp_config::{
    validate_window, RegistryPaths, DEFAULT_SAMPLING_INTERVAL_SECS, DEFAULT_WINDOW_SECS,
    DEFAULT_WORKFLOW,
};

use crate::collect::{LogDecoder, SarDecoder};
use crate::grammar::Metric;
use crate::logging::{init_logging, remove_if_empty, LogLevel};
use crate::output::plot::DEFAULT_TEMPLATES_DIR;
use crate::output::{GnuplotRunner, RUN_STAMP_FORMAT};
use crate::pipeline::{Pipeline, PlotSettings, RunContext, RunReport};
use crate::profile::{self, ProfileRequest, ScriptLauncher, DEFAULT_COLLECTOR};

/// Workflow profiler: post-process monitor logs into per-stage tables and plots.
#[derive(Parser, Debug)]
#[command(name = "wp-core", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Post-process the monitor logs of a finished run
    Parse(ParseArgs),
    /// Run a workflow program under the monitors, then post-process it
    Profile(ProfileArgs),
}

/// Metric selection shared by both commands.
#[derive(Args, Debug, Clone, Default)]
pub struct MetricFlags {
    /// Disk wait time from iostat
    #[arg(short = 'i', long)]
    pub iostat: bool,
    /// CPU, disk read/write, and committed memory from sar
    #[arg(short = 's', long)]
    pub sar: bool,
    /// Busiest core and total of all cores from mpstat
    #[arg(short = 'm', long)]
    pub mpstat: bool,
    /// iostat and the sar metrics, with plotting
    #[arg(short = 'A', long)]
    pub all: bool,
}

impl MetricFlags {
    /// Selected metrics in processing order.
    pub fn metrics(&self) -> Vec<Metric> {
        let mut metrics = Vec::new();
        if self.iostat || self.all {
            metrics.push(Metric::Iostat);
        }
        if self.sar || self.all {
            metrics.extend(Metric::SAR_FAMILY);
        }
        if self.mpstat {
            metrics.extend(Metric::MPSTAT_FAMILY);
        }
        metrics
    }

    /// Monitor flags for the collector script.
    pub fn collector_flags(&self) -> String {
        let mut flags = Vec::new();
        if self.sar || self.all {
            flags.push("--sar");
        }
        if self.iostat || self.all {
            flags.push("--iostat");
        }
        if self.mpstat {
            flags.push("--mpstat");
        }
        flags.join(" ")
    }

    /// `-A` implies plotting.
    pub fn plot_requested(&self, plot: bool) -> bool {
        plot || self.all
    }
}

/// Binary sar logs are decoded only on Linux, where `sar` can read them.
pub fn decode_sar_logs(no_decode: bool) -> bool {
    cfg!(target_os = "linux") && !no_decode
}

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    /// Run directory holding one sub-directory per stage
    pub root: PathBuf,

    /// Workflow name
    #[arg(short = 'N', long, default_value = DEFAULT_WORKFLOW)]
    pub workflow: String,

    /// Process only the stage with this directory pattern
    #[arg(short = 'S', long = "single-step", value_name = "PATTERN")]
    pub single_step: Option<String>,

    /// Output directory (created if its parent exists)
    #[arg(short = 'o', long, default_value = "./post_processed_stats")]
    pub output: PathBuf,

    #[command(flatten)]
    pub metrics: MetricFlags,

    /// Resample window in seconds
    #[arg(short = 'w', long, default_value_t = DEFAULT_WINDOW_SECS)]
    pub window: u32,

    /// Plot subtitle (defaults to the root's directory name)
    #[arg(short = 't', long)]
    pub tag: Option<String>,

    /// Render plot descriptors and run gnuplot
    #[arg(short = 'p', long)]
    pub plot: bool,

    /// Log level for parser.log
    #[arg(short = 'l', long, value_enum, default_value_t = LogLevel::Info)]
    pub log: LogLevel,

    /// Workflow registry file (TOML or JSON)
    #[arg(long, value_name = "FILE")]
    pub workflows: Option<PathBuf>,

    /// Plot template directory
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,

    /// Read sar logs as text instead of decoding them
    #[arg(long)]
    pub no_decode: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

fn parse_switch(s: &str) -> std::result::Result<bool, String> {
    match s {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(format!("expected 0 or 1, got '{other}'")),
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    /// Workflow program to run
    pub script: PathBuf,
    /// Workflow name
    pub workflow: String,
    /// Sample identifier
    pub sample: String,
    /// Thread count handed to the workflow
    pub threads: u32,
    /// Input directory
    pub input: PathBuf,
    /// Output root; a run directory is created inside it
    pub output: PathBuf,

    /// Run the monitors (0 or 1)
    #[arg(long, default_value = "1", value_parser = parse_switch, action = ArgAction::Set)]
    pub profiling: bool,

    /// Post-process after the workflow finishes (0 or 1)
    #[arg(
        long = "post-processing",
        default_value = "1",
        value_parser = parse_switch,
        action = ArgAction::Set
    )]
    pub post_processing: bool,

    /// Monitor sampling interval in seconds
    #[arg(long = "sampling-interval", default_value_t = DEFAULT_SAMPLING_INTERVAL_SECS)]
    pub sampling_interval: u32,

    /// Resample window in seconds
    #[arg(short = 'w', long, default_value_t = DEFAULT_WINDOW_SECS)]
    pub window: u32,

    /// Render plot descriptors and run gnuplot
    #[arg(short = 'p', long)]
    pub plot: bool,

    #[command(flatten)]
    pub metrics: MetricFlags,

    /// Collector script passed to the workflow
    #[arg(long, default_value = DEFAULT_COLLECTOR)]
    pub collector: PathBuf,

    /// Workflow registry file (TOML or JSON)
    #[arg(long, value_name = "FILE")]
    pub workflows: Option<PathBuf>,

    /// Plot template directory
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Create `dir` when missing, provided its parent exists.
fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    let parent_ok = match dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.is_dir(),
        _ => true,
    };
    if !parent_ok {
        return Err(Error::Config(format!(
            "cannot create output directory '{}': parent does not exist",
            dir.display()
        )));
    }
    fs::create_dir(dir)?;
    Ok(())
}

fn default_tag(root: &Path) -> String {
    let resolved = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Options for one pipeline run, before the workflow is resolved.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub root: PathBuf,
    pub output: PathBuf,
    pub workflow: String,
    pub single_step: Option<String>,
    pub metrics: Vec<Metric>,
    pub window: u32,
    pub tag: Option<String>,
    pub plot: bool,
    pub workflows: Option<PathBuf>,
    pub templates: Option<PathBuf>,
}

impl ParseOptions {
    /// Resolve the workflow and freeze everything into a [`RunContext`].
    pub fn into_context(self) -> Result<RunContext> {
        if self.metrics.is_empty() {
            return Err(Error::Config(
                "at least one metric flag (-i, -s, -m, -A) is required".into(),
            ));
        }
        let window_secs = validate_window(self.window)?;
        if !self.root.is_dir() {
            return Err(Error::Config(format!(
                "run root '{}' is not a directory",
                self.root.display()
            )));
        }

        let (registry, source) = RegistryPaths::discover(self.workflows.as_deref()).resolve()?;
        info!(?source, workflows = ?registry.names(), "workflow registry loaded");
        let full = registry.get(&self.workflow)?;
        let workflow = match &self.single_step {
            Some(pattern) => full.single_stage(pattern)?,
            None => full.clone(),
        };

        let plot = self.plot.then(|| PlotSettings {
            templates_dir: self
                .templates
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATES_DIR)),
            subtitle: self.tag.clone().unwrap_or_else(|| default_tag(&self.root)),
        });

        Ok(RunContext {
            single_stage: self.single_step.is_some(),
            root: self.root,
            output_dir: self.output,
            workflow,
            metrics: self.metrics,
            window_secs,
            plot,
            run_stamp: Local::now().format(RUN_STAMP_FORMAT).to_string(),
        })
    }
}

fn run_pipeline(ctx: RunContext, decode: bool) -> Result<RunReport> {
    let decoder: Option<Box<dyn LogDecoder>> = if decode {
        Some(Box::new(SarDecoder::default()))
    } else {
        None
    };
    Pipeline::new(ctx, decoder, Box::new(GnuplotRunner::default())).run()
}

/// `wp-core parse`
pub fn run_parse(args: ParseArgs) -> Result<RunReport> {
    if args.metrics.metrics().is_empty() {
        return Err(Error::Config(
            "at least one metric flag (-i, -s, -m, -A) is required".into(),
        ));
    }
    ensure_output_dir(&args.output)?;
    let log_path = init_logging(&args.output, args.log)?;

    let opts = ParseOptions {
        root: args.root,
        output: args.output,
        workflow: args.workflow,
        single_step: args.single_step,
        metrics: args.metrics.metrics(),
        window: args.window,
        tag: args.tag,
        plot: args.metrics.plot_requested(args.plot),
        workflows: args.workflows,
        templates: args.templates,
    };
    let result = opts
        .into_context()
        .and_then(|ctx| run_pipeline(ctx, decode_sar_logs(args.no_decode)));
    if let Err(e) = &result {
        tracing::error!(error = %e, code = e.code(), "post-processing failed");
    }
    remove_if_empty(&log_path);
    result
}

/// `wp-core profile`
pub fn run_profile(args: ProfileArgs) -> Result<Option<RunReport>> {
    let plot = args.metrics.plot_requested(args.plot);
    let req = ProfileRequest {
        script: args.script,
        workflow: args.workflow.clone(),
        sample: args.sample,
        threads: args.threads,
        input: args.input,
        output: args.output,
        profiling: args.profiling,
        post_processing: args.post_processing,
        sampling_interval: args.sampling_interval,
        window_secs: args.window,
        metrics: args.metrics.metrics(),
        collector_flags: args.metrics.collector_flags(),
        collector: args.collector,
    };
    let prepared = profile::prepare(&req, Local::now().naive_local())?;
    let log_path = init_logging(&prepared.run_dir, LogLevel::Debug)?;

    let result = profile::launch(&req, &ScriptLauncher, &prepared).and_then(|()| {
        if !req.post_processing {
            return Ok(None);
        }
        let output = prepared.post_processed_dir();
        ensure_output_dir(&output)?;
        let opts = ParseOptions {
            root: prepared.run_dir.clone(),
            output,
            workflow: args.workflow.to_lowercase(),
            single_step: None,
            metrics: req.metrics.clone(),
            window: req.window_secs,
            tag: None,
            plot,
            workflows: args.workflows,
            templates: args.templates,
        };
        run_pipeline(opts.into_context()?, decode_sar_logs(false)).map(Some)
    });
    if let Err(e) = &result {
        tracing::error!(error = %e, code = e.code(), "profile run failed");
    }
    remove_if_empty(&log_path);
    result
}
