//! Gnuplot descriptor rendering from per-metric templates.
//!
//! A template is a working `.plt` file for a single stage. Rendering retargets
//! it at the run's CSV and grows the plot command to one line per stage.

use chrono::{NaiveDateTime, Timelike};
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use tracing::debug;
use wp_common::{Error, Result, TIME_LABEL_FORMAT};

use crate::grammar::Metric;

/// Default template directory, relative to the working directory.
pub const DEFAULT_TEMPLATES_DIR: &str = "plot_templates";

static OUTPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(set output ")(.+)(/[^/]+\.png)"#).expect("output regex"));
static INTERVAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sampled at \d+ second intervals").expect("interval regex"));
static CSV_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*\d[^"]*\.csv""#).expect("csv path regex"));
static STARTING_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"starting_time = \S+").expect("starting time regex"));
static FIRST_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(1 t ")[^"]+"#).expect("title regex"));
static SINGLE_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(plot ".*?".*?t ").*(".*with lines.*)"#).expect("single title regex")
});

const SUBTITLE_TOKEN: &str = "<subtitle>";

/// How stage titles are written into the plot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlotMode {
    /// One line per stage, titled with the stage label.
    MultiStage,
    /// A single line titled with the process name, falling back to the stage label.
    SingleStage { process_name: Option<String> },
}

/// Everything needed to render one metric's descriptor.
#[derive(Debug, Clone)]
pub struct PlotRequest<'a> {
    pub template: &'a str,
    pub csv_path: &'a Path,
    pub stages: &'a [String],
    pub subtitle: &'a str,
    pub interval: Option<f64>,
    pub starting_time: Option<u32>,
    pub mode: PlotMode,
}

/// Seconds since midnight of a formatted time label.
pub fn starting_time(label: &str) -> Option<u32> {
    NaiveDateTime::parse_from_str(label, TIME_LABEL_FORMAT)
        .ok()
        .map(|t| t.num_seconds_from_midnight())
}

/// Gnuplot reads backslashes in strings as escapes.
fn gnuplot_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "\\\\")
}

fn extra_stage_line(index: usize, stage: &str, last: bool) -> String {
    let time_col = 3 + 2 * index;
    let data_col = 4 + 2 * index;
    let style = 2 + index;
    let tail = if last { "" } else { ", \\" };
    format!(
        "  '' using ((timecolumn({time_col})-offset)/3600):{data_col} every ::3 ls {style} t \"{stage}\" with lines{tail}"
    )
}

/// Cut `text` after its first `plot` line and chain one line per extra stage.
fn expand_plot_lines(text: &str, stages: &[String]) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let Some(plot_idx) = lines.iter().position(|l| l.starts_with("plot")) else {
        return text.to_string();
    };

    let mut out: Vec<String> = lines[..plot_idx].iter().map(|l| l.to_string()).collect();
    let mut plot_line = lines[plot_idx]
        .trim_end()
        .trim_end_matches('\\')
        .trim_end()
        .trim_end_matches(',')
        .to_string();
    let extras = stages.get(1..).unwrap_or_default();
    if !extras.is_empty() {
        plot_line.push_str(", \\");
    }
    out.push(plot_line);
    for (i, stage) in extras.iter().enumerate() {
        out.push(extra_stage_line(i, stage, i + 1 == extras.len()));
    }
    let mut rendered = out.join("\n");
    rendered.push('\n');
    rendered
}

/// Render `req.template` into a descriptor for this run.
pub fn render(req: &PlotRequest<'_>) -> String {
    let csv_dir = req
        .csv_path
        .parent()
        .map(gnuplot_path)
        .unwrap_or_default();
    let mut text = OUTPUT_RE
        .replace(req.template, |c: &Captures| format!("{}{}{}", &c[1], csv_dir, &c[3]))
        .into_owned();

    if let Some(secs) = req.interval {
        let phrase = format!("sampled at {} second intervals", secs.trunc() as i64);
        text = INTERVAL_RE.replace_all(&text, phrase.as_str()).into_owned();
    }

    text = text.replace(SUBTITLE_TOKEN, &req.subtitle.replace('_', "\\\\_"));

    let quoted_csv = format!("\"{}\"", gnuplot_path(req.csv_path));
    text = CSV_PATH_RE
        .replace_all(&text, |_: &Captures| quoted_csv.clone())
        .into_owned();

    if let Some(secs) = req.starting_time {
        let assignment = format!("starting_time = {secs}");
        text = STARTING_TIME_RE
            .replace_all(&text, assignment.as_str())
            .into_owned();
    }

    let first_stage = req.stages.first().map(String::as_str).unwrap_or_default();
    match &req.mode {
        PlotMode::MultiStage => {
            text = FIRST_TITLE_RE
                .replace(&text, |c: &Captures| format!("{}{}", &c[1], first_stage))
                .into_owned();
            expand_plot_lines(&text, req.stages)
        }
        PlotMode::SingleStage { process_name } => {
            let title = process_name.as_deref().unwrap_or(first_stage);
            SINGLE_TITLE_RE
                .replace(&text, |c: &Captures| format!("{}{}{}", &c[1], title, &c[2]))
                .into_owned()
        }
    }
}

/// The first template in `dir` (by name) matching `metric`.
pub fn find_template(dir: &Path, metric: Metric) -> Result<Option<PathBuf>> {
    let re = Regex::new(metric.template_pattern())
        .map_err(|e| Error::Config(format!("template pattern: {e}")))?;
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| re.is_match(n))
        .collect();
    names.sort();
    Ok(names.into_iter().next().map(|n| dir.join(n)))
}

/// `template_sar.plt` -> `plot_sar.plt`
pub fn output_plot_name(template_name: &str) -> String {
    match template_name.strip_prefix("template") {
        Some(rest) => format!("plot{rest}"),
        None => format!("plot_{template_name}"),
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Errors from running a rendered descriptor.
#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Exit { program: String, status: String },
}

/// Executes a rendered plot descriptor.
pub trait PlotRunner {
    fn run(&self, plot_file: &Path) -> std::result::Result<(), PlotError>;
}

/// Runs `gnuplot <file>` on the dumb terminal with output discarded.
#[derive(Debug, Clone)]
pub struct GnuplotRunner {
    program: String,
}

impl Default for GnuplotRunner {
    fn default() -> Self {
        Self {
            program: "gnuplot".to_string(),
        }
    }
}

impl GnuplotRunner {
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl PlotRunner for GnuplotRunner {
    fn run(&self, plot_file: &Path) -> std::result::Result<(), PlotError> {
        debug!(program = %self.program, file = %plot_file.display(), "running plot");
        let status = Command::new(&self.program)
            .arg(plot_file)
            .env("GNUTERM", "dumb")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| PlotError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(PlotError::Exit {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}
