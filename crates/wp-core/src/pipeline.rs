//! End-to-end post-processing of one run directory.
//!
//! For every requested metric, in order:
//! 1. Extract and parse each stage's log into a raw series
//! 2. Estimate, repair, and resample the series
//! 3. Assemble stage columns into one table and write it as CSV
//! 4. Optionally render and run the metric's plot descriptor
//!
//! Any error aborts the run. Files already written stay on disk; each one is
//! complete because it was renamed into place.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use wp_common::{Error, Result};
use wp_config::Workflow;

use crate::collect::{discover_stages, process_name, LogDecoder, RawSeriesExtractor, StageDir};
use crate::exit_codes::ExitCode;
use crate::grammar::{parse_series, Metric};
use crate::output::plot::{find_template, output_plot_name, render, starting_time};
use crate::output::{write_atomic, write_csv, Column, PlotMode, PlotRequest, PlotRunner, Table};
use crate::series;

/// Plot rendering options for a run.
#[derive(Debug, Clone)]
pub struct PlotSettings {
    pub templates_dir: PathBuf,
    pub subtitle: String,
}

/// Immutable description of one post-processing run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub root: PathBuf,
    pub output_dir: PathBuf,
    /// Already restricted to one stage in single-step mode.
    pub workflow: Workflow,
    pub single_stage: bool,
    pub metrics: Vec<Metric>,
    pub window_secs: u32,
    pub plot: Option<PlotSettings>,
    /// Prefix shared by every CSV of this run.
    pub run_stamp: String,
}

/// A column that fell back to raw samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DegradedColumn {
    pub metric: Metric,
    pub stage: String,
    pub samples: usize,
}

/// A plot descriptor that was written but could not be executed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotFailure {
    pub metric: Metric,
    pub plot_file: PathBuf,
    pub reason: String,
}

/// What a run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub csv_files: Vec<PathBuf>,
    pub plot_files: Vec<PathBuf>,
    pub degraded: Vec<DegradedColumn>,
    pub plot_failures: Vec<PlotFailure>,
}

impl RunReport {
    pub fn exit_code(&self) -> ExitCode {
        if self.degraded.is_empty() && self.plot_failures.is_empty() {
            ExitCode::Clean
        } else {
            ExitCode::Degraded
        }
    }
}

/// Drives extraction through output for a [`RunContext`].
pub struct Pipeline {
    ctx: RunContext,
    extractor: RawSeriesExtractor,
    plot_runner: Box<dyn PlotRunner>,
}

impl Pipeline {
    /// `decoder` handles binary logs; `None` reads every log as text.
    pub fn new(
        ctx: RunContext,
        decoder: Option<Box<dyn LogDecoder>>,
        plot_runner: Box<dyn PlotRunner>,
    ) -> Self {
        let extractor = RawSeriesExtractor::new(ctx.output_dir.clone(), decoder);
        Self {
            ctx,
            extractor,
            plot_runner,
        }
    }

    pub fn run(&self) -> Result<RunReport> {
        let stages = discover_stages(&self.ctx.root, &self.ctx.workflow)?;
        info!(
            workflow = %self.ctx.workflow.name,
            root = %self.ctx.root.display(),
            stages = ?self.ctx.workflow.labels(),
            metrics = self.ctx.metrics.len(),
            window_secs = self.ctx.window_secs,
            "starting post-processing"
        );

        let mut report = RunReport::default();
        for &metric in &self.ctx.metrics {
            self.run_metric(metric, &stages, &mut report)?;
        }

        info!(
            csv_files = report.csv_files.len(),
            plot_files = report.plot_files.len(),
            degraded = report.degraded.len(),
            plot_failures = report.plot_failures.len(),
            "post-processing finished"
        );
        Ok(report)
    }

    fn run_metric(&self, metric: Metric, stages: &[StageDir], report: &mut RunReport) -> Result<()> {
        let mut table = Table::new(metric.title());
        // The first stage with a known interval speaks for the whole plot.
        let mut plot_interval = None;

        for stage in stages {
            let (column, interval) = self.process_stage(metric, stage, report)?;
            plot_interval = plot_interval.or(interval);
            column.log_stats(metric.name());
            table = table.concat(&column);
        }

        let csv_path = write_csv(&table, &self.ctx.output_dir, metric.name(), &self.ctx.run_stamp)?;
        report.csv_files.push(csv_path.clone());

        if let Some(settings) = &self.ctx.plot {
            self.emit_plot(metric, &table, &csv_path, plot_interval, stages, settings, report)?;
        }
        Ok(())
    }

    fn process_stage(
        &self,
        metric: Metric,
        stage: &StageDir,
        report: &mut RunReport,
    ) -> Result<(Column, Option<f64>)> {
        let lines = self.extractor.extract(&stage.path, metric)?;
        let raw = parse_series(metric, &lines).map_err(|e| Error::MalformedLog {
            metric: metric.name().to_string(),
            stage: stage.label.clone(),
            reason: e.to_string(),
        })?;
        if raw.is_empty() {
            return Err(Error::EmptyDataSeries {
                metric: metric.name().to_string(),
                stage: stage.label.clone(),
            });
        }
        info!(metric = %metric, stage = %stage.label, samples = raw.len(), "parsed series");

        let processed = series::process(raw, self.ctx.window_secs).map_err(|e| {
            Error::FatalTimestampCorruption {
                metric: metric.name().to_string(),
                stage: stage.label.clone(),
                detail: e.to_string(),
            }
        })?;

        if let series::Resampled::Unaggregated(samples) = &processed.resampled {
            report.degraded.push(DegradedColumn {
                metric,
                stage: stage.label.clone(),
                samples: samples.len(),
            });
        }

        let interval = processed.interval.seconds();
        let column = Column::assemble(
            &processed.resampled,
            &stage.label,
            metric.grammar().label(),
            interval,
            self.ctx.window_secs,
        );
        Ok((column, interval))
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_plot(
        &self,
        metric: Metric,
        table: &Table,
        csv_path: &Path,
        interval: Option<f64>,
        stages: &[StageDir],
        settings: &PlotSettings,
        report: &mut RunReport,
    ) -> Result<()> {
        if !settings.templates_dir.is_dir() {
            warn!(
                metric = %metric,
                dir = %settings.templates_dir.display(),
                "plot template directory not found, skipping plot"
            );
            return Ok(());
        }
        let Some(template_path) = find_template(&settings.templates_dir, metric)? else {
            warn!(
                metric = %metric,
                dir = %settings.templates_dir.display(),
                "no plot template, skipping plot"
            );
            return Ok(());
        };
        let template = fs::read_to_string(&template_path)?;

        let labels: Vec<String> = stages.iter().map(|s| s.label.clone()).collect();
        let mode = if self.ctx.single_stage {
            PlotMode::SingleStage {
                process_name: process_name(&self.ctx.root),
            }
        } else {
            PlotMode::MultiStage
        };
        let text = render(&PlotRequest {
            template: &template,
            csv_path,
            stages: &labels,
            subtitle: &settings.subtitle,
            interval,
            starting_time: table.first_time_label().and_then(starting_time),
            mode,
        });

        let template_name = template_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let plot_path = self.ctx.output_dir.join(output_plot_name(template_name));
        write_atomic(&plot_path, text.as_bytes())?;
        report.plot_files.push(plot_path.clone());
        info!(metric = %metric, path = %plot_path.display(), "wrote plot descriptor");

        if let Err(e) = self.plot_runner.run(&plot_path) {
            warn!(metric = %metric, path = %plot_path.display(), error = %e, "plot failed");
            report.plot_failures.push(PlotFailure {
                metric,
                plot_file: plot_path,
                reason: e.to_string(),
            });
        }
        Ok(())
    }
}
