//! Column assembly and side-by-side table building.
//!
//! A metric's table holds one two-cell-wide column per workflow stage:
//!
//! ```text
//! Stage1                  |                          | Stage2 | ...
//! time in interval: 30s   | average cpu ... per 100s | ...
//! 2024-01-01 10:01:10     | 12.5                     | ...
//! ```
//!
//! Stages produce different numbers of rows; shorter columns are padded with
//! empty cells so the table stays rectangular.

use tracing::info;
use wp_common::TIME_LABEL_FORMAT;
use wp_math::Summary;

use crate::series::Resampled;

/// Cells per column: time and value.
pub const COLUMN_WIDTH: usize = 2;

/// Render seconds with at most two decimals and no trailing zeros.
pub fn format_seconds(secs: f64) -> String {
    let text = format!("{secs:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// One stage's series formatted for tabular output.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    stage: String,
    time_header: String,
    data_header: String,
    rows: Vec<[String; 2]>,
}

impl Column {
    /// Label `resampled` for `stage`.
    ///
    /// `raw_interval` is the estimated sampling interval; `window_secs` the
    /// resample window.
    pub fn assemble(
        resampled: &Resampled,
        stage: &str,
        metric_label: &str,
        raw_interval: Option<f64>,
        window_secs: u32,
    ) -> Self {
        let rows = match resampled {
            Resampled::Windowed(samples) => samples
                .iter()
                .map(|s| {
                    [
                        s.window_end.format(TIME_LABEL_FORMAT).to_string(),
                        format!("{:.1}", s.value),
                    ]
                })
                .collect(),
            Resampled::Unaggregated(samples) => samples
                .iter()
                .map(|s| {
                    [
                        s.timestamp.format(TIME_LABEL_FORMAT).to_string(),
                        s.value.to_string(),
                    ]
                })
                .collect(),
        };
        Self {
            stage: stage.to_string(),
            time_header: match raw_interval {
                Some(secs) => format!("time in interval: {}s", format_seconds(secs)),
                None => "time in interval: n/a".to_string(),
            },
            data_header: format!("average {metric_label} per {window_secs}s"),
            rows,
        }
    }

    /// Total height: stage row, header row, data rows.
    pub fn height(&self) -> usize {
        self.rows.len() + 2
    }

    /// Numeric values of the data rows.
    pub fn values(&self) -> Vec<f64> {
        self.rows.iter().filter_map(|r| r[1].parse().ok()).collect()
    }

    fn cells(&self) -> Vec<[String; 2]> {
        let mut out = Vec::with_capacity(self.height());
        out.push([self.stage.clone(), String::new()]);
        out.push([self.time_header.clone(), self.data_header.clone()]);
        out.extend(self.rows.iter().cloned());
        out
    }

    /// Log descriptive statistics of this column's values.
    pub fn log_stats(&self, metric: &str) -> Option<Summary> {
        let summary = Summary::of(&self.values())?;
        info!(
            metric,
            stage = %self.stage,
            mean = summary.mean,
            median = summary.median,
            stdev = summary.std_dev,
            max = summary.max,
            "stage statistics"
        );
        Some(summary)
    }
}

/// All stage columns for one metric, under a one-cell title row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    title: String,
    rows: Vec<Vec<String>>,
    columns: usize,
}

impl Table {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
            columns: 0,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.columns * COLUMN_WIDTH
    }

    /// Append `column` to the right, padding whichever side is shorter.
    pub fn concat(mut self, column: &Column) -> Self {
        let existing_width = self.width();
        let cells = column.cells();
        let height = self.rows.len().max(cells.len());

        self.rows
            .resize_with(height, || vec![String::new(); existing_width]);
        for (i, row) in self.rows.iter_mut().enumerate() {
            match cells.get(i) {
                Some(pair) => row.extend(pair.iter().cloned()),
                None => row.extend([String::new(), String::new()]),
            }
        }
        self.columns += 1;

        while self
            .rows
            .last()
            .is_some_and(|r| r.iter().all(String::is_empty))
        {
            self.rows.pop();
        }
        self
    }

    /// First data row's time label of the first column, if any.
    pub fn first_time_label(&self) -> Option<&str> {
        self.rows
            .get(2)
            .and_then(|r| r.first())
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}
