//! Error types for the workflow profiler.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for workflow profiler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the workflow profiler.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown workflow '{name}' (known: {known})")]
    UnknownWorkflow { name: String, known: String },

    #[error("single step '{pattern}' is not a stage pattern of workflow '{workflow}'")]
    InvalidSingleStage { workflow: String, pattern: String },

    // Discovery errors (20-29)
    #[error("no stage directory under {root} matches pattern(s): {}", patterns.join(", "))]
    StageDirectoryNotFound { root: PathBuf, patterns: Vec<String> },

    #[error("no log file containing '{token}' in {stage_dir}")]
    MissingLogFile { stage_dir: PathBuf, token: String },

    // Series errors (30-39)
    #[error("{metric} log for stage {stage} yielded no timestamp/value pairs")]
    EmptyDataSeries { metric: String, stage: String },

    #[error("{metric} log for stage {stage} is malformed: {reason}")]
    MalformedLog {
        metric: String,
        stage: String,
        reason: String,
    },

    #[error("unrepairable timestamps in {metric} for stage {stage}: {detail}")]
    FatalTimestampCorruption {
        metric: String,
        stage: String,
        detail: String,
    },

    // External tool errors (40-49)
    #[error("log decoder '{program}' failed: {reason}")]
    Decode { program: String, reason: String },

    #[error("workflow program failed: {0}")]
    WorkflowFailed(String),

    // Output and I/O errors (60-69)
    #[error("failed to write output: {0}")]
    Output(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the error code for this error type.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::UnknownWorkflow { .. } => 11,
            Error::InvalidSingleStage { .. } => 12,
            Error::StageDirectoryNotFound { .. } => 20,
            Error::MissingLogFile { .. } => 21,
            Error::EmptyDataSeries { .. } => 30,
            Error::MalformedLog { .. } => 31,
            Error::FatalTimestampCorruption { .. } => 32,
            Error::Decode { .. } => 40,
            Error::WorkflowFailed(_) => 41,
            Error::Output(_) => 60,
            Error::Io(_) => 61,
        }
    }
}
