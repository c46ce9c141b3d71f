//! Exit codes for the wp-core CLI.
//!
//! Exit codes communicate the run outcome without requiring log parsing.

use wp_common::Error;

/// Exit codes for wp-core operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// All outputs written from fully resampled data
    Clean = 0,

    /// Outputs written, but a column fell back to raw samples or a plot failed
    Degraded = 1,

    /// Bad arguments, unknown workflow, or unreadable registry
    ConfigError = 10,

    /// A stage pattern matched no directory
    StageNotFound = 11,

    /// A stage directory has no log for a requested metric
    MissingLog = 12,

    /// A log produced no samples or could not be parsed
    EmptySeries = 13,

    /// Timestamps could not be repaired
    CorruptTimestamps = 14,

    /// Log decoder or workflow program failed
    ExternalTool = 15,

    /// I/O error
    IoError = 20,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Config(_) | Error::UnknownWorkflow { .. } | Error::InvalidSingleStage { .. } => {
                ExitCode::ConfigError
            }
            Error::StageDirectoryNotFound { .. } => ExitCode::StageNotFound,
            Error::MissingLogFile { .. } => ExitCode::MissingLog,
            Error::EmptyDataSeries { .. } | Error::MalformedLog { .. } => ExitCode::EmptySeries,
            Error::FatalTimestampCorruption { .. } => ExitCode::CorruptTimestamps,
            Error::Decode { .. } | Error::WorkflowFailed(_) => ExitCode::ExternalTool,
            Error::Output(_) | Error::Io(_) => ExitCode::IoError,
        }
    }
}
