//! Logging setup: a `parser.log` file in the output directory plus warnings on stderr.

use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::rolling;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use wp_common::{Error, Result};

/// File name of the run log.
pub const LOG_FILE_NAME: &str = "parser.log";

/// Verbosity accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

/// Install the global subscriber writing to `output_dir/parser.log`.
///
/// `RUST_LOG` overrides `level` for the file layer. Returns the log path.
pub fn init_logging(output_dir: &Path, level: LogLevel) -> Result<PathBuf> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let file_appender = rolling::never(output_dir, LOG_FILE_NAME);
    let file_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_level(true)
        .with_timer(SystemTime)
        .with_ansi(false)
        .with_writer(file_appender)
        .with_filter(filter);

    let stderr_layer = fmt::layer()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to set tracing subscriber: {e}")))?;

    let path = output_dir.join(LOG_FILE_NAME);
    tracing::debug!(path = %path.display(), "logging initialized");
    Ok(path)
}

/// Remove the run log if nothing was written to it. Returns whether it was removed.
pub fn remove_if_empty(log_path: &Path) -> bool {
    if !fs::metadata(log_path).is_ok_and(|m| m.len() == 0) {
        return false;
    }
    match fs::remove_file(log_path) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(path = %log_path.display(), error = %e, "failed to remove empty log");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join(LOG_FILE_NAME);
        fs::write(&log, "").unwrap();
        assert!(remove_if_empty(&log));
        assert!(!log.exists());
    }

    #[test]
    fn non_empty_log_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join(LOG_FILE_NAME);
        fs::write(&log, "INFO stage statistics\n").unwrap();
        assert!(!remove_if_empty(&log));
        assert!(log.exists());
    }

    #[test]
    fn missing_log_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!remove_if_empty(&dir.path().join(LOG_FILE_NAME)));
    }
}
