//! Raw log extraction: locate a metric's log in a stage directory and read it.
//!
//! Some monitors (sysstat's `sar`) store binary capture files. Those are run
//! through a [`LogDecoder`] into a transient text file in the output
//! directory, read, and removed again.
//!
//! # Temp file hygiene
//! - The transient file is a `tempfile` handle named `decoded_*`, so it is
//!   removed when dropped on both success and error paths
//! - Files with `decoded` in their name are never picked as raw logs

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};
use wp_common::{Error, Result};

use crate::grammar::Metric;

/// Marker excluded from raw log selection.
pub const DECODED_MARKER: &str = "decoded";

// ---------------------------------------------------------------------------
// Decoders
// ---------------------------------------------------------------------------

/// Converts a binary monitor capture into text.
pub trait LogDecoder {
    /// Decode `source` with tool-specific `flags`, writing text into `dest`.
    fn decode(&self, source: &Path, flags: &[&str], dest: File) -> Result<()>;
}

/// Runs `sar --legacy -f <source> <flags>` with stdout redirected to the destination.
#[derive(Debug, Clone)]
pub struct SarDecoder {
    program: String,
}

impl Default for SarDecoder {
    fn default() -> Self {
        Self {
            program: "sar".to_string(),
        }
    }
}

impl LogDecoder for SarDecoder {
    fn decode(&self, source: &Path, flags: &[&str], dest: File) -> Result<()> {
        debug!(program = %self.program, source = %source.display(), ?flags, "decoding log");
        let output = Command::new(&self.program)
            .arg("--legacy")
            .arg("-f")
            .arg(source)
            .args(flags)
            .stdout(Stdio::from(dest))
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::Decode {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Decode {
                program: self.program.clone(),
                reason: format!("exited with {}: {}", output.status, stderr.trim()),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Locates and reads the raw log lines for one stage and metric.
pub struct RawSeriesExtractor {
    decoder: Option<Box<dyn LogDecoder>>,
    scratch_dir: PathBuf,
}

impl RawSeriesExtractor {
    /// `scratch_dir` receives transient decoded files; `decoder` is `None`
    /// when logs are already text.
    pub fn new(scratch_dir: impl Into<PathBuf>, decoder: Option<Box<dyn LogDecoder>>) -> Self {
        Self {
            decoder,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Ordered lines of `metric`'s log in `stage_dir`.
    pub fn extract(&self, stage_dir: &Path, metric: Metric) -> Result<Vec<String>> {
        let source = find_log_file(stage_dir, metric.search_token())?;
        let bytes = match (metric.decode_flags(), &self.decoder) {
            (Some(flags), Some(decoder)) => {
                self.decode_to_bytes(decoder.as_ref(), &source, metric, flags)?
            }
            _ => fs::read(&source)?,
        };
        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect())
    }

    fn decode_to_bytes(
        &self,
        decoder: &dyn LogDecoder,
        source: &Path,
        metric: Metric,
        flags: &[&str],
    ) -> Result<Vec<u8>> {
        let transient = tempfile::Builder::new()
            .prefix(&format!("{DECODED_MARKER}_{}_", metric.name()))
            .suffix(".txt")
            .tempfile_in(&self.scratch_dir)?;
        decoder.decode(source, flags, transient.reopen()?)?;
        let bytes = fs::read(transient.path())?;
        if let Err(e) = transient.close() {
            warn!(error = %e, "failed to remove decoded log");
        }
        Ok(bytes)
    }
}

/// The log in `dir` whose name contains `token` and not the decoded marker.
pub fn find_log_file(dir: &Path, token: &str) -> Result<PathBuf> {
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            name.contains(token) && !name.contains(DECODED_MARKER)
        })
        .map(|e| e.path())
        .collect();
    matches.sort();

    if matches.len() > 1 {
        warn!(
            dir = %dir.display(),
            token,
            candidates = matches.len(),
            "several logs match; using the first by name"
        );
    }
    matches
        .into_iter()
        .next()
        .ok_or_else(|| Error::MissingLogFile {
            stage_dir: dir.to_path_buf(),
            token: token.to_string(),
        })
}
