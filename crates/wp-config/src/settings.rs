//! Numeric run settings and their validation rules.

use std::path::Path;

use crate::ConfigError;

/// Default resample window in seconds.
pub const DEFAULT_WINDOW_SECS: u32 = 100;

/// Default collection interval handed to the workflow program.
pub const DEFAULT_SAMPLING_INTERVAL_SECS: u32 = 30;

/// Recommended collection interval bounds.
pub const SAMPLING_INTERVAL_RANGE: std::ops::RangeInclusive<u32> = 5..=120;

/// Longest output root accepted by `profile`; the collectors embed it in file names.
pub const MAX_OUTPUT_ROOT_LEN: usize = 100;

/// Reject a zero window; everything else is accepted.
pub fn validate_window(window_secs: u32) -> Result<u32, ConfigError> {
    if window_secs == 0 {
        return Err(ConfigError::Invalid("window must be at least 1 second".into()));
    }
    Ok(window_secs)
}

/// Advisory warnings for a collection interval / window combination.
pub fn sampling_warnings(interval_secs: u32, window_secs: u32) -> Vec<String> {
    let mut warnings = Vec::new();
    if !SAMPLING_INTERVAL_RANGE.contains(&interval_secs) {
        warnings.push(format!(
            "sampling interval {interval_secs}s is outside the preferred {}s..{}s range",
            SAMPLING_INTERVAL_RANGE.start(),
            SAMPLING_INTERVAL_RANGE.end()
        ));
    }
    if window_secs <= 2 * interval_secs {
        warnings.push(format!(
            "sliding window {window_secs}s should be more than twice the sampling interval {interval_secs}s"
        ));
    }
    warnings
}

/// Check the output root handed to `profile`.
pub fn validate_output_root(path: &Path) -> Result<(), ConfigError> {
    if !path.is_dir() {
        return Err(ConfigError::Invalid(format!(
            "output directory '{}' is not a directory",
            path.display()
        )));
    }
    let len = path.as_os_str().len();
    if len > MAX_OUTPUT_ROOT_LEN {
        return Err(ConfigError::Invalid(format!(
            "output directory path is {len} characters; at most {MAX_OUTPUT_ROOT_LEN} are allowed"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_window_is_rejected() {
        assert!(validate_window(0).is_err());
        assert_eq!(validate_window(DEFAULT_WINDOW_SECS).unwrap(), 100);
    }

    #[test]
    fn defaults_produce_no_warnings() {
        assert!(sampling_warnings(DEFAULT_SAMPLING_INTERVAL_SECS, DEFAULT_WINDOW_SECS).is_empty());
    }

    #[test]
    fn narrow_window_and_odd_interval_warn() {
        let w = sampling_warnings(2, 4);
        assert_eq!(w.len(), 2);
    }

    #[test]
    fn overlong_output_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut deep = dir.path().to_path_buf();
        while deep.as_os_str().len() <= MAX_OUTPUT_ROOT_LEN {
            deep.push("nested_directory_level");
        }
        std::fs::create_dir_all(&deep).unwrap();
        assert!(validate_output_root(&deep).is_err());
        if dir.path().as_os_str().len() <= MAX_OUTPUT_ROOT_LEN {
            assert!(validate_output_root(dir.path()).is_ok());
        }
    }
}
