//! Table serialization and atomic file emission.

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use wp_common::{Error, Result};

use super::table::Table;

/// Format of the per-run stamp prefixed to CSV names.
pub const RUN_STAMP_FORMAT: &str = "%Y-%m-%d_%H.%M.%S";

/// `{stamp}_{metric}.csv`
pub fn csv_file_name(run_stamp: &str, metric: &str) -> String {
    format!("{run_stamp}_{metric}.csv")
}

/// Write `contents` to `path` via a temp file in the same directory and a rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::Output(format!("{} has no parent directory", path.display())))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".wp-partial-")
        .tempfile_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path)
        .map_err(|e| Error::Output(format!("failed to persist {}: {}", path.display(), e.error)))?;
    Ok(())
}

/// Serialize `table`: the title record, then every row.
pub fn table_to_csv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    let to_output = |e: csv::Error| Error::Output(e.to_string());

    writer.write_record([table.title()]).map_err(to_output)?;
    for row in table.rows() {
        writer.write_record(row).map_err(to_output)?;
    }
    writer
        .into_inner()
        .map_err(|e| Error::Output(e.to_string()))
}

/// Write `table` as `{run_stamp}_{metric}.csv` in `output_dir`.
pub fn write_csv(table: &Table, output_dir: &Path, metric: &str, run_stamp: &str) -> Result<PathBuf> {
    let path = output_dir.join(csv_file_name(run_stamp, metric));
    write_atomic(&path, &table_to_csv(table)?)?;
    info!(metric, path = %path.display(), rows = table.rows().len(), "wrote table");
    Ok(path)
}
