//! Stage directory discovery under a run root.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;
use wp_common::{Error, Result};
use wp_config::Workflow;

// e.g. "run.20140115..bwa_aln.1" -> "bwa_aln"
static PROCESS_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"run\..+\.\.(.+)\.").expect("process name regex"));

/// A workflow stage bound to the directory holding its logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDir {
    pub label: String,
    pub pattern: String,
    pub path: PathBuf,
}

/// Sub-directories of `root`, sorted by name.
fn sorted_subdirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Bind every stage of `workflow` to a directory under `root`.
///
/// Iterates the workflow's patterns in order; the first directory (by name)
/// whose name contains a pattern wins. All unmatched patterns are reported
/// together.
pub fn discover_stages(root: &Path, workflow: &Workflow) -> Result<Vec<StageDir>> {
    let dirs = sorted_subdirs(root)?;
    let mut found = Vec::with_capacity(workflow.stages.len());
    let mut missing = Vec::new();

    for stage in &workflow.stages {
        let hit = dirs.iter().find(|d| {
            d.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(&stage.pattern))
        });
        match hit {
            Some(path) => {
                debug!(stage = %stage.label, dir = %path.display(), "stage directory found");
                found.push(StageDir {
                    label: stage.label.clone(),
                    pattern: stage.pattern.clone(),
                    path: path.clone(),
                });
            }
            None => missing.push(stage.pattern.clone()),
        }
    }

    if !missing.is_empty() {
        return Err(Error::StageDirectoryNotFound {
            root: root.to_path_buf(),
            patterns: missing,
        });
    }
    Ok(found)
}

/// Process name embedded in the first entry under `root`, if it follows the
/// `run.<id>..<process>.<n>` naming convention.
pub fn process_name(root: &Path) -> Option<String> {
    let mut entries: Vec<String> = fs::read_dir(root)
        .ok()?
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    entries.sort();
    let first = entries.first()?;
    PROCESS_NAME_RE
        .captures(first)
        .map(|c| c[1].to_string())
}
