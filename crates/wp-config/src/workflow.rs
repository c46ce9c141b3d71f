//! Workflow registry: the ordered stage list for each known workflow.
//!
//! A workflow maps to an ordered list of `(label, pattern)` pairs. The label
//! names the stage in CSV headers and plot titles. The pattern is a substring
//! of the stage's output directory name under a run root.
//!
//! The registry always contains the built-in `sample` workflow. Additional
//! workflows are loaded from a TOML (or JSON) file:
//!
//! ```toml
//! [workflows.dna]
//! stages = [
//!     { label = "Alignment", pattern = "bwa_aln" },
//!     { label = "Sorting", pattern = "sort" },
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::ConfigError;

/// Name of the built-in workflow used when none is requested.
pub const DEFAULT_WORKFLOW: &str = "sample";

// ── Types ───────────────────────────────────────────────────────────────

/// One stage of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Human-readable stage name.
    pub label: String,
    /// Substring that identifies the stage's directory.
    pub pattern: String,
}

impl Stage {
    pub fn new(label: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            pattern: pattern.into(),
        }
    }
}

/// A named workflow with its stages in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub stages: Vec<Stage>,
}

impl Workflow {
    /// Restrict the workflow to the single stage whose pattern equals `pattern`.
    pub fn single_stage(&self, pattern: &str) -> Result<Workflow, ConfigError> {
        let stage = self
            .stages
            .iter()
            .find(|s| s.pattern == pattern)
            .cloned()
            .ok_or_else(|| ConfigError::InvalidSingleStage {
                workflow: self.name.clone(),
                pattern: pattern.to_string(),
            })?;
        Ok(Workflow {
            name: self.name.clone(),
            stages: vec![stage],
        })
    }

    pub fn labels(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.label.as_str()).collect()
    }
}

/// On-disk shape of a registry file.
#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    workflows: BTreeMap<String, WorkflowDef>,
}

#[derive(Debug, Deserialize)]
struct WorkflowDef {
    stages: Vec<Stage>,
}

/// Mapping from workflow name to its definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRegistry {
    workflows: BTreeMap<String, Workflow>,
}

// ── Registry ────────────────────────────────────────────────────────────

impl Default for WorkflowRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WorkflowRegistry {
    /// Registry holding only the built-in workflows.
    pub fn builtin() -> Self {
        let sample = Workflow {
            name: DEFAULT_WORKFLOW.to_string(),
            stages: vec![
                Stage::new("Stage1", "stage1"),
                Stage::new("Stage2", "stage2"),
                Stage::new("Stage3", "stage3"),
            ],
        };
        let mut workflows = BTreeMap::new();
        workflows.insert(sample.name.clone(), sample);
        Self { workflows }
    }

    /// Parse registry TOML and merge it over the built-ins.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let file: RegistryFile = toml::from_str(text)?;
        Self::builtin().merged(file)
    }

    /// Parse registry JSON and merge it over the built-ins.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let file: RegistryFile = serde_json::from_str(text)?;
        Self::builtin().merged(file)
    }

    /// Load a registry file; `.json` files are parsed as JSON, anything else as TOML.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&text),
            _ => Self::from_toml(&text),
        }
    }

    fn merged(mut self, file: RegistryFile) -> Result<Self, ConfigError> {
        for (name, def) in file.workflows {
            if def.stages.is_empty() {
                return Err(ConfigError::EmptyWorkflow(name));
            }
            if let Some(stage) = def.stages.iter().find(|s| s.pattern.is_empty()) {
                return Err(ConfigError::EmptyPattern {
                    workflow: name,
                    label: stage.label.clone(),
                });
            }
            self.workflows.insert(
                name.clone(),
                Workflow {
                    name,
                    stages: def.stages,
                },
            );
        }
        Ok(self)
    }

    /// Look up a workflow by name.
    pub fn get(&self, name: &str) -> Result<&Workflow, ConfigError> {
        self.workflows
            .get(name)
            .ok_or_else(|| ConfigError::UnknownWorkflow {
                name: name.to_string(),
                known: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<String> {
        self.workflows.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_sample_has_three_ordered_stages() {
        let reg = WorkflowRegistry::builtin();
        let wf = reg.get("sample").unwrap();
        assert_eq!(wf.labels(), vec!["Stage1", "Stage2", "Stage3"]);
        assert_eq!(wf.stages[2].pattern, "stage3");
    }

    #[test]
    fn toml_workflows_merge_over_builtins() {
        let reg = WorkflowRegistry::from_toml(
            r#"
            [workflows.dna]
            stages = [
                { label = "Align", pattern = "bwa" },
                { label = "Sort", pattern = "sort" },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(reg.names(), vec!["dna".to_string(), "sample".to_string()]);
        let dna = reg.get("dna").unwrap();
        assert_eq!(dna.stages[0], Stage::new("Align", "bwa"));
    }

    #[test]
    fn toml_can_override_sample() {
        let reg = WorkflowRegistry::from_toml(
            r#"
            [workflows.sample]
            stages = [{ label = "Only", pattern = "only" }]
            "#,
        )
        .unwrap();
        assert_eq!(reg.get("sample").unwrap().stages.len(), 1);
    }

    #[test]
    fn json_registry_is_accepted() {
        let reg = WorkflowRegistry::from_json(
            r#"{"workflows": {"rna": {"stages": [{"label": "Map", "pattern": "star"}]}}}"#,
        )
        .unwrap();
        assert_eq!(reg.get("rna").unwrap().labels(), vec!["Map"]);
    }

    #[test]
    fn empty_stage_list_is_rejected() {
        let err = WorkflowRegistry::from_toml("[workflows.bad]\nstages = []\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyWorkflow(ref n) if n == "bad"));
    }

    #[test]
    fn unknown_workflow_lists_known_names() {
        let err = WorkflowRegistry::builtin().get("nope").unwrap_err();
        assert!(err.to_string().contains("sample"));
    }

    #[test]
    fn single_stage_requires_exact_pattern() {
        let reg = WorkflowRegistry::builtin();
        let wf = reg.get("sample").unwrap();
        let one = wf.single_stage("stage2").unwrap();
        assert_eq!(one.labels(), vec!["Stage2"]);
        assert!(wf.single_stage("stage").is_err());
    }

    #[test]
    fn load_from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workflows.toml");
        std::fs::write(
            &path,
            "[workflows.demo]\nstages = [{ label = \"A\", pattern = \"a\" }]\n",
        )
        .unwrap();
        let reg = WorkflowRegistry::load_from_file(&path).unwrap();
        assert!(reg.get("demo").is_ok());
    }
}
