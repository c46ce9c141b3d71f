//! Workflow profiler configuration loading and validation.
//!
//! This crate provides:
//! - The typed workflow registry (name → ordered stages)
//! - Registry resolution (CLI → env → XDG → built-ins)
//! - Run setting defaults and validation

pub mod resolve;
pub mod settings;
pub mod workflow;

pub use resolve::{RegistryPaths, RegistrySource, REGISTRY_ENV};
pub use settings::{
    sampling_warnings, validate_output_root, validate_window, DEFAULT_SAMPLING_INTERVAL_SECS,
    DEFAULT_WINDOW_SECS,
};
pub use workflow::{Stage, Workflow, WorkflowRegistry, DEFAULT_WORKFLOW};

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("workflow '{0}' has no stages")]
    EmptyWorkflow(String),

    #[error("stage '{label}' of workflow '{workflow}' has an empty pattern")]
    EmptyPattern { workflow: String, label: String },

    #[error("unknown workflow '{name}' (known: {known})")]
    UnknownWorkflow { name: String, known: String },

    #[error("single step '{pattern}' is not a stage pattern of workflow '{workflow}'")]
    InvalidSingleStage { workflow: String, pattern: String },

    #[error("{0}")]
    Invalid(String),
}

impl From<ConfigError> for wp_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownWorkflow { name, known } => {
                wp_common::Error::UnknownWorkflow { name, known }
            }
            ConfigError::InvalidSingleStage { workflow, pattern } => {
                wp_common::Error::InvalidSingleStage { workflow, pattern }
            }
            other => wp_common::Error::Config(other.to_string()),
        }
    }
}
