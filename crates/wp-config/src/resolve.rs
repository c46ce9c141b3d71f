//! Registry file resolution (CLI → env → XDG → built-ins).

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{ConfigError, WorkflowRegistry};

/// Environment variable naming a workflow registry file.
pub const REGISTRY_ENV: &str = "WP_WORKFLOWS";

/// File name looked up under the user's config directory.
pub const REGISTRY_FILE_NAME: &str = "workflows.toml";

/// Where the active registry came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    Cli(PathBuf),
    Env(PathBuf),
    UserConfig(PathBuf),
    Builtin,
}

/// Candidate locations for a registry file, in precedence order.
#[derive(Debug, Clone, Default)]
pub struct RegistryPaths {
    pub cli: Option<PathBuf>,
    pub env: Option<PathBuf>,
    pub user_config: Option<PathBuf>,
}

impl RegistryPaths {
    /// Gather candidates from the CLI flag, the environment, and the XDG config dir.
    pub fn discover(cli: Option<&Path>) -> Self {
        let env = std::env::var_os(REGISTRY_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let user_config = dirs::config_dir()
            .map(|d| d.join("workflow-profiler").join(REGISTRY_FILE_NAME))
            .filter(|p| p.is_file());
        Self {
            cli: cli.map(Path::to_path_buf),
            env,
            user_config,
        }
    }

    /// Load the highest-precedence registry.
    ///
    /// Explicit paths (CLI, env) must exist; the XDG path is only used when present.
    pub fn resolve(&self) -> Result<(WorkflowRegistry, RegistrySource), ConfigError> {
        if let Some(path) = &self.cli {
            debug!(path = %path.display(), "loading workflow registry from --workflows");
            return Ok((
                WorkflowRegistry::load_from_file(path)?,
                RegistrySource::Cli(path.clone()),
            ));
        }
        if let Some(path) = &self.env {
            debug!(path = %path.display(), "loading workflow registry from {REGISTRY_ENV}");
            return Ok((
                WorkflowRegistry::load_from_file(path)?,
                RegistrySource::Env(path.clone()),
            ));
        }
        if let Some(path) = &self.user_config {
            debug!(path = %path.display(), "loading workflow registry from user config");
            return Ok((
                WorkflowRegistry::load_from_file(path)?,
                RegistrySource::UserConfig(path.clone()),
            ));
        }
        Ok((WorkflowRegistry::builtin(), RegistrySource::Builtin))
    }
}
