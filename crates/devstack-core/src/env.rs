//! Environment variables exported to every external command.

use crate::config::{DevstackConfig, RELEASE_KEY};
use devstack_types::compose::{file_flags, COMPOSE_HTTP_TIMEOUT, RENDERED_FILES};
use devstack_types::{DevstackError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Directory holding the source repositories.
pub const WORKSPACE_VAR: &str = "DEVSTACK_WORKSPACE";
/// Compose `-f` flags for the rendered files.
pub const COMPOSE_FILES_VAR: &str = "DOCKER_COMPOSE_FILES";
/// Compose client timeout.
pub const COMPOSE_TIMEOUT_VAR: &str = "COMPOSE_HTTP_TIMEOUT";

/// Variables derived from the configuration for child processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentProjection {
    vars: BTreeMap<String, String>,
}

impl EnvironmentProjection {
    /// Project the configuration. `workspace` must be absolute.
    pub fn from_config(config: &DevstackConfig, workspace: impl AsRef<Path>) -> Result<Self> {
        let workspace = workspace.as_ref();
        if !workspace.is_absolute() {
            return Err(DevstackError::Bug(format!(
                "workspace {} is not absolute",
                workspace.display()
            )));
        }

        let mut vars = BTreeMap::new();
        vars.insert(WORKSPACE_VAR.to_string(), workspace.display().to_string());
        vars.insert(RELEASE_KEY.to_string(), config.release()?);
        vars.insert(COMPOSE_FILES_VAR.to_string(), file_flags(RENDERED_FILES));
        vars.insert(COMPOSE_TIMEOUT_VAR.to_string(), COMPOSE_HTTP_TIMEOUT.to_string());

        Ok(Self { vars })
    }

    /// Value of one variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// All variables, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The workspace is the directory containing the devstack checkout.
pub fn default_workspace(root_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let root = root_dir.as_ref().canonicalize()?;
    Ok(root.parent().map(Path::to_path_buf).unwrap_or(root))
}
