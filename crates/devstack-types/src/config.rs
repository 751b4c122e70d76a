//! Run settings: where things live and which optional steps to perform.

use std::path::{Path, PathBuf};

/// Default configuration file name, relative to the devstack root.
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

/// Default orchestration binary.
pub const DEFAULT_COMPOSE_BINARY: &str = "docker-compose";

/// Which of the optional bootstrap steps to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSelection {
    /// Pull updated images before anything else
    pub update_images: bool,
    /// Tear down the existing stack and its volumes
    pub destroy_old_stack: bool,
    /// Clone or update the source repositories
    pub update_repos: bool,
}

impl Default for StepSelection {
    fn default() -> Self {
        Self {
            update_images: false,
            destroy_old_stack: true,
            update_repos: true,
        }
    }
}

/// Settings for one bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Devstack checkout: scripts run here and rendered files land here
    pub root_dir: PathBuf,

    /// YAML configuration file
    pub config_file: PathBuf,

    /// Directory templates are resolved against
    pub template_root: PathBuf,

    /// Directory holding the source repositories.
    /// Defaults to the parent of `root_dir`.
    pub workspace: Option<PathBuf>,

    /// Orchestration CLI checked in preflight and used for pull/down
    pub compose_binary: String,

    /// Optional steps
    pub steps: StepSelection,

    /// Log commands and rendered files instead of running or writing them
    pub dry_run: bool,
}

fn default_compose_binary() -> String {
    DEFAULT_COMPOSE_BINARY.to_string()
}

impl RunSettings {
    /// Settings rooted at `root_dir` with every other value defaulted.
    pub fn new(root_dir: impl AsRef<Path>) -> Self {
        let root_dir = root_dir.as_ref().to_path_buf();
        Self {
            config_file: root_dir.join(DEFAULT_CONFIG_FILE),
            template_root: root_dir.clone(),
            root_dir,
            workspace: None,
            compose_binary: default_compose_binary(),
            steps: StepSelection::default(),
            dry_run: false,
        }
    }

    /// Use a different configuration file.
    pub fn with_config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_file = path.as_ref().to_path_buf();
        self
    }

    /// Use a different template root.
    pub fn with_template_root(mut self, path: impl AsRef<Path>) -> Self {
        self.template_root = path.as_ref().to_path_buf();
        self
    }

    /// Pin the workspace directory.
    pub fn with_workspace(mut self, path: impl AsRef<Path>) -> Self {
        self.workspace = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use a different orchestration binary.
    pub fn with_compose_binary(mut self, binary: impl Into<String>) -> Self {
        self.compose_binary = binary.into();
        self
    }

    /// Choose optional steps.
    pub fn with_steps(mut self, steps: StepSelection) -> Self {
        self.steps = steps;
        self
    }

    /// Preview the run without touching the filesystem or the stack.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
