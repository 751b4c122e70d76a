//! The bootstrap sequence.
//!
//! Steps run strictly in order and the first failure ends the run. Nothing
//! that already happened is undone: rendered files stay on disk and
//! commands that ran stay run.
//!
//! Teardown has to happen before rendering because `down` is given the very
//! compose files the render step overwrites.

use crate::config::DevstackConfig;
use crate::env::{default_workspace, EnvironmentProjection};
use crate::render::{preview_templates, render_templates};
use crate::services::activation_list;
use crate::template::RendererCache;
use crate::util::process::{CommandLine, CommandRunner};
use devstack_types::compose::{
    file_flags, PROVISION_SCRIPT, REPO_SCRIPT, REPO_SCRIPT_MODE, STALE_LOCK_NAME, TEARDOWN_FILES,
    WATCHERS_FILE,
};
use devstack_types::{bail, Result, RunSettings};
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Where to get the orchestration CLI.
pub const COMPOSE_INSTALL_HINT: &str = "https://docs.docker.com/compose/install/";

/// A stage of the bootstrap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Check the orchestration CLI is installed
    Preflight,
    /// Read the configuration file
    Load,
    /// Derive child-process environment variables
    Environment,
    /// Pull updated images
    ImageRefresh,
    /// Bring the old stack down and drop its volumes
    Teardown,
    /// Write the compose files
    Render,
    /// Clone or update source repositories
    RepositorySync,
    /// Work out which services to provision
    ServiceSelection,
    /// Run the provisioning script
    Provision,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Preflight => "preflight",
            Step::Load => "load configuration",
            Step::Environment => "environment",
            Step::ImageRefresh => "image refresh",
            Step::Teardown => "teardown",
            Step::Render => "render templates",
            Step::RepositorySync => "repository sync",
            Step::ServiceSelection => "service selection",
            Step::Provision => "provision",
        };
        f.write_str(name)
    }
}

/// What a completed run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateReport {
    /// Steps that ran, in order
    pub completed: Vec<Step>,
    /// Compose files written
    pub rendered: Vec<PathBuf>,
    /// Services passed to the provisioning script
    pub services: Vec<String>,
}

/// Drives the bootstrap sequence through a [`CommandRunner`].
pub struct Devstack<R: CommandRunner> {
    settings: RunSettings,
    runner: R,
    cache: RendererCache,
}

impl<R: CommandRunner> Devstack<R> {
    /// Create an orchestrator.
    pub fn new(settings: RunSettings, runner: R) -> Self {
        Self {
            settings,
            runner,
            cache: RendererCache::new(),
        }
    }

    /// Settings for this run.
    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// The command runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Give back the command runner.
    pub fn into_runner(self) -> R {
        self.runner
    }

    /// Run the whole sequence.
    pub fn create(&mut self) -> Result<CreateReport> {
        let mut report = CreateReport::default();
        let steps = self.settings.steps;

        self.step(&mut report, Step::Preflight, |this| this.preflight().map(|_| ()))?;
        let config = self.step(&mut report, Step::Load, |this| this.load_config())?;
        let env = self.step(&mut report, Step::Environment, |this| this.project_environment(&config))?;

        if steps.update_images {
            self.step(&mut report, Step::ImageRefresh, |this| this.pull_images(&env))?;
        }

        if steps.destroy_old_stack {
            self.step(&mut report, Step::Teardown, |this| this.teardown(&env))?;
        }

        let rendered = self.step(&mut report, Step::Render, |this| this.render_with(&config))?;
        report.rendered = rendered;

        if steps.update_repos {
            self.step(&mut report, Step::RepositorySync, |this| this.sync_repos(&env))?;
        }

        let services = self.step(&mut report, Step::ServiceSelection, |_| activation_list(&config))?;
        self.step(&mut report, Step::Provision, |this| this.provision(&env, &services))?;
        report.services = services;

        Ok(report)
    }

    /// Load the configuration and render the compose files only.
    pub fn render(&mut self) -> Result<Vec<PathBuf>> {
        let config = self.load_config()?;
        self.render_with(&config)
    }

    /// Load the configuration and compute the service list only.
    pub fn services(&self) -> Result<Vec<String>> {
        activation_list(&self.load_config()?)
    }

    /// Make sure the orchestration CLI is on `PATH`.
    pub fn preflight(&self) -> Result<PathBuf> {
        let binary = &self.settings.compose_binary;
        match self.runner.locate(binary) {
            Some(path) => {
                info!("Found {} at {}", binary, path.display());
                Ok(path)
            }
            None => bail!(
                Environment,
                "{} is not installed. Please follow instructions from {}",
                binary,
                COMPOSE_INSTALL_HINT
            ),
        }
    }

    /// Read the configuration file.
    pub fn load_config(&self) -> Result<DevstackConfig> {
        DevstackConfig::load(&self.settings.config_file)
    }

    fn project_environment(&self, config: &DevstackConfig) -> Result<EnvironmentProjection> {
        let workspace = match &self.settings.workspace {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => std::env::current_dir()?.join(path),
            None => default_workspace(&self.settings.root_dir)?,
        };
        EnvironmentProjection::from_config(config, workspace)
    }

    fn render_with(&mut self, config: &DevstackConfig) -> Result<Vec<PathBuf>> {
        let settings = &self.settings;
        if settings.dry_run {
            preview_templates(&mut self.cache, &settings.template_root, &settings.root_dir, config)
        } else {
            render_templates(&mut self.cache, &settings.template_root, &settings.root_dir, config)
        }
    }

    fn pull_images(&mut self, env: &EnvironmentProjection) -> Result<()> {
        let raw = format!("{} pull", self.settings.compose_binary);
        self.exec(env, raw)
    }

    fn teardown(&mut self, env: &EnvironmentProjection) -> Result<()> {
        let watchers = self.settings.root_dir.join(WATCHERS_FILE);
        if !watchers.exists() {
            warn!(
                "{} is not in {}; it is maintained outside of the templates",
                WATCHERS_FILE,
                self.settings.root_dir.display()
            );
        }

        let raw = format!(
            "{} {} down -v",
            self.settings.compose_binary,
            file_flags(TEARDOWN_FILES)
        );
        self.exec(env, raw)
    }

    fn sync_repos(&mut self, env: &EnvironmentProjection) -> Result<()> {
        // Old npm lock files make repository updates fail.
        self.exec(env, format!("sudo find . -iname {} -delete", STALE_LOCK_NAME))?;
        self.exec(env, format!("sudo -E {} {}", REPO_SCRIPT, REPO_SCRIPT_MODE))
    }

    fn provision(&mut self, env: &EnvironmentProjection, services: &[String]) -> Result<()> {
        self.exec(env, format!("{} {}", PROVISION_SCRIPT, services.join(" ")))
    }

    fn exec(&mut self, env: &EnvironmentProjection, raw: String) -> Result<()> {
        let command = CommandLine::parse(raw)
            .with_envs(env.iter())
            .in_dir(&self.settings.root_dir);
        self.runner.run(&command).map(|_| ())
    }

    fn step<T>(
        &mut self,
        report: &mut CreateReport,
        step: Step,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        info!("==> {}", step);
        match f(self) {
            Ok(value) => {
                report.completed.push(step);
                Ok(value)
            }
            Err(e) => {
                error!("Step '{}' failed: {}", step, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devstack_types::{DevstackError, StepSelection};
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const CONFIG: &str = "\
OPENEDX_RELEASE: ironwood.master
ACTIVATE_ECOMMERCE: true
ACTIVATE_DISCOVERY: false
ACTIVATE_CREDENTIALS: false
ACTIVATE_CHROME: false
ACTIVATE_FIREFOX: false
ACTIVATE_FORUM: false
ACTIVATE_NOTES: false
ACTIVATE_REGISTRAR: false
";

    const TEARDOWN: &str = "docker-compose -f docker-compose.yml -f docker-compose-watchers.yml \
-f docker-compose-host.yml -f docker-compose-themes.yml down -v";

    #[derive(Debug)]
    struct Call {
        command: String,
        env: BTreeMap<String, String>,
        compose_file: Option<String>,
    }

    /// Records calls and what the compose file looked like at the time.
    struct RecordingRunner {
        root: PathBuf,
        calls: Vec<Call>,
        fail_on: Option<&'static str>,
        installed: bool,
    }

    impl RecordingRunner {
        fn new(root: &Path) -> Self {
            Self {
                root: root.to_path_buf(),
                calls: Vec::new(),
                fail_on: None,
                installed: true,
            }
        }

        fn commands(&self) -> Vec<&str> {
            self.calls.iter().map(|c| c.command.as_str()).collect()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&mut self, command: &CommandLine) -> Result<i32> {
            self.calls.push(Call {
                command: command.to_string(),
                env: command.env_vars().clone(),
                compose_file: fs::read_to_string(self.root.join("docker-compose.yml")).ok(),
            });

            match self.fail_on {
                Some(needle) if command.as_str().contains(needle) => Err(DevstackError::Command {
                    command: command.to_string(),
                    code: Some(1),
                }),
                _ => Ok(0),
            }
        }

        fn locate(&self, program: &str) -> Option<PathBuf> {
            self.installed.then(|| PathBuf::from("/usr/local/bin").join(program))
        }
    }

    fn fixture() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("devstack");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("config.yml"), CONFIG).unwrap();
        fs::write(root.join("docker-compose-watchers.yml"), "version: \"2.1\"\n").unwrap();
        fs::write(
            root.join("docker-compose.yml.template"),
            "image: edxops/edxapp:{{OPENEDX_RELEASE}}\n",
        )
        .unwrap();
        fs::write(root.join("docker-compose-host.yml.template"), "# host\n").unwrap();
        fs::write(root.join("docker-compose-themes.yml.template"), "# themes\n").unwrap();
        (temp_dir, root)
    }

    fn devstack(root: &Path, steps: StepSelection) -> Devstack<RecordingRunner> {
        Devstack::new(
            RunSettings::new(root).with_steps(steps),
            RecordingRunner::new(root),
        )
    }

    #[test]
    fn test_default_sequence() {
        let (temp_dir, root) = fixture();
        let mut devstack = devstack(&root, StepSelection::default());

        let report = devstack.create().unwrap();
        let runner = devstack.into_runner();

        assert_eq!(
            runner.commands(),
            vec![
                TEARDOWN,
                "sudo find . -iname package-json.lock -delete",
                "sudo -E ./repo.sh clone_ssh",
                "./provision.sh lms ecommerce",
            ]
        );
        assert_eq!(report.services, vec!["lms", "ecommerce"]);
        assert_eq!(report.rendered.len(), 3);
        assert!(!report.completed.contains(&Step::ImageRefresh));
        assert_eq!(report.completed.last(), Some(&Step::Provision));

        let workspace = temp_dir.path().canonicalize().unwrap();
        let env = &runner.calls[0].env;
        assert_eq!(env["DEVSTACK_WORKSPACE"], workspace.display().to_string());
        assert_eq!(env["OPENEDX_RELEASE"], "ironwood.master");
        assert_eq!(env["COMPOSE_HTTP_TIMEOUT"], "180");
    }

    #[test]
    fn test_teardown_sees_old_files_and_sync_sees_new() {
        let (_temp_dir, root) = fixture();
        fs::write(root.join("docker-compose.yml"), "stale\n").unwrap();
        let mut devstack = devstack(&root, StepSelection::default());

        devstack.create().unwrap();
        let runner = devstack.into_runner();

        assert_eq!(runner.calls[0].command, TEARDOWN);
        assert_eq!(runner.calls[0].compose_file.as_deref(), Some("stale\n"));
        assert_eq!(
            runner.calls[1].compose_file.as_deref(),
            Some("image: edxops/edxapp:ironwood.master\n")
        );
    }

    #[test]
    fn test_image_refresh_runs_first() {
        let (_temp_dir, root) = fixture();
        let steps = StepSelection {
            update_images: true,
            ..StepSelection::default()
        };
        let mut devstack = devstack(&root, steps);

        devstack.create().unwrap();
        let commands = devstack.runner().commands();
        assert_eq!(commands[0], "docker-compose pull");
        assert_eq!(commands[1], TEARDOWN);
    }

    #[test]
    fn test_optional_steps_skipped() {
        let (_temp_dir, root) = fixture();
        let steps = StepSelection {
            update_images: false,
            destroy_old_stack: false,
            update_repos: false,
        };
        let mut devstack = devstack(&root, steps);

        let report = devstack.create().unwrap();
        assert_eq!(devstack.runner().commands(), vec!["./provision.sh lms ecommerce"]);
        assert!(root.join("docker-compose-themes.yml").exists());
        assert!(!report.completed.contains(&Step::Teardown));
        assert!(!report.completed.contains(&Step::RepositorySync));
    }

    #[test]
    fn test_failure_aborts_remaining_steps() {
        let (_temp_dir, root) = fixture();
        let mut devstack = devstack(&root, StepSelection::default());
        devstack.runner.fail_on = Some("repo.sh");

        let err = devstack.create().unwrap_err();
        assert!(matches!(err, DevstackError::Command { ref command, .. } if command.contains("repo.sh")));

        let commands = devstack.runner().commands();
        assert_eq!(commands.len(), 3);
        assert!(commands.iter().all(|c| !c.starts_with("./provision.sh")));
        // Rendered files are left in place.
        assert!(root.join("docker-compose.yml").exists());
    }

    #[test]
    fn test_teardown_failure_prevents_render() {
        let (_temp_dir, root) = fixture();
        let mut devstack = devstack(&root, StepSelection::default());
        devstack.runner.fail_on = Some("down -v");

        assert!(devstack.create().unwrap_err().is_command_error());
        assert_eq!(devstack.runner().commands().len(), 1);
        assert!(!root.join("docker-compose.yml").exists());
    }

    #[test]
    fn test_missing_compose_binary() {
        let (_temp_dir, root) = fixture();
        let mut devstack = devstack(&root, StepSelection::default());
        devstack.runner.installed = false;

        let err = devstack.create().unwrap_err();
        assert!(matches!(err, DevstackError::Environment(_)));
        assert!(err.to_string().contains("docker-compose is not installed"));
        assert!(devstack.runner().calls.is_empty());
    }

    #[test]
    fn test_missing_config() {
        let (_temp_dir, root) = fixture();
        fs::remove_file(root.join("config.yml")).unwrap();
        let mut devstack = devstack(&root, StepSelection::default());

        assert!(matches!(devstack.create().unwrap_err(), DevstackError::ConfigLoad(_)));
        assert!(devstack.runner().calls.is_empty());
    }

    #[test]
    fn test_missing_flag_stops_before_provision() {
        let (_temp_dir, root) = fixture();
        fs::write(root.join("config.yml"), "OPENEDX_RELEASE: master\nACTIVATE_ECOMMERCE: false\n").unwrap();
        let mut devstack = devstack(&root, StepSelection::default());

        assert!(matches!(devstack.create().unwrap_err(), DevstackError::MissingKey(_)));
        assert!(devstack
            .runner()
            .commands()
            .iter()
            .all(|c| !c.starts_with("./provision.sh")));
    }

    #[test]
    fn test_render_and_services_alone() {
        let (_temp_dir, root) = fixture();
        let mut devstack = devstack(&root, StepSelection::default());

        assert_eq!(devstack.services().unwrap(), vec!["lms", "ecommerce"]);
        assert_eq!(devstack.render().unwrap().len(), 3);
        assert!(devstack.runner().calls.is_empty());
    }

    #[test]
    fn test_dry_run_leaves_compose_files_alone() {
        let (_temp_dir, root) = fixture();
        fs::write(root.join("docker-compose-host.yml"), "previous\n").unwrap();
        let settings = RunSettings::new(&root).with_dry_run(true);
        let mut devstack = Devstack::new(settings, RecordingRunner::new(&root));

        let report = devstack.create().unwrap();

        assert_eq!(report.rendered.len(), 3);
        assert!(report.completed.contains(&Step::Render));
        assert!(!root.join("docker-compose.yml").exists());
        assert!(!root.join("docker-compose-themes.yml").exists());
        assert_eq!(fs::read_to_string(root.join("docker-compose-host.yml")).unwrap(), "previous\n");
        assert!(devstack.runner().calls.iter().all(|c| c.compose_file.is_none()));
    }

    #[test]
    fn test_pinned_workspace() {
        let (_temp_dir, root) = fixture();
        let settings = RunSettings::new(&root)
            .with_workspace("/opt/edx")
            .with_steps(StepSelection {
                update_images: false,
                destroy_old_stack: false,
                update_repos: false,
            });
        let mut devstack = Devstack::new(settings, RecordingRunner::new(&root));

        devstack.create().unwrap();
        assert_eq!(devstack.runner().calls[0].env["DEVSTACK_WORKSPACE"], "/opt/edx");
    }
}
