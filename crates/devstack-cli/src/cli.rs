//! CLI structure and command definitions.

use anyhow::Result;
use clap::{Parser, Subcommand};
use devstack_core::util::expand_path;
use devstack_types::config::DEFAULT_COMPOSE_BINARY;
use devstack_types::{RunSettings, StepSelection};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "create-devstack")]
#[command(version = devstack_core::VERSION)]
#[command(about = "Render compose files and provision a local Open edX devstack", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Devstack checkout to work in
    #[arg(long, global = true, env = "DEVSTACK_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Configuration file [default: <root>/config.yml]
    #[arg(short, long, global = true, env = "DEVSTACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the *.template files [default: <root>]
    #[arg(long, global = true)]
    pub templates: Option<PathBuf>,

    /// Directory holding the source repositories [default: parent of <root>]
    #[arg(long, global = true, env = "DEVSTACK_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Orchestration CLI to use
    #[arg(long, global = true, default_value = DEFAULT_COMPOSE_BINARY)]
    pub compose_bin: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tear down, re-render, sync repositories, and provision (the default)
    Create {
        /// Pull updated images first
        #[arg(long)]
        update_images: bool,

        /// Leave the running stack and its volumes alone
        #[arg(long)]
        keep_stack: bool,

        /// Do not clone or update source repositories
        #[arg(long)]
        skip_repos: bool,

        /// Log commands and rendered files instead of running or writing them
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Render the compose files only
    Render,

    /// Print the services that would be provisioned
    Services,
}

impl Cli {
    /// Run settings assembled from the global flags.
    pub fn settings(&self, steps: StepSelection) -> RunSettings {
        let mut settings = RunSettings::new(expand_path(&self.root))
            .with_compose_binary(self.compose_bin.clone())
            .with_steps(steps);

        if let Some(config) = &self.config {
            settings = settings.with_config_file(expand_path(config));
        }
        if let Some(templates) = &self.templates {
            settings = settings.with_template_root(expand_path(templates));
        }
        if let Some(workspace) = &self.workspace {
            settings = settings.with_workspace(expand_path(workspace));
        }

        settings
    }

    pub fn execute(&self) -> Result<()> {
        use crate::commands::*;

        match &self.command {
            None => create::execute(self.settings(StepSelection::default())),
            Some(Commands::Create {
                update_images,
                keep_stack,
                skip_repos,
                dry_run,
            }) => {
                let steps = StepSelection {
                    update_images: *update_images,
                    destroy_old_stack: !*keep_stack,
                    update_repos: !*skip_repos,
                };
                create::execute(self.settings(steps).with_dry_run(*dry_run))
            }
            Some(Commands::Render) => render::execute(self.settings(StepSelection::default())),
            Some(Commands::Services) => services::execute(self.settings(StepSelection::default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_flags_map_to_steps() {
        let cli = Cli::parse_from([
            "create-devstack",
            "--root",
            "/srv/devstack",
            "create",
            "--update-images",
            "--keep-stack",
        ]);

        let Some(Commands::Create { update_images, keep_stack, skip_repos, dry_run }) = &cli.command else {
            panic!("expected create");
        };
        assert!(*update_images && *keep_stack && !*skip_repos && !*dry_run);

        let settings = cli.settings(StepSelection::default());
        assert_eq!(settings.config_file, PathBuf::from("/srv/devstack/config.yml"));
        assert_eq!(settings.compose_binary, "docker-compose");
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "create-devstack",
            "services",
            "--root",
            "/srv/devstack",
            "--config",
            "/etc/devstack.yml",
            "--templates",
            "/srv/templates",
            "--compose-bin",
            "docker-compose-v1",
        ]);

        let settings = cli.settings(StepSelection::default());
        assert_eq!(settings.config_file, PathBuf::from("/etc/devstack.yml"));
        assert_eq!(settings.template_root, PathBuf::from("/srv/templates"));
        assert_eq!(settings.compose_binary, "docker-compose-v1");
    }
}
