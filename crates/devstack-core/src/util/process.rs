//! Process execution utilities.
//!
//! Commands run one at a time with the child's stdout and stderr connected
//! straight to ours. A run returns only once the child has exited.

use devstack_types::{DevstackError, Result};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::info;

/// How a command string is turned into a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMode {
    /// Split on whitespace into program and arguments
    Argv,
    /// Hand the whole string to `sh -c`
    Shell,
}

/// A command to run, with the environment its child should see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    raw: String,
    mode: InvocationMode,
    env_vars: BTreeMap<String, String>,
    current_dir: Option<PathBuf>,
}

impl CommandLine {
    /// A command run as an argument vector.
    pub fn parse(raw: impl Into<String>) -> Self {
        Self::with_mode(raw, InvocationMode::Argv)
    }

    /// A command interpreted by the shell.
    pub fn shell(raw: impl Into<String>) -> Self {
        Self::with_mode(raw, InvocationMode::Shell)
    }

    fn with_mode(raw: impl Into<String>, mode: InvocationMode) -> Self {
        Self {
            raw: raw.into(),
            mode,
            env_vars: BTreeMap::new(),
            current_dir: None,
        }
    }

    /// Add an environment variable for the child.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Add several environment variables for the child.
    pub fn with_envs<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Run the child in `dir`.
    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// The command string as requested.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Invocation mode.
    pub fn mode(&self) -> InvocationMode {
        self.mode
    }

    /// Environment variables set on the child.
    pub fn env_vars(&self) -> &BTreeMap<String, String> {
        &self.env_vars
    }

    /// Working directory of the child, if pinned.
    pub fn current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Program and arguments as they will be passed to the OS.
    pub fn argv(&self) -> Vec<&str> {
        match self.mode {
            InvocationMode::Argv => self.raw.split_whitespace().collect(),
            InvocationMode::Shell => vec!["sh", "-c", self.raw.as_str()],
        }
    }

    /// Program name, if the command is not empty.
    pub fn program(&self) -> Option<&str> {
        self.argv().first().copied()
    }

    fn to_command(&self) -> Result<Command> {
        let argv = self.argv();
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| DevstackError::Other("Cannot run an empty command".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(&self.env_vars)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        Ok(cmd)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Something that can execute commands on behalf of the orchestrator.
pub trait CommandRunner {
    /// Run a command to completion. Returns the exit code, which is always
    /// zero; any other outcome is an error.
    fn run(&mut self, command: &CommandLine) -> Result<i32>;

    /// Resolve a program on `PATH`.
    fn locate(&self, program: &str) -> Option<PathBuf> {
        find_executable(program)
    }
}

/// Runs commands for real.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &CommandLine) -> Result<i32> {
        info!("run command: {}", command);

        let mut child = command
            .to_command()?
            .spawn()
            .map_err(|source| DevstackError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let status = child.wait()?;

        match status.code() {
            Some(0) => Ok(0),
            code => Err(DevstackError::Command {
                command: command.to_string(),
                code,
            }),
        }
    }
}

/// Logs commands instead of running them.
#[derive(Debug, Default)]
pub struct DryRunRunner {
    history: Vec<CommandLine>,
}

impl DryRunRunner {
    /// Create a new dry-run runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands seen so far, in order.
    pub fn history(&self) -> &[CommandLine] {
        &self.history
    }
}

impl CommandRunner for DryRunRunner {
    fn run(&mut self, command: &CommandLine) -> Result<i32> {
        info!("[dry-run] would run: {}", command);
        self.history.push(command.clone());
        Ok(0)
    }
}

/// Find an executable by name the way the shell would.
///
/// Names containing a path separator are checked as given.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }

    if program.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }

    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
