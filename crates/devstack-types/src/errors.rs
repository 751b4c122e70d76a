//! Error types for devstack operations.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for devstack operations.
///
/// Every variant is fatal to a run: nothing in the pipeline catches one of
/// these and carries on. The variants map onto the failure categories of the
/// bootstrap sequence so that the CLI can say which step broke.
#[derive(Error, Debug)]
pub enum DevstackError {
    /// A required external tool is not installed
    #[error("Environment error: {0}")]
    Environment(String),

    /// The devstack configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    ConfigLoad(String),

    /// A configuration key referenced by the orchestrator is absent
    #[error("Configuration key '{0}' is missing")]
    MissingKey(String),

    /// A template path does not resolve under the template root
    #[error("Template load error: {0}")]
    TemplateLoad(String),

    /// A template is not valid template syntax
    #[error("Template syntax error: {0}")]
    TemplateSyntax(String),

    /// A template references a variable absent from the configuration
    #[error("Undefined template variable: {0}")]
    UndefinedVariable(String),

    /// Any other failure while evaluating a template
    #[error("Template render error: {0}")]
    TemplateRender(String),

    /// An external command exited unsuccessfully
    #[error("Command `{command}` failed{}", exit_suffix(.code))]
    Command {
        /// The command line as it was requested
        command: String,
        /// Exit code, or None when the process was killed by a signal
        code: Option<i32>,
    },

    /// An external command could not be started at all
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        /// The command line as it was requested
        command: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// A rendered file could not be written
    #[error("Failed to write {}: {source}", .path.display())]
    FileWrite {
        /// Destination path
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Internal bug - should never happen in production
    #[error("Bug detected: {0}\n\nThis is an internal error. Please report it to the devstack maintainers.")]
    Bug(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {}", code),
        None => " (terminated by signal)".to_string(),
    }
}

impl DevstackError {
    /// Whether this error came out of template loading or rendering.
    pub fn is_template_error(&self) -> bool {
        matches!(
            self,
            DevstackError::TemplateLoad(_)
                | DevstackError::TemplateSyntax(_)
                | DevstackError::UndefinedVariable(_)
                | DevstackError::TemplateRender(_)
        )
    }

    /// Whether this error came from an external command.
    pub fn is_command_error(&self) -> bool {
        matches!(self, DevstackError::Command { .. } | DevstackError::Spawn { .. })
    }
}

/// A specialized Result type for devstack operations.
pub type Result<T> = std::result::Result<T, DevstackError>;

/// Helper macro to bail out with a DevstackError
///
/// # Example
///
/// ```ignore
/// if !found {
///     bail!(Environment, "{} is not installed", tool);
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($variant:ident, $msg:expr) => {
        return Err($crate::DevstackError::$variant($msg.to_string()))
    };
    ($variant:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::DevstackError::$variant(format!($fmt, $($arg)*)))
    };
    ($msg:expr) => {
        return Err($crate::DevstackError::Other($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::DevstackError::Other(format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_message() {
        let err = DevstackError::Command {
            command: "./provision.sh lms".to_string(),
            code: Some(2),
        };
        assert_eq!(err.to_string(), "Command `./provision.sh lms` failed with exit code 2");
        assert!(err.is_command_error());
        assert!(!err.is_template_error());

        let killed = DevstackError::Command {
            command: "docker-compose pull".to_string(),
            code: None,
        };
        assert!(killed.to_string().ends_with("(terminated by signal)"));
    }

    #[test]
    fn test_template_error_grouping() {
        assert!(DevstackError::UndefinedVariable("X".into()).is_template_error());
        assert!(DevstackError::TemplateLoad("x".into()).is_template_error());
        assert!(!DevstackError::MissingKey("X".into()).is_template_error());
    }

    #[test]
    fn test_bail_macro() {
        fn check(ok: bool) -> Result<()> {
            if !ok {
                crate::bail!(Environment, "{} is not installed", "docker-compose");
            }
            Ok(())
        }

        assert!(check(true).is_ok());
        let err = check(false).unwrap_err();
        assert!(matches!(err, DevstackError::Environment(ref m) if m == "docker-compose is not installed"));
    }
}
