//! # Devstack Core
//!
//! Everything create-devstack does between reading `config.yml` and handing
//! control to `provision.sh`:
//!
//! - **Configuration**: YAML loading with strict key lookup
//! - **Process Execution**: blocking command runs with inherited output
//! - **Templating**: strict handlebars rendering of the compose templates
//! - **Service Selection**: the argument list for the provisioning script
//! - **Orchestration**: the ordered bootstrap sequence
//!
//! ## Example
//!
//! ```no_run
//! use devstack_core::{Devstack, SystemRunner};
//! use devstack_types::RunSettings;
//!
//! let mut devstack = Devstack::new(RunSettings::new("."), SystemRunner::new());
//! let report = devstack.create()?;
//! println!("provisioned: {}", report.services.join(" "));
//! # Ok::<(), devstack_types::DevstackError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod env;
pub mod log;
pub mod orchestrator;
pub mod render;
pub mod services;
pub mod template;
pub mod util;

// Re-export commonly used items
pub use config::DevstackConfig;
pub use env::EnvironmentProjection;
pub use orchestrator::{CreateReport, Devstack, Step};
pub use render::{preview_templates, render_templates};
pub use services::activation_list;
pub use template::{RendererCache, TemplateRenderer};
pub use util::process::{CommandLine, CommandRunner, DryRunRunner, SystemRunner};
pub use devstack_types::{DevstackError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
