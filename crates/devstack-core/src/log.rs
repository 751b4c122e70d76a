//! Logging setup.

use devstack_types::{DevstackError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "devstack_core=info,devstack_types=info,create_devstack=info";

/// Initialize logging. `RUST_LOG` takes precedence over `fallback`.
pub fn init(fallback: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .try_init()
        .map_err(|e| DevstackError::Other(format!("Failed to initialize logging: {}", e)))
}

/// Filter for a verbosity choice: debug when verbose, warnings only when quiet.
pub fn filter_for(verbose: bool, quiet: bool) -> String {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        return DEFAULT_FILTER.to_string();
    };

    DEFAULT_FILTER.replace("=info", &format!("={}", level))
}
