//! Render the compose files without touching the running stack.

use anyhow::{Context, Result};
use colored::Colorize;
use devstack_core::{Devstack, DryRunRunner};
use devstack_types::RunSettings;

pub fn execute(settings: RunSettings) -> Result<()> {
    // Rendering never runs a command.
    let mut devstack = Devstack::new(settings, DryRunRunner::new());

    let written = devstack.render().context("Failed to render templates")?;

    for path in &written {
        println!("{} {}", "✓".green().bold(), path.display());
    }

    Ok(())
}
