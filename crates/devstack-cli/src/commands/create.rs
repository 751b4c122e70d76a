//! Bootstrap the devstack.

use anyhow::{Context, Result};
use colored::Colorize;
use devstack_core::{CommandRunner, CreateReport, Devstack, DryRunRunner, SystemRunner};
use devstack_types::RunSettings;
use tracing::debug;

pub fn execute(settings: RunSettings) -> Result<()> {
    println!(
        "{} devstack in {}",
        "Creating".green().bold(),
        settings.root_dir.display().to_string().cyan()
    );
    debug!("Run settings: {:?}", settings);

    let dry_run = settings.dry_run;
    let report = if dry_run {
        println!("  {} Dry run mode - nothing is run or written", "→".yellow());
        run(Devstack::new(settings, DryRunRunner::new()))?
    } else {
        run(Devstack::new(settings, SystemRunner::new()))?
    };

    println!("{} Devstack created", "✓".green().bold());
    let label = if dry_run { "Would render" } else { "Rendered" };
    for path in &report.rendered {
        println!("  {}: {}", label, path.display());
    }
    println!("  Services: {}", report.services.join(" ").cyan());

    Ok(())
}

fn run<R: CommandRunner>(mut devstack: Devstack<R>) -> Result<CreateReport> {
    devstack.create().context("Failed to create devstack")
}
