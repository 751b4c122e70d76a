//! Print the provisioning service list.

use anyhow::{Context, Result};
use devstack_core::{Devstack, DryRunRunner};
use devstack_types::RunSettings;

pub fn execute(settings: RunSettings) -> Result<()> {
    let devstack = Devstack::new(settings, DryRunRunner::new());

    let services = devstack
        .services()
        .context("Failed to select services")?;

    // Plain output so the list can be fed to provision.sh by hand.
    println!("{}", services.join(" "));

    Ok(())
}
