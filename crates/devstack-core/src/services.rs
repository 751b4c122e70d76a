//! Choosing which services `provision.sh` installs.

use crate::config::DevstackConfig;
use devstack_types::{OptionalService, Result, BASE_SERVICES};
use tracing::debug;

/// Services to provision: the base services, then every optional service
/// with at least one truthy activation flag, in declaration order.
///
/// Flags are checked in order and the first truthy one decides, so later
/// flags of an already-selected service need not be present.
pub fn activation_list(config: &DevstackConfig) -> Result<Vec<String>> {
    let mut services: Vec<String> = BASE_SERVICES.iter().map(|s| s.to_string()).collect();

    for service in OptionalService::ALL {
        for key in service.flag_keys() {
            if config.flag(&key)? {
                debug!("{} enabled by {}", service, key);
                services.push(service.provision_name().to_string());
                break;
            }
        }
    }

    Ok(services)
}
