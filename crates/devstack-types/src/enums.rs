//! The catalogue of services the provisioning script knows how to install.

use std::fmt;

/// Services that are always provisioned, in order.
pub const BASE_SERVICES: &[&str] = &["lms"];

/// Prefix of the configuration flags that switch optional services on.
pub const ACTIVATION_PREFIX: &str = "ACTIVATE_";

/// Optional services accepted by `provision.sh`.
///
/// Declaration order is the order in which services are passed to the
/// provisioning script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionalService {
    /// E-commerce service
    Ecommerce,
    /// Course discovery service
    Discovery,
    /// Credentials service
    Credentials,
    /// End-to-end browser test containers
    E2e,
    /// Discussion forum
    Forum,
    /// Student notes
    Notes,
    /// Program registrar
    Registrar,
}

impl OptionalService {
    /// All optional services in declaration order.
    pub const ALL: [OptionalService; 7] = [
        OptionalService::Ecommerce,
        OptionalService::Discovery,
        OptionalService::Credentials,
        OptionalService::E2e,
        OptionalService::Forum,
        OptionalService::Notes,
        OptionalService::Registrar,
    ];

    /// Name understood by `provision.sh`.
    pub fn provision_name(&self) -> &'static str {
        match self {
            OptionalService::Ecommerce => "ecommerce",
            OptionalService::Discovery => "discovery",
            OptionalService::Credentials => "credentials",
            OptionalService::E2e => "e2e",
            OptionalService::Forum => "forum",
            OptionalService::Notes => "notes",
            OptionalService::Registrar => "registrar",
        }
    }

    /// Suffixes of the `ACTIVATE_*` flags that enable this service.
    ///
    /// Any one of them being truthy is enough.
    pub fn activation_flags(&self) -> &'static [&'static str] {
        match self {
            OptionalService::Ecommerce => &["ECOMMERCE"],
            OptionalService::Discovery => &["DISCOVERY"],
            OptionalService::Credentials => &["CREDENTIALS"],
            OptionalService::E2e => &["CHROME", "FIREFOX"],
            OptionalService::Forum => &["FORUM"],
            OptionalService::Notes => &["NOTES"],
            OptionalService::Registrar => &["REGISTRAR"],
        }
    }

    /// Full configuration keys, e.g. `ACTIVATE_CHROME`.
    pub fn flag_keys(&self) -> Vec<String> {
        self.activation_flags()
            .iter()
            .map(|flag| format!("{}{}", ACTIVATION_PREFIX, flag))
            .collect()
    }
}

impl fmt::Display for OptionalService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provision_name())
    }
}
