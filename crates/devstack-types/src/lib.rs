//! # Devstack Types
//!
//! Types shared by the create-devstack crates:
//!
//! - The error taxonomy and result alias
//! - The catalogue of optional services and their activation flags
//! - Fixed compose file names and script paths
//! - Run settings
//!
//! ## Example
//!
//! ```
//! use devstack_types::{OptionalService, BASE_SERVICES};
//!
//! assert_eq!(BASE_SERVICES, &["lms"]);
//! assert_eq!(OptionalService::E2e.flag_keys(), vec!["ACTIVATE_CHROME", "ACTIVATE_FIREFOX"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compose;
pub mod config;
pub mod enums;
pub mod errors;

// Re-export common types for convenience
pub use config::{RunSettings, StepSelection};
pub use enums::{OptionalService, ACTIVATION_PREFIX, BASE_SERVICES};
pub use errors::{DevstackError, Result};
