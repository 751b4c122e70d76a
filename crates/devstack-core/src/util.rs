//! Common utility functions.

pub mod data;
pub mod fs;
pub mod process;

// Re-export commonly used items
pub use data::{is_truthy, load_yaml, normalize_yaml11, yaml11_bool};
pub use fs::{expand_path, write_file};
pub use process::{find_executable, CommandLine, CommandRunner};
