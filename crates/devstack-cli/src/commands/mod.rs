//! CLI command implementations.

pub mod create;
pub mod render;
pub mod services;
