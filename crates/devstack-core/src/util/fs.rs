//! Filesystem utilities.

use devstack_types::{DevstackError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Expand a leading tilde to the home directory.
pub fn expand_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }

    path.to_path_buf()
}

/// Write `contents` to `path`, creating parent directories and replacing any
/// existing file.
pub fn write_file(path: impl AsRef<Path>, contents: &str) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| DevstackError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
    }

    info!("output file path: {}", path.display());
    fs::write(path, contents).map_err(|source| DevstackError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}
