//! Filesystem primitives shared by the stagehand crates.
//!
//! - `permissions.rs` - Nine-bit POSIX permission sets and their application
//! - directory helpers below - idempotent creation of directory trees

mod error;
pub mod permissions;

pub use error::{Error, Result};
pub use permissions::{PermissionSet, PosixPermission};

use std::path::Path;

/// Create `path` and all missing ancestors.
///
/// Succeeds without touching anything if the directory already exists.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(path).map_err(|e| Error::CreateDir {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Create the parent directory of `path`, if it has one.
pub fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}
