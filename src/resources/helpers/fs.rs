//! File-system resource helpers.
use anyhow::{Context as _, Result};
use std::os::unix::fs::{DirBuilderExt as _, PermissionsExt as _};
use std::path::Path;

/// Mode of directories only the provisioning user may enter.
const PRIVATE_DIR_MODE: u32 = 0o700;

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Create `path` as a new directory with mode 0700.
///
/// Fails if anything already exists at `path`, so a directory planted there
/// by someone else is never adopted.
///
/// # Errors
///
/// Returns an error if the path exists or cannot be created.
pub fn create_private_dir(path: &Path) -> Result<()> {
    std::fs::DirBuilder::new()
        .mode(PRIVATE_DIR_MODE)
        .create(path)
        .with_context(|| format!("creating private directory {}", path.display()))
}

/// Ensure `path` (and its ancestors) exists and restrict it to mode 0700.
///
/// # Errors
///
/// Returns an error if `path` is a symlink or not a directory, or if it
/// cannot be created or restricted.
pub fn ensure_private_dir(path: &Path) -> Result<()> {
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(PRIVATE_DIR_MODE)
        .create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let meta = path
        .symlink_metadata()
        .with_context(|| format!("inspecting {}", path.display()))?;
    if !meta.is_dir() {
        anyhow::bail!("{} is not a directory", path.display());
    }
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(PRIVATE_DIR_MODE))
        .with_context(|| format!("restricting {}", path.display()))
}

/// Whether `path` is a directory with at least one entry.
///
/// Returns `false` for missing paths and regular files.
#[must_use]
pub fn is_non_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).is_ok_and(|mut entries| entries.next().is_some())
}

/// Remove a file or directory tree at `path` if it exists.
///
/// # Errors
///
/// Returns an error if the path exists but cannot be removed.
pub fn remove_path(path: &Path) -> Result<()> {
    let Ok(meta) = path.symlink_metadata() else {
        return Ok(());
    };
    if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
    .with_context(|| format!("removing {}", path.display()))
}
