//! Filesystem helpers shared by the backup manager and the workflows

use std::fmt::Display;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Run a cleanup or normalization step whose failure must not fail the
/// enclosing workflow. Errors are logged and turned into `None`.
pub async fn best_effort<T, E, F>(what: &str, operation: F) -> Option<T>
where
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    match operation.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{} failed (ignored): {}", what, e);
            None
        }
    }
}

/// Recursively copy `src` into `dst`, overwriting files that already exist.
/// Returns the number of files copied.
pub async fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<u64> {
    let src = src.to_path_buf();
    let dst = dst.to_path_buf();
    tokio::task::spawn_blocking(move || copy_dir_blocking(&src, &dst))
        .await
        .map_err(io::Error::other)?
}

fn copy_dir_blocking(src: &Path, dst: &Path) -> io::Result<u64> {
    std::fs::create_dir_all(dst)?;
    let mut copied = 0;

    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    debug!("Copied {} files from {} to {}", copied, src.display(), dst.display());
    Ok(copied)
}

/// Every regular file below `dir`, relative to it, sorted
pub fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.path().strip_prefix(dir).map_err(io::Error::other)?.to_path_buf());
        }
    }
    Ok(files)
}

/// Owner read/write, everyone else read
pub async fn set_owner_rw(path: &Path) -> io::Result<()> {
    set_mode(path, 0o644).await
}

/// Read/write for everyone, applied before removing a file
pub async fn relax_permissions(path: &Path) -> io::Result<()> {
    set_mode(path, 0o666).await
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await
}

#[cfg(not(unix))]
async fn set_mode(path: &Path, _mode: u32) -> io::Result<()> {
    let mut permissions = fs::metadata(path).await?.permissions();
    #[allow(clippy::permissions_set_readonly_false)]
    permissions.set_readonly(false);
    fs::set_permissions(path, permissions).await
}

/// Remove `dir` if it exists and has no entries. Returns true if removed.
pub async fn remove_dir_if_empty(dir: &Path) -> io::Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    let mut entries = fs::read_dir(dir).await?;
    if entries.next_entry().await?.is_some() {
        return Ok(false);
    }
    fs::remove_dir(dir).await?;
    debug!("Removed empty directory {}", dir.display());
    Ok(true)
}

/// Remove `dir` and everything below it; a missing directory is not an error
pub async fn remove_dir_tree(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Remove `path`; returns false if it did not exist
pub async fn remove_file_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
