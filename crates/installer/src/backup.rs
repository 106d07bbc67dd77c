//! Snapshots of original movie directories taken before they are overlaid
//!
//! Each [`AssetSubject`] gets its own namespace below the backup root. The
//! presence of that namespace is what tells uninstall to restore instead of
//! just deleting.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::fs_ops::{best_effort, copy_dir_all, remove_dir_tree};
use crate::layout::{AssetSubject, GameLayout};

/// Copy `source` to `backup`, replacing any stale backup contents.
/// Returns false when `source` does not exist.
///
/// The copy is written next to `backup` and only moved into place once it
/// is complete, so a failed copy leaves the previous backup as it was.
pub async fn backup(source: &Path, backup: &Path) -> io::Result<bool> {
    if !source.is_dir() {
        debug!("Nothing to back up at {}", source.display());
        return Ok(false);
    }
    if let Some(parent) = backup.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let staged = staged_path(backup);
    remove_dir_tree(&staged).await?;
    let files = match copy_dir_all(source, &staged).await {
        Ok(files) => files,
        Err(e) => {
            best_effort("incomplete backup cleanup", remove_dir_tree(&staged)).await;
            return Err(e);
        }
    };
    remove_dir_tree(backup).await?;
    tokio::fs::rename(&staged, backup).await?;

    info!("Backed up {} files from {} to {}", files, source.display(), backup.display());
    Ok(true)
}

fn staged_path(backup: &Path) -> PathBuf {
    let mut name = backup.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    backup.with_file_name(name)
}

/// Copy the contents of `backup` into `target`. Returns false when there is
/// no backup.
pub async fn restore(backup: &Path, target: &Path) -> io::Result<bool> {
    if !backup.is_dir() {
        debug!("No backup at {}", backup.display());
        return Ok(false);
    }
    let files = copy_dir_all(backup, target).await?;
    info!("Restored {} files from {} to {}", files, backup.display(), target.display());
    Ok(true)
}

/// Owner of the backup root of one game install
#[derive(Debug, Clone)]
pub struct BackupManager {
    root: PathBuf,
}

impl BackupManager {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn for_layout(layout: &GameLayout) -> Self {
        Self::new(layout.backup_root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_dir(&self, subject: AssetSubject) -> PathBuf {
        self.root.join(subject.backup_name())
    }

    pub fn has_record(&self, subject: AssetSubject) -> bool {
        self.record_dir(subject).is_dir()
    }

    pub async fn backup_subject(&self, subject: AssetSubject, source: &Path) -> io::Result<bool> {
        backup(source, &self.record_dir(subject)).await
    }

    /// Replace `target` with the recorded copy of `subject`. The target is
    /// left untouched when no record exists.
    pub async fn restore_subject(&self, subject: AssetSubject, target: &Path) -> io::Result<bool> {
        let record = self.record_dir(subject);
        if !record.is_dir() {
            return Ok(false);
        }
        remove_dir_tree(target).await?;
        restore(&record, target).await
    }

    /// Delete the whole backup root
    pub async fn discard(&self) -> io::Result<()> {
        remove_dir_tree(&self.root).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, contents: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[tokio::test]
    async fn test_backup_missing_source_is_not_an_error() {
        let temp_dir = tempdir().unwrap();
        let manager = BackupManager::new(temp_dir.path().join("backup"));

        let backed_up = manager
            .backup_subject(AssetSubject::Splash, &temp_dir.path().join("Splash"))
            .await
            .unwrap();

        assert!(!backed_up);
        assert!(!manager.has_record(AssetSubject::Splash));
    }

    #[tokio::test]
    async fn test_backup_replaces_stale_contents() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("Cinematics");
        write(&source.join("intro.bk2"), b"original");
        let manager = BackupManager::new(temp_dir.path().join("backup"));
        write(&manager.record_dir(AssetSubject::Cinematic).join("stale.bk2"), b"stale");

        assert!(manager.backup_subject(AssetSubject::Cinematic, &source).await.unwrap());

        let record = manager.record_dir(AssetSubject::Cinematic);
        assert_eq!(std::fs::read(record.join("intro.bk2")).unwrap(), b"original");
        assert!(!record.join("stale.bk2").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_backup_keeps_previous_record() {
        let temp_dir = tempdir().unwrap();
        let source = temp_dir.path().join("Cinematics");
        write(&source.join("intro.bk2"), b"modded");
        std::os::unix::fs::symlink(temp_dir.path().join("gone.bk2"), source.join("dangling.bk2")).unwrap();
        let manager = BackupManager::new(temp_dir.path().join("backup"));
        let record = manager.record_dir(AssetSubject::Cinematic);
        write(&record.join("intro.bk2"), b"original");

        assert!(manager.backup_subject(AssetSubject::Cinematic, &source).await.is_err());

        assert_eq!(std::fs::read(record.join("intro.bk2")).unwrap(), b"original");
        assert!(!staged_path(&record).exists());
    }

    #[tokio::test]
    async fn test_restore_replaces_target_with_record() {
        let temp_dir = tempdir().unwrap();
        let target = temp_dir.path().join("Splash");
        write(&target.join("logo.bk2"), b"original");
        let manager = BackupManager::new(temp_dir.path().join("backup"));
        manager.backup_subject(AssetSubject::Splash, &target).await.unwrap();

        write(&target.join("logo.bk2"), b"modded");
        write(&target.join("extra.bk2"), b"modded only");

        assert!(manager.restore_subject(AssetSubject::Splash, &target).await.unwrap());
        assert_eq!(std::fs::read(target.join("logo.bk2")).unwrap(), b"original");
        assert!(!target.join("extra.bk2").exists());
    }

    #[tokio::test]
    async fn test_restore_without_record_keeps_target() {
        let temp_dir = tempdir().unwrap();
        let target = temp_dir.path().join("Splash");
        write(&target.join("logo.bk2"), b"current");
        let manager = BackupManager::new(temp_dir.path().join("backup"));

        assert!(!manager.restore_subject(AssetSubject::Splash, &target).await.unwrap());
        assert_eq!(std::fs::read(target.join("logo.bk2")).unwrap(), b"current");
    }

    #[tokio::test]
    async fn test_discard_removes_root() {
        let temp_dir = tempdir().unwrap();
        let manager = BackupManager::new(temp_dir.path().join("backup"));
        write(&manager.record_dir(AssetSubject::Cinematic).join("a.bk2"), b"a");

        manager.discard().await.unwrap();
        assert!(!manager.root().exists());
        manager.discard().await.unwrap();
    }
}
