// Backup + atomic replacement of the target document

use crate::config::MigrationPaths;
use crate::error::{CoreError, Result};
use chrono::Local;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Copies `target` into `backup_dir` under a timestamped name.
///
/// Returns `None` when there is nothing to back up yet.
pub fn backup_file(target: &Path, backup_dir: &Path) -> Result<Option<PathBuf>> {
    if !target.exists() {
        debug!("No existing {} to back up", target.display());
        return Ok(None);
    }

    let failed = |source| CoreError::BackupFailed {
        path: target.to_path_buf(),
        source,
    };
    fs::create_dir_all(backup_dir).map_err(failed)?;

    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bookmarks".to_string());
    let stamp = Local::now().format("%Y%m%dT%H%M%S").to_string();

    let mut backup = backup_dir.join(format!("{}.{}.bak", name, stamp));
    let mut attempt = 1;
    while backup.exists() {
        backup = backup_dir.join(format!("{}.{}-{}.bak", name, stamp, attempt));
        attempt += 1;
    }

    fs::copy(target, &backup).map_err(failed)?;
    info!("Backed up {} to {}", target.display(), backup.display());
    Ok(Some(backup))
}

/// Writes `content` to a temp file next to `target`, syncs it, then renames
/// it over `target`. Readers see either the old or the new file, never a
/// partial one.
pub fn write_atomic(target: &Path, content: &[u8]) -> Result<()> {
    let failed = |source| CoreError::WriteFailed {
        path: target.to_path_buf(),
        source,
    };
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir).map_err(failed)?;

    let mut temp = NamedTempFile::new_in(dir).map_err(failed)?;
    // The replacement keeps the mode of the file it replaces
    if let Ok(existing) = fs::metadata(target) {
        temp.as_file()
            .set_permissions(existing.permissions())
            .map_err(failed)?;
    }
    temp.write_all(content).map_err(failed)?;
    temp.as_file().sync_all().map_err(failed)?;
    temp.persist(target).map_err(|e| failed(e.error))?;

    #[cfg(unix)]
    fs::File::open(dir).and_then(|d| d.sync_all()).map_err(failed)?;

    info!("Wrote {} bytes to {}", content.len(), target.display());
    Ok(())
}

/// Destination of a run: the target file plus where its backups go.
#[derive(Debug, Clone)]
pub struct Sink {
    target: PathBuf,
    backup_dir: PathBuf,
}

impl Sink {
    pub fn new(target: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            backup_dir: backup_dir.into(),
        }
    }

    pub fn from_paths(paths: &MigrationPaths) -> Self {
        Self::new(paths.target.clone(), paths.backup_dir.clone())
    }

    /// Backs up the current target, then atomically replaces it. A failed
    /// write leaves the original in place and the backup on disk.
    pub fn replace(&self, content: &[u8]) -> Result<Option<PathBuf>> {
        let backup = backup_file(&self.target, &self.backup_dir)?;
        write_atomic(&self.target, content)?;
        Ok(backup)
    }
}
