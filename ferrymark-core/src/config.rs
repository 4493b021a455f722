// Run configuration, passed explicitly to every pipeline

use ferrymark_tree::{MissingUrlPolicy, TitleMatch};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_TARGET: &str = "~/Library/Safari/Bookmarks.plist";
pub const DEFAULT_BACKUP_DIR: &str = "~/Library/Safari";
pub const DEFAULT_EXPORT: &str = "~/Library/Safari/MasterBackup/unique_bookmarks.json";
pub const DEFAULT_PROFILES_DIR: &str = "~/Library/Application Support/Waterfox/Profiles";
pub const PLACES_FILE: &str = "places.sqlite";

/// Where a run reads from, writes to, and keeps its pre-write backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPaths {
    pub source: PathBuf,
    pub target: PathBuf,
    pub backup_dir: PathBuf,
}

impl MigrationPaths {
    pub fn new(
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            backup_dir: backup_dir.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policies {
    pub missing_url: MissingUrlPolicy,
    pub title_match: TitleMatch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlistFormat {
    #[default]
    Xml,
    Binary,
}

/// Locates the places database inside a browser profiles directory.
///
/// Profiles named `*.default-release*` win; otherwise the first profile
/// (by name) holding a places database is used.
pub fn find_places_database(profiles_root: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(profiles_root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list profiles in {}: {}", profiles_root.display(), e);
            return None;
        }
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.join(PLACES_FILE).is_file())
        .collect();
    candidates.sort();

    let preferred = candidates.iter().position(|path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.contains("default-release"))
    });

    let profile = match preferred {
        Some(index) => candidates.swap_remove(index),
        None => candidates.into_iter().next()?,
    };
    debug!("Using profile {}", profile.display());
    Some(profile.join(PLACES_FILE))
}
