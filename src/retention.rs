//! Retention of the newest directory entries
//!
//! [`prune`] keeps the `keep` most recently modified entries directly under a
//! directory and removes the rest, recursively for subdirectories. Entries are
//! read fresh on every call.
//!
//! Deletion is best effort: a failing entry does not stop the pass, and the
//! last failure is returned once every candidate has been attempted. A listing
//! failure aborts before anything is deleted.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// A single entry of the pruned directory
#[derive(Clone, Debug)]
pub struct DirectoryEntry {
    /// File or directory name
    pub name: String,
    /// Full path
    pub path: PathBuf,
    /// Last modification time
    pub modified: SystemTime,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

/// Outcome of a retention pass
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PruneReport {
    /// Entries that survived, newest first
    pub kept: Vec<String>,
    /// Entries that were removed
    pub removed: Vec<String>,
    /// Entries whose removal failed
    pub failed: Vec<String>,
}

/// List the entries directly under `dir`, newest first
///
/// The sort is stable, so entries with identical modification times keep the
/// order of the directory listing. That order is platform dependent.
pub async fn list_entries(dir: &Path) -> Result<Vec<DirectoryEntry>> {
    let listing_error = |e: std::io::Error| Error::Retention {
        path: dir.to_path_buf(),
        reason: format!("failed to list directory: {}", e),
    };

    let mut read_dir = tokio::fs::read_dir(dir).await.map_err(listing_error)?;
    let mut entries = Vec::new();

    while let Some(entry) = read_dir.next_entry().await.map_err(listing_error)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(entry) = describe_entry(name, entry.path())
            .await
            .map_err(listing_error)?
        {
            entries.push(entry);
        }
    }

    entries.sort_by(|a, b| b.modified.cmp(&a.modified));
    Ok(entries)
}

/// Stat one listed entry; `None` when it vanished after the listing
async fn describe_entry(name: String, path: PathBuf) -> std::io::Result<Option<DirectoryEntry>> {
    // Does not follow symlinks, so a link is pruned as itself
    let metadata = match tokio::fs::symlink_metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(?path, "entry vanished while listing");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    Ok(Some(DirectoryEntry {
        name,
        path,
        modified: metadata.modified()?,
        is_dir: metadata.is_dir(),
    }))
}

/// Keep the `keep` newest entries of `dir` and delete the others
///
/// # Errors
///
/// - [`Error::Retention`] if the directory cannot be listed (nothing deleted)
/// - [`Error::Retention`] carrying the last deletion failure, after all
///   candidates were attempted
pub async fn prune(dir: &Path, keep: usize) -> Result<PruneReport> {
    let entries = list_entries(dir).await?;

    if entries.len() <= keep {
        debug!(?dir, entries = entries.len(), keep, "nothing to prune");
        return Ok(PruneReport {
            kept: entries.into_iter().map(|e| e.name).collect(),
            ..Default::default()
        });
    }

    let mut report = PruneReport::default();
    let mut last_error = None;

    for (position, entry) in entries.into_iter().enumerate() {
        if position < keep {
            report.kept.push(entry.name);
            continue;
        }

        match remove_entry(&entry).await {
            Ok(()) => {
                debug!(path = ?entry.path, "pruned entry");
                report.removed.push(entry.name);
            }
            Err(e) => {
                warn!(path = ?entry.path, error = %e, "failed to prune entry");
                report.failed.push(entry.name);
                last_error = Some(Error::Retention {
                    path: entry.path,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        ?dir,
        keep,
        removed = report.removed.len(),
        failed = report.failed.len(),
        "retention pass finished"
    );

    match last_error {
        Some(err) => Err(err),
        None => Ok(report),
    }
}

/// Remove a file or a whole directory tree
///
/// A path that is already gone counts as removed.
async fn remove_entry(entry: &DirectoryEntry) -> std::io::Result<()> {
    let result = if entry.is_dir {
        tokio::fs::remove_dir_all(&entry.path).await
    } else {
        tokio::fs::remove_file(&entry.path).await
    };

    match result {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
