//! Per-directory mutual exclusion for the local phase of a request.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

/// Registry of async mutexes keyed by canonical directory path
///
/// Two requests targeting the same directory (even through different
/// spellings of its path) share one mutex; different directories never
/// contend. Entries are never evicted, one per distinct directory.
#[derive(Clone, Default)]
pub struct DirectoryLocks {
    locks: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl DirectoryLocks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `dir`
    ///
    /// The returned guard releases the directory when dropped.
    pub async fn lock(&self, dir: &Path) -> OwnedMutexGuard<()> {
        let key = tokio::fs::canonicalize(dir)
            .await
            .unwrap_or_else(|_| dir.to_path_buf());

        let mutex = {
            let mut locks = self.locks.lock().await;
            locks.entry(key.clone()).or_default().clone()
        };

        trace!(dir = ?key, "waiting for directory lock");
        let guard = mutex.lock_owned().await;
        trace!(dir = ?key, "directory lock acquired");
        guard
    }

    /// Number of directories seen so far
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Whether no directory has been locked yet
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl std::fmt::Debug for DirectoryLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryLocks").finish_non_exhaustive()
    }
}
