//! Extraction step and the cleanup that always follows it.

use crate::error::{Error, Result};
use crate::retention::{self, PruneReport};
use crate::types::{Event, RequestId};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::Downloader;

/// What the unpack step produced
pub(crate) struct UnpackResult {
    /// Extraction result, already mapped to [`Error::Extract`] on failure
    pub(crate) extracted: Result<Vec<PathBuf>>,
    /// Retention report, `None` when pruning failed
    pub(crate) pruned: Option<PruneReport>,
}

impl Downloader {
    /// Extract `archive` into `folder`, then remove the archive and prune
    ///
    /// Cleanup runs whether or not extraction succeeded. Its failures are
    /// logged and never replace the extraction result.
    pub(crate) async fn unpack(&self, id: RequestId, archive: &Path, folder: &Path) -> UnpackResult {
        info!(
            request_id = %id,
            ?archive,
            ?folder,
            extractor = self.extractor.name(),
            "extracting archive"
        );

        let extracted = self
            .extractor
            .extract(archive, folder)
            .await
            .map_err(|e| match e {
                Error::Extract { .. } => e,
                other => Error::Extract {
                    archive: archive.to_path_buf(),
                    reason: other.to_string(),
                },
            });

        match &extracted {
            Ok(files) => self.emit_event(Event::Extracted {
                id,
                dest: folder.to_path_buf(),
                files: files.len(),
            }),
            Err(e) => {
                warn!(request_id = %id, ?archive, error = %e, "extraction failed, cleaning up");
                self.emit_event(Event::ExtractFailed {
                    id,
                    error: e.to_string(),
                });
            }
        }

        self.remove_archive(id, archive).await;
        let pruned = self.prune_destination(id).await;

        UnpackResult { extracted, pruned }
    }

    async fn remove_archive(&self, id: RequestId, archive: &Path) {
        match tokio::fs::remove_file(archive).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                request_id = %id,
                ?archive,
                error = %e,
                "failed to remove downloaded archive"
            ),
        }
    }

    async fn prune_destination(&self, id: RequestId) -> Option<PruneReport> {
        let dir = self.config.download_dir();
        let keep = self.config.download.keep_old_count;

        match retention::prune(dir, keep).await {
            Ok(report) => {
                self.emit_event(Event::Pruned {
                    id,
                    removed: report.removed.clone(),
                });
                Some(report)
            }
            Err(e) => {
                warn!(request_id = %id, ?dir, keep, error = %e, "retention pass failed");
                None
            }
        }
    }
}
