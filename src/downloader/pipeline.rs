//! Request pipeline: validate, download, write, optionally unpack.

use crate::error::{Error, Result};
use crate::types::{DownloadOutcome, DownloadRequest, Event, RequestId, Stage};
use crate::utils::{file_name_from_key, folder_name_from_file_name};
use tracing::{debug, info, warn};

use super::Downloader;
use super::fetch::write_object;

impl Downloader {
    /// Run one retrieval request to completion
    ///
    /// The object is opened in storage before the destination directory is
    /// locked, so slow downloads never hold up other requests; only the
    /// write/extract/prune sequence is serialized per directory.
    ///
    /// # Errors
    ///
    /// * [`Error::BadRequest`] - empty key, or a key that does not name a file
    /// * [`Error::Download`] - the storage provider could not open the object
    /// * [`Error::Write`] - the local file could not be written
    /// * [`Error::Extract`] - unpacking failed (the archive is still removed
    ///   and the directory still pruned)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use artifact_dl::{Config, DownloadRequest, Downloader};
    /// use artifact_dl::extraction::ArchiveExtractor;
    /// use artifact_dl::storage::{build_provider, Storage};
    /// use std::sync::Arc;
    ///
    /// # async fn example(config: Config) -> artifact_dl::Result<()> {
    /// let storage = Storage::new(build_provider(&config.storage).await?);
    /// let downloader = Downloader::new(config, storage, Arc::new(ArchiveExtractor)).await?;
    ///
    /// let outcome = downloader
    ///     .handle(DownloadRequest::new("configs/config-1.tar.gz", true))
    ///     .await?;
    /// println!("extracted to {:?}", outcome.extracted_to);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn handle(&self, request: DownloadRequest) -> Result<DownloadOutcome> {
        let id = self.next_request_id();
        let DownloadRequest { key, unarchive } = request;

        // Validate
        if key.is_empty() {
            return Err(self.fail(id, Stage::Received, Error::BadRequest("empty uri field".into())));
        }
        let file_name = file_name_from_key(&key).map_err(|e| self.fail(id, Stage::Received, e))?;

        info!(request_id = %id, %key, unarchive, "download requested");
        self.emit_event(Event::Started {
            id,
            key: key.clone(),
        });

        // Download
        let reader = self.storage.download(&key).await.map_err(|e| {
            let reason = match e {
                Error::Storage(message) => message,
                other => other.to_string(),
            };
            self.fail(
                id,
                Stage::Downloading,
                Error::Download {
                    key: key.clone(),
                    reason,
                },
            )
        })?;

        let dest_dir = self.config.download_dir();
        let _guard = if self.config.download.serialize_directory {
            Some(self.locks.lock(dest_dir).await)
        } else {
            None
        };

        // Write
        let file_path = dest_dir.join(file_name);
        let bytes = write_object(reader, &file_path)
            .await
            .map_err(|e| self.fail(id, Stage::Writing, e))?;
        self.emit_event(Event::Written {
            id,
            path: file_path.clone(),
            bytes,
        });

        if !unarchive {
            debug!(request_id = %id, path = ?file_path, "unarchive not requested, leaving file");
            self.emit_event(Event::Completed {
                id,
                path: file_path.clone(),
            });
            return Ok(DownloadOutcome {
                file: file_path,
                extracted_to: None,
                pruned: None,
            });
        }

        // Extract, then always clean up
        let folder = dest_dir.join(folder_name_from_file_name(file_name));
        let unpacked = self.unpack(id, &file_path, &folder).await;

        if let Err(e) = unpacked.extracted {
            return Err(self.fail(id, Stage::Extracting, e));
        }

        info!(request_id = %id, path = ?folder, "download complete");
        self.emit_event(Event::Completed {
            id,
            path: folder.clone(),
        });

        Ok(DownloadOutcome {
            file: file_path,
            extracted_to: Some(folder),
            pruned: unpacked.pruned,
        })
    }

    /// Record a request abort and hand the error back
    fn fail(&self, id: RequestId, stage: Stage, error: Error) -> Error {
        warn!(request_id = %id, %stage, error = %error, "download request failed");
        self.emit_event(Event::Failed {
            id,
            stage,
            error: error.to_string(),
        });
        error
    }
}
