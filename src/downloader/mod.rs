//! Core downloader implementation split into focused submodules.
//!
//! The `Downloader` struct and its methods are organized by step:
//! - [`pipeline`] - Request entry point and stage sequencing
//! - [`fetch`] - Streaming an object onto the local disk
//! - [`unpack`] - Extraction followed by archive removal and pruning
//! - [`locks`] - Per-directory serialization of the local phase

mod fetch;
mod locks;
mod pipeline;
mod unpack;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use locks::DirectoryLocks;

use crate::config::Config;
use crate::error::Result;
use crate::extraction::Extractor;
use crate::storage::Storage;
use crate::types::{Event, RequestId};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
///
/// One instance serves every request; each call to
/// [`handle`](Downloader::handle) runs independently.
#[derive(Clone)]
pub struct Downloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Storage facade over the configured provider
    pub(crate) storage: Storage,
    /// Archive extractor (trait object so tests can inject failures)
    pub(crate) extractor: Arc<dyn Extractor>,
    /// Per-directory locks for the write/extract/prune sequence
    pub(crate) locks: DirectoryLocks,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Source of request IDs
    next_id: Arc<AtomicU64>,
}

impl Downloader {
    /// Create a new downloader
    ///
    /// Creates the destination directory if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`](crate::Error::Io) if the destination directory
    /// cannot be created.
    pub async fn new(
        config: Config,
        storage: Storage,
        extractor: Arc<dyn Extractor>,
    ) -> Result<Self> {
        tokio::fs::create_dir_all(config.download_dir()).await?;

        tracing::info!(
            download_dir = ?config.download_dir(),
            keep_old_count = config.download.keep_old_count,
            serialize_directory = config.download.serialize_directory,
            storage = storage.name(),
            bucket = storage.bucket_name(),
            "downloader ready"
        );

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config: Arc::new(config),
            storage,
            extractor,
            locks: DirectoryLocks::new(),
            event_tx,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Subscribe to request lifecycle events
    ///
    /// Events are best-effort: a slow subscriber may observe
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Storage facade in use
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }

    fn next_request_id(&self) -> RequestId {
        RequestId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("download_dir", self.config.download_dir())
            .field("storage", &self.storage)
            .field("extractor", &self.extractor.name())
            .finish_non_exhaustive()
    }
}
