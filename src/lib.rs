//! # artifact-dl
//!
//! Artifact retrieval service: fetch objects from blob storage into a local
//! directory, optionally unpack them, and keep only the newest entries.
//!
//! ## Overview
//!
//! - **Storage** - one provider per process (local directory, S3 or GCS), chosen
//!   from configuration at startup
//! - **Pipeline** - download, write, optionally extract, then remove the
//!   archive and prune the destination to the configured count
//! - **HTTP** - a small form-based API (`POST /v1/download`, `GET /v1/ping`)
//! - **Event-driven** - consumers can subscribe to per-request events
//!
//! ## Quick Start
//!
//! ```no_run
//! use artifact_dl::{Config, DownloadRequest, Downloader};
//! use artifact_dl::extraction::ArchiveExtractor;
//! use artifact_dl::storage::{Storage, build_provider};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_toml_str(
//!         r#"
//!         [download]
//!         download_dir = "/srv/configs"
//!         keep_old_count = 3
//!
//!         [storage]
//!         backend = "local"
//!         bucket = "/mnt/artifacts"
//!         "#,
//!     )?;
//!     config.validate()?;
//!
//!     let storage = Storage::new(build_provider(&config.storage).await?);
//!     let downloader = Downloader::new(config, storage, Arc::new(ArchiveExtractor)).await?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     downloader
//!         .handle(DownloadRequest::new("configs/config-7.tar.gz", true))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP API module
pub mod api;
/// Configuration types
pub mod config;
/// Retrieval pipeline (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Archive extraction and creation
pub mod extraction;
/// Keep-newest-N directory pruning
pub mod retention;
/// Blob storage providers and facade
pub mod storage;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{ApiConfig, Config, DownloadConfig, StorageConfig};
pub use downloader::Downloader;
pub use error::{Error, Result, ToHttpStatus};
pub use extraction::{ArchiveExtractor, Extractor};
pub use retention::{PruneReport, prune};
pub use storage::{Storage, StorageProvider};
pub use types::{DownloadOutcome, DownloadRequest, Event, RequestId, Stage};

use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Helper function to serve the API until a termination signal arrives.
///
/// In-flight requests are allowed to finish before this returns.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use artifact_dl::{Config, Downloader, run_with_shutdown};
/// use artifact_dl::extraction::ArchiveExtractor;
/// use artifact_dl::storage::{Storage, build_provider};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let bind_address = config.server.bind_address;
///     let storage = Storage::new(build_provider(&config.storage).await?);
///     let downloader = Downloader::new(config, storage, Arc::new(ArchiveExtractor)).await?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(Arc::new(downloader), bind_address).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: Arc<Downloader>, bind_address: SocketAddr) -> Result<()> {
    let shutdown = CancellationToken::new();

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::info!("shutting down, waiting for in-flight requests");
        signal_token.cancel();
    });

    api::start_api_server(downloader, bind_address, shutdown).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
