//! HTTP API server module
//!
//! Exposes the download pipeline over a small form-based HTTP interface
//! compatible with existing deployment scripts.

use crate::{Downloader, Result};
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// - `POST /v1/download` - Download an object, optionally unarchive it
///   (form fields `uri`, `unarchive`)
/// - `GET /v1/ping` - Liveness probe, answers `PONG`
/// - `GET /v1/openapi.json` - OpenAPI specification
pub fn create_router(downloader: Arc<Downloader>) -> Router {
    let state = AppState::new(downloader);

    Router::new()
        .route("/v1/download", post(routes::download))
        .route("/v1/ping", get(routes::ping))
        .route("/v1/openapi.json", get(routes::openapi_spec))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the API server on `bind_address`.
///
/// Runs until `shutdown` is cancelled, then stops accepting connections and
/// waits for in-flight requests to finish.
///
/// # Example
///
/// ```no_run
/// use artifact_dl::{Config, Downloader};
/// use artifact_dl::extraction::ArchiveExtractor;
/// use artifact_dl::storage::{build_provider, Storage};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example(config: Config) -> artifact_dl::Result<()> {
/// let bind_address = config.server.bind_address;
/// let storage = Storage::new(build_provider(&config.storage).await?);
/// let downloader = Arc::new(Downloader::new(config, storage, Arc::new(ArchiveExtractor)).await?);
///
/// let shutdown = CancellationToken::new();
/// artifact_dl::api::start_api_server(downloader, bind_address, shutdown).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(
    downloader: Arc<Downloader>,
    bind_address: SocketAddr,
    shutdown: CancellationToken,
) -> Result<()> {
    tracing::info!(address = %bind_address, "Starting API server");

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    serve(listener, downloader, shutdown).await
}

/// Serve the API on an already bound listener
///
/// Useful when the port is chosen by the OS (`127.0.0.1:0`).
pub async fn serve(
    listener: TcpListener,
    downloader: Arc<Downloader>,
    shutdown: CancellationToken,
) -> Result<()> {
    let address = listener.local_addr().map_err(crate::error::Error::Io)?;
    tracing::info!(%address, "API server listening");

    let app = create_router(downloader);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
