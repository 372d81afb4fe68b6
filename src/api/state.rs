//! Application state for the API server

use crate::Downloader;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The downloader running every request
    pub downloader: Arc<Downloader>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(downloader: Arc<Downloader>) -> Self {
        Self { downloader }
    }
}
