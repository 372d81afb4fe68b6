//! Route handlers for the HTTP API
//!
//! Handlers are organized by domain:
//! - [`download`]: object retrieval
//! - [`system`]: ping and OpenAPI

use serde::{Deserialize, Serialize};

mod download;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use download::*;
pub use system::*;

// ============================================================================
// Request Types (shared across handlers)
// ============================================================================

/// Form fields for POST /v1/download
///
/// Read from the `application/x-www-form-urlencoded` body only; the query
/// string is ignored.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadForm {
    /// Storage key of the object to fetch
    #[serde(default)]
    pub uri: String,
    /// `true` (any case) to extract the object after download
    #[serde(default)]
    pub unarchive: Option<String>,
}

impl DownloadForm {
    /// Build the form from decoded body pairs
    ///
    /// A repeated field keeps its first value, even when that value is empty.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut uri = None;
        let mut unarchive = None;
        for (name, value) in pairs {
            match name.as_str() {
                "uri" if uri.is_none() => uri = Some(value),
                "unarchive" if unarchive.is_none() => unarchive = Some(value),
                _ => {}
            }
        }
        DownloadForm {
            uri: uri.unwrap_or_default(),
            unarchive,
        }
    }
}
