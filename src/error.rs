//! Error types for artifact-dl
//!
//! This module provides error handling for the library, including:
//! - One error variant per pipeline failure class (download, write, extract, retention)
//! - HTTP status code mapping for the API layer
//! - Context information (storage key, local path, archive path)

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for artifact-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for artifact-dl
///
/// Each variant includes the key or path it concerns so that a log line or an
/// HTTP error message is enough to locate the failing request.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "storage.bucket")
        key: Option<String>,
    },

    /// Invalid request input (empty or unusable key)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Storage backend failure (missing object, transport error)
    #[error("storage error: {0}")]
    Storage(String),

    /// The object could not be opened for reading
    #[error("error downloading {key}: {reason}")]
    Download {
        /// The storage key that was requested
        key: String,
        /// The underlying storage failure
        reason: String,
    },

    /// The downloaded stream could not be written to local disk
    #[error("failed to write {path}: {source}")]
    Write {
        /// The local destination file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Archive format or extraction failure
    #[error("extraction failed for {archive}: {reason}")]
    Extract {
        /// The archive that failed to extract
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// Directory listing or deletion failed while pruning old entries
    #[error("retention failed for {path}: {reason}")]
    Retention {
        /// The directory or entry being pruned
        path: PathBuf,
        /// The reason pruning failed
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

impl Error {
    /// Build a configuration error for the given key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::BadRequest(_) => 400,

            // Storage read failures are reported as client errors. Existing
            // callers retry on 400, so this stays even though 502 would fit.
            Error::Download { .. } => 400,

            // 500 Internal Server Error - local disk and archive problems
            Error::Write { .. } => 500,
            Error::Extract { .. } => 500,
            Error::Retention { .. } => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,

            // 502 Bad Gateway - backend failure outside a download request
            Error::Storage(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::BadRequest(_) => "bad_request",
            Error::Storage(_) => "storage_error",
            Error::Download { .. } => "download_failed",
            Error::Write { .. } => "write_failed",
            Error::Extract { .. } => "extract_failed",
            Error::Retention { .. } => "retention_error",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}
