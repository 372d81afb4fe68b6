//! Core types and events

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::retention::PruneReport;

/// Identifier assigned to each pipeline invocation
///
/// Only used to correlate events and log lines of concurrent requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One retrieval request: which object to fetch and whether to unpack it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Storage key (object path inside the bucket)
    pub key: String,
    /// Extract the downloaded file into a sibling directory
    pub unarchive: bool,
}

impl DownloadRequest {
    /// Create a request
    pub fn new(key: impl Into<String>, unarchive: bool) -> Self {
        Self {
            key: key.into(),
            unarchive,
        }
    }
}

/// Result of a successful pipeline run
#[derive(Clone, Debug)]
pub struct DownloadOutcome {
    /// Where the object was written
    ///
    /// When `extracted_to` is set this file no longer exists.
    pub file: PathBuf,
    /// Extraction directory, for unarchive requests
    pub extracted_to: Option<PathBuf>,
    /// Retention pass result, for unarchive requests whose prune succeeded
    pub pruned: Option<PruneReport>,
}

/// Pipeline stage of a single request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Request accepted, not yet validated
    Received,
    /// Opening the object in storage
    Downloading,
    /// Copying the object to the destination directory
    Writing,
    /// Unpacking the downloaded archive
    Extracting,
    /// Removing the archive and old entries
    Pruning,
    /// Finished successfully
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Downloading => "downloading",
            Stage::Writing => "writing",
            Stage::Extracting => "extracting",
            Stage::Pruning => "pruning",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Archive type detected by file name or magic bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveType {
    /// Gzip-compressed tarball (.tar.gz, .tgz)
    TarGz,
    /// Bzip2-compressed tarball (.tar.bz2, .tbz2)
    TarBz2,
    /// Xz-compressed tarball (.tar.xz, .txz)
    TarXz,
    /// Uncompressed tarball (.tar)
    Tar,
    /// ZIP archive (.zip)
    Zip,
    /// 7-Zip archive (.7z)
    SevenZip,
    /// RAR archive (.rar, .r00)
    Rar,
}

/// Event emitted during a request's lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Request validated, download starting
    Started {
        /// Request ID
        id: RequestId,
        /// Storage key
        key: String,
    },

    /// Object written to the destination directory
    Written {
        /// Request ID
        id: RequestId,
        /// Local file path
        path: PathBuf,
        /// Number of bytes written
        bytes: u64,
    },

    /// Archive unpacked
    Extracted {
        /// Request ID
        id: RequestId,
        /// Extraction directory
        dest: PathBuf,
        /// Number of files extracted
        files: usize,
    },

    /// Archive could not be unpacked (cleanup still runs)
    ExtractFailed {
        /// Request ID
        id: RequestId,
        /// Error message
        error: String,
    },

    /// Retention pass finished on the destination directory
    Pruned {
        /// Request ID
        id: RequestId,
        /// Entries that were removed
        removed: Vec<String>,
    },

    /// Request finished successfully
    Completed {
        /// Request ID
        id: RequestId,
        /// Local path of the artifact (file or extraction directory)
        path: PathBuf,
    },

    /// Request aborted
    Failed {
        /// Request ID
        id: RequestId,
        /// Stage where the request stopped
        stage: Stage,
        /// Error message
        error: String,
    },
}
