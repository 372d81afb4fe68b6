//! Configuration types for artifact-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf};

/// Download pipeline configuration (destination directory, retention)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Destination directory for downloads (default: "downloads")
    ///
    /// Created at startup if it does not exist.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Number of entries to keep in the destination directory after an
    /// unarchive (default: 5)
    ///
    /// `0` empties the directory after every unarchive.
    #[serde(default = "default_keep_old_count")]
    pub keep_old_count: usize,

    /// Serialize the write/extract/prune phase per destination directory
    /// (default: true)
    ///
    /// When disabled, concurrent unarchive requests race on pruning and the
    /// "keep N newest" bound may be violated transiently.
    #[serde(default = "default_true")]
    pub serialize_directory: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            keep_old_count: default_keep_old_count(),
            serialize_directory: true,
        }
    }
}

/// Local filesystem bucket configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    /// Base directory that plays the role of the bucket
    /// e.g. "/srv/artifacts" or "./test-bucket"
    pub bucket: PathBuf,
}

impl LocalStorageConfig {
    /// Create a config for the given bucket directory
    pub fn new(bucket: impl Into<PathBuf>) -> Self {
        Self {
            bucket: bucket.into(),
        }
    }

    /// Reject an empty bucket path
    pub fn validate(&self) -> Result<()> {
        if self.bucket.as_os_str().is_empty() {
            return Err(Error::config("storage.bucket", "empty bucket path"));
        }
        Ok(())
    }
}

/// S3 (or S3-compatible) bucket configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct S3StorageConfig {
    /// Bucket name
    pub bucket: String,

    /// AWS region (falls back to the environment when unset)
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint URL for S3-compatible stores (MinIO, DigitalOcean Spaces)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Use path-style addressing (required by most S3-compatible stores)
    #[serde(default)]
    pub force_path_style: bool,

    /// Static access key id (falls back to the default credential chain)
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Static secret access key
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

impl S3StorageConfig {
    /// Reject an empty bucket name and half-specified static credentials
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::config("storage.bucket", "empty bucket name"));
        }
        if self.access_key_id.is_some() != self.secret_access_key.is_some() {
            return Err(Error::config(
                "storage.access_key_id",
                "access_key_id and secret_access_key must be set together",
            ));
        }
        Ok(())
    }
}

/// Google Cloud Storage bucket configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GcsStorageConfig {
    /// Bucket name
    pub bucket: String,

    /// Service account key as inline JSON
    #[serde(default)]
    pub access_json: Option<String>,

    /// Path to a service account key file
    ///
    /// Without either key the default credentials are used
    /// (`GOOGLE_APPLICATION_CREDENTIALS`, gcloud, then the metadata server).
    #[serde(default)]
    pub service_account_path: Option<PathBuf>,
}

impl GcsStorageConfig {
    /// Create a config for the given bucket using default credentials
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Reject an empty bucket name and conflicting key sources
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::config("storage.bucket", "empty bucket name"));
        }
        if self.access_json.is_some() && self.service_account_path.is_some() {
            return Err(Error::config(
                "storage.access_json",
                "access_json and service_account_path are mutually exclusive",
            ));
        }
        Ok(())
    }
}

/// Storage backend selection
///
/// Chosen once at startup; the pipeline never switches backends at runtime.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local filesystem directory
    Local(LocalStorageConfig),
    /// Amazon S3 or an S3-compatible object store
    S3(S3StorageConfig),
    /// Google Cloud Storage
    #[serde(alias = "gs")]
    Gcs(GcsStorageConfig),
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Local(LocalStorageConfig::new(""))
    }
}

impl StorageConfig {
    /// Validate the selected backend's configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            StorageConfig::Local(local) => local.validate(),
            StorageConfig::S3(s3) => s3.validate(),
            StorageConfig::Gcs(gcs) => gcs.validate(),
        }
    }
}

/// HTTP API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:9000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Main configuration for the artifact downloader
///
/// Loaded from a TOML file and/or command-line flags at process start, then
/// shared read-only for the process lifetime.
///
/// ```toml
/// [download]
/// download_dir = "/var/lib/artifacts"
/// keep_old_count = 3
///
/// [storage]
/// backend = "s3"            # or "local", "gcs"
/// bucket = "release-artifacts"
/// region = "eu-west-1"
///
/// [server]
/// bind_address = "0.0.0.0:9000"
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download pipeline settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// Storage backend settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ApiConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config {
            message: format!("invalid TOML: {}", e),
            key: None,
        })
    }

    /// Destination directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.download.download_dir
    }

    /// Validate the whole configuration
    pub fn validate(&self) -> Result<()> {
        if self.download.download_dir.as_os_str().is_empty() {
            return Err(Error::config(
                "download.download_dir",
                "download directory must not be empty",
            ));
        }
        self.storage.validate()
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_keep_old_count() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 9000))
}
