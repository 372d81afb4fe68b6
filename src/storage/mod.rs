//! Blob storage providers
//!
//! Every backend implements [`StorageProvider`]; the pipeline only ever talks
//! to a provider through the [`Storage`] facade. The backend is picked once at
//! startup by [`build_provider`] and never changes afterwards.

mod facade;
mod gcs;
mod local;
mod s3;

pub use facade::Storage;
pub use gcs::GcsProvider;
pub use local::LocalProvider;
pub use s3::S3Provider;

use crate::config::StorageConfig;
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Byte stream of an object being read from storage
///
/// Dropping the reader releases the underlying file handle or HTTP body.
pub type ObjectReader = Pin<Box<dyn AsyncRead + Send>>;

/// Capability interface shared by all storage backends
///
/// Construction of an implementation must validate its configuration before
/// touching the filesystem or network; once constructed, the accessors never
/// fail.
///
/// # Examples
///
/// ```no_run
/// use artifact_dl::config::LocalStorageConfig;
/// use artifact_dl::storage::{LocalProvider, StorageProvider};
/// use tokio::io::AsyncReadExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = LocalProvider::new(LocalStorageConfig::new("/srv/artifacts"))?;
/// let mut reader = provider.open_read("releases/app-1.2.tar.gz").await?;
/// let mut buf = Vec::new();
/// reader.read_to_end(&mut buf).await?;
/// println!("{} bytes from {}", buf.len(), provider.bucket_url());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Open an object for reading
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`](crate::Error::Storage) if the key does not
    /// exist or the backend cannot be reached. Errors are not classified
    /// further; callers treat any failure as fatal to the current request.
    async fn open_read(&self, key: &str) -> Result<ObjectReader>;

    /// Write a whole object, replacing any existing one
    async fn write(&self, key: &str, data: Bytes) -> Result<()>;

    /// Human-readable provider name for logging
    fn name(&self) -> &'static str;

    /// Logical bucket name
    fn bucket_name(&self) -> &str;

    /// Canonical bucket URL, used to build fully-qualified object paths
    fn bucket_url(&self) -> String;
}

/// Construct the provider selected by the configuration
///
/// # Errors
///
/// Returns [`Error::Config`](crate::Error::Config) when the backend
/// configuration is invalid. Validation happens before any I/O.
pub async fn build_provider(config: &StorageConfig) -> Result<Arc<dyn StorageProvider>> {
    let provider: Arc<dyn StorageProvider> = match config {
        StorageConfig::Local(local) => Arc::new(LocalProvider::new(local.clone())?),
        StorageConfig::S3(s3) => Arc::new(S3Provider::new(s3.clone()).await?),
        StorageConfig::Gcs(gcs) => Arc::new(GcsProvider::new(gcs.clone())?),
    };

    tracing::info!(
        provider = provider.name(),
        bucket = provider.bucket_name(),
        "storage provider initialized"
    );

    Ok(provider)
}

/// Join a bucket URL and an object key with exactly one separator
pub(crate) fn qualified_path(bucket_url: &str, key: &str) -> String {
    format!(
        "{}/{}",
        bucket_url.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}
