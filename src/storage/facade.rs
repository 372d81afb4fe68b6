use super::{ObjectReader, StorageProvider, qualified_path};
use crate::error::{Error, Result};
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;

/// Operation layer over a [`StorageProvider`]
///
/// The single point through which the pipeline touches persistent storage.
/// No retries and no buffering happen here.
#[derive(Clone)]
pub struct Storage {
    provider: Arc<dyn StorageProvider>,
}

impl Storage {
    /// Wrap a provider
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self { provider }
    }

    /// Provider name
    pub fn name(&self) -> &'static str {
        self.provider.name()
    }

    /// Bucket name of the provider
    pub fn bucket_name(&self) -> &str {
        self.provider.bucket_name()
    }

    /// Canonical bucket URL of the provider
    pub fn bucket_url(&self) -> String {
        self.provider.bucket_url()
    }

    /// Open an object for reading
    ///
    /// The caller owns the returned stream.
    pub async fn download(&self, key: &str) -> Result<ObjectReader> {
        self.provider.open_read(key).await
    }

    /// Upload bytes and return the fully-qualified object path
    pub async fn upload(&self, content: impl Into<Bytes>, destination: &str) -> Result<String> {
        self.provider.write(destination, content.into()).await?;
        Ok(qualified_path(&self.provider.bucket_url(), destination))
    }

    /// Upload a local file and return the fully-qualified object path
    pub async fn upload_file(&self, source: &Path, destination: &str) -> Result<String> {
        let content = tokio::fs::read(source).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read {}: {}", source.display(), e),
            ))
        })?;
        self.upload(content, destination).await
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("provider", &self.provider.name())
            .field("bucket", &self.provider.bucket_name())
            .finish()
    }
}
