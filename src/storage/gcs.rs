use super::{ObjectReader, StorageProvider};
use crate::config::GcsStorageConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use tokio_util::io::StreamReader;
use tracing::debug;

/// Storage provider backed by Google Cloud Storage
#[derive(Debug)]
pub struct GcsProvider {
    store: GoogleCloudStorage,
    config: GcsStorageConfig,
}

impl GcsProvider {
    /// Create a provider for the configured bucket
    ///
    /// A service account key from the configuration takes precedence over the
    /// environment. No request is sent until the first read or write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty bucket name or an unreadable
    /// service account key.
    pub fn new(config: GcsStorageConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(&config.bucket);
        if let Some(json) = &config.access_json {
            builder = builder.with_service_account_key(json);
        }
        if let Some(path) = &config.service_account_path {
            builder = builder.with_service_account_path(path.to_string_lossy());
        }

        let store = builder.build().map_err(|e| {
            Error::config(
                "storage.access_json",
                format!("invalid google cloud storage credentials: {}", e),
            )
        })?;

        Ok(Self { store, config })
    }

    fn object_path(&self, key: &str) -> Result<ObjectPath> {
        ObjectPath::parse(key).map_err(|e| {
            Error::Storage(format!("invalid key for gs://{}: {}", self.config.bucket, e))
        })
    }
}

#[async_trait]
impl StorageProvider for GcsProvider {
    async fn open_read(&self, key: &str) -> Result<ObjectReader> {
        debug!(bucket = %self.config.bucket, key, "fetching GCS object");

        let path = self.object_path(key)?;
        let result = self.store.get(&path).await.map_err(|e| {
            Error::Storage(format!(
                "could not get gs://{}/{}: {}",
                self.config.bucket, key, e
            ))
        })?;

        let body = result.into_stream().map_err(std::io::Error::other);
        Ok(Box::pin(StreamReader::new(body)))
    }

    async fn write(&self, key: &str, data: Bytes) -> Result<()> {
        let len = data.len();
        let path = self.object_path(key)?;
        self.store
            .put(&path, PutPayload::from(data))
            .await
            .map_err(|e| {
                Error::Storage(format!(
                    "could not put gs://{}/{}: {}",
                    self.config.bucket, key, e
                ))
            })?;

        debug!(bucket = %self.config.bucket, key, bytes = len, "wrote GCS object");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "google-cloud-storage"
    }

    fn bucket_name(&self) -> &str {
        &self.config.bucket
    }

    fn bucket_url(&self) -> String {
        format!("gs://{}", self.config.bucket)
    }
}
