use super::{ObjectReader, StorageProvider};
use crate::config::S3StorageConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::debug;

/// Storage provider backed by Amazon S3 or an S3-compatible store
#[derive(Clone, Debug)]
pub struct S3Provider {
    client: Client,
    config: S3StorageConfig,
}

impl S3Provider {
    /// Create a provider for the configured bucket
    ///
    /// Credentials come from the static keys in the configuration when set,
    /// otherwise from the default AWS credential chain. No request is sent
    /// until the first read or write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty bucket name or half-specified
    /// credentials.
    pub async fn new(config: S3StorageConfig) -> Result<Self> {
        config.validate()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let (Some(id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                id.clone(),
                secret.clone(),
                None,
                None,
                "artifact-dl-static",
            ));
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            config,
        })
    }
}

#[async_trait]
impl StorageProvider for S3Provider {
    async fn open_read(&self, key: &str) -> Result<ObjectReader> {
        debug!(bucket = %self.config.bucket, key, "fetching S3 object");

        let output = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                Error::Storage(format!(
                    "could not get s3://{}/{}: {}",
                    self.config.bucket,
                    key,
                    DisplayErrorContext(e)
                ))
            })?;

        Ok(Box::pin(output.body.into_async_read()))
    }

    async fn write(&self, key: &str, data: Bytes) -> Result<()> {
        let len = data.len();
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                Error::Storage(format!(
                    "could not put s3://{}/{}: {}",
                    self.config.bucket,
                    key,
                    DisplayErrorContext(e)
                ))
            })?;

        debug!(bucket = %self.config.bucket, key, bytes = len, "wrote S3 object");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "s3"
    }

    fn bucket_name(&self) -> &str {
        &self.config.bucket
    }

    fn bucket_url(&self) -> String {
        format!("s3://{}", self.config.bucket)
    }
}
