use super::{ObjectReader, StorageProvider};
use crate::config::LocalStorageConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Storage provider backed by a local directory
///
/// Keys are paths relative to the bucket directory. Keys that would escape
/// the bucket (`..` components, absolute paths) are rejected.
#[derive(Clone, Debug)]
pub struct LocalProvider {
    root: PathBuf,
    bucket_name: String,
}

impl LocalProvider {
    /// Create a provider over an existing directory
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the bucket path is empty or is not an
    /// existing directory.
    pub fn new(config: LocalStorageConfig) -> Result<Self> {
        config.validate()?;

        let is_dir = std::fs::metadata(&config.bucket)
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(Error::config(
                "storage.bucket",
                format!(
                    "bucket directory {} does not exist",
                    config.bucket.display()
                ),
            ));
        }

        Ok(Self {
            bucket_name: config.bucket.to_string_lossy().into_owned(),
            root: config.bucket,
        })
    }

    /// Resolve a key to a path inside the bucket directory
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let mut relative = PathBuf::new();
        for component in Path::new(key.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::Storage(format!(
                        "key {key} escapes bucket {}",
                        self.bucket_name
                    )));
                }
            }
        }

        if relative.as_os_str().is_empty() {
            return Err(Error::Storage(format!("empty object key {key:?}")));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageProvider for LocalProvider {
    async fn open_read(&self, key: &str) -> Result<ObjectReader> {
        let path = self.resolve(key)?;
        debug!(?path, "opening local object");

        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| Error::Storage(format!("could not open {}: {}", path.display(), e)))?;

        Ok(Box::pin(file))
    }

    async fn write(&self, key: &str, data: Bytes) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Storage(format!("could not create {}: {}", parent.display(), e))
            })?;
        }

        // Write next to the target and rename so readers never see a partial object
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let staging = path.with_file_name(format!(".{file_name}.partial"));

        tokio::fs::write(&staging, &data).await.map_err(|e| {
            Error::Storage(format!("could not write {}: {}", staging.display(), e))
        })?;
        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(Error::Storage(format!(
                "could not move object into place at {}: {}",
                path.display(),
                e
            )));
        }

        debug!(?path, bytes = data.len(), "wrote local object");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local-file"
    }

    fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    fn bucket_url(&self) -> String {
        format!("file://{}", self.bucket_name)
    }
}
