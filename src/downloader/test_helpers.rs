//! Shared test helpers for creating Downloader instances in tests.

use crate::config::{Config, LocalStorageConfig, StorageConfig};
use crate::downloader::Downloader;
use crate::error::{Error, Result};
use crate::extraction::{ArchiveExtractor, Extractor};
use crate::storage::{LocalProvider, Storage};
use async_trait::async_trait;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::{TempDir, tempdir};

/// Scratch layout for one downloader under test
pub(crate) struct TestEnv {
    /// Keeps the scratch tree alive
    pub(crate) _temp_dir: TempDir,
    /// Local bucket directory (the "remote" side)
    pub(crate) bucket: PathBuf,
    /// Destination directory
    pub(crate) downloads: PathBuf,
}

impl TestEnv {
    /// Put an object into the bucket, creating parent directories
    pub(crate) fn put(&self, key: &str, content: &[u8]) {
        let path = self.bucket.join(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// Names currently in the destination directory, sorted
    pub(crate) fn download_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.downloads)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Build a config pointing at a fresh scratch bucket and destination
pub(crate) fn test_config(keep_old_count: usize) -> (Config, TestEnv) {
    let temp_dir = tempdir().unwrap();
    let bucket = temp_dir.path().join("bucket");
    let downloads = temp_dir.path().join("downloads");
    std::fs::create_dir_all(&bucket).unwrap();

    let mut config = Config::default();
    config.download.download_dir = downloads.clone();
    config.download.keep_old_count = keep_old_count;
    config.storage = StorageConfig::Local(LocalStorageConfig::new(&bucket));

    (
        config,
        TestEnv {
            _temp_dir: temp_dir,
            bucket,
            downloads,
        },
    )
}

/// Downloader over a local bucket with the real archive extractor
pub(crate) async fn create_test_downloader(keep_old_count: usize) -> (Downloader, TestEnv) {
    create_test_downloader_with(keep_old_count, Arc::new(ArchiveExtractor)).await
}

/// Downloader over a local bucket with a custom extractor
pub(crate) async fn create_test_downloader_with(
    keep_old_count: usize,
    extractor: Arc<dyn Extractor>,
) -> (Downloader, TestEnv) {
    let (config, env) = test_config(keep_old_count);
    let provider = LocalProvider::new(LocalStorageConfig::new(&env.bucket)).unwrap();
    let storage = Storage::new(Arc::new(provider));
    let downloader = Downloader::new(config, storage, extractor).await.unwrap();
    (downloader, env)
}

/// Gzipped tarball bytes holding the given files
pub(crate) fn tar_gz_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        builder.append_data(&mut header, name, *content).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Create `name` under `dir` with a modification time `age_secs` in the past
pub(crate) fn create_aged_entry(dir: &Path, name: &str, age_secs: u64) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, name.as_bytes()).unwrap();
    let mtime = SystemTime::now() - Duration::from_secs(age_secs);
    std::fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
    path
}

/// Extractor that always fails, for exercising cleanup after a bad archive
pub(crate) struct FailingExtractor;

#[async_trait]
impl Extractor for FailingExtractor {
    async fn extract(&self, archive: &Path, _destination: &Path) -> Result<Vec<PathBuf>> {
        Err(Error::Extract {
            archive: archive.to_path_buf(),
            reason: "corrupt archive".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}
