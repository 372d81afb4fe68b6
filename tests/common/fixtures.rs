//! Scratch buckets, destinations and archives

use artifact_dl::config::{LocalStorageConfig, StorageConfig};
use artifact_dl::extraction::ArchiveExtractor;
use artifact_dl::storage::{Storage, build_provider};
use artifact_dl::{Config, Downloader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// A local bucket and destination directory inside one temp dir
pub struct Fixture {
    pub temp_dir: TempDir,
    pub bucket: PathBuf,
    pub downloads: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let bucket = temp_dir.path().join("bucket");
        let downloads = temp_dir.path().join("downloads");
        std::fs::create_dir_all(&bucket).unwrap();
        Self {
            temp_dir,
            bucket,
            downloads,
        }
    }

    /// Configuration pointing at this fixture
    pub fn config(&self, keep_old_count: usize) -> Config {
        let mut config = Config::default();
        config.download.download_dir = self.downloads.clone();
        config.download.keep_old_count = keep_old_count;
        config.storage = StorageConfig::Local(LocalStorageConfig::new(&self.bucket));
        config.server.bind_address = "127.0.0.1:0".parse().unwrap();
        config
    }

    /// Storage facade over the fixture bucket
    pub async fn storage(&self) -> Storage {
        let config = self.config(0);
        Storage::new(build_provider(&config.storage).await.unwrap())
    }

    /// Downloader wired the way the binary wires it
    pub async fn downloader(&self, keep_old_count: usize) -> Arc<Downloader> {
        let config = self.config(keep_old_count);
        config.validate().unwrap();
        let storage = Storage::new(build_provider(&config.storage).await.unwrap());
        Arc::new(
            Downloader::new(config, storage, Arc::new(ArchiveExtractor))
                .await
                .unwrap(),
        )
    }

    /// Write a file into the bucket
    pub fn put(&self, key: &str, content: &[u8]) {
        let path = self.bucket.join(key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    /// Scratch directory outside bucket and destination
    pub fn scratch(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join("scratch").join(name);
        std::fs::create_dir_all(&path).unwrap();
        path
    }
}

/// Populate `dir` with the given relative files
pub fn write_tree(dir: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

/// Backdate the modification time of `path`
pub fn backdate(path: &Path, age: Duration) {
    let file = std::fs::File::options()
        .read(true)
        .open(path)
        .unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}
