use super::*;
use crate::downloader::test_helpers::{
    FailingExtractor, create_aged_entry, create_test_downloader, create_test_downloader_with,
    tar_gz_bytes,
};
use crate::error::Error;
use crate::types::{DownloadRequest, Event, Stage};
use std::time::Duration;


/// Collect every event currently buffered in `rx`
fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_new_creates_download_dir() {
    let (downloader, env) = create_test_downloader(5).await;

    assert!(env.downloads.is_dir());
    assert_eq!(downloader.config().download_dir(), &env.downloads);
    assert_eq!(downloader.storage().name(), "local-file");
}

#[tokio::test]
async fn test_new_fails_when_download_dir_cannot_be_created() {
    let (mut config, env) = crate::downloader::test_helpers::test_config(5);
    // a regular file blocks directory creation beneath it
    let blocker = env.bucket.join("blocker");
    std::fs::write(&blocker, b"x").unwrap();
    config.download.download_dir = blocker.join("downloads");

    let provider =
        crate::storage::LocalProvider::new(crate::config::LocalStorageConfig::new(&env.bucket))
            .unwrap();
    let storage = Storage::new(Arc::new(provider));
    let result = Downloader::new(config, storage, Arc::new(crate::extraction::ArchiveExtractor)).await;

    assert!(matches!(result, Err(Error::Io(_))));
}
