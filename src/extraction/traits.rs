//! Extraction seam used by the download pipeline

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Trait for unpacking a downloaded archive
///
/// The download pipeline only talks to this trait, so alternative
/// implementations (or failing stubs in tests) can be swapped in.
///
/// # Examples
///
/// ```no_run
/// use artifact_dl::extraction::{ArchiveExtractor, Extractor};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = ArchiveExtractor;
/// let files = extractor
///     .extract(Path::new("downloads/app.tar.gz"), Path::new("downloads/app"))
///     .await?;
/// println!("{} files", files.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Unpack `archive` into `destination`, creating it if needed
    ///
    /// Returns the regular files written.
    async fn extract(&self, archive: &Path, destination: &Path) -> Result<Vec<PathBuf>>;

    /// Name of this extractor, for logging
    fn name(&self) -> &'static str;
}

/// Default extractor dispatching on archive format
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveExtractor;

#[async_trait]
impl Extractor for ArchiveExtractor {
    async fn extract(&self, archive: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
        super::extract_archive(archive, destination).await
    }

    fn name(&self) -> &'static str {
        "archive"
    }
}
