//! Archive extraction and creation
//!
//! This module unpacks downloaded artifacts (tar.gz, tar.bz2, tar.xz, tar, ZIP,
//! 7z, RAR) into a destination directory, and packs local files into tarballs
//! or ZIP archives.
//! All blocking archive work runs on tokio's blocking pool.

mod pack;
mod rar;
mod sevenz;
mod shared;
mod tar;
mod traits;
mod zip;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

// Re-exports
pub use pack::create_archive;
pub use rar::RarExtractor;
pub use sevenz::SevenZipExtractor;
pub use shared::{detect_archive_type, sniff_archive_type};
pub use tar::TarExtractor;
pub use traits::{ArchiveExtractor, Extractor};
pub use zip::ZipExtractor;

use crate::error::{Error, Result};
use crate::types::ArchiveType;
use std::path::{Path, PathBuf};
use tracing::info;

/// Unified archive extraction dispatcher
///
/// Detects the archive type from the file name, falling back to the file's
/// magic bytes, and routes to the matching extractor.
///
/// # Returns
/// * `Ok(Vec<PathBuf>)` - List of extracted files on success
/// * `Err(Error::Extract)` - Unknown format, corrupt archive, or I/O failure
///
/// # Example
/// ```no_run
/// use artifact_dl::extraction::extract_archive;
/// use std::path::PathBuf;
///
/// # async fn example() -> artifact_dl::Result<()> {
/// let files = extract_archive(
///     &PathBuf::from("downloads/config-1.tar.gz"),
///     &PathBuf::from("downloads/config-1"),
/// ).await?;
/// println!("Extracted {} files", files.len());
/// # Ok(())
/// # }
/// ```
pub async fn extract_archive(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
    let archive_type = match detect_archive_type(archive_path) {
        Some(archive_type) => archive_type,
        None => {
            let sniff_path = archive_path.to_path_buf();
            tokio::task::spawn_blocking(move || sniff_archive_type(&sniff_path))
                .await
                .ok()
                .flatten()
                .ok_or_else(|| Error::Extract {
                    archive: archive_path.to_path_buf(),
                    reason: format!("unknown archive type for file: {}", archive_path.display()),
                })?
        }
    };

    info!(
        ?archive_path,
        ?archive_type,
        "dispatching extraction to appropriate extractor"
    );

    match archive_type {
        ArchiveType::TarGz => TarExtractor::extract_gz(archive_path, dest_path).await,
        ArchiveType::TarBz2 => TarExtractor::extract_bz2(archive_path, dest_path).await,
        ArchiveType::TarXz => TarExtractor::extract_xz(archive_path, dest_path).await,
        ArchiveType::Tar => TarExtractor::extract_plain(archive_path, dest_path).await,
        ArchiveType::Zip => ZipExtractor::extract(archive_path, dest_path).await,
        ArchiveType::SevenZip => SevenZipExtractor::extract(archive_path, dest_path).await,
        ArchiveType::Rar => RarExtractor::extract(archive_path, dest_path).await,
    }
}
