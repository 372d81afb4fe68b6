use crate::error::{Error, Result};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use xz2::read::XzDecoder;

use super::shared::{prepare_destination, run_blocking_extract, sanitize_entry_path};

/// Archive extractor for tarballs, plain or gzip/bzip2/xz-compressed
pub struct TarExtractor;

impl TarExtractor {
    /// Unpack every entry of an opened tar stream
    fn unpack_entries<R: Read>(
        mut archive: tar::Archive<R>,
        archive_path: &Path,
        dest_path: &Path,
    ) -> Result<Vec<PathBuf>> {
        let tar_failure = |what: &str, e: std::io::Error| Error::Extract {
            archive: archive_path.to_path_buf(),
            reason: format!("{}: {}", what, e),
        };

        let mut extracted_files = Vec::new();
        let entries = archive
            .entries()
            .map_err(|e| tar_failure("failed to read tar archive", e))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| tar_failure("failed to read tar entry", e))?;
            let raw_path = entry
                .path()
                .map_err(|e| tar_failure("invalid tar entry path", e))?
                .into_owned();

            let Some(relative) = sanitize_entry_path(&raw_path) else {
                if raw_path.as_os_str() != "." && raw_path.as_os_str() != "./" {
                    warn!(?raw_path, "skipping entry with unsafe path");
                }
                continue;
            };

            let entry_type = entry.header().entry_type();
            if entry_type.is_symlink() || entry_type.is_hard_link() {
                warn!(?raw_path, "skipping link entry");
                continue;
            }

            // unpack_in refuses paths outside dest_path and creates parents
            let unpacked = entry
                .unpack_in(dest_path)
                .map_err(|e| tar_failure("failed to unpack tar entry", e))?;

            if unpacked && entry_type.is_file() {
                extracted_files.push(dest_path.join(relative));
            }
        }

        Ok(extracted_files)
    }

    /// Extract a `.tar.gz` / `.tgz` archive into `dest_path` (blocking)
    pub fn extract_gz_blocking(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting tar.gz extraction");
        prepare_destination(archive_path, dest_path)?;

        let file = Self::open(archive_path)?;
        Self::unpack_entries(tar::Archive::new(GzDecoder::new(file)), archive_path, dest_path)
    }

    /// Extract a `.tar.bz2` / `.tbz2` archive into `dest_path` (blocking)
    pub fn extract_bz2_blocking(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting tar.bz2 extraction");
        prepare_destination(archive_path, dest_path)?;

        let file = Self::open(archive_path)?;
        Self::unpack_entries(tar::Archive::new(BzDecoder::new(file)), archive_path, dest_path)
    }

    /// Extract a `.tar.xz` / `.txz` archive into `dest_path` (blocking)
    pub fn extract_xz_blocking(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting tar.xz extraction");
        prepare_destination(archive_path, dest_path)?;

        let file = Self::open(archive_path)?;
        Self::unpack_entries(tar::Archive::new(XzDecoder::new(file)), archive_path, dest_path)
    }

    /// Extract an uncompressed `.tar` archive into `dest_path` (blocking)
    pub fn extract_plain_blocking(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting tar extraction");
        prepare_destination(archive_path, dest_path)?;

        let file = Self::open(archive_path)?;
        Self::unpack_entries(tar::Archive::new(file), archive_path, dest_path)
    }

    fn open(archive_path: &Path) -> Result<std::fs::File> {
        std::fs::File::open(archive_path).map_err(|e| Error::Extract {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to open archive: {}", e),
        })
    }

    /// Extract a gzip-compressed tarball without blocking the async runtime
    pub async fn extract_gz(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        run_blocking_extract("tar.gz", Self::extract_gz_blocking, archive_path, dest_path).await
    }

    /// Extract a bzip2-compressed tarball without blocking the async runtime
    pub async fn extract_bz2(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        run_blocking_extract("tar.bz2", Self::extract_bz2_blocking, archive_path, dest_path).await
    }

    /// Extract an xz-compressed tarball without blocking the async runtime
    pub async fn extract_xz(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        run_blocking_extract("tar.xz", Self::extract_xz_blocking, archive_path, dest_path).await
    }

    /// Extract a plain tarball without blocking the async runtime
    pub async fn extract_plain(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        run_blocking_extract("tar", Self::extract_plain_blocking, archive_path, dest_path).await
    }
}
