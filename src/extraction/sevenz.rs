use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::shared::{
    collect_extracted_files, prepare_destination, run_blocking_extract, validate_extracted_paths,
};

/// Archive extractor for 7z files
pub struct SevenZipExtractor;

impl SevenZipExtractor {
    /// Extract a 7z archive into `dest_path` (blocking)
    ///
    /// sevenz-rust writes the tree itself, so the result is checked for
    /// entries that escaped the destination afterwards.
    pub fn extract_blocking(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting 7z extraction");

        prepare_destination(archive_path, dest_path)?;

        sevenz_rust::decompress_file(archive_path, dest_path).map_err(|e| Error::Extract {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to extract 7z archive: {}", e),
        })?;

        validate_extracted_paths(archive_path, dest_path)?;

        collect_extracted_files(dest_path).map_err(|e| Error::Extract {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to list extracted files: {}", e),
        })
    }

    /// Extract a 7z archive without blocking the async runtime
    pub async fn extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        run_blocking_extract("7z", Self::extract_blocking, archive_path, dest_path).await
    }
}
