use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::shared::{prepare_destination, run_blocking_extract};

/// Archive extractor for ZIP files
pub struct ZipExtractor;

impl ZipExtractor {
    /// Extract a single ZIP entry to disk, creating directories as needed
    fn extract_zip_entry(
        mut file: zip::read::ZipFile,
        dest_path: &Path,
        archive_path: &Path,
    ) -> Result<Option<PathBuf>> {
        let file_path = match file.enclosed_name() {
            Some(path) => dest_path.join(path),
            None => {
                warn!(name = file.name(), "skipping entry with unsafe path");
                return Ok(None);
            }
        };

        let io_failure = |what: &str, e: std::io::Error| Error::Extract {
            archive: archive_path.to_path_buf(),
            reason: format!("{} {}: {}", what, file_path.display(), e),
        };

        if file.is_dir() {
            std::fs::create_dir_all(&file_path)
                .map_err(|e| io_failure("failed to create directory", e))?;
            return Ok(None);
        }

        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| io_failure("failed to create parent of", e))?;
        }

        let mut outfile = std::fs::File::create(&file_path)
            .map_err(|e| io_failure("failed to create output file", e))?;
        std::io::copy(&mut file, &mut outfile)
            .map_err(|e| io_failure("failed to extract", e))?;

        Ok(Some(file_path))
    }

    /// Extract a ZIP archive into `dest_path` (blocking)
    pub fn extract_blocking(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting ZIP extraction");

        prepare_destination(archive_path, dest_path)?;

        let file = std::fs::File::open(archive_path).map_err(|e| Error::Extract {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to open ZIP archive: {}", e),
        })?;

        let mut archive = zip::ZipArchive::new(file).map_err(|e| Error::Extract {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to read ZIP archive: {}", e),
        })?;

        let mut extracted_files = Vec::new();
        for i in 0..archive.len() {
            let entry = archive.by_index(i).map_err(|e| Error::Extract {
                archive: archive_path.to_path_buf(),
                reason: format!("failed to read ZIP entry {}: {}", i, e),
            })?;

            if let Some(file_path) = Self::extract_zip_entry(entry, dest_path, archive_path)? {
                extracted_files.push(file_path);
            }
        }

        Ok(extracted_files)
    }

    /// Extract a ZIP archive without blocking the async runtime
    pub async fn extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        run_blocking_extract("ZIP", Self::extract_blocking, archive_path, dest_path).await
    }
}
