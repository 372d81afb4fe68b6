use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::shared::{prepare_destination, run_blocking_extract, sanitize_entry_path};

/// Archive extractor for RAR files
pub struct RarExtractor;

impl RarExtractor {
    fn convert_unrar_error(e: unrar::error::UnrarError, archive_path: &Path) -> Error {
        Error::Extract {
            archive: archive_path.to_path_buf(),
            reason: e.to_string(),
        }
    }

    /// Extract a RAR archive into `dest_path` (blocking)
    pub fn extract_blocking(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        debug!(?archive_path, ?dest_path, "attempting RAR extraction");

        prepare_destination(archive_path, dest_path)?;

        let processor = unrar::Archive::new(archive_path)
            .open_for_processing()
            .map_err(|e| Self::convert_unrar_error(e, archive_path))?;

        let mut extracted_files = Vec::new();

        // unrar's typestate API: read_header moves to BeforeFile, extract/skip moves back
        let mut at_header = processor;
        loop {
            let at_file = match at_header.read_header() {
                Ok(Some(entry_processor)) => entry_processor,
                Ok(None) => break,
                Err(e) => return Err(Self::convert_unrar_error(e, archive_path)),
            };

            let header = at_file.entry();
            let target = sanitize_entry_path(&header.filename).map(|p| dest_path.join(p));

            match target {
                Some(file_path) if !header.is_directory() => {
                    at_header = at_file
                        .extract_to(&file_path)
                        .map_err(|e| Self::convert_unrar_error(e, archive_path))?;
                    extracted_files.push(file_path);
                }
                _ => {
                    // Directories are created on demand; unsafe names are dropped
                    at_header = at_file
                        .skip()
                        .map_err(|e| Self::convert_unrar_error(e, archive_path))?;
                }
            }
        }

        Ok(extracted_files)
    }

    /// Extract a RAR archive without blocking the async runtime
    pub async fn extract(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
        run_blocking_extract("RAR", Self::extract_blocking, archive_path, dest_path).await
    }
}
