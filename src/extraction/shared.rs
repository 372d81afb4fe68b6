use crate::error::{Error, Result};
use crate::types::ArchiveType;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

/// Run a blocking extractor on the blocking thread pool.
///
/// This is the single implementation behind every format's `extract`.
pub(crate) async fn run_blocking_extract(
    format_name: &'static str,
    extract_fn: fn(&Path, &Path) -> Result<Vec<PathBuf>>,
    archive_path: &Path,
    dest_path: &Path,
) -> Result<Vec<PathBuf>> {
    info!(?archive_path, ?dest_path, "starting {} extraction", format_name);

    let archive_path_owned = archive_path.to_path_buf();
    let dest_path_owned = dest_path.to_path_buf();

    let result = spawn_blocking(move || extract_fn(&archive_path_owned, &dest_path_owned))
        .await
        .map_err(|e| Error::Extract {
            archive: archive_path.to_path_buf(),
            reason: format!("extraction task panicked: {}", e),
        })?;

    match &result {
        Ok(files) => info!(
            ?archive_path,
            extracted_count = files.len(),
            "{} extraction successful",
            format_name
        ),
        Err(e) => warn!(
            ?archive_path,
            error = %e,
            "{} extraction failed",
            format_name
        ),
    }

    result
}

/// Detect archive type from the file name
///
/// Multi-part suffixes are checked before single ones so that
/// `config.tar.gz` is a gzipped tarball, not a plain gzip stream.
pub fn detect_archive_type(path: &Path) -> Option<ArchiveType> {
    let name = path.file_name()?.to_str()?.to_lowercase();

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(ArchiveType::TarGz)
    } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
        Some(ArchiveType::TarBz2)
    } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
        Some(ArchiveType::TarXz)
    } else if name.ends_with(".tar") {
        Some(ArchiveType::Tar)
    } else if name.ends_with(".zip") {
        Some(ArchiveType::Zip)
    } else if name.ends_with(".7z") {
        Some(ArchiveType::SevenZip)
    } else if name.ends_with(".rar") || name.ends_with(".r00") {
        Some(ArchiveType::Rar)
    } else {
        None
    }
}

/// Detect archive type from the leading bytes of the file
///
/// Used when the name carries no recognizable suffix. A bare gzip, bzip2 or
/// xz stream is assumed to wrap a tarball.
pub fn sniff_archive_type(path: &Path) -> Option<ArchiveType> {
    let mut header = [0u8; 262];
    let mut file = std::fs::File::open(path).ok()?;
    let mut filled = 0;
    while filled < header.len() {
        match file.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(_) => return None,
        }
    }
    let header = &header[..filled];

    if header.starts_with(b"PK\x03\x04") || header.starts_with(b"PK\x05\x06") {
        Some(ArchiveType::Zip)
    } else if header.starts_with(&[0x1f, 0x8b]) {
        Some(ArchiveType::TarGz)
    } else if header.starts_with(b"BZh") {
        Some(ArchiveType::TarBz2)
    } else if header.starts_with(b"\xFD7zXZ\x00") {
        Some(ArchiveType::TarXz)
    } else if header.starts_with(b"7z\xBC\xAF\x27\x1C") {
        Some(ArchiveType::SevenZip)
    } else if header.starts_with(b"Rar!\x1A\x07") {
        Some(ArchiveType::Rar)
    } else if header.len() >= 262 && &header[257..262] == b"ustar" {
        Some(ArchiveType::Tar)
    } else {
        None
    }
}

/// Reduce an archive entry name to its normal components
///
/// Returns `None` when nothing safe is left (absolute roots and `..` are
/// dropped), in which case the entry must be skipped.
pub(crate) fn sanitize_entry_path(name: &Path) -> Option<PathBuf> {
    let sanitized: PathBuf = name
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();

    if sanitized.as_os_str().is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// Create the extraction destination directory
pub(crate) fn prepare_destination(archive_path: &Path, dest_path: &Path) -> Result<()> {
    std::fs::create_dir_all(dest_path).map_err(|e| Error::Extract {
        archive: archive_path.to_path_buf(),
        reason: format!("failed to create destination {}: {}", dest_path.display(), e),
    })
}

/// Validate that all extracted files are within the destination directory.
///
/// Used after extractors that write the tree themselves (7z), where entry
/// names cannot be checked up front.
pub(crate) fn validate_extracted_paths(archive_path: &Path, dest_path: &Path) -> Result<()> {
    let canonical_dest = dest_path.canonicalize().map_err(|e| Error::Extract {
        archive: archive_path.to_path_buf(),
        reason: format!("failed to canonicalize destination path: {}", e),
    })?;

    for path in walk_files(dest_path, true)? {
        let canonical = path.canonicalize().map_err(|e| Error::Extract {
            archive: archive_path.to_path_buf(),
            reason: format!("failed to canonicalize extracted path: {}", e),
        })?;

        if !canonical.starts_with(&canonical_dest) {
            return Err(Error::Extract {
                archive: archive_path.to_path_buf(),
                reason: format!(
                    "path traversal detected: extracted file {:?} is outside destination",
                    canonical
                ),
            });
        }
    }

    Ok(())
}

/// Recursively collect all files (not directories) below a directory
pub(crate) fn collect_extracted_files(dir: &Path) -> Result<Vec<PathBuf>> {
    walk_files(dir, false)
}

fn walk_files(dir: &Path, include_dirs: bool) -> Result<Vec<PathBuf>> {
    fn visit_dir(dir: &Path, include_dirs: bool, out: &mut Vec<PathBuf>) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            // symlink_metadata so a link to a directory outside dest is not followed
            let is_dir = std::fs::symlink_metadata(&path)?.is_dir();
            if is_dir {
                if include_dirs {
                    out.push(path.clone());
                }
                visit_dir(&path, include_dirs, out)?;
            } else {
                out.push(path);
            }
        }
        Ok(())
    }

    let mut out = Vec::new();
    visit_dir(dir, include_dirs, &mut out)?;
    debug!(?dir, count = out.len(), "walked extracted tree");
    Ok(out)
}
