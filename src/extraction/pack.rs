use crate::error::{Error, Result};
use crate::types::ArchiveType;
use bzip2::write::BzEncoder;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use xz2::write::XzEncoder;

use super::shared::detect_archive_type;

/// Pack files and directories into a single archive
///
/// The format follows the destination name: `.tar.gz`/`.tgz`,
/// `.tar.bz2`/`.tbz2`, `.tar.xz`/`.txz`, `.tar` or `.zip`.
/// Each source is stored under its own file name at the archive root;
/// directories are added recursively. Returns the number of regular files
/// written.
pub async fn create_archive(sources: &[PathBuf], destination: &Path) -> Result<usize> {
    let archive_type = match detect_archive_type(destination) {
        Some(
            t @ (ArchiveType::TarGz
            | ArchiveType::TarBz2
            | ArchiveType::TarXz
            | ArchiveType::Tar
            | ArchiveType::Zip),
        ) => t,
        _ => {
            return Err(Error::BadRequest(format!(
                "unsupported archive format for {}",
                destination.display()
            )));
        }
    };

    if sources.is_empty() {
        return Err(Error::BadRequest("no sources to archive".to_string()));
    }

    let sources = sources.to_vec();
    let dest = destination.to_path_buf();
    let count = tokio::task::spawn_blocking(move || -> Result<usize> {
        match archive_type {
            ArchiveType::TarGz => {
                let encoder = GzEncoder::new(File::create(&dest)?, Compression::default());
                let (encoder, count) = write_tar(encoder, &sources)?;
                encoder.finish()?;
                Ok(count)
            }
            ArchiveType::TarBz2 => {
                let encoder = BzEncoder::new(File::create(&dest)?, bzip2::Compression::default());
                let (encoder, count) = write_tar(encoder, &sources)?;
                encoder.finish()?;
                Ok(count)
            }
            ArchiveType::TarXz => {
                let encoder = XzEncoder::new(File::create(&dest)?, 6);
                let (encoder, count) = write_tar(encoder, &sources)?;
                encoder.finish()?;
                Ok(count)
            }
            ArchiveType::Tar => write_tar(File::create(&dest)?, &sources).map(|(_, n)| n),
            _ => write_zip(File::create(&dest)?, &sources),
        }
    })
    .await
    .map_err(|e| Error::Io(std::io::Error::other(format!("archive task panicked: {}", e))))??;

    info!(?destination, files = count, "archive created");
    Ok(count)
}

fn entry_name(source: &Path) -> Result<PathBuf> {
    source
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| Error::BadRequest(format!("invalid source path: {}", source.display())))
}

fn write_tar<W: Write>(writer: W, sources: &[PathBuf]) -> Result<(W, usize)> {
    let mut builder = tar::Builder::new(writer);
    builder.follow_symlinks(false);

    let mut count = 0;
    for source in sources {
        let name = entry_name(source)?;
        if source.is_dir() {
            builder.append_dir_all(&name, source)?;
            count += count_files(source)?;
        } else {
            builder.append_path_with_name(source, &name)?;
            count += 1;
        }
        debug!(?source, "added to tarball");
    }

    Ok((builder.into_inner()?, count))
}

fn write_zip(file: File, sources: &[PathBuf]) -> Result<usize> {
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o755);

    let mut files = Vec::new();
    for source in sources {
        let name = entry_name(source)?;
        if source.is_dir() {
            collect_zip_entries(source, &name, &mut files)?;
        } else {
            files.push((source.clone(), name));
        }
    }

    let mut count = 0;
    for (path, name) in files {
        let name = zip_name(&name);
        if path.is_dir() {
            writer.add_directory(name, options).map_err(zip_error)?;
        } else {
            writer.start_file(name, options).map_err(zip_error)?;
            let mut input = File::open(&path)?;
            std::io::copy(&mut input, &mut writer)?;
            count += 1;
        }
    }

    writer.finish().map_err(zip_error)?;
    Ok(count)
}

/// Depth-first listing of `dir` as (disk path, archive name) pairs
fn collect_zip_entries(
    dir: &Path,
    prefix: &Path,
    out: &mut Vec<(PathBuf, PathBuf)>,
) -> Result<()> {
    out.push((dir.to_path_buf(), prefix.to_path_buf()));

    let mut entries = std::fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let name = prefix.join(entry.file_name());
        let file_type = std::fs::symlink_metadata(&path)?.file_type();
        if file_type.is_dir() {
            collect_zip_entries(&path, &name, out)?;
        } else if file_type.is_file() {
            out.push((path, name));
        }
    }
    Ok(())
}

/// ZIP entry names always use forward slashes
fn zip_name(name: &Path) -> String {
    name.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn count_files(dir: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let file_type = std::fs::symlink_metadata(&path)?.file_type();
        if file_type.is_dir() {
            count += count_files(&path)?;
        } else if file_type.is_file() {
            count += 1;
        }
    }
    Ok(count)
}

fn zip_error(e: zip::result::ZipError) -> Error {
    Error::Io(std::io::Error::other(e))
}
