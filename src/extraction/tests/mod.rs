use crate::error::Error;
use crate::extraction::*;
use crate::types::ArchiveType;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Append a regular file entry with the given name and content
fn append_tar_file<W: Write>(builder: &mut ::tar::Builder<W>, name: &str, content: &[u8]) {
    let mut header = ::tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_entry_type(::tar::EntryType::Regular);
    builder.append_data(&mut header, name, content).unwrap();
}

/// Create a gzip-compressed tarball containing the given files
fn create_tar_gz(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut builder = ::tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, content) in files {
        append_tar_file(&mut builder, name, content);
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Create a bzip2-compressed tarball containing the given files
fn create_tar_bz2(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let encoder = ::bzip2::write::BzEncoder::new(file, ::bzip2::Compression::default());
    let mut builder = ::tar::Builder::new(encoder);
    for (name, content) in files {
        append_tar_file(&mut builder, name, content);
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Create an xz-compressed tarball containing the given files
fn create_tar_xz(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut builder = ::tar::Builder::new(::xz2::write::XzEncoder::new(file, 6));
    for (name, content) in files {
        append_tar_file(&mut builder, name, content);
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Create an uncompressed tarball containing the given files
fn create_tar(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut builder = ::tar::Builder::new(file);
    for (name, content) in files {
        append_tar_file(&mut builder, name, content);
    }
    builder.finish().unwrap();
}

/// Create a tarball whose single entry name climbs out of the destination
///
/// `append_data` refuses `..`, so the raw name bytes are written directly.
fn create_tar_with_traversal(archive_path: &Path) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut builder = ::tar::Builder::new(file);

    let content = b"escaped";
    let mut header = ::tar::Header::new_old();
    let name = b"../evil.txt";
    header.as_old_mut().name[..name.len()].copy_from_slice(name);
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_entry_type(::tar::EntryType::Regular);
    header.set_cksum();
    builder.append(&header, &content[..]).unwrap();

    append_tar_file(&mut builder, "safe.txt", b"kept");
    builder.finish().unwrap();
}

/// Create a ZIP archive containing multiple files
fn create_zip_archive(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options =
        ::zip::write::FileOptions::default().compression_method(::zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        std::io::Write::write_all(&mut writer, content).unwrap();
    }
    writer.finish().unwrap();
}

/// Create a valid 7z archive from a source directory using sevenz_rust
fn create_7z_archive(archive_path: &Path, source_dir: &Path) {
    sevenz_rust::compress_to_path(source_dir, archive_path).unwrap();
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn sorted_names(files: &[PathBuf], root: &Path) -> Vec<String> {
    let mut names: Vec<String> = files
        .iter()
        .map(|p| {
            p.strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    names.sort();
    names
}

// ---------------------------------------------------------------------------
// Format detection
// ---------------------------------------------------------------------------

#[test]
fn test_detect_archive_type_tar_gz() {
    assert_eq!(
        detect_archive_type(Path::new("config-1.tar.gz")),
        Some(ArchiveType::TarGz)
    );
    assert_eq!(
        detect_archive_type(Path::new("CONFIG.TGZ")),
        Some(ArchiveType::TarGz)
    );
}

#[test]
fn test_detect_archive_type_other_formats() {
    assert_eq!(
        detect_archive_type(Path::new("bundle.tar")),
        Some(ArchiveType::Tar)
    );
    assert_eq!(
        detect_archive_type(Path::new("config-1.tar.bz2")),
        Some(ArchiveType::TarBz2)
    );
    assert_eq!(
        detect_archive_type(Path::new("config-1.TBZ2")),
        Some(ArchiveType::TarBz2)
    );
    assert_eq!(
        detect_archive_type(Path::new("config-1.tar.xz")),
        Some(ArchiveType::TarXz)
    );
    assert_eq!(
        detect_archive_type(Path::new("config-1.txz")),
        Some(ArchiveType::TarXz)
    );
    assert_eq!(
        detect_archive_type(Path::new("/tmp/site.zip")),
        Some(ArchiveType::Zip)
    );
    assert_eq!(
        detect_archive_type(Path::new("data.7z")),
        Some(ArchiveType::SevenZip)
    );
    assert_eq!(
        detect_archive_type(Path::new("data.rar")),
        Some(ArchiveType::Rar)
    );
    assert_eq!(
        detect_archive_type(Path::new("data.r00")),
        Some(ArchiveType::Rar)
    );
}

#[test]
fn test_detect_archive_type_unknown() {
    assert_eq!(detect_archive_type(Path::new("notes.txt")), None);
    assert_eq!(detect_archive_type(Path::new("payload.gz")), None);
    assert_eq!(detect_archive_type(Path::new("noext")), None);
}

#[test]
fn test_sniff_archive_type_from_content() {
    let dir = TempDir::new().unwrap();

    let gz = dir.path().join("blob-a");
    create_tar_gz(&gz, &[("a.txt", b"a")]);
    assert_eq!(sniff_archive_type(&gz), Some(ArchiveType::TarGz));

    let zip = dir.path().join("blob-b");
    create_zip_archive(&zip, &[("b.txt", b"b")]);
    assert_eq!(sniff_archive_type(&zip), Some(ArchiveType::Zip));

    let tar = dir.path().join("blob-c");
    create_tar(&tar, &[("c.txt", b"c")]);
    assert_eq!(sniff_archive_type(&tar), Some(ArchiveType::Tar));

    let bz2 = dir.path().join("blob-e");
    create_tar_bz2(&bz2, &[("e.txt", b"e")]);
    assert_eq!(sniff_archive_type(&bz2), Some(ArchiveType::TarBz2));

    let xz = dir.path().join("blob-f");
    create_tar_xz(&xz, &[("f.txt", b"f")]);
    assert_eq!(sniff_archive_type(&xz), Some(ArchiveType::TarXz));

    let text = dir.path().join("blob-d");
    std::fs::write(&text, b"plain text").unwrap();
    assert_eq!(sniff_archive_type(&text), None);
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_extract_tar_gz() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("config-1.tar.gz");
    create_tar_gz(
        &archive,
        &[("app.yaml", b"port: 80"), ("nested/db.yaml", b"host: db")],
    );

    let dest = dir.path().join("config-1");
    let files = extract_archive(&archive, &dest).await.unwrap();

    assert_eq!(sorted_names(&files, &dest), vec!["app.yaml", "nested/db.yaml"]);
    assert_eq!(read(dest.join("app.yaml")), "port: 80");
    assert_eq!(read(dest.join("nested/db.yaml")), "host: db");
}

#[tokio::test]
async fn test_extract_tar_bz2() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("config-2.tar.bz2");
    create_tar_bz2(&archive, &[("app.yaml", b"rev: 2"), ("certs/ca.pem", b"CA-pem")]);

    let dest = dir.path().join("config-2");
    let files = extract_archive(&archive, &dest).await.unwrap();

    assert_eq!(sorted_names(&files, &dest), vec!["app.yaml", "certs/ca.pem"]);
    assert_eq!(read(dest.join("app.yaml")), "rev: 2");
}

#[tokio::test]
async fn test_extract_tar_xz() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("config-3.txz");
    create_tar_xz(&archive, &[("app.yaml", b"rev: 3"), ("certs/ca.pem", b"CA-pem")]);

    let dest = dir.path().join("config-3");
    let files = extract_archive(&archive, &dest).await.unwrap();

    assert_eq!(sorted_names(&files, &dest), vec!["app.yaml", "certs/ca.pem"]);
    assert_eq!(read(dest.join("certs/ca.pem")), "CA-pem");
}

#[tokio::test]
async fn test_extract_plain_tar() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("bundle.tar");
    create_tar(&archive, &[("readme.md", b"# bundle")]);

    let dest = dir.path().join("bundle");
    let files = extract_archive(&archive, &dest).await.unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(read(dest.join("readme.md")), "# bundle");
}

#[tokio::test]
async fn test_extract_tar_skips_traversal_entries() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("evil.tar");
    create_tar_with_traversal(&archive);

    let dest = dir.path().join("out");
    let files = extract_archive(&archive, &dest).await.unwrap();

    assert_eq!(sorted_names(&files, &dest), vec!["safe.txt"]);
    assert!(!dir.path().join("evil.txt").exists());
}

#[tokio::test]
async fn test_extract_zip() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("site.zip");
    create_zip_archive(
        &archive,
        &[("index.html", b"<html/>"), ("css/main.css", b"body{}")],
    );

    let dest = dir.path().join("site");
    let files = extract_archive(&archive, &dest).await.unwrap();

    assert_eq!(
        sorted_names(&files, &dest),
        vec!["css/main.css", "index.html"]
    );
    assert_eq!(read(dest.join("css/main.css")), "body{}");
}

#[tokio::test]
async fn test_extract_zip_skips_traversal_entries() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("evil.zip");
    create_zip_archive(&archive, &[("../evil.txt", b"escaped"), ("ok.txt", b"ok")]);

    let dest = dir.path().join("out");
    let files = extract_archive(&archive, &dest).await.unwrap();

    assert_eq!(sorted_names(&files, &dest), vec!["ok.txt"]);
    assert!(!dir.path().join("evil.txt").exists());
}

#[tokio::test]
async fn test_extract_7z() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    std::fs::create_dir_all(&source).unwrap();
    std::fs::write(source.join("data.bin"), b"seven").unwrap();

    let archive = dir.path().join("data.7z");
    create_7z_archive(&archive, &source);

    let dest = dir.path().join("data");
    let files = extract_archive(&archive, &dest).await.unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(read(&files[0]), "seven");
}

#[tokio::test]
async fn test_extract_without_suffix_uses_magic_bytes() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("artifact");
    create_tar_gz(&archive, &[("bin/tool", b"#!/bin/sh")]);

    let dest = dir.path().join("artifact-out");
    let files = extract_archive(&archive, &dest).await.unwrap();

    assert_eq!(sorted_names(&files, &dest), vec!["bin/tool"]);
}

#[tokio::test]
async fn test_extract_archive_unknown_type() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, b"just text").unwrap();

    let result = extract_archive(&file, &dir.path().join("notes")).await;

    match result {
        Err(Error::Extract { archive, reason }) => {
            assert_eq!(archive, file);
            assert!(reason.contains("unknown archive type"), "{reason}");
        }
        other => panic!("expected extract error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_extract_corrupt_archive_fails() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("broken.tar.gz");
    std::fs::write(&archive, b"this is not gzip").unwrap();

    let result = extract_archive(&archive, &dir.path().join("broken")).await;
    assert!(matches!(result, Err(Error::Extract { .. })));
}

#[tokio::test]
async fn test_extract_missing_archive_fails() {
    let dir = TempDir::new().unwrap();
    let result = extract_archive(
        &dir.path().join("missing.zip"),
        &dir.path().join("missing"),
    )
    .await;
    assert!(matches!(result, Err(Error::Extract { .. })));
}

#[tokio::test]
async fn test_archive_extractor_trait() {
    let dir = TempDir::new().unwrap();
    let archive = dir.path().join("app.tgz");
    create_tar_gz(&archive, &[("app", b"binary")]);

    let extractor: std::sync::Arc<dyn Extractor> = std::sync::Arc::new(ArchiveExtractor);
    assert_eq!(extractor.name(), "archive");

    let dest = dir.path().join("app");
    let files = extractor.extract(&archive, &dest).await.unwrap();
    assert_eq!(files, vec![dest.join("app")]);
}

// ---------------------------------------------------------------------------
// Archive creation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_tar_gz_then_extract() {
    let dir = TempDir::new().unwrap();
    let conf = dir.path().join("conf");
    std::fs::create_dir_all(conf.join("sub")).unwrap();
    std::fs::write(conf.join("a.toml"), b"a = 1").unwrap();
    std::fs::write(conf.join("sub/b.toml"), b"b = 2").unwrap();
    let extra = dir.path().join("VERSION");
    std::fs::write(&extra, b"1.2.3").unwrap();

    let archive = dir.path().join("release.tar.gz");
    let count = create_archive(&[conf, extra], &archive).await.unwrap();
    assert_eq!(count, 3);

    let dest = dir.path().join("release");
    let files = extract_archive(&archive, &dest).await.unwrap();
    assert_eq!(
        sorted_names(&files, &dest),
        vec!["VERSION", "conf/a.toml", "conf/sub/b.toml"]
    );
    assert_eq!(read(dest.join("conf/sub/b.toml")), "b = 2");
}

#[tokio::test]
async fn test_create_zip_then_extract() {
    let dir = TempDir::new().unwrap();
    let site = dir.path().join("site");
    std::fs::create_dir_all(site.join("img")).unwrap();
    std::fs::write(site.join("index.html"), b"<p>hi</p>").unwrap();
    std::fs::write(site.join("img/logo.svg"), b"<svg/>").unwrap();

    let archive = dir.path().join("site.zip");
    let count = create_archive(&[site], &archive).await.unwrap();
    assert_eq!(count, 2);

    let dest = dir.path().join("unzipped");
    let files = extract_archive(&archive, &dest).await.unwrap();
    assert_eq!(
        sorted_names(&files, &dest),
        vec!["site/img/logo.svg", "site/index.html"]
    );
}

#[tokio::test]
async fn test_create_compressed_tarballs_then_extract() {
    let dir = TempDir::new().unwrap();
    let conf = dir.path().join("conf");
    std::fs::create_dir_all(&conf).unwrap();
    std::fs::write(conf.join("a.toml"), b"a = 1").unwrap();

    for name in ["release.tar.bz2", "release.tar.xz"] {
        let archive = dir.path().join(name);
        let count = create_archive(&[conf.clone()], &archive).await.unwrap();
        assert_eq!(count, 1);

        let dest = dir.path().join(format!("out-{name}"));
        let files = extract_archive(&archive, &dest).await.unwrap();
        assert_eq!(sorted_names(&files, &dest), vec!["conf/a.toml"]);
        assert_eq!(read(dest.join("conf/a.toml")), "a = 1");
    }
}

#[tokio::test]
async fn test_create_archive_rejects_unsupported_format() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.txt");
    std::fs::write(&file, b"a").unwrap();

    let result = create_archive(&[file.clone()], &dir.path().join("out.7z")).await;
    assert!(matches!(result, Err(Error::BadRequest(_))));

    let result = create_archive(&[], &dir.path().join("out.tar")).await;
    assert!(matches!(result, Err(Error::BadRequest(_))));
}
