//! Helpers for turning storage keys into local names

use crate::error::{Error, Result};

/// Folder name used when a file name has nothing before its first dot
const FALLBACK_FOLDER_NAME: &str = "extracted";

/// Final `/`-separated segment of a storage key
///
/// Trailing slashes are ignored, so `releases/app/` yields `app`. Keys that
/// would name the download directory itself or its parent (empty, `.`,
/// `..`) are rejected.
///
/// # Examples
///
/// ```
/// use artifact_dl::utils::file_name_from_key;
///
/// assert_eq!(file_name_from_key("a/b/config-1.tar.gz").unwrap(), "config-1.tar.gz");
/// assert!(file_name_from_key("a/..").is_err());
/// ```
pub fn file_name_from_key(key: &str) -> Result<&str> {
    let trimmed = key.trim_end_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);

    if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
        return Err(Error::BadRequest(format!(
            "key {:?} does not name a file",
            key
        )));
    }
    Ok(name)
}

/// Directory name an archive is extracted into
///
/// The base name is cut at its first dot: `config-1.tar.gz` becomes
/// `config-1`, a name without dots is returned unchanged. Leading dots are
/// skipped so hidden files do not map onto the download directory itself.
///
/// # Examples
///
/// ```
/// use artifact_dl::utils::folder_name_from_file_name;
///
/// assert_eq!(folder_name_from_file_name("a/b/config-1.tar.gz"), "config-1");
/// assert_eq!(folder_name_from_file_name("noext"), "noext");
/// ```
pub fn folder_name_from_file_name(name: &str) -> &str {
    let base = name.rsplit('/').next().unwrap_or(name);
    let visible = base.trim_start_matches('.');

    let folder = match visible.find('.') {
        Some(idx) => &visible[..idx],
        None => visible,
    };

    if folder.is_empty() {
        FALLBACK_FOLDER_NAME
    } else {
        folder
    }
}

/// Interpret the `unarchive` form value
///
/// Only a case-insensitive `true` enables extraction; anything else,
/// including an absent value or one with surrounding whitespace, means no
/// extraction.
pub fn parse_unarchive_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}
