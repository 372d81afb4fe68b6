//! Copying a storage object onto the local disk.

use crate::error::{Error, Result};
use crate::storage::ObjectReader;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Permission bits of written artifacts (unix only)
#[cfg(unix)]
const ARTIFACT_MODE: u32 = 0o755;

/// Stream `reader` into `path`, creating or truncating the file
///
/// Returns the number of bytes written. On failure the partial file is left
/// in place; the reader is dropped on every path.
pub(crate) async fn write_object(mut reader: ObjectReader, path: &Path) -> Result<u64> {
    let write_error = |source: std::io::Error| Error::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(ARTIFACT_MODE);

    let mut file = options.open(path).await.map_err(write_error)?;
    let bytes = match tokio::io::copy(&mut reader, &mut file).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // settle in-flight writes so the partial file is complete on disk
            file.flush().await.ok();
            return Err(write_error(e));
        }
    };
    file.flush().await.map_err(write_error)?;

    debug!(?path, bytes, "object written");
    Ok(bytes)
}
