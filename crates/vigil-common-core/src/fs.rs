//! Bounded file reads.

use crate::error::{Error, FsErrorKind, Result};
use std::fs;
use std::io;
use std::path::Path;

fn map_io(path: &Path, e: io::Error, what: &str) -> Error {
    let kind = match e.kind() {
        io::ErrorKind::NotFound => FsErrorKind::NotFound,
        _ => FsErrorKind::Read,
    };
    let message = match kind {
        FsErrorKind::NotFound => format!("file not found: {}", path.display()),
        _ => format!("{}: {}: {}", what, path.display(), e),
    };
    Error::FileSystem {
        kind,
        message,
        path: path.to_string_lossy().to_string(),
        source: Some(e),
    }
}

fn check_size(path: &Path, max_size: u64) -> Result<()> {
    let metadata = fs::metadata(path).map_err(|e| map_io(path, e, "failed to read metadata"))?;
    if metadata.len() > max_size {
        return Err(Error::FileSystem {
            kind: FsErrorKind::TooLarge,
            message: format!(
                "file too large: {} bytes (max: {})",
                metadata.len(),
                max_size
            ),
            path: path.to_string_lossy().to_string(),
            source: None,
        });
    }
    Ok(())
}

/// Read a file to string with size limit.
pub fn read_to_string(path: impl AsRef<Path>, max_size: u64) -> Result<String> {
    let path = path.as_ref();
    check_size(path, max_size)?;
    fs::read_to_string(path).map_err(|e| map_io(path, e, "failed to read file"))
}

/// Read a file to bytes with size limit.
pub fn read_bytes(path: impl AsRef<Path>, max_size: u64) -> Result<Vec<u8>> {
    let path = path.as_ref();
    check_size(path, max_size)?;
    fs::read(path).map_err(|e| map_io(path, e, "failed to read file"))
}
