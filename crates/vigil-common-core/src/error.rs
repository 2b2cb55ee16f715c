//! Error types for Vigil.

use thiserror::Error;

/// Classification of a filesystem failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsErrorKind {
    /// The path does not exist.
    NotFound,
    /// The path exists but could not be read.
    Read,
    /// The file exceeds the caller's size limit.
    TooLarge,
}

/// The main error type for Vigil utility operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem error with the offending path.
    #[error("{message}")]
    FileSystem {
        kind: FsErrorKind,
        message: String,
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl Error {
    /// Whether this error reports a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::FileSystem {
                kind: FsErrorKind::NotFound,
                ..
            }
        )
    }
}

/// Result type alias using Vigil's Error.
pub type Result<T> = std::result::Result<T, Error>;
