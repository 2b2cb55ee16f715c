//! Ledger errors.

use crate::canonical::EncodingError;
use std::path::PathBuf;

/// Errors raised by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Missing or invalid ledger configuration.
    #[error("ledger configuration error: {0}")]
    Configuration(String),

    /// The event could not be encoded; nothing was written.
    #[error("failed to encode ledger entry: {0}")]
    Encoding(#[from] EncodingError),

    /// Reading or writing the stream failed.
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream is unparseable or its chain does not verify.
    #[error("ledger corrupted at entry {index}: {reason}")]
    Corruption { index: usize, reason: String },

    /// Another process holds the ledger lock.
    #[error("ledger is locked by another writer: {}", path.display())]
    Locked { path: PathBuf },
}

impl LedgerError {
    /// Whether processing must halt rather than continue with the next item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Corruption { .. })
    }
}
