//! Hash-chained, append-only audit ledger.
//!
//! Every entry commits to the previous one through `prev_hash`, so editing,
//! reordering or dropping a historical entry is detectable by [`verify`].
//! Entries are stored one canonical JSON object per line.

pub mod canonical;
mod entry;
mod error;
mod ledger;
mod replay;

pub use canonical::EncodingError;
pub use entry::LedgerEntry;
pub use error::LedgerError;
pub use ledger::{Ledger, RecoveryPolicy};
pub use replay::{Inconsistency, InconsistencyKind, VerifyReport};
pub use vigil_common_core::ZERO_DIGEST;

/// An event payload: a JSON object.
pub type Event = serde_json::Map<String, serde_json::Value>;

/// Verify the ledger stored at `path` without opening it for writing.
///
/// Takes a shared advisory lock, so it fails with [`LedgerError::Locked`]
/// while a [`Ledger`] holds the file open. A missing file is an intact,
/// empty chain.
pub fn verify(path: impl AsRef<std::path::Path>) -> Result<VerifyReport, LedgerError> {
    ledger::verify_path(path.as_ref())
}
