//! Command implementations.

mod log;
mod scan;
mod verify;

pub use log::LogCommand;
pub use scan::{ScanCommand, ScanFileCommand};
pub use verify::VerifyCommand;

use vigil_audit_ledger::{Ledger, RecoveryPolicy};
use vigil_common_config::{RecoveryMode, VigilConfig};

use crate::error::CliError;

/// Open the configured ledger with the configured recovery policy.
pub(crate) fn open_ledger(config: &VigilConfig) -> Result<Ledger, CliError> {
    let policy = match config.ledger.recovery {
        RecoveryMode::Refuse => RecoveryPolicy::Refuse,
        RecoveryMode::TruncateTornTail => RecoveryPolicy::TruncateTornTail,
    };
    Ok(Ledger::open_with(&config.paths.ledger, policy)?)
}
