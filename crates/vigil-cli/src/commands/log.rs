//! Log command implementation.

use clap::Parser;
use vigil_audit_ledger::Event;

use crate::cli::CommandContext;
use crate::commands::open_ledger;
use crate::error::CliError;
use crate::output::{print_output, LoggedEntry};

/// Append an arbitrary event to the audit ledger
#[derive(Debug, Parser)]
pub struct LogCommand {
    /// Event as a JSON object, e.g. '{"event":"startup"}'
    #[arg(long)]
    pub event: String,
}

impl LogCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let event: Event = serde_json::from_str(&self.event)
            .map_err(|e| CliError::invalid(format!("--event must be a JSON object: {e}")))?;
        let ledger = open_ledger(&ctx.config)?;
        let entry_hash = ledger.append(&event)?;
        print_output(ctx, &LoggedEntry { entry_hash })
    }
}
