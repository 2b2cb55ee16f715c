//! Verify command implementation.

use clap::Parser;

use crate::cli::CommandContext;
use crate::error::CliError;
use crate::output::print_output;

/// Verify the audit ledger's hash chain
#[derive(Debug, Parser)]
pub struct VerifyCommand {}

impl VerifyCommand {
    pub fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let path = &ctx.config.paths.ledger;
        let report = vigil_audit_ledger::verify(path)?;
        print_output(ctx, &report)?;

        if report.is_intact() {
            tracing::info!(path = %path.display(), entries = report.entries, "ledger verified");
            Ok(())
        } else {
            Err(CliError::TamperDetected {
                message: format!("ledger {} is {report}", path.display()),
            })
        }
    }
}
