//! Scan command implementations.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueHint};
use vigil_common_config::VigilConfig;
use vigil_scan::{AuditStatus, Orchestrator, OrchestratorConfig, Walker};
use vigil_scan_checks::{CheckRegistry, ScanTarget, SoftwareIdentity};

use crate::cli::CommandContext;
use crate::commands::open_ledger;
use crate::error::CliError;
use crate::output::print_output;

fn orchestrator(config: &VigilConfig) -> Result<Orchestrator, CliError> {
    let ledger = Arc::new(open_ledger(config)?);
    let registry = CheckRegistry::standard(&config.scan.enabled_checks);
    Ok(Orchestrator::new(
        ledger,
        registry,
        OrchestratorConfig::from_config(config),
    ))
}

/// Scan every eligible file under a directory
#[derive(Debug, Parser)]
pub struct ScanCommand {
    /// Directory to walk
    #[arg(value_hint = ValueHint::DirPath)]
    pub root: PathBuf,
}

impl ScanCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let config = &ctx.config;
        let walker = Walker::new(config.walker.clone())
            .exclude_path(&config.paths.ledger)
            .exclude_path(&config.paths.rules)
            .exclude_path(&config.paths.cve_db);
        // Reject a bad root before the ledger is created.
        walker.discover(&self.root)?;

        let orchestrator = orchestrator(config)?;
        let summary = walker.run(&self.root, &orchestrator).await?;
        print_output(ctx, &summary)
    }
}

/// Scan a single file
#[derive(Debug, Parser)]
pub struct ScanFileCommand {
    /// File to scan
    #[arg(value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Declared software name for the vulnerability lookup
    #[arg(long, requires = "software_version")]
    pub software: Option<String>,

    /// Declared software version for the vulnerability lookup
    #[arg(long = "software-version", requires = "software")]
    pub software_version: Option<String>,
}

impl ScanFileCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<(), CliError> {
        let mut target = ScanTarget::new(&self.file);
        if let (Some(name), Some(version)) = (&self.software, &self.software_version) {
            target = target.with_software(SoftwareIdentity::new(name, version));
        }

        let orchestrator = orchestrator(&ctx.config)?;
        let report = orchestrator.scan(target).await;
        print_output(ctx, &report)?;

        match report.into_non_fatal()?.audit {
            AuditStatus::Logged { .. } => Ok(()),
            AuditStatus::LogFailed { error } => Err(error.into()),
        }
    }
}
