//! CLI argument definitions using clap derive macros.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand, ValueHint};
use vigil_common_config::{ConfigLoader, VigilConfig};

use crate::commands::{LogCommand, ScanCommand, ScanFileCommand, VerifyCommand};
use crate::error::CliError;

/// Vigil - tamper-evident file scan auditing
///
/// Scans files with integrity checks and records every result in a
/// hash-chained audit ledger.
#[derive(Debug, Parser)]
#[command(
    name = "vigil",
    author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "VIGIL_CONFIG",
        value_hint = ValueHint::FilePath
    )]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Audit ledger path (overrides configuration)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub ledger: Option<PathBuf>,

    /// Pattern rules path (overrides configuration)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub rules: Option<PathBuf>,

    /// CVE table path (overrides configuration)
    #[arg(long = "cve-db", global = true, value_hint = ValueHint::FilePath)]
    pub cve_db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan every eligible file under a directory
    Scan(ScanCommand),

    /// Scan a single file
    ScanFile(ScanFileCommand),

    /// Verify the audit ledger's hash chain
    Verify(VerifyCommand),

    /// Append an arbitrary event to the audit ledger
    Log(LogCommand),
}

fn override_path(cwd: &Path, flag: &str, value: &Path) -> Result<PathBuf, CliError> {
    if value.as_os_str().is_empty() {
        return Err(CliError::config(format!("{flag} must not be empty")));
    }
    Ok(cwd.join(value))
}

impl Cli {
    /// Load configuration from `--config` or `.vigil/config.yaml`, then apply
    /// path overrides.
    pub fn load_config(&self) -> Result<VigilConfig, CliError> {
        let cwd = std::env::current_dir()
            .map_err(|e| CliError::io("cannot determine working directory", e))?;
        let loader = ConfigLoader::new(&cwd);
        let mut config = match &self.config {
            Some(path) => loader.load_file(path)?,
            None => loader.load()?,
        };

        if let Some(ledger) = &self.ledger {
            config.paths.ledger = override_path(&cwd, "--ledger", ledger)?;
        }
        if let Some(rules) = &self.rules {
            config.paths.rules = override_path(&cwd, "--rules", rules)?;
        }
        if let Some(cve_db) = &self.cve_db {
            config.paths.cve_db = override_path(&cwd, "--cve-db", cve_db)?;
        }
        Ok(config)
    }

    /// Execute the selected command
    pub async fn execute(self, config: VigilConfig) -> Result<(), CliError> {
        let ctx = CommandContext {
            config,
            format: self.format,
        };

        match self.command {
            Command::Scan(cmd) => cmd.execute(&ctx).await,
            Command::ScanFile(cmd) => cmd.execute(&ctx).await,
            Command::Verify(cmd) => cmd.execute(&ctx),
            Command::Log(cmd) => cmd.execute(&ctx),
        }
    }
}

/// Context passed to all commands
#[derive(Debug)]
pub struct CommandContext {
    pub config: VigilConfig,
    pub format: OutputFormat,
}
