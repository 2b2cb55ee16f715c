//! Vigil CLI - tamper-evident file scan auditing.
//!
//! Main entry point for the `vigil` binary.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use vigil_common_log::{LogConfig, LogFormat, LogLevel};

mod cli;
mod commands;
mod error;
mod output;

use cli::Cli;
use error::CliError;

/// Application exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Exit {
    Success = 0,
    GeneralError = 1,
    ConfigError = 2,
    IoError = 3,
    Corruption = 4,
    TamperDetected = 5,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("warning: {e}");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to create async runtime: {e}");
            return Exit::GeneralError.into();
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => Exit::Success.into(),
        Err(e) => {
            error!("{e}");
            e.exit_code()
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.load_config()?;
    cli.execute(config).await
}

/// Environment settings win unless verbosity flags were given.
fn init_logging(cli: &Cli) -> Result<(), vigil_common_log::LogError> {
    let mut config = LogConfig::from_env();
    let env_level =
        std::env::var_os("VIGIL_LOG_LEVEL").is_some() || std::env::var_os("RUST_LOG").is_some();
    if cli.verbose > 0 || cli.quiet || !env_level {
        config.level = LogLevel::from_verbosity(cli.verbose, cli.quiet);
    }
    if std::env::var_os("VIGIL_LOG_FORMAT").is_none() {
        config.format = LogFormat::Compact;
    }
    vigil_common_log::init(config)
}
