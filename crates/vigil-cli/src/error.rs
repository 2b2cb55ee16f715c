//! CLI error handling.

use std::io;
use std::process::ExitCode;

use thiserror::Error;
use vigil_audit_ledger::LedgerError;
use vigil_common_config::ConfigError;
use vigil_scan::WalkError;

use crate::Exit;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("{message}")]
    Corruption { message: String },

    #[error("{message}")]
    TamperDetected { message: String },

    #[error("{message}")]
    InvalidInput { message: String },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Exit status for this error
    pub fn exit(&self) -> Exit {
        match self {
            Self::Config { .. } => Exit::ConfigError,
            Self::Io { .. } => Exit::IoError,
            Self::Corruption { .. } => Exit::Corruption,
            Self::TamperDetected { .. } => Exit::TamperDetected,
            Self::InvalidInput { .. } | Self::Other(_) => Exit::GeneralError,
        }
    }

    /// Exit code reported to the shell
    pub fn exit_code(&self) -> ExitCode {
        self.exit().into()
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: format!("{}: {source}", message.into()),
            source: Some(source),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<LedgerError> for CliError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::Configuration(_) => Self::config(message),
            LedgerError::Corruption { .. } => Self::Corruption { message },
            LedgerError::Encoding(_) => Self::InvalidInput { message },
            LedgerError::Io(source) => Self::Io {
                message,
                source: Some(source),
            },
            LedgerError::Locked { .. } => Self::Io {
                message,
                source: None,
            },
        }
    }
}

impl From<WalkError> for CliError {
    fn from(err: WalkError) -> Self {
        match err {
            WalkError::Configuration(message) => Self::config(message),
            WalkError::Ledger { source, .. } => source.into(),
        }
    }
}
