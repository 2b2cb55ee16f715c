//! Check results.

use crate::vulnerability::VulnerabilityRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The success value of a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckValue {
    /// Hex digests keyed by algorithm.
    Digests(BTreeMap<String, String>),
    /// Whether the detached signature verified.
    SignatureValid(bool),
    /// Matched rule identifiers, in rule order.
    Matches(Vec<String>),
    /// Whether the target is world-readable or world-writable.
    InsecurePermissions(bool),
    /// Known vulnerabilities for the target's declared software.
    Vulnerabilities(Vec<VulnerabilityRecord>),
    /// The check does not apply to this target.
    NotApplicable { reason: String },
}

/// Classification of a check failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MissingInput,
    Io,
    InvalidInput,
    Unsupported,
    Timeout,
    Cancelled,
    Panicked,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingInput => "missing input",
            Self::Io => "i/o error",
            Self::InvalidInput => "invalid input",
            Self::Unsupported => "unsupported",
            Self::Timeout => "timed out",
            Self::Cancelled => "cancelled",
            Self::Panicked => "panicked",
        };
        f.write_str(s)
    }
}

/// A typed check failure with a human-readable cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CheckFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl CheckFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing(message: impl Into<String>) -> Self {
        Self::new(FailureKind::MissingInput, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Io, message)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidInput, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Unsupported, message)
    }
}

impl From<vigil_common_core::Error> for CheckFailure {
    fn from(err: vigil_common_core::Error) -> Self {
        use vigil_common_core::{Error, FsErrorKind};
        match &err {
            Error::FileSystem {
                kind: FsErrorKind::NotFound,
                ..
            } => Self::missing(err.to_string()),
            Error::FileSystem {
                kind: FsErrorKind::TooLarge,
                ..
            } => Self::invalid(err.to_string()),
            _ => Self::io(err.to_string()),
        }
    }
}

/// What a check returns.
pub type Outcome = Result<CheckValue, CheckFailure>;

/// Serialized form of an [`Outcome`] inside a scan result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    Ok { value: CheckValue },
    NotApplicable { reason: String },
    Failed { kind: FailureKind, message: String },
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The success value, if any.
    pub fn value(&self) -> Option<&CheckValue> {
        match self {
            Self::Ok { value } => Some(value),
            _ => None,
        }
    }

    /// The failure kind, if any.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<Outcome> for CheckOutcome {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Ok(CheckValue::NotApplicable { reason }) => Self::NotApplicable { reason },
            Ok(value) => Self::Ok { value },
            Err(CheckFailure { kind, message }) => Self::Failed { kind, message },
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok { value } => match value {
                CheckValue::Digests(d) => {
                    let parts: Vec<String> = d.iter().map(|(k, v)| format!("{k}={v}")).collect();
                    write!(f, "{}", parts.join(" "))
                }
                CheckValue::SignatureValid(v) => write!(f, "signature valid: {v}"),
                CheckValue::Matches(m) if m.is_empty() => write!(f, "no matches"),
                CheckValue::Matches(m) => write!(f, "matched: {}", m.join(", ")),
                CheckValue::InsecurePermissions(v) => write!(f, "insecure permissions: {v}"),
                CheckValue::Vulnerabilities(v) if v.is_empty() => write!(f, "no known vulnerabilities"),
                CheckValue::Vulnerabilities(v) => {
                    let ids: Vec<&str> = v.iter().map(|r| r.cve.as_str()).collect();
                    write!(f, "vulnerable: {}", ids.join(", "))
                }
                CheckValue::NotApplicable { reason } => write!(f, "not applicable: {reason}"),
            },
            Self::NotApplicable { reason } => write!(f, "not applicable: {reason}"),
            Self::Failed { kind, message } => write!(f, "failed ({kind}): {message}"),
        }
    }
}
