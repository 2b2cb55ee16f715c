//! Configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VigilConfig {
    /// Input and output locations.
    pub paths: PathsConfig,
    /// Scan orchestration settings.
    pub scan: ScanConfig,
    /// Startup walker settings.
    pub walker: WalkerConfig,
    /// Ledger settings.
    pub ledger: LedgerConfig,
}

/// Paths consumed by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Hash-chained audit ledger.
    pub ledger: PathBuf,
    /// Pattern rules source.
    pub rules: PathBuf,
    /// Offline CVE table (JSON).
    pub cve_db: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            ledger: PathBuf::from(".vigil/audit.log"),
            rules: PathBuf::from(".vigil/rules.yar"),
            cve_db: PathBuf::from(".vigil/cve_db.json"),
        }
    }
}

/// The checks the orchestrator knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Hash,
    Signature,
    Pattern,
    Permissions,
    Vulnerabilities,
}

impl CheckKind {
    /// All check kinds in their canonical order.
    pub const ALL: [CheckKind; 5] = [
        CheckKind::Hash,
        CheckKind::Signature,
        CheckKind::Pattern,
        CheckKind::Permissions,
        CheckKind::Vulnerabilities,
    ];

    /// Registered name of the check.
    pub fn name(self) -> &'static str {
        match self {
            Self::Hash => "hash",
            Self::Signature => "signature",
            Self::Pattern => "pattern",
            Self::Permissions => "permissions",
            Self::Vulnerabilities => "vulnerabilities",
        }
    }
}

/// Scan orchestration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Per-check timeout (ms).
    pub check_timeout_ms: u64,
    /// Maximum checks running at once for one target.
    pub max_parallel_checks: usize,
    /// Digest algorithms computed by the hash check.
    pub hash_algorithms: Vec<String>,
    /// Suffix appended to the target path to find its signature.
    pub signature_suffix: String,
    /// Suffix appended to the target path to find its public key.
    pub public_key_suffix: String,
    /// Signature algorithm: `rsa`, `ecdsa` or `ed25519`.
    pub signature_algorithm: String,
    /// Checks to run.
    pub enabled_checks: Vec<CheckKind>,
}

impl ScanConfig {
    /// Per-check timeout as a duration.
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            check_timeout_ms: 30_000,
            max_parallel_checks: 4,
            hash_algorithms: vec!["sha256".to_string(), "sha512".to_string()],
            signature_suffix: ".sig".to_string(),
            public_key_suffix: ".pem".to_string(),
            signature_algorithm: "rsa".to_string(),
            enabled_checks: CheckKind::ALL.to_vec(),
        }
    }
}

/// Startup walker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerConfig {
    /// File extensions to scan; empty means every file.
    pub extensions: Vec<String>,
    /// File names never scanned.
    pub exclude_names: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["py".to_string()],
            exclude_names: vec!["__init__.py".to_string()],
        }
    }
}

/// How the ledger treats a torn final entry on open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryMode {
    /// Refuse to open.
    #[default]
    Refuse,
    /// Truncate back to the last well-formed entry.
    TruncateTornTail,
}

/// Ledger configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Torn tail recovery policy.
    pub recovery: RecoveryMode,
}
