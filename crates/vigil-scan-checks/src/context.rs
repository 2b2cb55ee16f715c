//! Shared inputs for a check run.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use vigil_common_config::VigilConfig;

use crate::CheckFailure;
use crate::FailureKind;

/// Configuration consumed by the checks.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Pattern rules source.
    pub rules_path: PathBuf,
    /// Offline CVE table.
    pub cve_db_path: PathBuf,
    /// Digest algorithms for the hash check.
    pub hash_algorithms: Vec<String>,
    /// Signature sidecar suffix.
    pub signature_suffix: String,
    /// Public key sidecar suffix.
    pub public_key_suffix: String,
    /// Signature algorithm name.
    pub signature_algorithm: String,
}

impl CheckConfig {
    pub fn new(rules_path: impl Into<PathBuf>, cve_db_path: impl Into<PathBuf>) -> Self {
        let scan = vigil_common_config::ScanConfig::default();
        Self {
            rules_path: rules_path.into(),
            cve_db_path: cve_db_path.into(),
            hash_algorithms: scan.hash_algorithms,
            signature_suffix: scan.signature_suffix,
            public_key_suffix: scan.public_key_suffix,
            signature_algorithm: scan.signature_algorithm,
        }
    }

    pub fn from_config(config: &VigilConfig) -> Self {
        Self {
            rules_path: config.paths.rules.clone(),
            cve_db_path: config.paths.cve_db.clone(),
            hash_algorithms: config.scan.hash_algorithms.clone(),
            signature_suffix: config.scan.signature_suffix.clone(),
            public_key_suffix: config.scan.public_key_suffix.clone(),
            signature_algorithm: config.scan.signature_algorithm.clone(),
        }
    }
}

/// Cooperative cancellation raised by the orchestrator on timeout.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fail with [`FailureKind::Cancelled`] once cancellation was requested.
    pub fn checkpoint(&self) -> Result<(), CheckFailure> {
        if self.is_cancelled() {
            Err(CheckFailure::new(FailureKind::Cancelled, "check cancelled"))
        } else {
            Ok(())
        }
    }
}

/// Everything a check receives besides the target.
#[derive(Debug, Clone)]
pub struct CheckContext {
    pub config: Arc<CheckConfig>,
    pub cancel: CancelFlag,
}

impl CheckContext {
    pub fn new(config: Arc<CheckConfig>) -> Self {
        Self {
            config,
            cancel: CancelFlag::new(),
        }
    }
}
