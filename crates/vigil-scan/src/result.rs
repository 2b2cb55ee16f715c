//! Aggregated scan results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vigil_scan_checks::{CheckOutcome, FailureKind};

/// Per-check outcomes for one target, keyed by registered check name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub target: String,
    pub per_check: BTreeMap<String, CheckOutcome>,
}

impl ScanResult {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            per_check: BTreeMap::new(),
        }
    }

    pub fn outcome(&self, check: &str) -> Option<&CheckOutcome> {
        self.per_check.get(check)
    }

    /// Checks that failed, with their failure kind.
    pub fn failures(&self) -> impl Iterator<Item = (&str, FailureKind)> {
        self.per_check
            .iter()
            .filter_map(|(name, outcome)| outcome.failure_kind().map(|k| (name.as_str(), k)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }
}
