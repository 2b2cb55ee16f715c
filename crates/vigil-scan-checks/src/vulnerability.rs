//! Offline CVE lookup.
//!
//! The table is a JSON object keyed by software name:
//!
//! ```json
//! {"openssl": [{"cve_id": "CVE-2016-2107", "vulnerable_versions": ["1.0.2"], "description": "..."}]}
//! ```
//!
//! Names compare case-insensitively; versions compare by exact string
//! equality.

use crate::{Check, CheckContext, CheckFailure, CheckValue, Outcome, ScanTarget, SoftwareIdentity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Size limit for the CVE table.
const MAX_TABLE_BYTES: u64 = 64 * 1024 * 1024;

/// One CVE entry for a software name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CveRecord {
    pub cve_id: String,
    pub vulnerable_versions: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// CVE records keyed by lowercased software name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CveTable {
    entries: BTreeMap<String, Vec<CveRecord>>,
}

impl CveTable {
    /// Build from raw entries, folding names to lowercase.
    pub fn new(raw: BTreeMap<String, Vec<CveRecord>>) -> Self {
        let mut entries: BTreeMap<String, Vec<CveRecord>> = BTreeMap::new();
        for (name, records) in raw {
            entries.entry(name.to_lowercase()).or_default().extend(records);
        }
        Self { entries }
    }

    /// Parse a JSON table.
    pub fn from_json(text: &str) -> Result<Self, CheckFailure> {
        let raw: BTreeMap<String, Vec<CveRecord>> = serde_json::from_str(text)
            .map_err(|e| CheckFailure::invalid(format!("malformed CVE table: {e}")))?;
        Ok(Self::new(raw))
    }

    /// Load and parse the table at `path`.
    pub fn load(path: &Path) -> Result<Self, CheckFailure> {
        let text = vigil_common_core::fs::read_to_string(path, MAX_TABLE_BYTES)?;
        Self::from_json(&text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn records(&self, name: &str) -> &[CveRecord] {
        self.entries
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// A vulnerability found for a declared software version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VulnerabilityRecord {
    pub software: String,
    pub version: String,
    pub cve: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Every record whose name matches and whose version list contains the
/// declared version exactly.
pub fn lookup(table: &CveTable, software: &[SoftwareIdentity]) -> Vec<VulnerabilityRecord> {
    software
        .iter()
        .flat_map(|identity| {
            table
                .records(&identity.name)
                .iter()
                .filter(|record| record.vulnerable_versions.iter().any(|v| *v == identity.version))
                .map(|record| VulnerabilityRecord {
                    software: identity.name.clone(),
                    version: identity.version.clone(),
                    cve: record.cve_id.clone(),
                    description: record.description.clone(),
                })
        })
        .collect()
}

/// Match the target's declared software against the CVE table.
#[derive(Debug, Default)]
pub struct VulnerabilityCheck;

impl VulnerabilityCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Check for VulnerabilityCheck {
    fn name(&self) -> &str {
        "vulnerabilities"
    }

    fn run(&self, target: &ScanTarget, ctx: &CheckContext) -> Outcome {
        ctx.cancel.checkpoint()?;
        let table = CveTable::load(&ctx.config.cve_db_path)?;
        ctx.cancel.checkpoint()?;
        Ok(CheckValue::Vulnerabilities(lookup(&table, &[target.software()])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CheckConfig, FailureKind};
    use std::sync::Arc;
    use vigil_test_utils::{temp_dir, write_file};

    const TABLE: &str = r#"{
        "OpenSSL": [
            {"cve_id": "CVE-2016-2107", "vulnerable_versions": ["1.0.2", "1.0.1"], "description": "padding oracle"}
        ],
        "test_software": [
            {"cve_id": "CVE-2020-1234", "vulnerable_versions": ["1.0.0"]}
        ]
    }"#;

    #[test]
    fn test_exact_version_match() {
        let table = CveTable::from_json(TABLE).unwrap();

        let hits = lookup(&table, &[SoftwareIdentity::new("openssl", "1.0.2")]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].cve, "CVE-2016-2107");
        assert_eq!(hits[0].software, "openssl");
        assert_eq!(hits[0].description.as_deref(), Some("padding oracle"));

        assert!(lookup(&table, &[SoftwareIdentity::new("openssl", "1.1.0")]).is_empty());
        assert!(lookup(&table, &[SoftwareIdentity::new("openssl", "1.0.2a")]).is_empty());
    }

    #[test]
    fn test_name_case_folded() {
        let table = CveTable::from_json(TABLE).unwrap();
        let hits = lookup(&table, &[SoftwareIdentity::new("Test_Software", "1.0.0")]);
        assert_eq!(hits[0].cve, "CVE-2020-1234");
        assert!(lookup(&table, &[SoftwareIdentity::new("unknown", "1.0.0")]).is_empty());
    }

    #[test]
    fn test_check_uses_file_name_identity() {
        let dir = temp_dir();
        let db = write_file(
            dir.path(),
            "cve.json",
            r#"{"plugin.py": [{"cve_id": "CVE-2021-0001", "vulnerable_versions": ["unknown"]}]}"#,
        );
        let target = write_file(dir.path(), "plugin.py", "pass");
        let ctx = CheckContext::new(Arc::new(CheckConfig::new("rules.yar", db)));

        match VulnerabilityCheck.run(&ScanTarget::new(target), &ctx).unwrap() {
            CheckValue::Vulnerabilities(v) => assert_eq!(v[0].cve, "CVE-2021-0001"),
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn test_missing_and_malformed_table() {
        let dir = temp_dir();
        let target = ScanTarget::new(write_file(dir.path(), "plugin.py", "pass"));

        let ctx = CheckContext::new(Arc::new(CheckConfig::new("r", dir.path().join("absent.json"))));
        assert_eq!(VulnerabilityCheck.run(&target, &ctx).unwrap_err().kind, FailureKind::MissingInput);

        let bad = write_file(dir.path(), "bad.json", "[1, 2");
        let ctx = CheckContext::new(Arc::new(CheckConfig::new("r", bad)));
        assert_eq!(VulnerabilityCheck.run(&target, &ctx).unwrap_err().kind, FailureKind::InvalidInput);
    }
}
