//! Startup directory walk.

use crate::orchestrator::{Orchestrator, ScanReport};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use vigil_audit_ledger::LedgerError;
use vigil_common_config::WalkerConfig;
use vigil_scan_checks::ScanTarget;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("walk configuration error: {0}")]
    Configuration(String),

    #[error("ledger unusable while scanning {}: {source}", path.display())]
    Ledger {
        path: PathBuf,
        #[source]
        source: LedgerError,
    },
}

/// What a walk did.
#[derive(Debug, Default)]
pub struct WalkSummary {
    /// Files scanned.
    pub scanned: usize,
    /// Scans whose event could not be logged.
    pub log_failures: usize,
    /// One report per scanned file, in walk order.
    pub reports: Vec<ScanReport>,
}

/// Resolve symlinks in `path`, or in its nearest existing ancestor when the
/// file has not been created yet.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            resolve(parent).join(name)
        }
        _ => path.to_path_buf(),
    }
}

/// Discovers eligible files under a root and scans them one at a time.
#[derive(Debug, Clone)]
pub struct Walker {
    config: WalkerConfig,
    excluded: HashSet<PathBuf>,
}

impl Walker {
    pub fn new(config: WalkerConfig) -> Self {
        Self {
            config,
            excluded: HashSet::new(),
        }
    }

    /// Never scan `path`, which need not exist yet; used for the ledger,
    /// rules and CVE files.
    pub fn exclude_path(mut self, path: impl AsRef<Path>) -> Self {
        self.excluded.insert(resolve(path.as_ref()));
        self
    }

    fn is_eligible(&self, path: &Path) -> bool {
        let name = path.file_name().map(|n| n.to_string_lossy());
        if name.is_some_and(|n| self.config.exclude_names.iter().any(|x| *x == n)) {
            return false;
        }
        if !self.config.extensions.is_empty() {
            let ext = path.extension().map(|e| e.to_string_lossy());
            let wanted = ext.is_some_and(|e| {
                self.config
                    .extensions
                    .iter()
                    .any(|x| x.trim_start_matches('.').eq_ignore_ascii_case(&e))
            });
            if !wanted {
                return false;
            }
        }
        !self.excluded.contains(&resolve(path))
    }

    /// Eligible files under `root`, sorted.
    pub fn discover(&self, root: impl AsRef<Path>) -> Result<Vec<PathBuf>, WalkError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(WalkError::Configuration(format!(
                "scan root is not a directory: {}",
                root.display()
            )));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && self.is_eligible(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Scan every eligible file under `root` in order.
    ///
    /// Check failures and non-fatal log failures are recorded in the
    /// summary; a fatal ledger error stops the walk.
    pub async fn run(
        &self,
        root: impl AsRef<Path>,
        orchestrator: &Orchestrator,
    ) -> Result<WalkSummary, WalkError> {
        let root = root.as_ref();
        let files = self.discover(root)?;
        info!(root = %root.display(), files = files.len(), "starting scan walk");

        let mut summary = WalkSummary::default();
        for path in files {
            let relative = path.strip_prefix(root).unwrap_or(&path).display().to_string();
            info!("Scanning {relative}");
            let report = orchestrator
                .scan(ScanTarget::new(&path))
                .await
                .into_non_fatal()
                .map_err(|source| WalkError::Ledger {
                    path: path.clone(),
                    source,
                })?;
            summary.scanned += 1;
            if !report.is_logged() {
                summary.log_failures += 1;
            }
            summary.reports.push(report);
        }

        info!(
            scanned = summary.scanned,
            log_failures = summary.log_failures,
            "scan walk complete"
        );
        Ok(summary)
    }
}
