//! Concurrent check execution and audit logging.

use crate::result::ScanResult;
use crate::state::ScanState;
use serde_json::{json, Value};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn, Instrument};
use vigil_audit_ledger::{EncodingError, Event, Ledger, LedgerError};
use vigil_common_config::VigilConfig;
use vigil_common_log::spans::{check_span, scan_span, Timer};
use vigil_scan_checks::{
    CancelFlag, Check, CheckConfig, CheckContext, CheckFailure, CheckOutcome, CheckRegistry,
    FailureKind, Outcome, ScanTarget,
};

/// Destination of scan events.
pub trait AuditSink: Send + Sync {
    /// Append `event` and return its entry hash.
    fn append_event(&self, event: &Event) -> Result<String, LedgerError>;
}

impl AuditSink for Ledger {
    fn append_event(&self, event: &Event) -> Result<String, LedgerError> {
        self.append(event)
    }
}

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Time budget for each check.
    pub check_timeout: Duration,
    /// Checks running at once across all scans.
    pub max_parallel_checks: usize,
    /// Configuration handed to every check.
    pub checks: Arc<CheckConfig>,
}

impl OrchestratorConfig {
    pub fn new(checks: CheckConfig) -> Self {
        let scan = vigil_common_config::ScanConfig::default();
        Self {
            check_timeout: scan.check_timeout(),
            max_parallel_checks: scan.max_parallel_checks,
            checks: Arc::new(checks),
        }
    }

    pub fn from_config(config: &VigilConfig) -> Self {
        Self {
            check_timeout: config.scan.check_timeout(),
            max_parallel_checks: config.scan.max_parallel_checks,
            checks: Arc::new(CheckConfig::from_config(config)),
        }
    }

    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }
}

/// Whether the scan event reached the ledger.
#[derive(Debug)]
pub enum AuditStatus {
    Logged { entry_hash: String },
    LogFailed { error: LedgerError },
}

/// The outcome of one scan: the result is always present, whether or not it
/// was logged.
#[derive(Debug)]
pub struct ScanReport {
    pub result: ScanResult,
    pub audit: AuditStatus,
}

impl ScanReport {
    pub fn is_logged(&self) -> bool {
        matches!(self.audit, AuditStatus::Logged { .. })
    }

    pub fn entry_hash(&self) -> Option<&str> {
        match &self.audit {
            AuditStatus::Logged { entry_hash } => Some(entry_hash),
            AuditStatus::LogFailed { .. } => None,
        }
    }

    /// A ledger error after which no further scans should be logged.
    pub fn fatal_error(&self) -> Option<&LedgerError> {
        match &self.audit {
            AuditStatus::LogFailed { error } if error.is_fatal() => Some(error),
            _ => None,
        }
    }

    /// `Err` with the ledger error when it is fatal, otherwise the report.
    pub fn into_non_fatal(self) -> Result<Self, LedgerError> {
        match self.audit {
            AuditStatus::LogFailed { error } if error.is_fatal() => Err(error),
            audit => Ok(Self {
                result: self.result,
                audit,
            }),
        }
    }

    /// JSON rendering for machine-readable output.
    pub fn to_json(&self) -> Value {
        let audit = match &self.audit {
            AuditStatus::Logged { entry_hash } => json!({"status": "logged", "entry_hash": entry_hash}),
            AuditStatus::LogFailed { error } => json!({"status": "log_failed", "error": error.to_string()}),
        };
        json!({"result": self.result, "audit": audit})
    }
}

/// Runs the registered checks against targets and logs each scan.
pub struct Orchestrator {
    sink: Arc<dyn AuditSink>,
    registry: CheckRegistry,
    config: OrchestratorConfig,
    permits: Arc<Semaphore>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "check panicked".to_string()
    }
}

fn transition(state: &mut ScanState, next: ScanState) {
    match state.advance(next) {
        Ok(next) => {
            debug!(from = %state, to = %next, "scan state");
            *state = next;
        }
        Err(e) => error!(error = %e, "scan state machine violated"),
    }
}

impl Orchestrator {
    pub fn new(sink: Arc<dyn AuditSink>, registry: CheckRegistry, config: OrchestratorConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_parallel_checks.max(1)));
        Self {
            sink,
            registry,
            config,
            permits,
        }
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run every check on `target`, then append one `scan` event.
    pub async fn scan(&self, target: ScanTarget) -> ScanReport {
        let display = target.path().display().to_string();
        let span = scan_span(&display);
        self.scan_inner(target, display).instrument(span).await
    }

    async fn scan_inner(&self, target: ScanTarget, display: String) -> ScanReport {
        let timer = Timer::start("scan");
        let mut state = ScanState::Pending;
        transition(&mut state, ScanState::Running);

        let target = Arc::new(target);
        let runs = self
            .registry
            .iter()
            .map(|(name, check)| self.run_check(name.to_string(), Arc::clone(check), Arc::clone(&target)));
        let outcomes = futures::future::join_all(runs).await;

        let mut result = ScanResult::new(display);
        result.per_check.extend(outcomes);
        transition(&mut state, ScanState::Aggregated);

        let audit = match self.log(&result).await {
            Ok(entry_hash) => {
                transition(&mut state, ScanState::Logged);
                AuditStatus::Logged { entry_hash }
            }
            Err(error) => {
                transition(&mut state, ScanState::LogFailed);
                if error.is_fatal() {
                    error!(error = %error, "audit ledger unusable");
                } else {
                    warn!(error = %error, "failed to log scan result");
                }
                AuditStatus::LogFailed { error }
            }
        };

        let failures = result.failures().count();
        info!(
            checks = result.per_check.len(),
            failures,
            duration_ms = %timer.finish(),
            "scan complete"
        );
        ScanReport { result, audit }
    }

    async fn run_check(
        &self,
        name: String,
        check: Arc<dyn Check>,
        target: Arc<ScanTarget>,
    ) -> (String, CheckOutcome) {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                let failure = CheckFailure::new(FailureKind::Cancelled, "orchestrator shut down");
                return (name, Outcome::Err(failure).into());
            }
        };

        let cancel = CancelFlag::new();
        let ctx = CheckContext {
            config: Arc::clone(&self.config.checks),
            cancel: cancel.clone(),
        };
        let span = check_span(&name);
        let handle = tokio::task::spawn_blocking(move || {
            let _entered = span.entered();
            check.run(&target, &ctx)
        });

        let outcome = match tokio::time::timeout(self.config.check_timeout, handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) if e.is_panic() => {
                let message = panic_message(e.into_panic());
                warn!(check = %name, panic = %message, "check panicked");
                Err(CheckFailure::new(FailureKind::Panicked, message))
            }
            Ok(Err(e)) => Err(CheckFailure::new(FailureKind::Cancelled, e.to_string())),
            Err(_) => {
                cancel.cancel();
                let ms = self.config.check_timeout.as_millis();
                warn!(check = %name, timeout_ms = %ms, "check timed out");
                Err(CheckFailure::new(FailureKind::Timeout, format!("exceeded {ms} ms")))
            }
        };
        (name, outcome.into())
    }

    async fn log(&self, result: &ScanResult) -> Result<String, LedgerError> {
        let results = serde_json::to_value(result)
            .map_err(|e| LedgerError::Encoding(EncodingError::from(e)))?;
        let mut event = Event::new();
        event.insert("event".to_string(), json!("scan"));
        event.insert("target".to_string(), json!(result.target));
        event.insert("results".to_string(), results);

        let sink = Arc::clone(&self.sink);
        tokio::task::spawn_blocking(move || sink.append_event(&event))
            .await
            .map_err(|e| LedgerError::Io(std::io::Error::other(format!("ledger append aborted: {e}"))))?
    }
}
