//! Scan orchestration for Vigil.
//!
//! The [`Orchestrator`] runs every registered check against a target,
//! aggregates the outcomes into a [`ScanResult`] and appends one `scan`
//! event to the audit ledger. The [`Walker`] drives the orchestrator over a
//! directory tree at startup.

mod orchestrator;
mod result;
mod state;
mod walker;

pub use orchestrator::{AuditSink, AuditStatus, Orchestrator, OrchestratorConfig, ScanReport};
pub use result::ScanResult;
pub use state::{InvalidTransition, ScanState};
pub use walker::{WalkError, WalkSummary, Walker};
