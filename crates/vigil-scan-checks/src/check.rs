//! The check contract.

use crate::{CheckContext, Outcome, ScanTarget};

/// A named unit of work run against one target.
///
/// Implementations report expected failure modes (missing files, malformed
/// inputs) as [`CheckFailure`](crate::CheckFailure) values. The orchestrator
/// additionally converts panics and timeouts, so one check can never abort
/// its siblings.
pub trait Check: Send + Sync {
    /// Name under which results are reported.
    fn name(&self) -> &str;

    /// Run against `target`.
    fn run(&self, target: &ScanTarget, ctx: &CheckContext) -> Outcome;
}
