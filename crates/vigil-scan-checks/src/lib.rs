//! Integrity checks for the Vigil scan pipeline.
//!
//! Every check implements [`Check`] and reports an [`Outcome`]: a
//! [`CheckValue`] or a typed [`CheckFailure`]. Checks never touch the
//! ledger; the orchestrator aggregates their outcomes.

mod check;
mod context;
mod outcome;
mod registry;
mod target;

pub mod hash;
pub mod pattern;
pub mod permission;
pub mod signature;
pub mod vulnerability;

pub use check::Check;
pub use context::{CancelFlag, CheckConfig, CheckContext};
pub use hash::HashCheck;
pub use outcome::{CheckFailure, CheckOutcome, CheckValue, FailureKind, Outcome};
pub use pattern::PatternCheck;
pub use permission::PermissionCheck;
pub use registry::{CheckRegistry, CollisionPolicy, RegistryError};
pub use signature::SignatureCheck;
pub use target::{ScanTarget, SoftwareIdentity};
pub use vulnerability::{VulnerabilityCheck, VulnerabilityRecord};

/// Upper bound on bytes loaded into memory by checks that need whole files.
pub const MAX_LOADED_FILE_BYTES: u64 = 256 * 1024 * 1024;
