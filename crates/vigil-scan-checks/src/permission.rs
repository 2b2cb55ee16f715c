//! File mode audit.

use crate::{Check, CheckContext, CheckFailure, CheckValue, Outcome, ScanTarget};
use std::io::ErrorKind;

/// Other-read and other-write bits.
pub const WORLD_ACCESS_MASK: u32 = 0o006;

/// Whether `mode` grants read or write access to everyone.
pub fn is_insecure_mode(mode: u32) -> bool {
    mode & WORLD_ACCESS_MASK != 0
}

/// Flag files that are world-readable or world-writable.
#[derive(Debug, Default)]
pub struct PermissionCheck;

impl PermissionCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Check for PermissionCheck {
    fn name(&self) -> &str {
        "permissions"
    }

    fn run(&self, target: &ScanTarget, ctx: &CheckContext) -> Outcome {
        ctx.cancel.checkpoint()?;
        let path = target.path();
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CheckFailure::missing(format!("file not found: {}", path.display())),
            _ => CheckFailure::io(format!("{}: {e}", path.display())),
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            Ok(CheckValue::InsecurePermissions(is_insecure_mode(
                metadata.permissions().mode(),
            )))
        }

        #[cfg(not(unix))]
        {
            let _ = metadata;
            Ok(CheckValue::NotApplicable {
                reason: "file modes are not available on this platform".to_string(),
            })
        }
    }
}
