//! Pattern matching against compiled rules.
//!
//! The engine is a seam: [`PatternEngine`] compiles rule source into a
//! [`Matcher`]. The default engine compiles the rule language in
//! [`rules`]. Compiled rules are cached per rules file and reused until
//! the file's modification time or length changes.

pub mod rules;

use crate::{Check, CheckContext, CheckFailure, CheckValue, Outcome, ScanTarget, MAX_LOADED_FILE_BYTES};
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

pub use rules::{RuleError, RuleSet};

const MAX_RULES_BYTES: u64 = 16 * 1024 * 1024;

/// Compiled rules that classify a byte buffer.
pub trait Matcher: Send + Sync {
    /// Identifiers of the matching rules.
    fn scan(&self, data: &[u8]) -> Vec<String>;
}

/// Compiles rule source.
pub trait PatternEngine: Send + Sync {
    fn compile(&self, source: &str) -> Result<Arc<dyn Matcher>, RuleError>;
}

impl Matcher for RuleSet {
    fn scan(&self, data: &[u8]) -> Vec<String> {
        RuleSet::scan(self, data)
    }
}

/// The built-in rule engine.
#[derive(Debug, Default)]
pub struct RuleEngine;

impl PatternEngine for RuleEngine {
    fn compile(&self, source: &str) -> Result<Arc<dyn Matcher>, RuleError> {
        Ok(Arc::new(RuleSet::compile(source)?))
    }
}

#[derive(Clone, PartialEq, Eq)]
struct CacheKey {
    path: PathBuf,
    modified: Option<SystemTime>,
    len: u64,
}

struct CachedRules {
    key: CacheKey,
    matcher: Arc<dyn Matcher>,
}

/// Match the target's bytes against the configured rules file.
pub struct PatternCheck {
    engine: Arc<dyn PatternEngine>,
    cache: Mutex<Option<CachedRules>>,
}

impl PatternCheck {
    pub fn new(engine: Arc<dyn PatternEngine>) -> Self {
        Self {
            engine,
            cache: Mutex::new(None),
        }
    }

    fn rules_for(&self, path: &Path) -> Result<Arc<dyn Matcher>, CheckFailure> {
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                CheckFailure::missing(format!("rules file not found: {}", path.display()))
            }
            _ => CheckFailure::io(format!("{}: {e}", path.display())),
        })?;
        let key = CacheKey {
            path: path.to_path_buf(),
            modified: metadata.modified().ok(),
            len: metadata.len(),
        };

        if let Some(cached) = self.cache.lock().as_ref() {
            if cached.key == key {
                return Ok(Arc::clone(&cached.matcher));
            }
        }

        let source = vigil_common_core::fs::read_to_string(path, MAX_RULES_BYTES)?;
        let matcher = self.engine.compile(&source).map_err(|e| {
            CheckFailure::invalid(format!("failed to compile {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "compiled pattern rules");
        *self.cache.lock() = Some(CachedRules {
            key,
            matcher: Arc::clone(&matcher),
        });
        Ok(matcher)
    }
}

impl Default for PatternCheck {
    fn default() -> Self {
        Self::new(Arc::new(RuleEngine))
    }
}

impl std::fmt::Debug for PatternCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternCheck").finish_non_exhaustive()
    }
}

impl Check for PatternCheck {
    fn name(&self) -> &str {
        "pattern"
    }

    fn run(&self, target: &ScanTarget, ctx: &CheckContext) -> Outcome {
        let matcher = self.rules_for(&ctx.config.rules_path)?;
        ctx.cancel.checkpoint()?;
        let data = vigil_common_core::fs::read_bytes(target.path(), MAX_LOADED_FILE_BYTES)?;
        ctx.cancel.checkpoint()?;
        Ok(CheckValue::Matches(matcher.scan(&data)))
    }
}
