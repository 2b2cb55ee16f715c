//! Named check registration.

use crate::{Check, HashCheck, PatternCheck, PermissionCheck, SignatureCheck, VulnerabilityCheck};
use std::sync::Arc;
use thiserror::Error;
use vigil_common_config::CheckKind;

/// How [`CheckRegistry::register`] handles a name already in use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Fail with [`RegistryError::Duplicate`].
    #[default]
    Reject,
    /// Register as `name_2`, `name_3`, ...
    RenameWithSuffix,
    /// Register as `namespace::name`.
    NamespaceQualify(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("check '{0}' is already registered")]
    Duplicate(String),
    #[error("check name must not be empty")]
    EmptyName,
}

/// Checks keyed by unique name, in registration order.
#[derive(Default)]
pub struct CheckRegistry {
    checks: Vec<(String, Arc<dyn Check>)>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in checks selected by `enabled`, in their canonical order.
    pub fn standard(enabled: &[CheckKind]) -> Self {
        let mut registry = Self::new();
        for kind in CheckKind::ALL.iter().filter(|k| enabled.contains(*k)) {
            let check: Arc<dyn Check> = match kind {
                CheckKind::Hash => Arc::new(HashCheck::new()),
                CheckKind::Signature => Arc::new(SignatureCheck::default()),
                CheckKind::Pattern => Arc::new(PatternCheck::default()),
                CheckKind::Permissions => Arc::new(PermissionCheck::new()),
                CheckKind::Vulnerabilities => Arc::new(VulnerabilityCheck::new()),
            };
            registry.checks.push((kind.name().to_string(), check));
        }
        registry
    }

    /// Register `check` and return the name it was stored under.
    pub fn register(
        &mut self,
        check: Arc<dyn Check>,
        policy: CollisionPolicy,
    ) -> Result<String, RegistryError> {
        let base = check.name().to_string();
        if base.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let name = match policy {
            _ if !self.contains(&base) => base,
            CollisionPolicy::Reject => return Err(RegistryError::Duplicate(base)),
            CollisionPolicy::RenameWithSuffix => (2..)
                .map(|n| format!("{base}_{n}"))
                .find(|candidate| !self.contains(candidate))
                .ok_or_else(|| RegistryError::Duplicate(base.clone()))?,
            CollisionPolicy::NamespaceQualify(namespace) => {
                let qualified = format!("{namespace}::{base}");
                if self.contains(&qualified) {
                    return Err(RegistryError::Duplicate(qualified));
                }
                qualified
            }
        };
        tracing::debug!(check = %name, "registered check");
        self.checks.push((name.clone(), check));
        Ok(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.checks.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Check>> {
        self.checks.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Check>)> {
        self.checks.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CheckContext, CheckValue, Outcome, ScanTarget};

    struct Named(&'static str);

    impl Check for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn run(&self, _target: &ScanTarget, _ctx: &CheckContext) -> Outcome {
            Ok(CheckValue::Matches(vec![]))
        }
    }

    #[test]
    fn test_standard_registry() {
        let registry = CheckRegistry::standard(&CheckKind::ALL);
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, ["hash", "signature", "pattern", "permissions", "vulnerabilities"]);

        let partial = CheckRegistry::standard(&[CheckKind::Permissions, CheckKind::Hash]);
        assert_eq!(partial.names().collect::<Vec<_>>(), ["hash", "permissions"]);
    }

    #[test]
    fn test_reject_duplicate() {
        let mut registry = CheckRegistry::new();
        assert_eq!(registry.register(Arc::new(Named("hash")), CollisionPolicy::Reject).unwrap(), "hash");
        let err = registry
            .register(Arc::new(Named("hash")), CollisionPolicy::Reject)
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("hash".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rename_with_suffix() {
        let mut registry = CheckRegistry::new();
        for _ in 0..3 {
            registry
                .register(Arc::new(Named("yara")), CollisionPolicy::RenameWithSuffix)
                .unwrap();
        }
        assert_eq!(registry.names().collect::<Vec<_>>(), ["yara", "yara_2", "yara_3"]);
    }

    #[test]
    fn test_namespace_qualify() {
        let mut registry = CheckRegistry::standard(&[CheckKind::Hash]);
        let name = registry
            .register(Arc::new(Named("hash")), CollisionPolicy::NamespaceQualify("custom".into()))
            .unwrap();
        assert_eq!(name, "custom::hash");
        assert!(registry.get("custom::hash").is_some());
        assert!(registry
            .register(Arc::new(Named("hash")), CollisionPolicy::NamespaceQualify("custom".into()))
            .is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut registry = CheckRegistry::new();
        assert_eq!(
            registry.register(Arc::new(Named("")), CollisionPolicy::Reject).unwrap_err(),
            RegistryError::EmptyName
        );
    }
}
