//! Scan targets.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Software name and version declared for a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareIdentity {
    pub name: String,
    pub version: String,
}

impl SoftwareIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// A file to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    path: PathBuf,
    software: Option<SoftwareIdentity>,
}

impl ScanTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            software: None,
        }
    }

    /// Declare the software this file ships.
    pub fn with_software(mut self, software: SoftwareIdentity) -> Self {
        self.software = Some(software);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A sibling artifact named by appending `suffix` to the full file name,
    /// e.g. `plugin.py` + `.sig` = `plugin.py.sig`.
    pub fn sidecar(&self, suffix: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    /// The declared software, or the file name with version `unknown`.
    pub fn software(&self) -> SoftwareIdentity {
        self.software.clone().unwrap_or_else(|| {
            let name = self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            SoftwareIdentity::new(name, "unknown")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_appends_suffix() {
        let target = ScanTarget::new("/opt/nodes/plugin.py");
        assert_eq!(target.sidecar(".sig"), PathBuf::from("/opt/nodes/plugin.py.sig"));
        assert_eq!(target.sidecar(".pem"), PathBuf::from("/opt/nodes/plugin.py.pem"));
    }

    #[test]
    fn test_default_software_identity() {
        let target = ScanTarget::new("/opt/nodes/plugin.py");
        assert_eq!(target.software(), SoftwareIdentity::new("plugin.py", "unknown"));

        let declared = target.with_software(SoftwareIdentity::new("OpenSSL", "1.0.2"));
        assert_eq!(declared.software().name, "OpenSSL");
    }
}
