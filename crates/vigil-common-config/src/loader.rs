//! Configuration file loading and parsing.

use crate::types::VigilConfig;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

fn env_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("env var pattern is valid")
    })
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the project config file.
    pub fn config_path(&self) -> PathBuf {
        self.base_path.join(".vigil/config.yaml")
    }

    /// Load configuration from `.vigil/config.yaml`, falling back to defaults.
    ///
    /// Relative paths in the result are resolved against the project directory.
    pub fn load(&self) -> Result<VigilConfig, ConfigError> {
        let config_path = self.config_path();

        let config = if config_path.exists() {
            self.parse(&std::fs::read_to_string(&config_path)?)?
        } else {
            VigilConfig::default()
        };

        self.finish(config)
    }

    /// Load configuration from an explicit file, which must exist.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<VigilConfig, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let config = self.parse(&std::fs::read_to_string(path)?)?;
        self.finish(config)
    }

    fn parse(&self, contents: &str) -> Result<VigilConfig, ConfigError> {
        let expanded = self.expand_env_vars(contents)?;
        serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })
    }

    fn finish(&self, mut config: VigilConfig) -> Result<VigilConfig, ConfigError> {
        self.validate(&config)?;
        config.paths.ledger = self.resolve(&config.paths.ledger);
        config.paths.rules = self.resolve(&config.paths.rules);
        config.paths.cve_db = self.resolve(&config.paths.cve_db);
        Ok(config)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    pub fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(content.len());
        let mut last = 0;

        for cap in env_pattern().captures_iter(content) {
            let Some(full_match) = cap.get(0) else {
                continue;
            };
            let var_name = &cap[1];
            let default = cap.get(2).map(|m| m.as_str());

            let value = match std::env::var(var_name) {
                Ok(v) => v,
                Err(_) => match default {
                    Some(d) => d.to_string(),
                    None => {
                        return Err(ConfigError::EnvVarNotFound {
                            var: var_name.to_string(),
                        })
                    }
                },
            };

            result.push_str(&content[last..full_match.start()]);
            result.push_str(&value);
            last = full_match.end();
        }
        result.push_str(&content[last..]);

        Ok(result)
    }

    /// Validate configuration values.
    pub fn validate(&self, config: &VigilConfig) -> Result<(), ConfigError> {
        let required = [
            ("paths.ledger", &config.paths.ledger),
            ("paths.rules", &config.paths.rules),
            ("paths.cve_db", &config.paths.cve_db),
        ];
        for (name, path) in required {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError {
                    message: format!("{name} must be provided and not empty"),
                });
            }
        }

        if config.scan.check_timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                message: "scan.check_timeout_ms must be greater than 0".to_string(),
            });
        }

        if config.scan.max_parallel_checks == 0 {
            return Err(ConfigError::ValidationError {
                message: "scan.max_parallel_checks must be greater than 0".to_string(),
            });
        }

        if config.scan.hash_algorithms.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "scan.hash_algorithms must list at least one algorithm".to_string(),
            });
        }

        if config.scan.signature_suffix.is_empty() || config.scan.public_key_suffix.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "signature and public key suffixes must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to `.vigil/config.yaml`.
    pub fn save(&self, config: &VigilConfig) -> Result<(), ConfigError> {
        let config_path = self.config_path();
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(config_path, yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}
