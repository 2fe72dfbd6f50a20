//! Configuration management for rembench.
//!
//! Configuration is loaded from a platform config directory (TOML) with
//! sensible defaults. API keys are written as `${ENV_VAR}` references
//! and resolved once per operation, never read ambiently mid-flight.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for rembench.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Replicate API access (background-removal jobs and LLaVA scoring)
    pub replicate: ReplicateConfig,

    /// Background-removal provider catalog
    pub providers: ProvidersConfig,

    /// Job status polling
    pub poll: PollConfig,

    /// Vision-model scoring settings
    pub vision: VisionConfig,

    /// Comparison fan-out settings
    pub compare: CompareConfig,

    /// Test-record store backend
    pub store: StoreConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories, falling back to
    /// `~/.rembench/config.toml` if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "rembench", "rembench")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".rembench").join("config.toml")
            })
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
///
/// Returns `None` for empty values and unset environment variables;
/// plain strings pass through unchanged.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll.interval_ms, 2000);
        assert_eq!(config.poll.max_attempts, 150);
        assert_eq!(config.compare.parallel, 5);
        assert_eq!(config.vision.provider, "replicate");
        assert_eq!(config.providers.catalog.len(), 5);
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[replicate]"));
        assert!(toml.contains("[poll]"));
        assert!(toml.contains("[vision]"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[poll]\ninterval_ms = 500\nmax_attempts = 10\n\n[vision]\nprovider = \"gemini\"\n"
        )
        .unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.poll.interval_ms, 500);
        assert_eq!(config.poll.max_attempts, 10);
        assert_eq!(config.vision.provider, "gemini");
        // Unspecified sections keep their defaults
        assert_eq!(config.compare.parallel, 5);
    }

    #[test]
    fn test_load_from_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[poll]\nmax_attempts = 0\n").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn test_resolve_env_var() {
        // Non-env-var strings pass through
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        // Empty returns None
        assert_eq!(resolve_env_var(""), None);
        // Unset env var returns None
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_XYZ_123}"), None);
    }
}
