//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poll.interval_ms must be > 0".into(),
            ));
        }
        if self.poll.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "poll.max_attempts must be > 0".into(),
            ));
        }
        if self.compare.parallel == 0 {
            return Err(ConfigError::ValidationError(
                "compare.parallel must be > 0".into(),
            ));
        }
        if self.providers.catalog.is_empty() {
            return Err(ConfigError::ValidationError(
                "providers.catalog must not be empty".into(),
            ));
        }
        match self.vision.provider.as_str() {
            "replicate" | "gemini" | "anthropic" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "vision.provider must be one of replicate, gemini, anthropic (got '{other}')"
                )));
            }
        }
        if self.vision.score_max_tokens == 0 || self.vision.analyze_max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "vision token budgets must be > 0".into(),
            ));
        }
        if self.store.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "store.timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}
