//! rembench core - background-removal comparison bench.
//!
//! Orchestrates several third-party inference APIs to compare background
//! removal quality across providers:
//!
//! ```text
//! Image URL → submit to N providers → poll each to terminal state
//!           → vision model scores results → test record saved
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use rembench_core::{Bench, Config};
//! use rembench_core::poller::CancelFlag;
//!
//! #[tokio::main]
//! async fn main() -> rembench_core::Result<()> {
//!     let bench = Bench::new(Config::load()?)?;
//!     let providers = bench.removal_providers(None)?;
//!     let report = bench
//!         .comparison()
//!         .run("https://example.com/cat.png", providers, CancelFlag::new(), |id, job| {
//!             println!("{id}: {}", job.status);
//!         })
//!         .await;
//!     println!("{} providers finished", report.jobs.len());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod poller;
pub mod provider;
pub mod scorer;
pub mod store;
pub mod types;
pub mod vision;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ApiError, ApiResult, ConfigError, RembenchError, Result};
pub use orchestrator::{Comparison, ComparisonReport};
pub use poller::{CancelFlag, Poller};
pub use scorer::VisionScorer;
pub use store::TestStore;
pub use types::{Job, JobOutput, JobStatus, ScoreProvenance, ScoreSet, StoreStats, TestRecord};

use provider::{RemovalProvider, ReplicateProvider};
use std::sync::Arc;
use vision::VisionProviderFactory;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Entry point tying configuration to the pipeline components.
///
/// Credentials are resolved here, once per constructed component, from
/// config values (with `${ENV_VAR}` syntax) or an explicit override.
pub struct Bench {
    config: Config,
}

impl Bench {
    /// Create a bench instance with the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        tracing::debug!("Initializing rembench v{VERSION}");
        Ok(Self { config })
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the Replicate API token from the override or config.
    ///
    /// `MissingCredential` here blocks the operation before any network
    /// call is attempted.
    pub fn replicate_token(&self, token_override: Option<&str>) -> ApiResult<String> {
        token_override
            .map(String::from)
            .or_else(|| config::resolve_env_var(&self.config.replicate.api_token))
            .ok_or_else(|| ApiError::MissingCredential {
                what: "Replicate API token (set REPLICATE_API_KEY or replicate.api_token)"
                    .to_string(),
            })
    }

    /// Build one removal provider per catalog entry.
    pub fn removal_providers(
        &self,
        token_override: Option<&str>,
    ) -> ApiResult<Vec<Arc<dyn RemovalProvider>>> {
        let token = self.replicate_token(token_override)?;
        Ok(self
            .config
            .providers
            .catalog
            .iter()
            .map(|info| {
                Arc::new(ReplicateProvider::new(
                    &info.id,
                    &token,
                    &self.config.replicate.base_url,
                )) as Arc<dyn RemovalProvider>
            })
            .collect())
    }

    /// Build removal providers for an explicit subset of catalog ids.
    pub fn removal_providers_for(
        &self,
        ids: &[String],
        token_override: Option<&str>,
    ) -> ApiResult<Vec<Arc<dyn RemovalProvider>>> {
        let token = self.replicate_token(token_override)?;
        Ok(ids
            .iter()
            .map(|id| {
                Arc::new(ReplicateProvider::new(
                    id,
                    &token,
                    &self.config.replicate.base_url,
                )) as Arc<dyn RemovalProvider>
            })
            .collect())
    }

    /// Build the comparison orchestrator.
    pub fn comparison(&self) -> Comparison {
        Comparison::new(Poller::new(&self.config.poll), &self.config.compare)
    }

    /// Build the vision scorer from the configured backend.
    pub fn scorer(&self, key_override: Option<&str>) -> ApiResult<VisionScorer> {
        let replicate_token = config::resolve_env_var(&self.config.replicate.api_token);
        let provider = VisionProviderFactory::create(
            &self.config.vision,
            replicate_token.as_deref(),
            key_override,
        )?;
        Ok(VisionScorer::new(provider, &self.config.vision))
    }

    /// Build the test-record store client.
    ///
    /// Returns `None` when no backend is configured; saving is optional.
    pub fn store(&self) -> Option<TestStore> {
        if self.config.store.base_url.is_empty() {
            return None;
        }
        Some(TestStore::new(
            &self.config.store.base_url,
            self.config.store.timeout_ms,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_bench_new() {
        let bench = Bench::new(Config::default()).unwrap();
        assert_eq!(bench.config().compare.parallel, 5);
    }

    #[test]
    fn test_missing_replicate_token_blocks_providers() {
        let mut config = Config::default();
        config.replicate.api_token = "${DEFINITELY_NOT_SET_XYZ_123}".to_string();
        let bench = Bench::new(config).unwrap();
        let err = bench.removal_providers(None).unwrap_err();
        assert!(matches!(err, ApiError::MissingCredential { .. }));
    }

    #[test]
    fn test_token_override_bypasses_config() {
        let mut config = Config::default();
        config.replicate.api_token = String::new();
        let bench = Bench::new(config).unwrap();
        let providers = bench.removal_providers(Some("r8_test_token")).unwrap();
        assert_eq!(providers.len(), 5);
    }

    #[test]
    fn test_store_absent_without_base_url() {
        let bench = Bench::new(Config::default()).unwrap();
        assert!(bench.store().is_none());
    }
}
