//! Sub-configuration structs, one per pipeline concern.

use crate::types::{default_providers, ProviderInfo};
use serde::{Deserialize, Serialize};

/// Replicate API access settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicateConfig {
    /// API token, usually a `${REPLICATE_API_KEY}` reference
    pub api_token: String,

    /// API base URL (overridable for tests and proxies)
    pub base_url: String,
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            api_token: "${REPLICATE_API_KEY}".to_string(),
            base_url: "https://api.replicate.com/v1".to_string(),
        }
    }
}

/// Background-removal provider catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Models to fan out to; defaults to the five-model catalog
    pub catalog: Vec<ProviderInfo>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            catalog: default_providers(),
        }
    }
}

/// Job status polling settings.
///
/// The loop is bounded so a hung prediction surfaces as a failed job
/// instead of never returning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Delay between status checks in milliseconds
    pub interval_ms: u64,

    /// Maximum status checks before giving up on a job
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_attempts: 150,
        }
    }
}

/// Vision-model scoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Provider identifier ("replicate", "gemini", "anthropic")
    pub provider: String,

    /// Token budget for source-image analysis
    pub analyze_max_tokens: u32,

    /// Token budget for single-result scoring
    pub score_max_tokens: u32,

    /// Token budget for comparative scoring
    pub comparative_max_tokens: u32,

    /// Transient-failure retries per vision call
    pub retry_attempts: u32,

    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,

    pub gemini: Option<GeminiConfig>,
    pub anthropic: Option<AnthropicConfig>,
    pub llava: Option<LlavaConfig>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            provider: "replicate".to_string(),
            analyze_max_tokens: 500,
            score_max_tokens: 100,
            comparative_max_tokens: 300,
            retry_attempts: 1,
            retry_delay_ms: 1000,
            gemini: None,
            anthropic: None,
            llava: None,
        }
    }
}

/// Replicate-hosted LLaVA settings for vision scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlavaConfig {
    /// Immutable prediction version id for llava-13b
    pub version: String,
}

impl Default for LlavaConfig {
    fn default() -> Self {
        Self {
            version: "2facb4a474a0462c15041b78b1ad70952ea46b5ec6ad29583c0b29dbd4249591"
                .to_string(),
        }
    }
}

/// Google Gemini settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (supports `${ENV_VAR}` syntax)
    pub api_key: String,
    /// Model name
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: "${GEMINI_API_KEY}".to_string(),
            model: "gemini-1.5-flash".to_string(),
        }
    }
}

/// Anthropic settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    /// API key (supports `${ENV_VAR}` syntax)
    pub api_key: String,
    /// Model name
    pub model: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: "${ANTHROPIC_API_KEY}".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
        }
    }
}

/// Comparison fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Maximum concurrent provider pipelines
    pub parallel: usize,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self { parallel: 5 }
    }
}

/// Test-record store backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the record backend (Apps-Script-style REST surface)
    pub base_url: String,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_ms: 15_000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,

    /// Output format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
