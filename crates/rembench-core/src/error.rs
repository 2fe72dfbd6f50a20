//! Error types for rembench.
//!
//! Errors are organized by boundary: configuration, upstream API calls,
//! and local I/O. API errors carry the HTTP status code when one exists
//! so callers can classify failures without string matching.

use thiserror::Error;

/// Top-level error type for rembench operations.
#[derive(Error, Debug)]
pub enum RembenchError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Upstream API errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors from the external HTTP APIs this tool orchestrates.
///
/// `ProviderNotFound` and `Upstream` are terminal for one provider's
/// pipeline only; the orchestrator folds them into that provider's job
/// rather than letting them cross the comparison boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The logical model name could not be resolved to a version
    #[error("Provider not found: {provider}: {message}")]
    ProviderNotFound { provider: String, message: String },

    /// The inference service returned non-2xx, a malformed body, or was unreachable
    #[error("Upstream error: {message}")]
    Upstream {
        message: String,
        status_code: Option<u16>,
    },

    /// The vision model endpoint failed
    #[error("Vision API error: {message}")]
    Vision {
        message: String,
        status_code: Option<u16>,
    },

    /// No API key configured or supplied; raised before any network call
    #[error("Missing credential: {what}")]
    MissingCredential { what: String },

    /// An operation exceeded its configured bound
    #[error("Timeout in {what} after {timeout_ms}ms")]
    Timeout { what: String, timeout_ms: u64 },
}

impl ApiError {
    /// HTTP status code attached to this error, if the upstream reported one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Upstream { status_code, .. } | ApiError::Vision { status_code, .. } => {
                *status_code
            }
            _ => None,
        }
    }
}

/// Convenience type alias for rembench results.
pub type Result<T> = std::result::Result<T, RembenchError>;

/// Convenience type alias for API-boundary results.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Determine whether an API error is worth retrying.
///
/// Retryable: timeouts, rate limits (429), server errors (5xx), and
/// transport-level failures (connection refused, DNS). Non-retryable:
/// auth failures, bad requests, unknown models.
pub fn is_retryable(error: &ApiError) -> bool {
    match error {
        ApiError::Timeout { .. } => true,
        ApiError::Upstream { .. } | ApiError::Vision { .. } => {
            if let Some(code) = error.status_code() {
                return code == 429 || (500..=599).contains(&code);
            }
            // No status code means the request never got an HTTP response
            let message = match error {
                ApiError::Upstream { message, .. } | ApiError::Vision { message, .. } => message,
                _ => unreachable!(),
            };
            message.contains("timed out") || message.contains("connect")
        }
        _ => false,
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> std::time::Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    std::time::Duration::from_millis(delay.min(30_000))
}
