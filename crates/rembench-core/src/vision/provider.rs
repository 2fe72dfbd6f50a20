//! Vision provider trait and request types, plus the factory that
//! creates the configured backend.

use crate::config::{resolve_env_var, VisionConfig};
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use base64::Engine;
use std::time::Duration;

/// An image to send to a vision model: either a fetchable URL or inline
/// base64 bytes.
#[derive(Debug, Clone)]
pub enum ImageRef {
    /// Publicly fetchable URL (including data: URLs for Replicate)
    Url(String),
    /// Base64-encoded bytes with MIME type
    Inline { data: String, media_type: String },
}

impl ImageRef {
    /// Create an inline `ImageRef` from raw bytes and a format identifier
    /// (e.g., "jpeg", "png", "webp").
    pub fn from_bytes(bytes: &[u8], format: &str) -> Self {
        let media_type = match format {
            "jpeg" | "jpg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            other => {
                tracing::warn!("Unknown image format '{other}', defaulting to image/png");
                "image/png"
            }
        };
        ImageRef::Inline {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Render as a data URL.
    pub fn data_url(&self) -> String {
        match self {
            ImageRef::Url(url) => url.clone(),
            ImageRef::Inline { data, media_type } => {
                format!("data:{media_type};base64,{data}")
            }
        }
    }
}

/// A request to generate text from an image plus a rubric prompt.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub image: ImageRef,
    pub prompt: String,
    pub max_tokens: u32,
}

/// Trait that all vision backends implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the scorer holds `Box<dyn VisionProvider>` for dynamic dispatch).
///
/// Implementations are responsible for normalizing their upstream's
/// response envelope (array-of-strings, single string, or nested
/// candidate parts) into one plain string.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name for logging (e.g., "replicate", "gemini").
    fn name(&self) -> &str;

    /// Send the request and return the model's free-text response.
    async fn generate(&self, request: &VisionRequest) -> ApiResult<String>;

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

impl std::fmt::Debug for dyn VisionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionProvider")
            .field("name", &self.name())
            .finish()
    }
}

/// Factory that creates the configured vision backend.
pub struct VisionProviderFactory;

impl VisionProviderFactory {
    /// Create a vision provider from config, with an optional key
    /// override resolved once here; components never read ambient
    /// environment state mid-request.
    ///
    /// Raises `MissingCredential` before any network call when no usable
    /// key is available.
    pub fn create(
        config: &VisionConfig,
        replicate_token: Option<&str>,
        key_override: Option<&str>,
    ) -> ApiResult<Box<dyn VisionProvider>> {
        match config.provider.as_str() {
            "replicate" => {
                let token = key_override
                    .map(String::from)
                    .or_else(|| replicate_token.map(String::from))
                    .ok_or_else(|| ApiError::MissingCredential {
                        what: "Replicate API token (set REPLICATE_API_KEY)".to_string(),
                    })?;
                let llava = config.llava.clone().unwrap_or_default();
                Ok(Box::new(super::replicate::ReplicateVisionProvider::new(
                    &token,
                    &llava.version,
                )))
            }
            "gemini" => {
                let cfg = config.gemini.clone().unwrap_or_default();
                let api_key = key_override
                    .map(String::from)
                    .or_else(|| resolve_env_var(&cfg.api_key))
                    .ok_or_else(|| ApiError::MissingCredential {
                        what: "Gemini API key (set GEMINI_API_KEY)".to_string(),
                    })?;
                Ok(Box::new(super::gemini::GeminiVisionProvider::new(
                    &api_key, &cfg.model,
                )))
            }
            "anthropic" => {
                let cfg = config.anthropic.clone().unwrap_or_default();
                let api_key = key_override
                    .map(String::from)
                    .or_else(|| resolve_env_var(&cfg.api_key))
                    .ok_or_else(|| ApiError::MissingCredential {
                        what: "Anthropic API key (set ANTHROPIC_API_KEY)".to_string(),
                    })?;
                Ok(Box::new(super::anthropic::AnthropicVisionProvider::new(
                    &api_key, &cfg.model,
                )))
            }
            other => Err(ApiError::Vision {
                message: format!("Unknown vision provider: {other}"),
                status_code: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_ref_from_bytes_png() {
        let image = ImageRef::from_bytes(&[0x89, 0x50, 0x4E, 0x47], "png");
        match image {
            ImageRef::Inline { media_type, data } => {
                assert_eq!(media_type, "image/png");
                assert!(!data.is_empty());
            }
            ImageRef::Url(_) => panic!("expected inline"),
        }
    }

    #[test]
    fn test_image_ref_data_url() {
        let image = ImageRef::from_bytes(&[1, 2, 3], "jpeg");
        assert!(image.data_url().starts_with("data:image/jpeg;base64,"));

        let url = ImageRef::Url("https://x/a.png".to_string());
        assert_eq!(url.data_url(), "https://x/a.png");
    }

    #[test]
    fn test_factory_missing_credential_blocks_before_network() {
        let config = VisionConfig::default();
        let err = VisionProviderFactory::create(&config, None, None).unwrap_err();
        assert!(matches!(err, ApiError::MissingCredential { .. }));
    }

    #[test]
    fn test_factory_key_override_wins() {
        let config = VisionConfig::default();
        let provider = VisionProviderFactory::create(&config, None, Some("override-token"));
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().name(), "replicate");
    }

    #[test]
    fn test_factory_unknown_provider() {
        let config = VisionConfig {
            provider: "palm".to_string(),
            ..VisionConfig::default()
        };
        let err = VisionProviderFactory::create(&config, Some("tok"), None).unwrap_err();
        assert!(matches!(err, ApiError::Vision { .. }));
    }

    #[test]
    fn test_factory_gemini_uses_config_key() {
        let config = VisionConfig {
            provider: "gemini".to_string(),
            gemini: Some(crate::config::GeminiConfig {
                api_key: "literal-key".to_string(),
                model: "gemini-1.5-flash".to_string(),
            }),
            ..VisionConfig::default()
        };
        let provider = VisionProviderFactory::create(&config, None, None).unwrap();
        assert_eq!(provider.name(), "gemini");
    }
}
