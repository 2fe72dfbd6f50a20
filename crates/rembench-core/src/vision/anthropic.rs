//! Anthropic vision backend using the Messages API.
//!
//! Accepts both URL and base64 image sources natively; the response
//! envelope is a list of content blocks whose text fields are joined.

use super::provider::{ImageRef, VisionProvider, VisionRequest};
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct AnthropicVisionProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl AnthropicVisionProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "image")]
    Image { source: ImageSource },
    #[serde(rename = "text")]
    Text { text: String },
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ImageSource {
    #[serde(rename = "base64")]
    Base64 { media_type: String, data: String },
    #[serde(rename = "url")]
    Url { url: String },
}

impl From<&ImageRef> for ImageSource {
    fn from(image: &ImageRef) -> Self {
        match image {
            ImageRef::Url(url) => ImageSource::Url { url: url.clone() },
            ImageRef::Inline { data, media_type } => ImageSource::Base64 {
                media_type: media_type.clone(),
                data: data.clone(),
            },
        }
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    text: Option<String>,
}

#[async_trait]
impl VisionProvider for AnthropicVisionProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, request: &VisionRequest) -> ApiResult<String> {
        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource::from(&request.image),
                    },
                    ContentBlock::Text {
                        text: request.prompt.clone(),
                    },
                ],
            }],
        };

        let resp = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| ApiError::Vision {
                message: format!("Anthropic request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ApiError::Vision {
                message: format!("Anthropic HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let parsed: MessagesResponse = resp.json().await.map_err(|e| ApiError::Vision {
            message: format!("Failed to parse Anthropic response: {e}"),
            status_code: None,
        })?;

        let text = parsed
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("")
            .trim()
            .to_string();
        if text.is_empty() {
            return Err(ApiError::Vision {
                message: "Anthropic returned empty response".to_string(),
                status_code: None,
            });
        }

        Ok(text)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_image_uses_url_source() {
        let source = ImageSource::from(&ImageRef::Url("https://x/a.png".to_string()));
        let json = serde_json::to_string(&source).unwrap();
        assert!(json.contains("\"type\":\"url\""));
        assert!(json.contains("https://x/a.png"));
    }

    #[test]
    fn test_inline_image_uses_base64_source() {
        let source = ImageSource::from(&ImageRef::from_bytes(&[1, 2, 3], "png"));
        let json = serde_json::to_string(&source).unwrap();
        assert!(json.contains("\"type\":\"base64\""));
        assert!(json.contains("\"media_type\":\"image/png\""));
    }

    #[test]
    fn test_content_blocks_join() {
        let json = r#"{"content":[{"text":"Edge: 8\n"},{"text":"Detail: 7"},{"type":"tool_use"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(json).unwrap();
        let text = parsed
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");
        assert_eq!(text, "Edge: 8\nDetail: 7");
    }
}
