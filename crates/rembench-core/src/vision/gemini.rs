//! Google Gemini vision backend via `generateContent`.
//!
//! Gemini only accepts inline image bytes, so URL references are fetched
//! and base64-encoded before the call. The response envelope is the
//! nested `candidates[0].content.parts[0].text` shape.

use super::provider::{ImageRef, VisionProvider, VisionRequest};
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct GeminiVisionProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiVisionProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Inline the image, fetching it first if it is a plain URL.
    async fn inline_image(&self, image: &ImageRef) -> ApiResult<(String, String)> {
        match image {
            ImageRef::Inline { data, media_type } => Ok((data.clone(), media_type.clone())),
            ImageRef::Url(url) => {
                let resp = self
                    .client
                    .get(url)
                    .timeout(Duration::from_secs(30))
                    .send()
                    .await
                    .map_err(|e| ApiError::Vision {
                        message: format!("failed to fetch image for Gemini: {e}"),
                        status_code: None,
                    })?;
                if !resp.status().is_success() {
                    return Err(ApiError::Vision {
                        message: format!("image fetch returned HTTP {}", resp.status()),
                        status_code: Some(resp.status().as_u16()),
                    });
                }
                let media_type = resp
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("image/png")
                    .to_string();
                let bytes = resp.bytes().await.map_err(|e| ApiError::Vision {
                    message: format!("failed to read image bytes: {e}"),
                    status_code: None,
                })?;
                let data = base64::engine::general_purpose::STANDARD.encode(&bytes);
                Ok((data, media_type))
            }
        }
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

#[async_trait]
impl VisionProvider for GeminiVisionProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &VisionRequest) -> ApiResult<String> {
        let (data, mime_type) = self.inline_image(&request.image).await?;

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: request.prompt.clone(),
                    },
                    Part::InlineData {
                        inline_data: InlineData { mime_type, data },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
            },
        };

        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| ApiError::Vision {
                message: format!("Gemini request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ApiError::Vision {
                message: format!("Gemini HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let parsed: GenerateContentResponse =
            resp.json().await.map_err(|e| ApiError::Vision {
                message: format!("Failed to parse Gemini response: {e}"),
                status_code: None,
            })?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(ApiError::Vision {
                message: "Gemini returned empty response".to_string(),
                status_code: None,
            });
        }

        Ok(text)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(60)
    }
}
