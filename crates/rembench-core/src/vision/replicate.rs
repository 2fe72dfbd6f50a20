//! Replicate-hosted LLaVA vision backend.
//!
//! Replicate has no synchronous inference endpoint, so a vision call is
//! itself a prediction: create it, then poll the status endpoint until
//! terminal. Output arrives as a token array or a single string; both
//! normalize to one joined string.

use super::provider::{VisionProvider, VisionRequest};
use crate::error::{ApiError, ApiResult};
use crate::types::JobStatus;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLLS: u32 = 120;

pub struct ReplicateVisionProvider {
    api_token: String,
    version: String,
    base_url: String,
    client: reqwest::Client,
}

impl ReplicateVisionProvider {
    pub fn new(api_token: &str, version: &str) -> Self {
        Self::with_base_url(api_token, version, "https://api.replicate.com/v1")
    }

    pub fn with_base_url(api_token: &str, version: &str, base_url: &str) -> Self {
        Self {
            api_token: api_token.to_string(),
            version: version.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_prediction(&self, id: &str) -> ApiResult<VisionPrediction> {
        let url = format!("{}/predictions/{}", self.base_url, id);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.api_token))
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| ApiError::Vision {
                message: format!("prediction status check failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Vision {
                message: format!("prediction status check returned HTTP {status}"),
                status_code: Some(status.as_u16()),
            });
        }

        resp.json().await.map_err(|e| ApiError::Vision {
            message: format!("malformed prediction response: {e}"),
            status_code: None,
        })
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct CreateVisionPrediction {
    version: String,
    input: VisionInput,
}

#[derive(Serialize)]
struct VisionInput {
    image: String,
    prompt: String,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct VisionPrediction {
    id: String,
    status: JobStatus,
    #[serde(default)]
    output: Option<VisionOutput>,
    #[serde(default)]
    error: Option<String>,
}

/// LLaVA streams tokens, so `output` is usually an array of string
/// fragments; some models return one string.
#[derive(Deserialize)]
#[serde(untagged)]
enum VisionOutput {
    Text(String),
    Tokens(Vec<String>),
}

impl VisionOutput {
    fn join(self) -> String {
        match self {
            VisionOutput::Text(text) => text,
            VisionOutput::Tokens(tokens) => tokens.concat(),
        }
    }
}

#[async_trait]
impl VisionProvider for ReplicateVisionProvider {
    fn name(&self) -> &str {
        "replicate"
    }

    async fn generate(&self, request: &VisionRequest) -> ApiResult<String> {
        let url = format!("{}/predictions", self.base_url);
        let body = CreateVisionPrediction {
            version: self.version.clone(),
            input: VisionInput {
                image: request.image.data_url(),
                prompt: request.prompt.clone(),
                max_tokens: request.max_tokens,
            },
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_token))
            .json(&body)
            .timeout(Duration::from_secs(60))
            .send()
            .await
            .map_err(|e| ApiError::Vision {
                message: format!("prediction create failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ApiError::Vision {
                message: format!("prediction create returned HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let mut prediction: VisionPrediction =
            resp.json().await.map_err(|e| ApiError::Vision {
                message: format!("malformed prediction response: {e}"),
                status_code: None,
            })?;

        let mut polls = 0u32;
        while !prediction.status.is_terminal() {
            if polls >= MAX_POLLS {
                return Err(ApiError::Timeout {
                    what: "LLaVA prediction".to_string(),
                    timeout_ms: POLL_INTERVAL.as_millis() as u64 * MAX_POLLS as u64,
                });
            }
            polls += 1;
            tokio::time::sleep(POLL_INTERVAL).await;
            prediction = self.fetch_prediction(&prediction.id).await?;
        }

        if prediction.status != JobStatus::Succeeded {
            return Err(ApiError::Vision {
                message: format!(
                    "LLaVA prediction {}: {}",
                    prediction.status,
                    prediction.error.unwrap_or_else(|| "no detail".to_string())
                ),
                status_code: None,
            });
        }

        let text = prediction
            .output
            .map(VisionOutput::join)
            .unwrap_or_default()
            .trim()
            .to_string();
        if text.is_empty() {
            return Err(ApiError::Vision {
                message: "LLaVA returned empty output".to_string(),
                status_code: None,
            });
        }

        Ok(text)
    }

    fn timeout(&self) -> Duration {
        // Covers create + worst-case poll loop
        Duration::from_secs(180)
    }
}
