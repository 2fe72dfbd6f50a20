//! Replicate-backed removal provider.
//!
//! Replicate models are referenced by a logical "owner/name" that must be
//! resolved to an immutable version id before a prediction can be created.
//! Resolution failure maps to `ProviderNotFound`; everything else that
//! goes wrong on the wire maps to `Upstream`.

use super::RemovalProvider;
use crate::error::{ApiError, ApiResult};
use crate::types::{Job, JobOutput, JobStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One Replicate background-removal model.
pub struct ReplicateProvider {
    model_id: String,
    api_token: String,
    base_url: String,
    client: reqwest::Client,
}

impl ReplicateProvider {
    pub fn new(model_id: &str, api_token: &str, base_url: &str) -> Self {
        Self {
            model_id: model_id.to_string(),
            api_token: api_token.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Resolve the model's latest immutable version id.
    async fn resolve_version(&self) -> ApiResult<String> {
        let url = format!("{}/models/{}", self.base_url, self.model_id);
        tracing::debug!(model = %self.model_id, "Resolving model version");

        let resp = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.api_token))
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| ApiError::ProviderNotFound {
                provider: self.model_id.clone(),
                message: format!("model lookup failed: {e}"),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::ProviderNotFound {
                provider: self.model_id.clone(),
                message: error_excerpt(status.as_u16(), &body),
            });
        }

        let model: ModelResponse = resp.json().await.map_err(|e| ApiError::ProviderNotFound {
            provider: self.model_id.clone(),
            message: format!("malformed model response: {e}"),
        })?;

        tracing::debug!(model = %self.model_id, version = %model.latest_version.id, "Resolved version");
        Ok(model.latest_version.id)
    }

    fn into_job(&self, prediction: PredictionResponse) -> Job {
        // A non-succeeded prediction never carries usable output
        let output = if prediction.status == JobStatus::Succeeded {
            prediction.output
        } else {
            None
        };
        Job {
            id: prediction.id,
            provider_id: self.model_id.clone(),
            status: prediction.status,
            output,
            error: prediction.error,
        }
    }
}

// --- Wire types ---

#[derive(Deserialize)]
struct ModelResponse {
    latest_version: ModelVersion,
}

#[derive(Deserialize)]
struct ModelVersion {
    id: String,
}

#[derive(Serialize)]
struct CreatePredictionRequest {
    version: String,
    input: PredictionInput,
}

#[derive(Serialize)]
struct PredictionInput {
    image: String,
}

#[derive(Deserialize)]
struct PredictionResponse {
    id: String,
    status: JobStatus,
    #[serde(default)]
    output: Option<JobOutput>,
    #[serde(default)]
    error: Option<String>,
}

/// Build a compact error message from a failed HTTP exchange.
///
/// Replicate's proxy layer sometimes answers with HTML error pages; those
/// are summarized rather than quoted.
fn error_excerpt(status: u16, body: &str) -> String {
    if body.contains("<html>") {
        format!("HTTP {status}: upstream returned an HTML error page")
    } else if body.is_empty() {
        format!("HTTP {status}")
    } else {
        let excerpt: String = body.chars().take(100).collect();
        format!("HTTP {status}: {excerpt}")
    }
}

#[async_trait]
impl RemovalProvider for ReplicateProvider {
    fn id(&self) -> &str {
        &self.model_id
    }

    async fn submit(&self, image_url: &str) -> ApiResult<Job> {
        let version = self.resolve_version().await?;

        let url = format!("{}/predictions", self.base_url);
        let body = CreatePredictionRequest {
            version,
            input: PredictionInput {
                image: image_url.to_string(),
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
            .map_err(|e| ApiError::Upstream {
                message: format!("prediction create failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Upstream {
                message: error_excerpt(status.as_u16(), &body),
                status_code: Some(status.as_u16()),
            });
        }

        let prediction: PredictionResponse =
            resp.json().await.map_err(|e| ApiError::Upstream {
                message: format!("malformed prediction response: {e}"),
                status_code: None,
            })?;

        tracing::info!(model = %self.model_id, job = %prediction.id, "Prediction created");
        Ok(self.into_job(prediction))
    }

    async fn fetch(&self, job_id: &str) -> ApiResult<Job> {
        let url = format!("{}/predictions/{}", self.base_url, job_id);

        let resp = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.api_token))
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| ApiError::Upstream {
                message: format!("status check failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Upstream {
                message: format!("status check returned HTTP {status}"),
                status_code: Some(status.as_u16()),
            });
        }

        let prediction: PredictionResponse =
            resp.json().await.map_err(|e| ApiError::Upstream {
                message: format!("malformed status response: {e}"),
                status_code: None,
            })?;

        Ok(self.into_job(prediction))
    }
}
