//! Test-record persistence client.
//!
//! Talks to the spreadsheet-backed REST surface (an Apps-Script-style
//! web app addressed as `{base_url}?path=...`). That backend only
//! accepts GET and POST, so PUT and DELETE are tunnelled as POST with an
//! `X-HTTP-Method-Override` header. The core calls this only at save
//! time; record lifecycle belongs to the backend.
//!
//! Also provides local aggregation and export over already-fetched
//! records, so stats and CSV dumps work without a second round trip.

use crate::error::{ApiError, ApiResult};
use crate::types::{StoreStats, TestRecord};
use std::collections::HashMap;
use std::time::Duration;

/// Client for the test-record backend.
pub struct TestStore {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl TestStore {
    pub fn new(base_url: &str, timeout_ms: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_millis(timeout_ms),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}?path={}", self.base_url, path)
    }

    /// Build one backend request.
    ///
    /// The backend accepts only GET and POST; other verbs ride on POST
    /// with a method-override header.
    fn build_request(
        &self,
        path: &str,
        method: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<reqwest::Request> {
        let url = self.url(path);

        let mut req = if method == "GET" {
            self.client.get(&url)
        } else {
            let mut post = self.client.post(&url);
            if method != "POST" {
                post = post.header("X-HTTP-Method-Override", method);
            }
            post
        };
        if let Some(body) = body {
            req = req.json(&body);
        }

        req.timeout(self.timeout)
            .build()
            .map_err(|e| ApiError::Upstream {
                message: format!("failed to build store request: {e}"),
                status_code: None,
            })
    }

    async fn request(
        &self,
        path: &str,
        method: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<serde_json::Value> {
        let req = self.build_request(path, method, body)?;

        let resp = self
            .client
            .execute(req)
            .await
            .map_err(|e| ApiError::Upstream {
                message: format!("store request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Upstream {
                message: format!("store returned HTTP {status} for {path}"),
                status_code: Some(status.as_u16()),
            });
        }

        resp.json().await.map_err(|e| ApiError::Upstream {
            message: format!("malformed store response: {e}"),
            status_code: None,
        })
    }

    /// Fetch all saved test records.
    pub async fn list_tests(&self) -> ApiResult<Vec<TestRecord>> {
        let value = self.request("tests", "GET", None).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Upstream {
            message: format!("malformed test list: {e}"),
            status_code: None,
        })
    }

    /// Persist a new record; the backend assigns the id.
    pub async fn persist_test(&self, record: &TestRecord) -> ApiResult<TestRecord> {
        let body = serde_json::to_value(record).map_err(|e| ApiError::Upstream {
            message: format!("failed to encode record: {e}"),
            status_code: None,
        })?;
        let value = self.request("tests", "POST", Some(body)).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Upstream {
            message: format!("malformed persisted record: {e}"),
            status_code: None,
        })
    }

    /// Delete a record by id.
    pub async fn delete_test(&self, id: &str) -> ApiResult<()> {
        self.request(&format!("tests/{id}"), "DELETE", None).await?;
        Ok(())
    }

    /// Fetch backend-computed aggregate statistics.
    pub async fn get_stats(&self) -> ApiResult<StoreStats> {
        let value = self.request("tests/stats", "GET", None).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Upstream {
            message: format!("malformed stats response: {e}"),
            status_code: None,
        })
    }
}

/// Compute aggregate statistics over a set of records locally.
pub fn compute_stats(records: &[TestRecord]) -> StoreStats {
    let mut by_category: HashMap<String, usize> = HashMap::new();
    let mut per_provider: HashMap<String, Vec<u8>> = HashMap::new();

    for record in records {
        *by_category.entry(record.category.clone()).or_default() += 1;
        for (provider_id, scores) in &record.scores {
            per_provider
                .entry(provider_id.clone())
                .or_default()
                .push(scores.overall);
        }
    }

    let avg_scores = per_provider
        .into_iter()
        .map(|(provider_id, overalls)| {
            let mean = overalls.iter().map(|&v| v as f64).sum::<f64>() / overalls.len() as f64;
            (provider_id, mean)
        })
        .collect();

    StoreStats {
        total_tests: records.len(),
        by_category,
        avg_scores,
    }
}

/// Render records as CSV, one row per (test, provider) score.
pub fn export_csv(records: &[TestRecord]) -> String {
    let headers = [
        "Test ID",
        "Date",
        "Category",
        "Name",
        "Notes",
        "AI Analysis",
        "Provider",
        "Edge Accuracy",
        "Detail Preservation",
        "Transparency Quality",
        "Overall Score",
        "Processing Time (s)",
    ];

    let mut lines = vec![headers.join(",")];
    for record in records {
        let mut providers: Vec<_> = record.scores.keys().collect();
        providers.sort();
        for provider_id in providers {
            let scores = &record.scores[provider_id];
            let time = record
                .processing_times
                .get(provider_id)
                .map(|t| format!("{t:.1}"))
                .unwrap_or_default();
            let row = [
                record.id.clone(),
                record.timestamp.clone(),
                record.category.clone(),
                record.name.clone(),
                record.notes.clone(),
                record.image_analysis.clone().unwrap_or_default(),
                provider_id.clone(),
                scores.edge_accuracy.to_string(),
                scores.detail_preservation.to_string(),
                scores.transparency.to_string(),
                scores.overall.to_string(),
                time,
            ];
            let quoted: Vec<String> = row
                .iter()
                .map(|cell| format!("\"{}\"", cell.replace('"', "\"\"")))
                .collect();
            lines.push(quoted.join(","));
        }
    }
    lines.join("\n")
}

/// Render records as pretty JSON.
pub fn export_json(records: &[TestRecord]) -> crate::error::Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
