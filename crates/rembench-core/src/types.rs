//! Core data types for the rembench comparison pipeline.
//!
//! These types mirror the wire formats of the external services: job
//! status values match Replicate's prediction states, and test records
//! serialize camelCase to match the spreadsheet backend.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle state of one provider's background-removal job.
///
/// `Succeeded`, `Failed`, and `Canceled` are terminal; no further
/// transitions occur once one of them is observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Canceled
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Starting => "starting",
            JobStatus::Processing => "processing",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
        };
        f.write_str(s)
    }
}

/// Output of a succeeded job.
///
/// Replicate models return either a single URL or a list of URLs
/// depending on the model, so the wire shape is untagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobOutput {
    Url(String),
    Urls(Vec<String>),
}

impl JobOutput {
    /// The primary output URL, if any.
    pub fn first_url(&self) -> Option<&str> {
        match self {
            JobOutput::Url(url) => Some(url.as_str()),
            JobOutput::Urls(urls) => urls.first().map(String::as_str),
        }
    }
}

/// One provider's asynchronous background-removal task.
///
/// Created when a provider accepts a request; mutated only by the
/// poller's observations. `output` is non-null only when
/// `status == Succeeded`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Upstream prediction id (empty for jobs that failed at submission)
    pub id: String,

    /// The provider this job belongs to (e.g., "bria/remove-background")
    pub provider_id: String,

    /// Current lifecycle state
    pub status: JobStatus,

    /// Result URL(s), present only once the job has succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<JobOutput>,

    /// Upstream error text for failed jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Job {
    /// A freshly-accepted job in the `Starting` state.
    pub fn starting(id: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider_id: provider_id.into(),
            status: JobStatus::Starting,
            output: None,
            error: None,
        }
    }

    /// A job that failed before or during submission.
    ///
    /// Used by the orchestrator to fold submission errors into the
    /// aggregate instead of letting them escape the provider's pipeline.
    pub fn failed(provider_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            provider_id: provider_id.into(),
            status: JobStatus::Failed,
            output: None,
            error: Some(error.into()),
        }
    }

    /// A job cancelled locally before reaching a terminal upstream state.
    pub fn canceled(mut self) -> Self {
        self.status = JobStatus::Canceled;
        self.output = None;
        self
    }
}

/// Whether a score was parsed from model output or substituted by the
/// fallback policy.
///
/// A defaulted 7 and a measured 7 carry the same number; the provenance
/// flag lets callers tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreProvenance {
    /// All three metrics were parsed from the model's response
    Measured,
    /// At least one metric came from the fallback policy
    Defaulted,
}

/// The three-metric quality judgment for one (test, provider) pair.
///
/// Each metric is clamped to [1,10]; `overall` is always recomputed as
/// the rounded mean of the three and is never independently settable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSet {
    pub edge_accuracy: u8,
    pub detail_preservation: u8,
    pub transparency: u8,
    pub overall: u8,
    pub provenance: ScoreProvenance,
}

impl ScoreSet {
    /// Build a ScoreSet, clamping each metric into [1,10] and deriving
    /// `overall` from the clamped values.
    pub fn new(
        edge_accuracy: i64,
        detail_preservation: i64,
        transparency: i64,
        provenance: ScoreProvenance,
    ) -> Self {
        let edge_accuracy = clamp_metric(edge_accuracy);
        let detail_preservation = clamp_metric(detail_preservation);
        let transparency = clamp_metric(transparency);
        let sum = edge_accuracy as u32 + detail_preservation as u32 + transparency as u32;
        // Rounded mean of three values in [1,10] stays in [1,10]
        let overall = ((sum as f64 / 3.0).round()) as u8;
        Self {
            edge_accuracy,
            detail_preservation,
            transparency,
            overall,
            provenance,
        }
    }

    /// The deterministic placeholder for a comparative-scoring candidate
    /// whose block could not be parsed: `8 - index` on all metrics,
    /// descending with candidate position so placeholder rankings stay
    /// monotonic.
    pub fn fallback(index: usize) -> Self {
        let value = 8i64.saturating_sub(index as i64);
        Self::new(value, value, value, ScoreProvenance::Defaulted)
    }
}

fn clamp_metric(value: i64) -> u8 {
    value.clamp(1, 10) as u8
}

/// Descriptive metadata for one background-removal provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Replicate model id, "owner/name"
    pub id: String,
    /// Display name
    pub name: String,
    /// Short description
    pub description: String,
    /// What the model is best suited for
    pub best_for: String,
}

impl ProviderInfo {
    fn new(id: &str, name: &str, description: &str, best_for: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            best_for: best_for.to_string(),
        }
    }
}

/// The default provider catalog.
pub fn default_providers() -> Vec<ProviderInfo> {
    vec![
        ProviderInfo::new(
            "851-labs/background-remover",
            "851 Labs",
            "Community model for general use",
            "General purpose",
        ),
        ProviderInfo::new(
            "lucataco/remove-bg",
            "Lucataco Tracer",
            "Fast processing model",
            "Quick results",
        ),
        ProviderInfo::new(
            "bria/remove-background",
            "BRIA AI (Official)",
            "Commercial model with 256 transparency levels",
            "E-commerce, products, advertising, multi-object scenes",
        ),
        ProviderInfo::new(
            "men1scus/birefnet",
            "BiRefNet (High-Res)",
            "High-resolution specialist with bilateral processing",
            "Fine details, portraits, hair/fur, complex scenes",
        ),
        ProviderInfo::new(
            "cjwbw/rembg",
            "CJWBW RemBG",
            "Reliable u2net-based model",
            "Product shots, clear subjects, high-contrast images",
        ),
    ]
}

/// One saved comparison run, owned by the test-record store.
///
/// The core populates a record at save time; identity and lifecycle
/// belong to the backend (`id` is assigned there when empty).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    /// Backend-assigned id (empty until persisted)
    #[serde(default)]
    pub id: String,

    /// ISO 8601 creation time
    pub timestamp: String,

    /// Test category (e.g., "portrait", "ecommerce", "fine-details")
    pub category: String,

    /// Human-given test name
    pub name: String,

    /// Free-form notes
    #[serde(default)]
    pub notes: String,

    /// The source image the comparison ran on
    pub image_url: String,

    /// Vision-model analysis of the source image, if one was run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_analysis: Option<String>,

    /// Terminal job per provider
    #[serde(default)]
    pub results: HashMap<String, Job>,

    /// Quality judgment per provider
    #[serde(default)]
    pub scores: HashMap<String, ScoreSet>,

    /// Wall-clock seconds per provider
    #[serde(default)]
    pub processing_times: HashMap<String, f64>,
}

/// Aggregate statistics over saved test records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_tests: usize,
    /// Test count per category
    pub by_category: HashMap<String, usize>,
    /// Mean overall score per provider
    pub avg_scores: HashMap<String, f64>,
}
