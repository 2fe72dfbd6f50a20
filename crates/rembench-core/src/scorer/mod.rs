//! Vision-model scoring engine.
//!
//! Wraps a vision backend with the rubric templates and the pure score
//! parsers: analyze a source image, score one result in isolation, or
//! score all results comparatively in a single call. Transient backend
//! failures are retried with exponential backoff; parse failures never
//! surface, they degrade to the documented fallback scores.

pub mod rubric;
pub mod scores;

use crate::config::VisionConfig;
use crate::error::{self, ApiResult};
use crate::types::ScoreSet;
use crate::vision::{ImageRef, VisionProvider, VisionRequest};
use std::collections::HashMap;

/// Scoring engine over one configured vision backend.
pub struct VisionScorer {
    provider: Box<dyn VisionProvider>,
    analyze_max_tokens: u32,
    score_max_tokens: u32,
    comparative_max_tokens: u32,
    retry_attempts: u32,
    retry_delay_ms: u64,
}

impl VisionScorer {
    pub fn new(provider: Box<dyn VisionProvider>, config: &VisionConfig) -> Self {
        Self {
            provider,
            analyze_max_tokens: config.analyze_max_tokens,
            score_max_tokens: config.score_max_tokens,
            comparative_max_tokens: config.comparative_max_tokens,
            retry_attempts: config.retry_attempts,
            retry_delay_ms: config.retry_delay_ms,
        }
    }

    /// Describe a source image for background-removal purposes.
    pub async fn analyze(&self, image: ImageRef) -> ApiResult<String> {
        let request = VisionRequest {
            image,
            prompt: rubric::analyze_image(),
            max_tokens: self.analyze_max_tokens,
        };
        self.generate_with_retry(&request).await
    }

    /// Score one background-removal result in isolation.
    ///
    /// Always returns a complete ScoreSet: metrics missing from the
    /// model's response default to 7 and flag the set `Defaulted`.
    pub async fn score_single(
        &self,
        image: ImageRef,
        provider_label: &str,
    ) -> ApiResult<ScoreSet> {
        let request = VisionRequest {
            image,
            prompt: rubric::score_single(provider_label),
            max_tokens: self.score_max_tokens,
        };
        let text = self.generate_with_retry(&request).await?;
        tracing::debug!(label = provider_label, "Raw scoring response: {text}");
        Ok(scores::parse_single(&text))
    }

    /// Score all results together, ranked against each other.
    ///
    /// `candidates` pairs a label (provider id) with its result URL.
    /// Returns one ScoreSet per label; candidates whose block the model
    /// omitted receive the descending placeholder. The first candidate's
    /// image rides along as the visual reference for the model.
    pub async fn score_comparative(
        &self,
        candidates: &[(String, String)],
    ) -> ApiResult<HashMap<String, ScoreSet>> {
        if candidates.is_empty() {
            return Ok(HashMap::new());
        }

        let request = VisionRequest {
            image: ImageRef::Url(candidates[0].1.clone()),
            prompt: rubric::score_comparative(candidates),
            max_tokens: self.comparative_max_tokens,
        };
        let text = self.generate_with_retry(&request).await?;
        tracing::debug!("Raw comparative response: {text}");

        let parsed = scores::parse_comparative(&text, candidates.len());
        Ok(candidates
            .iter()
            .zip(parsed)
            .map(|((label, _), score_set)| (label.clone(), score_set))
            .collect())
    }

    async fn generate_with_retry(&self, request: &VisionRequest) -> ApiResult<String> {
        let mut last_error = None;
        for attempt in 0..=self.retry_attempts {
            if attempt > 0 {
                let delay = error::backoff_duration(attempt - 1, self.retry_delay_ms);
                tracing::debug!(
                    provider = self.provider.name(),
                    "Vision retry {attempt}/{} after {delay:?}",
                    self.retry_attempts
                );
                tokio::time::sleep(delay).await;
            }

            match self.provider.generate(request).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    let retryable = error::is_retryable(&e);
                    tracing::warn!(provider = self.provider.name(), "Vision call failed: {e}");
                    last_error = Some(e);
                    if !retryable {
                        break;
                    }
                }
            }
        }
        Err(last_error.expect("loop ran at least once"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::types::ScoreProvenance;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Mock backend producing a response per call index.
    struct MockVision {
        response_fn: Box<dyn Fn(u32) -> ApiResult<String> + Send + Sync>,
        call_count: Arc<AtomicU32>,
    }

    impl MockVision {
        fn success(text: &str) -> Self {
            let text = text.to_string();
            Self {
                response_fn: Box::new(move |_| Ok(text.clone())),
                call_count: Arc::new(AtomicU32::new(0)),
            }
        }

        fn failing(status_code: Option<u16>, message: &str) -> Self {
            let message = message.to_string();
            Self {
                response_fn: Box::new(move |_| {
                    Err(ApiError::Vision {
                        message: message.clone(),
                        status_code,
                    })
                }),
                call_count: Arc::new(AtomicU32::new(0)),
            }
        }

        fn fail_then_succeed(status_code: Option<u16>, text: &str) -> Self {
            let text = text.to_string();
            Self {
                response_fn: Box::new(move |idx| {
                    if idx == 0 {
                        Err(ApiError::Vision {
                            message: "HTTP 503".to_string(),
                            status_code,
                        })
                    } else {
                        Ok(text.clone())
                    }
                }),
                call_count: Arc::new(AtomicU32::new(0)),
            }
        }

        fn call_count_handle(&self) -> Arc<AtomicU32> {
            self.call_count.clone()
        }
    }

    #[async_trait]
    impl VisionProvider for MockVision {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate(&self, _request: &VisionRequest) -> ApiResult<String> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            (self.response_fn)(idx)
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(5)
        }
    }

    fn fast_config() -> VisionConfig {
        VisionConfig {
            retry_attempts: 1,
            retry_delay_ms: 1,
            ..VisionConfig::default()
        }
    }

    fn scorer(mock: MockVision) -> VisionScorer {
        VisionScorer::new(Box::new(mock), &fast_config())
    }

    #[tokio::test]
    async fn test_score_single_parses_response() {
        let scorer = scorer(MockVision::success("Edge: 8\nDetail: 6\nTransparency: 9"));
        let scores = scorer
            .score_single(ImageRef::Url("https://x/out.png".to_string()), "BRIA")
            .await
            .unwrap();
        assert_eq!(scores.edge_accuracy, 8);
        assert_eq!(scores.provenance, ScoreProvenance::Measured);
    }

    #[tokio::test]
    async fn test_score_single_degrades_on_parse_failure() {
        let scorer = scorer(MockVision::success("The edges look fine to me."));
        let scores = scorer
            .score_single(ImageRef::Url("https://x/out.png".to_string()), "BRIA")
            .await
            .unwrap();
        assert_eq!(scores.overall, 7);
        assert_eq!(scores.provenance, ScoreProvenance::Defaulted);
    }

    #[tokio::test]
    async fn test_score_comparative_maps_labels() {
        let scorer = scorer(MockVision::success(
            "Result 1 - Edge: 9, Detail: 8, Transparency: 9\n\
             Result 2 - Edge: 5, Detail: 6, Transparency: 5",
        ));
        let candidates = vec![
            ("bria/remove-background".to_string(), "https://x/a.png".to_string()),
            ("cjwbw/rembg".to_string(), "https://x/b.png".to_string()),
        ];
        let scores = scorer.score_comparative(&candidates).await.unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores["bria/remove-background"].edge_accuracy, 9);
        assert_eq!(scores["cjwbw/rembg"].edge_accuracy, 5);
    }

    #[tokio::test]
    async fn test_score_comparative_empty_candidates() {
        let mock = MockVision::success("anything");
        let calls = mock.call_count_handle();
        let scorer = scorer(mock);
        let scores = scorer.score_comparative(&[]).await.unwrap();
        assert!(scores.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retry_on_transient_failure() {
        let mock = MockVision::fail_then_succeed(Some(503), "Edge: 7 Detail: 7 Transparency: 7");
        let calls = mock.call_count_handle();
        let scorer = scorer(mock);
        let scores = scorer
            .score_single(ImageRef::Url("https://x/out.png".to_string()), "RemBG")
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(scores.provenance, ScoreProvenance::Measured);
    }

    #[tokio::test]
    async fn test_no_retry_on_auth_failure() {
        let mock = MockVision::failing(Some(401), "unauthorized");
        let calls = mock.call_count_handle();
        let scorer = scorer(mock);
        let err = scorer
            .analyze(ImageRef::Url("https://x/in.png".to_string()))
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, ApiError::Vision { .. }));
    }

    #[tokio::test]
    async fn test_analyze_passes_text_through() {
        let scorer = scorer(MockVision::success(
            "**Subject**: a cat\n**Recommended Category**: Animals",
        ));
        let analysis = scorer
            .analyze(ImageRef::Url("https://x/in.png".to_string()))
            .await
            .unwrap();
        assert!(analysis.contains("Recommended Category"));
    }
}
