//! Comparison orchestration.
//!
//! Fans one source image out to N removal providers concurrently, one
//! submit+poll pipeline per provider. Pipelines are independent: a
//! provider that fails resolution, submission, or processing ends up as
//! a failed job in the aggregate without cancelling or delaying its
//! siblings. Callers observe incremental progress through a callback and
//! receive the full terminal mapping at the join point.

use crate::config::CompareConfig;
use crate::poller::{CancelFlag, Poller};
use crate::provider::RemovalProvider;
use crate::types::Job;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Semaphore;

/// Aggregate result of one comparison run.
#[derive(Debug, Clone, Default)]
pub struct ComparisonReport {
    /// Terminal job per provider id
    pub jobs: HashMap<String, Job>,
    /// Wall-clock seconds per provider pipeline
    pub processing_times: HashMap<String, f64>,
}

/// Runs submit+poll pipelines across a provider set.
pub struct Comparison {
    poller: Poller,
    parallel: usize,
}

impl Comparison {
    pub fn new(poller: Poller, config: &CompareConfig) -> Self {
        Self {
            poller,
            parallel: config.parallel,
        }
    }

    /// Fan `image_url` out to every provider and run each pipeline to a
    /// terminal state.
    ///
    /// `on_update` fires once per observation on any pipeline, keyed by
    /// provider id; completion order across providers is whichever
    /// finishes first. The returned report contains a terminal job for
    /// every provider, including those whose submission failed.
    pub async fn run<F>(
        &self,
        image_url: &str,
        providers: Vec<Arc<dyn RemovalProvider>>,
        cancel: CancelFlag,
        on_update: F,
    ) -> ComparisonReport
    where
        F: Fn(&str, &Job) + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.parallel));
        let aggregate = Arc::new(Mutex::new(HashMap::new()));
        let times = Arc::new(Mutex::new(HashMap::new()));
        let on_update = Arc::new(on_update);
        let mut handles = Vec::with_capacity(providers.len());

        for provider in providers {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                tracing::warn!("Comparison semaphore closed unexpectedly, stopping fan-out");
                break;
            };

            let poller = self.poller.clone();
            let image_url = image_url.to_string();
            let cancel = cancel.clone();
            let aggregate = aggregate.clone();
            let times = times.clone();
            let on_update = on_update.clone();

            let handle = tokio::spawn(async move {
                let provider_id = provider.id().to_string();
                let started = Instant::now();

                let terminal =
                    run_pipeline(&poller, provider.as_ref(), &image_url, &cancel, |job| {
                        aggregate
                            .lock()
                            .unwrap()
                            .insert(job.provider_id.clone(), job.clone());
                        on_update(&job.provider_id, job);
                    })
                    .await;

                aggregate
                    .lock()
                    .unwrap()
                    .insert(provider_id.clone(), terminal);
                times
                    .lock()
                    .unwrap()
                    .insert(provider_id, started.elapsed().as_secs_f64());
                drop(permit);
            });

            handles.push(handle);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Comparison pipeline task panicked: {e}");
            }
        }

        ComparisonReport {
            jobs: Arc::try_unwrap(aggregate)
                .map(|m| m.into_inner().unwrap())
                .unwrap_or_default(),
            processing_times: Arc::try_unwrap(times)
                .map(|m| m.into_inner().unwrap())
                .unwrap_or_default(),
        }
    }
}

/// One provider's pipeline: submit, then poll to a terminal state.
///
/// Submission errors become a failed job delivered through the same
/// update channel as poll observations; they never propagate.
async fn run_pipeline<F>(
    poller: &Poller,
    provider: &dyn RemovalProvider,
    image_url: &str,
    cancel: &CancelFlag,
    mut on_update: F,
) -> Job
where
    F: FnMut(&Job),
{
    if cancel.is_cancelled() {
        let job = Job::failed(provider.id(), "cancelled before submission").canceled();
        on_update(&job);
        return job;
    }

    let job = match provider.submit(image_url).await {
        Ok(job) => job,
        Err(e) => {
            tracing::warn!(provider = provider.id(), "Submission failed: {e}");
            let job = Job::failed(provider.id(), e.to_string());
            on_update(&job);
            return job;
        }
    };
    on_update(&job);

    poller.poll(provider, job, cancel, on_update).await
}
