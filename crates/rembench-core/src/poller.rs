//! Job status polling.
//!
//! Repeatedly queries a provider for a job's state until it reaches a
//! terminal status, invoking a callback after every observation. A failed
//! status check is a transient event: it is logged and retried, never
//! treated as job failure. The loop is bounded by `max_attempts` so a
//! hung prediction surfaces as a failed job instead of spinning forever.

use crate::config::PollConfig;
use crate::error::ApiError;
use crate::provider::RemovalProvider;
use crate::types::{Job, JobStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative cancellation flag shared across pipelines.
///
/// Checked before every suspension point; a cancelled pipeline marks its
/// job `Canceled` and stops polling. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Polls one job to a terminal state.
#[derive(Debug, Clone)]
pub struct Poller {
    interval: Duration,
    max_attempts: u32,
}

impl Poller {
    pub fn new(config: &PollConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            max_attempts: config.max_attempts,
        }
    }

    /// Poll `job` until terminal, invoking `on_update` after every
    /// observation.
    ///
    /// The callback fires once per status check, including checks that
    /// observe no change; it never fires again after the terminal
    /// observation has been delivered. Returns the terminal job. If the
    /// attempt budget runs out, the returned job is `Failed` with a
    /// timeout message; if `cancel` trips, it is `Canceled`.
    pub async fn poll<F>(
        &self,
        provider: &dyn RemovalProvider,
        job: Job,
        cancel: &CancelFlag,
        mut on_update: F,
    ) -> Job
    where
        F: FnMut(&Job),
    {
        let mut current = job;

        for attempt in 1..=self.max_attempts {
            if current.status.is_terminal() {
                return current;
            }
            if cancel.is_cancelled() {
                tracing::info!(provider = provider.id(), job = %current.id, "Polling cancelled");
                return current.canceled();
            }

            tokio::time::sleep(self.interval).await;

            if cancel.is_cancelled() {
                return current.canceled();
            }

            match provider.fetch(&current.id).await {
                Ok(observed) => {
                    current = observed;
                    on_update(&current);
                }
                Err(e) => {
                    // Transient: a single failed status check doesn't fail the job
                    tracing::warn!(
                        provider = provider.id(),
                        job = %current.id,
                        attempt,
                        "Status check failed, will retry: {e}"
                    );
                }
            }
        }

        if current.status.is_terminal() {
            return current;
        }

        let timeout = ApiError::Timeout {
            what: format!("polling {}", provider.id()),
            timeout_ms: self.interval.as_millis() as u64 * self.max_attempts as u64,
        };
        tracing::warn!(provider = provider.id(), job = %current.id, "{timeout}");
        current.status = JobStatus::Failed;
        current.output = None;
        current.error = Some(timeout.to_string());
        on_update(&current);
        current
    }
}
