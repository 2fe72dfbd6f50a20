//! Background-removal provider clients.
//!
//! Defines the interface a removal provider implements (submit a job,
//! fetch its status) plus the Replicate-backed implementation used for
//! the default catalog.

pub(crate) mod replicate;

pub use replicate::ReplicateProvider;

use crate::error::ApiResult;
use crate::types::Job;
use async_trait::async_trait;

/// Interface to one external background-removal service.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the orchestrator holds `Arc<dyn RemovalProvider>` for dynamic dispatch
/// and mock injection in tests).
#[async_trait]
pub trait RemovalProvider: Send + Sync {
    /// Stable provider identifier (e.g., "bria/remove-background").
    fn id(&self) -> &str;

    /// Submit an image for background removal.
    ///
    /// Resolves the provider's current processing version first, then
    /// creates the job. Returns the accepted job, normally in the
    /// `Starting` state. Errors are terminal for this provider only.
    async fn submit(&self, image_url: &str) -> ApiResult<Job>;

    /// Fetch the current state of a previously submitted job.
    async fn fetch(&self, job_id: &str) -> ApiResult<Job>;
}

impl std::fmt::Debug for dyn RemovalProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemovalProvider")
            .field("id", &self.id())
            .finish()
    }
}
