//! The provider trait.

use async_trait::async_trait;

use vox_models::ProviderKind;

use crate::error::ProviderResult;
use crate::types::{JobHandle, JobState, PollPolicy, RenderRequest};

/// A remote video-generation vendor.
///
/// The logical contract is the same for every vendor: create a job, then
/// poll it until a terminal state. Adapters own the wire formats and the
/// status vocabulary; callers only ever see `JobHandle` and `JobState`.
#[async_trait]
pub trait VideoProvider: Send + Sync + std::fmt::Debug {
    /// Which vendor this adapter talks to.
    fn kind(&self) -> ProviderKind;

    /// Polling bounds for this vendor.
    ///
    /// Vendors differ in typical completion latency, so the ceiling is
    /// provider-specific.
    fn poll_policy(&self) -> PollPolicy;

    /// Submit a generation job. Exactly one outbound job-creation call; never
    /// retried by callers.
    async fn submit(&self, request: &RenderRequest) -> ProviderResult<JobHandle>;

    /// Check the status of a submitted job.
    async fn poll(&self, handle: &JobHandle) -> ProviderResult<JobState>;
}
