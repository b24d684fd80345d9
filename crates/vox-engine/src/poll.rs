//! Bounded status polling.

use std::future::Future;

use tracing::{debug, warn};

use vox_providers::{JobHandle, JobState, PollPolicy, RenderArtifact, VideoProvider};

use crate::error::{EngineError, EngineResult};

/// Poll a submitted job until a terminal state, a hard error or the attempt
/// budget runs out.
///
/// At most `policy.max_attempts` status calls are made, each preceded by one
/// interval of cooperative sleep, and the loop exits at the first terminal
/// classification. A retryable status-check error (network, 429, 5xx)
/// consumes an attempt and keeps the loop alive; the policy is the same for
/// every provider. `on_attempt` runs once per status call with the attempt
/// count and is where heartbeats land.
pub async fn poll_until_terminal<F, Fut>(
    provider: &dyn VideoProvider,
    handle: &JobHandle,
    policy: &PollPolicy,
    mut on_attempt: F,
) -> EngineResult<RenderArtifact>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ()>,
{
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.interval).await;

        let result = provider.poll(handle).await;
        on_attempt(attempt).await;

        match result {
            Ok(JobState::Pending) => {
                debug!(
                    provider = %provider.kind(),
                    job = %handle,
                    attempt,
                    "Job still pending"
                );
            }
            Ok(JobState::Succeeded(artifact)) => return Ok(artifact),
            Ok(JobState::Failed(failure)) => {
                return Err(EngineError::VendorFailed {
                    message: failure.message,
                    detail: failure.detail,
                })
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    provider = %provider.kind(),
                    job = %handle,
                    attempt,
                    "Transient status-check failure: {}",
                    e
                );
            }
            Err(e) => return Err(EngineError::Poll(e)),
        }
    }

    Err(EngineError::Timeout {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use vox_models::ProviderKind;
    use vox_providers::{ProviderError, ProviderResult, RenderRequest, VendorFailure};

    /// Provider that replays a scripted sequence of poll results.
    #[derive(Debug)]
    struct ScriptedProvider {
        polls: AtomicU32,
        script: Mutex<Vec<ProviderResult<JobState>>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<ProviderResult<JobState>>) -> Self {
            let mut script = script;
            script.reverse();
            Self {
                polls: AtomicU32::new(0),
                script: Mutex::new(script),
            }
        }

        fn poll_count(&self) -> u32 {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VideoProvider for ScriptedProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Did
        }

        fn poll_policy(&self) -> PollPolicy {
            PollPolicy::new(Duration::from_secs(5), 60)
        }

        async fn submit(&self, _request: &RenderRequest) -> ProviderResult<JobHandle> {
            Ok(JobHandle("job-1".into()))
        }

        async fn poll(&self, _handle: &JobHandle) -> ProviderResult<JobState> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Ok(JobState::Pending))
        }
    }

    fn policy(max_attempts: u32) -> PollPolicy {
        PollPolicy::new(Duration::from_secs(5), max_attempts)
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_terminal_polls_exactly_max_attempts() {
        let provider = ScriptedProvider::new(vec![]);
        let handle = JobHandle("job-1".into());

        let result =
            poll_until_terminal(&provider, &handle, &policy(60), |_| async {}).await;

        assert!(matches!(result, Err(EngineError::Timeout { attempts: 60 })));
        assert_eq!(provider.poll_count(), 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_short_circuits() {
        let provider = ScriptedProvider::new(vec![
            Ok(JobState::Pending),
            Ok(JobState::Pending),
            Ok(JobState::Succeeded(RenderArtifact::Url(
                "https://x/video.mp4".into(),
            ))),
        ]);
        let handle = JobHandle("job-1".into());

        let artifact = poll_until_terminal(&provider, &handle, &policy(60), |_| async {})
            .await
            .unwrap();

        assert_eq!(artifact, RenderArtifact::Url("https://x/video.mp4".into()));
        // No polls after the terminal state on the 3rd attempt
        assert_eq!(provider.poll_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vendor_failure_short_circuits() {
        let provider = ScriptedProvider::new(vec![Ok(JobState::Failed(
            VendorFailure::with_detail("bad image", serde_json::json!({ "message": "bad image" })),
        ))]);
        let handle = JobHandle("job-1".into());

        let err = poll_until_terminal(&provider, &handle, &policy(60), |_| async {})
            .await
            .unwrap_err();

        match err {
            EngineError::VendorFailed { message, detail } => {
                assert_eq!(message, "bad image");
                assert_eq!(detail, Some(serde_json::json!({ "message": "bad image" })));
            }
            other => panic!("expected vendor failure, got {:?}", other),
        }
        assert_eq!(provider.poll_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_consume_attempts_without_aborting() {
        let provider = ScriptedProvider::new(vec![
            Err(ProviderError::StatusCheck {
                status: 503,
                body: "hiccup".into(),
            }),
            Err(ProviderError::StatusCheck {
                status: 429,
                body: "slow down".into(),
            }),
            Ok(JobState::Succeeded(RenderArtifact::Url(
                "https://x/video.mp4".into(),
            ))),
        ]);
        let handle = JobHandle("job-1".into());

        let artifact = poll_until_terminal(&provider, &handle, &policy(60), |_| async {})
            .await
            .unwrap();

        assert_eq!(artifact, RenderArtifact::Url("https://x/video.mp4".into()));
        assert_eq!(provider.poll_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_poll_error_aborts() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::StatusCheck {
            status: 404,
            body: "unknown job".into(),
        })]);
        let handle = JobHandle("job-1".into());

        let err = poll_until_terminal(&provider, &handle, &policy(60), |_| async {})
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Poll(_)));
        assert_eq!(provider.poll_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_runs_once_per_attempt() {
        let provider = ScriptedProvider::new(vec![
            Ok(JobState::Pending),
            Ok(JobState::Succeeded(RenderArtifact::Url("u".into()))),
        ]);
        let handle = JobHandle("job-1".into());
        let beats = AtomicU32::new(0);

        poll_until_terminal(&provider, &handle, &policy(60), |_| {
            beats.fetch_add(1, Ordering::SeqCst);
            async {}
        })
        .await
        .unwrap();

        assert_eq!(beats.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_budget_respects_policy() {
        let provider = ScriptedProvider::new(vec![]);
        let handle = JobHandle("job-1".into());

        let result =
            poll_until_terminal(&provider, &handle, &policy(120), |_| async {}).await;

        assert!(matches!(result, Err(EngineError::Timeout { attempts: 120 })));
        assert_eq!(provider.poll_count(), 120);
    }
}
