use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::handle::JobHandle;
use crate::registry::JobRegistry;

/// Arm a one-shot timeout guard for a dispatched job.
///
/// After the deadline elapses the guard cancels the job if it has not
/// finished and removes it from the running set either way; the removal is
/// idempotent with the completion monitor's. The guard is disarmed by system
/// shutdown.
///
/// The deadline is captured at dispatch; later timeout reconfiguration does
/// not affect guards already armed.
pub(crate) fn arm(
    handle: JobHandle,
    timeout: Duration,
    registry: Arc<JobRegistry>,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {
                let id = handle.id();
                if handle.cancel() {
                    tracing::info!(
                        job_id = %id,
                        timeout_ms = timeout.as_millis() as u64,
                        "job cancelled by timeout"
                    );
                }
                registry.unregister_running(id);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::{JobId, JobState};

    fn tracked_handle(registry: &JobRegistry) -> JobHandle {
        let id = JobId::generate();
        let handle = JobHandle::new(id);
        registry.register_running(id, handle.clone());
        handle
    }

    #[tokio::test]
    async fn test_guard_cancels_after_deadline() {
        let registry = Arc::new(JobRegistry::new());
        let handle = tracked_handle(&registry);
        let id = handle.id();

        arm(
            handle,
            Duration::from_millis(30),
            Arc::clone(&registry),
            CancellationToken::new(),
        );

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(registry.state_of(id), JobState::Cancelled);
        assert_eq!(registry.count_running(), 0);
    }

    #[tokio::test]
    async fn test_guard_is_noop_for_finished_job() {
        let registry = Arc::new(JobRegistry::new());
        let handle = tracked_handle(&registry);
        let id = handle.id();

        // Completes before the deadline.
        handle.mark_finished();
        registry.unregister_running(id);

        arm(
            handle.clone(),
            Duration::from_millis(30),
            Arc::clone(&registry),
            CancellationToken::new(),
        );

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!handle.is_cancelled());
        assert_eq!(registry.state_of(id), JobState::Done);
    }

    #[tokio::test]
    async fn test_shutdown_disarms_guard() {
        let registry = Arc::new(JobRegistry::new());
        let handle = tracked_handle(&registry);
        let id = handle.id();
        let shutdown = CancellationToken::new();

        arm(
            handle.clone(),
            Duration::from_millis(30),
            Arc::clone(&registry),
            shutdown.clone(),
        );
        shutdown.cancel();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!handle.is_cancelled());
        assert!(registry.is_running(id));
    }
}
