use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::pool::WorkerPool;
use crate::registry::JobRegistry;

pub(crate) const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Spawn the completion monitor: a background loop that drains finished
/// handles from the pool and retires them from the running set.
///
/// Cancelled jobs are skipped; their registry exit is handled on the
/// cancellation path. The poll is bounded so the loop notices shutdown within
/// one interval even when no job finishes.
pub(crate) fn spawn(
    pool: Arc<WorkerPool>,
    registry: Arc<JobRegistry>,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if shutdown.is_cancelled() {
                break;
            }
            if let Some(handle) = pool.poll_next_finished(POLL_INTERVAL).await {
                if !handle.is_cancelled() {
                    registry.unregister_running(handle.id());
                    tracing::debug!(job_id = %handle.id(), "job completed");
                }
            }
        }
        tracing::debug!("completion monitor stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::error::JobResult;
    use crate::types::{Job, JobId, JobState};

    struct NoopJob;

    #[async_trait]
    impl Job for NoopJob {
        async fn run(&self) -> JobResult<()> {
            Ok(())
        }

        async fn clean(&self) {}
    }

    #[tokio::test]
    async fn test_monitor_unregisters_completed_job() {
        let pool = Arc::new(WorkerPool::new(2));
        let registry = Arc::new(JobRegistry::new());
        let shutdown = CancellationToken::new();
        spawn(Arc::clone(&pool), Arc::clone(&registry), shutdown.clone());

        let id = JobId::generate();
        let handle = pool.submit(id, Arc::new(NoopJob)).expect("accepted");
        registry.register_running(id, handle);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(registry.state_of(id), JobState::Done);
        assert_eq!(registry.count_running(), 0);

        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_monitor_stops_after_shutdown() {
        let pool = Arc::new(WorkerPool::new(1));
        let registry = Arc::new(JobRegistry::new());
        let shutdown = CancellationToken::new();
        let task = spawn(pool, registry, shutdown.clone());

        shutdown.cancel();
        tokio::time::timeout(POLL_INTERVAL * 2, task)
            .await
            .expect("monitor exits within one poll interval")
            .expect("monitor task does not panic");
    }
}
