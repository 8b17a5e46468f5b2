use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::JobSystemConfig;
use crate::error::{JobError, JobResult};
use crate::monitor;
use crate::pool::WorkerPool;
use crate::registry::JobRegistry;
use crate::scheduler::DelayScheduler;
use crate::timeout;
use crate::types::{Job, JobId, JobState};

struct Shared {
    pool: Arc<WorkerPool>,
    registry: Arc<JobRegistry>,
    shutdown: CancellationToken,
    timeout_ms: AtomicU64,
}

impl Shared {
    /// Immediate-submission path shared by `execute` and a firing scheduler
    /// entry: hand the job to the pool, register it as running, and arm its
    /// timeout guard.
    fn dispatch(self: &Arc<Self>, id: JobId, job: Arc<dyn Job>) {
        // Expected race with user-initiated shutdown: the id was already
        // handed to the caller but is never registered, so it reads as
        // does-not-exist.
        let Some(handle) = self.pool.submit(id, job) else {
            return;
        };
        self.registry.register_running(id, handle.clone());
        let deadline = Duration::from_millis(self.timeout_ms.load(Ordering::Acquire));
        timeout::arm(
            handle,
            deadline,
            Arc::clone(&self.registry),
            self.shutdown.clone(),
        );
        tracing::info!(job_id = %id, "job dispatched");
    }
}

/// Façade over the worker pool, registry, scheduler, timeout guards, and
/// completion monitor.
///
/// Instances are independent; two systems share no state. Dropping a system
/// shuts it down.
pub struct JobSystem {
    shared: Arc<Shared>,
    scheduler: Arc<DelayScheduler>,
}

impl JobSystem {
    pub fn new(config: JobSystemConfig) -> JobResult<Self> {
        config.validate()?;

        let shutdown = CancellationToken::new();
        let registry = Arc::new(JobRegistry::new());
        let pool = Arc::new(WorkerPool::new(config.max_concurrent_jobs));
        let scheduler = Arc::new(DelayScheduler::new(
            Arc::clone(&registry),
            shutdown.clone(),
        ));
        monitor::spawn(Arc::clone(&pool), Arc::clone(&registry), shutdown.clone());

        tracing::info!(
            max_concurrent_jobs = config.max_concurrent_jobs,
            job_timeout_ms = config.job_timeout_ms,
            "job system started"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                pool,
                registry,
                shutdown,
                timeout_ms: AtomicU64::new(config.job_timeout_ms),
            }),
            scheduler,
        })
    }

    /// Submit a job for immediate execution and return its id.
    ///
    /// The id is valid for state queries and cancellation from the moment
    /// this returns. Submission never blocks on pool capacity; the job waits
    /// for a worker slot internally.
    pub fn execute(&self, job: Arc<dyn Job>) -> JobId {
        let id = JobId::generate();
        self.shared.dispatch(id, job);
        id
    }

    /// Submit a job to start after `delay`. Until the delay elapses the id
    /// reports as scheduled and can be cancelled without the job ever
    /// running.
    pub fn scheduled_execution(&self, job: Arc<dyn Job>, delay: Duration) -> JobResult<JobId> {
        if delay.is_zero() {
            return Err(JobError::invalid_argument(
                "delay",
                "must be greater than zero",
            ));
        }

        let id = JobId::generate();
        let shared = Arc::clone(&self.shared);
        self.scheduler.arm(id, delay, move || {
            shared.dispatch(id, job);
        });
        Ok(id)
    }

    /// Cancel a scheduled or running job.
    ///
    /// Returns `true` if this call caused a cancellation, `false` if the id
    /// is unknown, already finished, or already cancelled.
    pub fn cancel_job(&self, id: JobId) -> bool {
        if self.shared.registry.is_scheduled(id) {
            return self.scheduler.cancel(id);
        }
        match self.shared.registry.handle_of(id) {
            Some(handle) => {
                self.shared.registry.unregister_running(id);
                let cancelled = handle.cancel();
                if cancelled {
                    tracing::info!(job_id = %id, "job cancelled");
                }
                cancelled
            }
            None => false,
        }
    }

    /// Cancel every scheduled and every known job.
    ///
    /// Returns `true` only if every individual cancellation reported `true`;
    /// stops at the first failure. Best-effort all-or-report-failure, not
    /// transactional.
    pub fn cancel_all_jobs(&self) -> bool {
        for id in self.shared.registry.scheduled_ids() {
            if !self.cancel_job(id) {
                return false;
            }
        }
        for id in self.shared.registry.all_known_ids() {
            if !self.cancel_job(id) {
                return false;
            }
        }
        true
    }

    pub fn job_state(&self, id: JobId) -> JobState {
        self.shared.registry.state_of(id)
    }

    pub fn num_scheduled_jobs(&self) -> usize {
        self.shared.registry.count_scheduled()
    }

    pub fn num_running_jobs(&self) -> usize {
        self.shared.registry.count_running()
    }

    /// Adjust the concurrency ceiling at runtime. Jobs already running are
    /// never interrupted by a shrink.
    pub fn set_concurrency_limit(&self, limit: usize) -> JobResult<()> {
        if limit == 0 {
            return Err(JobError::invalid_argument(
                "limit",
                "must be greater than zero",
            ));
        }
        self.shared.pool.set_concurrency_limit(limit);
        tracing::info!(limit, "concurrency limit updated");
        Ok(())
    }

    pub fn concurrency_limit(&self) -> usize {
        self.shared.pool.concurrency_limit()
    }

    /// Set the deadline applied to subsequently dispatched jobs. Guards
    /// already armed keep their original deadline.
    pub fn set_timeout(&self, timeout: Duration) -> JobResult<()> {
        if timeout.is_zero() {
            return Err(JobError::invalid_argument(
                "timeout",
                "must be greater than zero",
            ));
        }
        self.shared
            .timeout_ms
            .store(timeout.as_millis() as u64, Ordering::Release);
        tracing::info!(timeout_ms = timeout.as_millis() as u64, "job timeout updated");
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.shared.timeout_ms.load(Ordering::Acquire))
    }

    /// Stop the system: reject new submissions, discard pending scheduled
    /// entries, and stop the completion monitor. Running jobs drain
    /// best-effort. Idempotent.
    pub fn shutdown(&self) {
        tracing::info!("job system shutting down");
        self.shared.shutdown.cancel();
        self.shared.pool.shutdown();
    }
}

impl Drop for JobSystem {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
        self.shared.pool.shutdown();
    }
}
