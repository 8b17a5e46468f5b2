use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore, mpsc};

use crate::handle::JobHandle;
use crate::types::{Job, JobId};

/// Bounded-concurrency executor for submitted units of work.
///
/// Up to the configured limit of units execute simultaneously; the limit is
/// live-adjustable. Finished units are handed back through
/// [`poll_next_finished`](WorkerPool::poll_next_finished) in completion
/// order, which is arbitrary across distinct jobs.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    limit: AtomicUsize,
    accepting: AtomicBool,
    completion_tx: mpsc::UnboundedSender<JobHandle>,
    completion_rx: Mutex<mpsc::UnboundedReceiver<JobHandle>>,
}

impl WorkerPool {
    pub fn new(concurrency_limit: usize) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency_limit)),
            limit: AtomicUsize::new(concurrency_limit),
            accepting: AtomicBool::new(true),
            completion_tx,
            completion_rx: Mutex::new(completion_rx),
        }
    }

    /// Submit a unit of work, spawning its worker task.
    ///
    /// The unit waits for an execution permit, runs `run` raced against its
    /// cancellation token, then always runs `clean`, including after a
    /// failed or interrupted `run`. A unit cancelled while still queued runs
    /// neither. A failure from `run` is contained and logged, never
    /// propagated out of the worker.
    ///
    /// Returns `None` once the pool has shut down. This is an expected race
    /// with user-initiated shutdown, not a fatal error.
    pub fn submit(&self, id: JobId, job: Arc<dyn Job>) -> Option<JobHandle> {
        if !self.accepting.load(Ordering::Acquire) {
            tracing::warn!(job_id = %id, "submission rejected, worker pool is shut down");
            return None;
        }

        let handle = JobHandle::new(id);
        let worker_handle = handle.clone();
        let semaphore = Arc::clone(&self.semaphore);
        let completion_tx = self.completion_tx.clone();

        tokio::spawn(async move {
            let token = worker_handle.cancellation_token().clone();

            let permit = tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(job_id = %id, "job cancelled before execution started");
                    None
                }
                permit = semaphore.acquire_owned() => permit.ok(),
            };

            if permit.is_some() {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::debug!(job_id = %id, "job interrupted by cancellation");
                    }
                    result = job.run() => {
                        if let Err(error) = result {
                            tracing::error!(job_id = %id, error = %error, "job run failed");
                        }
                    }
                }
                // Cleanup always follows run, whatever the outcome.
                job.clean().await;
            }

            worker_handle.mark_finished();
            let _ = completion_tx.send(worker_handle);
        });

        Some(handle)
    }

    /// Wait up to `timeout` for the next finished unit.
    ///
    /// The bounded wait exists so a monitoring loop built on top can
    /// periodically check a shutdown flag instead of blocking indefinitely.
    pub async fn poll_next_finished(&self, timeout: Duration) -> Option<JobHandle> {
        let mut rx = self.completion_rx.lock().await;
        tokio::time::timeout(timeout, rx.recv()).await.ok().flatten()
    }

    /// Adjust the ceiling on simultaneously executing units.
    ///
    /// Growing releases additional permits immediately. Shrinking retires the
    /// surplus permits as running units return them; units already executing
    /// are not interrupted. Across interleaved reconfigurations the limit is
    /// enforced eventually, not instantaneously: a grow issued while a prior
    /// shrink is still retiring permits can transiently admit more than the
    /// configured limit until the retirement settles.
    pub fn set_concurrency_limit(&self, concurrency_limit: usize) {
        let previous = self.limit.swap(concurrency_limit, Ordering::AcqRel);
        if concurrency_limit > previous {
            self.semaphore.add_permits(concurrency_limit - previous);
        } else {
            for _ in 0..previous - concurrency_limit {
                let semaphore = Arc::clone(&self.semaphore);
                tokio::spawn(async move {
                    if let Ok(permit) = semaphore.acquire_owned().await {
                        permit.forget();
                    }
                });
            }
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.limit.load(Ordering::Acquire)
    }

    /// Stop accepting new submissions. In-flight units drain best-effort and
    /// are not forcibly awaited.
    pub fn shutdown(&self) {
        self.accepting.store(false, Ordering::Release);
    }
}
