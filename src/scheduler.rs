use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::registry::JobRegistry;
use crate::types::JobId;

/// Fires a delayed submission after a configured duration, cancelable while
/// pending.
///
/// Each armed entry owns a cancellation token derived from the system-wide
/// shutdown token, so shutting the system down discards every pending entry
/// without firing it. The registry only tracks the scheduled id; the token
/// lives exclusively in this map.
pub struct DelayScheduler {
    entries: DashMap<JobId, CancellationToken>,
    registry: Arc<JobRegistry>,
    shutdown: CancellationToken,
}

impl DelayScheduler {
    pub fn new(registry: Arc<JobRegistry>, shutdown: CancellationToken) -> Self {
        Self {
            entries: DashMap::new(),
            registry,
            shutdown,
        }
    }

    /// Register a deferred dispatch: after `delay` elapses, the id leaves the
    /// scheduled set and `on_fire` performs the immediate-submission steps,
    /// reusing the original id.
    pub fn arm<F>(self: &Arc<Self>, id: JobId, delay: Duration, on_fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let token = self.shutdown.child_token();
        self.entries.insert(id, token.clone());
        self.registry.register_scheduled(id);
        tracing::debug!(job_id = %id, delay_ms = delay.as_millis() as u64, "scheduled job armed");

        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(job_id = %id, "scheduled job discarded before firing");
                }
                _ = tokio::time::sleep(delay) => {
                    scheduler.entries.remove(&id);
                    scheduler.registry.unregister_scheduled(id);
                    tracing::debug!(job_id = %id, "scheduled job firing");
                    on_fire();
                }
            }
        });
    }

    /// Cancel a pending entry, removing all of its bookkeeping.
    ///
    /// Returns `true` if the entry was still pending, `false` if it already
    /// fired or was never armed.
    pub fn cancel(&self, id: JobId) -> bool {
        match self.entries.remove(&id) {
            Some((_, token)) => {
                token.cancel();
                self.registry.unregister_scheduled(id);
                tracing::debug!(job_id = %id, "scheduled job cancelled");
                true
            }
            None => false,
        }
    }
}
