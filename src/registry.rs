use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::handle::JobHandle;
use crate::types::{JobId, JobState};

#[derive(Debug, Default)]
struct RegistryInner {
    /// Ids whose delayed dispatch has not yet fired or been cancelled
    scheduled: HashSet<JobId>,
    /// Every dispatched id mapped to its handle; retained for the lifetime
    /// of the registry, never evicted
    jobs: HashMap<JobId, JobHandle>,
    /// Subset of `jobs` believed still executing
    running: HashSet<JobId>,
}

/// Authoritative bookkeeping of which job ids are scheduled, running, or
/// known-but-finished.
///
/// Mutated concurrently from the submission path, the completion monitor,
/// timeout-guard callbacks, and explicit cancellation, so all three
/// collections sit behind a single mutex: a completion and a timeout racing
/// to unregister the same id are both safe no-ops after the first succeeds.
/// An id belongs to at most one of {scheduled, running} at any instant.
#[derive(Debug, Default)]
pub struct JobRegistry {
    inner: Mutex<RegistryInner>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        // A poisoned mutex means a panic inside a critical section; the
        // bookkeeping can no longer be trusted.
        self.inner.lock().expect("job registry mutex poisoned")
    }

    /// Track a dispatched job as running.
    ///
    /// Returns `false` without overwriting if the id is already known.
    /// Duplicates should not occur given random id generation, but the
    /// contract is honored rather than silently clobbered.
    pub fn register_running(&self, id: JobId, handle: JobHandle) -> bool {
        let mut inner = self.lock();
        if inner.jobs.contains_key(&id) {
            tracing::warn!(job_id = %id, "duplicate registration ignored");
            return false;
        }
        inner.jobs.insert(id, handle);
        inner.running.insert(id);
        true
    }

    pub fn register_scheduled(&self, id: JobId) -> bool {
        self.lock().scheduled.insert(id)
    }

    pub fn unregister_scheduled(&self, id: JobId) -> bool {
        self.lock().scheduled.remove(&id)
    }

    /// Remove an id from the running set. Idempotent; removing an id that is
    /// not present is a no-op returning `false`.
    pub fn unregister_running(&self, id: JobId) -> bool {
        self.lock().running.remove(&id)
    }

    pub fn is_scheduled(&self, id: JobId) -> bool {
        self.lock().scheduled.contains(&id)
    }

    pub fn is_running(&self, id: JobId) -> bool {
        self.lock().running.contains(&id)
    }

    pub fn handle_of(&self, id: JobId) -> Option<JobHandle> {
        self.lock().jobs.get(&id).cloned()
    }

    pub fn count_scheduled(&self) -> usize {
        self.lock().scheduled.len()
    }

    pub fn count_running(&self) -> usize {
        self.lock().running.len()
    }

    pub fn scheduled_ids(&self) -> Vec<JobId> {
        self.lock().scheduled.iter().copied().collect()
    }

    /// All ids ever dispatched, whatever their current state
    pub fn all_known_ids(&self) -> Vec<JobId> {
        self.lock().jobs.keys().copied().collect()
    }

    /// Derive the externally observable state of an id under a single lock
    /// acquisition. Evaluation order matters: scheduled membership first,
    /// then unknown, then the handle's cancelled flag, then running.
    pub fn state_of(&self, id: JobId) -> JobState {
        let inner = self.lock();
        if inner.scheduled.contains(&id) {
            return JobState::Scheduled;
        }
        let Some(handle) = inner.jobs.get(&id) else {
            return JobState::DoesNotExist;
        };
        if handle.is_cancelled() {
            return JobState::Cancelled;
        }
        if inner.running.contains(&id) {
            return JobState::Running;
        }
        JobState::Done
    }
}
