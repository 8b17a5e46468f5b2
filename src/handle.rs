use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use crate::types::JobId;

/// Cancelable reference to a dispatched unit of work.
///
/// Cheap to clone; all clones observe the same unit. Cancellation is a
/// cooperative request delivered through the unit's cancellation token, not
/// forced preemption.
#[derive(Debug, Clone)]
pub struct JobHandle {
    inner: Arc<HandleInner>,
}

#[derive(Debug)]
struct HandleInner {
    id: JobId,
    token: CancellationToken,
    cancelled: AtomicBool,
    finished: AtomicBool,
}

impl JobHandle {
    pub(crate) fn new(id: JobId) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id,
                token: CancellationToken::new(),
                cancelled: AtomicBool::new(false),
                finished: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> JobId {
        self.inner.id
    }

    /// Request cooperative cancellation of the unit.
    ///
    /// Returns `true` only for the first cancellation of a unit that has not
    /// already finished. Cancelling a finished or already-cancelled unit is a
    /// harmless no-op returning `false`.
    pub fn cancel(&self) -> bool {
        if self.inner.finished.load(Ordering::Acquire) {
            return false;
        }
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.inner.token.cancel();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::Acquire)
    }

    pub(crate) fn cancellation_token(&self) -> &CancellationToken {
        &self.inner.token
    }

    pub(crate) fn mark_finished(&self) {
        self.inner.finished.store(true, Ordering::Release);
    }
}
