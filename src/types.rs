use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::JobResult;

/// Opaque unique identifier for a tracked job.
///
/// Generated by the caller-facing API at submission time, never by a worker.
/// Renders as a UUID string, suitable as a map key and for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unit of work accepted by the job system.
///
/// `run` is the work itself; `clean` is the post-run release step and always
/// executes after `run`, including when `run` returns an error. A failure
/// from `run` is contained by the worker and logged, never propagated.
///
/// Cancellation is cooperative: the running `run` future is dropped at its
/// next await point when the job is cancelled or times out. Work that never
/// awaits cannot be preempted.
#[async_trait]
pub trait Job: Send + Sync {
    /// Execute the work
    async fn run(&self) -> JobResult<()>;

    /// Release resources; invoked after `run` regardless of outcome
    async fn clean(&self);
}

/// Externally observable lifecycle state of a job id.
///
/// Derived from registry membership, never stored. For a single id the
/// observed states form a non-decreasing path through
/// `Scheduled → Running → {Done | Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Scheduled,
    Running,
    Cancelled,
    Done,
    DoesNotExist,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Scheduled => write!(f, "scheduled"),
            JobState::Running => write!(f, "running"),
            JobState::Cancelled => write!(f, "cancelled"),
            JobState::Done => write!(f, "done"),
            JobState::DoesNotExist => write!(f, "does_not_exist"),
        }
    }
}

/// Convenience delay buckets for scheduled submission.
///
/// Caller-level constants only; the scheduler accepts any positive
/// [`Duration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFrame {
    OneHour,
    TwoHours,
    SixHours,
    TwelveHours,
}

impl From<TimeFrame> for Duration {
    fn from(frame: TimeFrame) -> Self {
        let hours = match frame {
            TimeFrame::OneHour => 1,
            TimeFrame::TwoHours => 2,
            TimeFrame::SixHours => 6,
            TimeFrame::TwelveHours => 12,
        };
        Duration::from_secs(hours * 3600)
    }
}
