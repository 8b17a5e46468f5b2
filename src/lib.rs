//! In-process job execution with bounded concurrency, per-job deadlines,
//! delayed dispatch, and lifecycle introspection.
//!
//! A [`JobSystem`] accepts units of work implementing the [`Job`] trait,
//! runs at most a configured number of them simultaneously, cancels any that
//! outlive the configured timeout, and answers state queries for every id it
//! has ever handed out.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use jobforge::{Job, JobResult, JobSystem, JobSystemConfig};
//!
//! struct SleepJob;
//!
//! #[async_trait::async_trait]
//! impl Job for SleepJob {
//!     async fn run(&self) -> JobResult<()> {
//!         tokio::time::sleep(Duration::from_millis(50)).await;
//!         Ok(())
//!     }
//!
//!     async fn clean(&self) {}
//! }
//!
//! #[tokio::main]
//! async fn main() -> JobResult<()> {
//!     let system = JobSystem::new(JobSystemConfig::default())?;
//!     let id = system.execute(Arc::new(SleepJob));
//!     println!("job {id} is {}", system.job_state(id));
//!     system.shutdown();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handle;
mod monitor;
pub mod pool;
pub mod registry;
pub mod scheduler;
pub mod system;
mod timeout;
pub mod types;

pub use config::JobSystemConfig;
pub use error::{JobError, JobResult};
pub use handle::JobHandle;
pub use pool::WorkerPool;
pub use registry::JobRegistry;
pub use scheduler::DelayScheduler;
pub use system::JobSystem;
pub use types::{Job, JobId, JobState, TimeFrame};
