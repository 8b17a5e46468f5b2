use thiserror::Error;

/// Errors surfaced by the job system.
///
/// Argument validation failures are reported synchronously and have no side
/// effects. Everything that happens after a job has been accepted (timeout
/// races, duplicate cancellation, post-shutdown submissions) is resolved
/// internally and reported through boolean return values or
/// [`JobState::DoesNotExist`](crate::types::JobState::DoesNotExist), never
/// through this type.
#[derive(Debug, Error)]
pub enum JobError {
    /// A caller-supplied value failed validation
    #[error("Invalid argument: {field} - {reason}")]
    InvalidArgument { field: String, reason: String },

    /// A job's `run` action failed internally. Contained within the worker;
    /// exposed so jobs built from fallible code can report their failure.
    #[error("Job execution failed")]
    ExecutionFailed {
        #[source]
        source: anyhow::Error,
    },

    /// Configuration loading or parsing error
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),
}

impl JobError {
    /// Create a new invalid argument error
    pub fn invalid_argument<S: Into<String>>(field: S, reason: S) -> Self {
        JobError::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<anyhow::Error> for JobError {
    fn from(error: anyhow::Error) -> Self {
        JobError::ExecutionFailed { source: error }
    }
}

/// Type alias for Result with JobError to simplify function signatures
pub type JobResult<T> = Result<T, JobError>;
