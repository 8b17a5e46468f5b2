//! Runtime configuration for the job system.
//!
//! Values come from three layers, later layers overriding earlier ones:
//! built-in defaults, an optional TOML file, and environment variables with
//! the `JOBFORGE` prefix (`JOBFORGE__MAX_CONCURRENT_JOBS=4`).

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{JobError, JobResult};

const ENV_PREFIX: &str = "JOBFORGE";
const ENV_SEPARATOR: &str = "__";

fn default_max_concurrent_jobs() -> usize {
    10
}

fn default_job_timeout_ms() -> u64 {
    300_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSystemConfig {
    /// Upper bound on simultaneously running jobs
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
    /// Per-job execution deadline in milliseconds
    #[serde(default = "default_job_timeout_ms")]
    pub job_timeout_ms: u64,
}

impl Default for JobSystemConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            job_timeout_ms: default_job_timeout_ms(),
        }
    }
}

impl JobSystemConfig {
    pub fn new(max_concurrent_jobs: usize, job_timeout: Duration) -> Self {
        Self {
            max_concurrent_jobs,
            job_timeout_ms: job_timeout.as_millis() as u64,
        }
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_millis(self.job_timeout_ms)
    }

    pub fn validate(&self) -> JobResult<()> {
        if self.max_concurrent_jobs == 0 {
            return Err(JobError::invalid_argument(
                "max_concurrent_jobs",
                "must be greater than zero",
            ));
        }
        if self.job_timeout_ms == 0 {
            return Err(JobError::invalid_argument(
                "job_timeout_ms",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Load configuration from a TOML file, overlaid with `JOBFORGE`-prefixed
    /// environment variables, then validate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> JobResult<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR))
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let config = JobSystemConfig::default();
        assert_eq!(config.max_concurrent_jobs, 10);
        assert_eq!(config.job_timeout(), Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_new_converts_duration() {
        let config = JobSystemConfig::new(4, Duration::from_millis(170));
        assert_eq!(config.job_timeout_ms, 170);
        assert_eq!(config.job_timeout(), Duration::from_millis(170));
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = JobSystemConfig::new(0, Duration::from_secs(1));
        match config.validate() {
            Err(JobError::InvalidArgument { field, .. }) => {
                assert_eq!(field, "max_concurrent_jobs");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = JobSystemConfig::new(4, Duration::ZERO);
        match config.validate() {
            Err(JobError::InvalidArgument { field, .. }) => {
                assert_eq!(field, "job_timeout_ms");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_from_file_reads_toml() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").expect("temp file");
        writeln!(file, "max_concurrent_jobs = 7").expect("write");
        writeln!(file, "job_timeout_ms = 2500").expect("write");

        let config = JobSystemConfig::from_file(file.path()).expect("valid config");
        assert_eq!(config.max_concurrent_jobs, 7);
        assert_eq!(config.job_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_from_file_applies_defaults_for_missing_keys() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").expect("temp file");
        writeln!(file, "max_concurrent_jobs = 3").expect("write");

        let config = JobSystemConfig::from_file(file.path()).expect("valid config");
        assert_eq!(config.max_concurrent_jobs, 3);
        assert_eq!(config.job_timeout_ms, default_job_timeout_ms());
    }

    #[test]
    fn test_from_file_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").expect("temp file");
        writeln!(file, "max_concurrent_jobs = 0").expect("write");

        assert!(JobSystemConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_from_file_missing_file_is_an_error() {
        assert!(JobSystemConfig::from_file("/nonexistent/jobforge.toml").is_err());
    }

    proptest! {
        #[test]
        fn prop_config_round_trip_serialization(
            max in 1usize..=10_000,
            timeout_ms in 1u64..=86_400_000,
        ) {
            let config = JobSystemConfig {
                max_concurrent_jobs: max,
                job_timeout_ms: timeout_ms,
            };
            let encoded = toml::to_string(&config).expect("serializes");
            let decoded: JobSystemConfig = toml::from_str(&encoded).expect("deserializes");
            prop_assert_eq!(decoded.max_concurrent_jobs, max);
            prop_assert_eq!(decoded.job_timeout_ms, timeout_ms);
        }
    }
}
