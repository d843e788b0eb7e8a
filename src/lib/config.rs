//! Resource configuration for job admission and supervision.

use std::time::Duration;

use crate::errors::{Result, ScreenError};

/// Default per-job resident-memory ceiling: 16 GB.
pub const DEFAULT_JOB_MEMORY_CEILING: u64 = 16_000_000_000;

/// Default free-memory floor required before a job is admitted: 5 GB.
pub const DEFAULT_MIN_FREE_MEMORY: u64 = 5_000_000_000;

/// Default interval between admission polls.
pub const DEFAULT_ADMISSION_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default ceiling on how long admission may wait for memory: 6 hours.
pub const DEFAULT_ADMISSION_TIMEOUT: Duration = Duration::from_secs(21_600);

/// Default interval between watchdog polls of a job's resident set size.
pub const DEFAULT_WATCHDOG_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of concurrent worker threads.
pub const DEFAULT_WORKERS: usize = 6;

/// Default deadline applied to neighbour-sweep jobs.
pub const DEFAULT_NEIGHBOUR_DEADLINE: Duration = Duration::from_secs(30);

/// Resource limits and supervision intervals for a screening run.
///
/// One config is shared by the admission controller, the worker pool and the
/// watchdogs spawned for each job. The `deadline` field is optional: sweeps
/// over large neighbour collections set it, target sweeps leave it unset.
#[derive(Debug, Clone)]
pub struct ResourceConfig {
    /// Resident-memory ceiling per job, in bytes. The watchdog kills any
    /// job whose RSS exceeds this.
    pub job_memory_ceiling: u64,
    /// Free host memory that must be available before a job is admitted.
    pub min_free_memory: u64,
    /// How often the admission controller re-checks available memory.
    pub admission_poll_interval: Duration,
    /// How long the admission controller waits before aborting the run.
    pub admission_timeout: Duration,
    /// How often a watchdog samples its process's resident set size.
    pub watchdog_poll_interval: Duration,
    /// Number of worker threads in the dispatch pool.
    pub workers: usize,
    /// Optional wall-clock deadline per job.
    pub deadline: Option<Duration>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            job_memory_ceiling: DEFAULT_JOB_MEMORY_CEILING,
            min_free_memory: DEFAULT_MIN_FREE_MEMORY,
            admission_poll_interval: DEFAULT_ADMISSION_POLL_INTERVAL,
            admission_timeout: DEFAULT_ADMISSION_TIMEOUT,
            watchdog_poll_interval: DEFAULT_WATCHDOG_POLL_INTERVAL,
            workers: DEFAULT_WORKERS,
            deadline: None,
        }
    }
}

impl ResourceConfig {
    /// Validate the configuration before a run starts.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ScreenError::InvalidParameter {
                parameter: "workers".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.job_memory_ceiling == 0 {
            return Err(ScreenError::InvalidParameter {
                parameter: "job-memory-ceiling".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.admission_poll_interval.is_zero() {
            return Err(ScreenError::InvalidParameter {
                parameter: "admission-poll-interval".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Returns a copy of this config with the per-job deadline set.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}
