//! Common CLI options shared across commands.
//!
//! This module provides shared argument structures that can be composed into
//! command structs using `#[command(flatten)]`.

use std::time::Duration;

use clap::Args;

use ampliscreen_lib::config::ResourceConfig;

/// Memory, concurrency and deadline options for a screening run.
#[derive(Debug, Clone, Args)]
pub struct ResourceOptions {
    /// Resident-memory ceiling per job in bytes; jobs above it are killed
    #[arg(long = "max-job-memory", default_value = "16000000000")]
    pub max_job_memory: u64,

    /// Free host memory in bytes required before a job may start
    #[arg(long = "min-free-memory", default_value = "5000000000")]
    pub min_free_memory: u64,

    /// Seconds between free-memory checks while waiting for admission
    #[arg(long = "check-interval", default_value = "2")]
    pub check_interval: u64,

    /// Seconds to wait for free memory before aborting the whole run
    #[arg(long = "admission-timeout", default_value = "21600")]
    pub admission_timeout: u64,

    /// Number of concurrent worker threads
    #[arg(short = 'w', long = "workers", default_value = "6")]
    pub workers: usize,

    /// Per-job deadline in seconds for neighbour sweeps; 0 disables it
    #[arg(long = "neighbour-deadline", default_value = "30")]
    pub neighbour_deadline: u64,
}

impl ResourceOptions {
    /// Translate the CLI options into a [`ResourceConfig`].
    #[must_use]
    pub fn to_config(&self) -> ResourceConfig {
        let deadline = (self.neighbour_deadline > 0)
            .then(|| Duration::from_secs(self.neighbour_deadline));
        ResourceConfig {
            job_memory_ceiling: self.max_job_memory,
            min_free_memory: self.min_free_memory,
            admission_poll_interval: Duration::from_secs(self.check_interval),
            admission_timeout: Duration::from_secs(self.admission_timeout),
            workers: self.workers,
            deadline,
            ..ResourceConfig::default()
        }
    }
}

/// Options naming the external search tool.
#[derive(Debug, Clone, Args)]
pub struct SearchOptions {
    /// External search executable invoked per (assembly, mismatch) job
    #[arg(long = "search-program", default_value = "search")]
    pub program: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ResourceOptions {
        ResourceOptions {
            max_job_memory: 1_000,
            min_free_memory: 500,
            check_interval: 1,
            admission_timeout: 60,
            workers: 4,
            neighbour_deadline: 30,
        }
    }

    #[test]
    fn test_to_config() {
        let config = options().to_config();
        assert_eq!(config.job_memory_ceiling, 1_000);
        assert_eq!(config.workers, 4);
        assert_eq!(config.deadline, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_zero_deadline_disables_it() {
        let mut opts = options();
        opts.neighbour_deadline = 0;
        assert_eq!(opts.to_config().deadline, None);
    }
}
