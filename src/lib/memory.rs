//! Host memory probing and job admission control.
//!
//! Before a search job is handed to a worker, the admission controller waits
//! until the host reports enough available memory. This is a deliberate
//! spin-wait with a hard timeout rather than a queue: batches are small
//! (tens to low hundreds of jobs) and jobs are short-lived, so first-come
//! polling order is sufficient.
//!
//! On Linux both signals come from `/proc`: `MemAvailable` in
//! `/proc/meminfo` for the host, `VmRSS` in `/proc/<pid>/status` for a
//! single process. The parsers are split out as pure functions over the
//! file contents so they can be exercised on fixtures.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;

use crate::config::ResourceConfig;
use crate::errors::{Result, ScreenError};

/// Source of host- and process-level memory readings.
///
/// The dispatch pool and the watchdogs only see this trait, so tests can
/// substitute a scripted probe without touching `/proc`.
pub trait MemoryProbe: Send + Sync {
    /// Memory currently available on the host, in bytes.
    fn available_bytes(&self) -> Result<u64>;

    /// Resident set size of `pid` in bytes, or `None` once the process is
    /// gone. A probe error is reported as `None`: a process disappearing
    /// between polls is expected, not exceptional.
    fn process_rss_bytes(&self, pid: u32) -> Option<u64>;
}

/// `/proc`-backed probe used outside of tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcMemoryProbe;

impl MemoryProbe for ProcMemoryProbe {
    fn available_bytes(&self) -> Result<u64> {
        let contents =
            fs::read_to_string("/proc/meminfo").map_err(|e| ScreenError::InvalidFileFormat {
                file_type: "meminfo".to_string(),
                path: "/proc/meminfo".to_string(),
                reason: e.to_string(),
            })?;
        parse_meminfo_available(&contents)
    }

    fn process_rss_bytes(&self, pid: u32) -> Option<u64> {
        let path = format!("/proc/{pid}/status");
        let contents = fs::read_to_string(Path::new(&path)).ok()?;
        parse_status_rss(&contents)
    }
}

/// Extract `MemAvailable` from `/proc/meminfo` contents, in bytes.
pub fn parse_meminfo_available(contents: &str) -> Result<u64> {
    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix("MemAvailable:") {
            let value = rest.split_whitespace().next().ok_or_else(|| {
                ScreenError::InvalidFileFormat {
                    file_type: "meminfo".to_string(),
                    path: "/proc/meminfo".to_string(),
                    reason: "MemAvailable value missing".to_string(),
                }
            })?;
            let kb: u64 = value.parse().map_err(|_| ScreenError::InvalidFileFormat {
                file_type: "meminfo".to_string(),
                path: "/proc/meminfo".to_string(),
                reason: format!("unparseable MemAvailable value '{value}'"),
            })?;
            return Ok(kb * 1024);
        }
    }
    Err(ScreenError::InvalidFileFormat {
        file_type: "meminfo".to_string(),
        path: "/proc/meminfo".to_string(),
        reason: "MemAvailable field missing".to_string(),
    })
}

/// Extract `VmRSS` from `/proc/<pid>/status` contents, in bytes.
///
/// Returns `None` when the field is absent (kernel threads) or malformed.
#[must_use]
pub fn parse_status_rss(contents: &str) -> Option<u64> {
    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            let kb: u64 = rest.split_whitespace().next()?.parse().ok()?;
            return Some(kb * 1024);
        }
    }
    None
}

/// Gates job admission on available host memory.
///
/// `admit` blocks the submitting worker until the probe reports at least the
/// requested number of free bytes, then returns. After the configured
/// timeout (default 6 hours) it fails with
/// [`ScreenError::AdmissionTimeout`], which aborts the whole run: partial
/// execution under memory pressure risks the kernel OOM-killing unrelated
/// processes.
pub struct AdmissionController {
    probe: Arc<dyn MemoryProbe>,
    poll_interval: Duration,
    timeout: Duration,
}

impl AdmissionController {
    /// Create a controller reading from `/proc`.
    #[must_use]
    pub fn new(config: &ResourceConfig) -> Self {
        Self::with_probe(config, Arc::new(ProcMemoryProbe))
    }

    /// Create a controller with an explicit probe (test seam).
    #[must_use]
    pub fn with_probe(config: &ResourceConfig, probe: Arc<dyn MemoryProbe>) -> Self {
        Self {
            probe,
            poll_interval: config.admission_poll_interval,
            timeout: config.admission_timeout,
        }
    }

    /// Block until at least `required_bytes` of host memory are available.
    ///
    /// # Errors
    /// [`ScreenError::AdmissionTimeout`] once the wait exceeds the ceiling.
    pub fn admit(&self, required_bytes: u64) -> Result<()> {
        let start = Instant::now();
        loop {
            let available = self.probe.available_bytes()?;
            if available >= required_bytes {
                return Ok(());
            }
            if start.elapsed() > self.timeout {
                return Err(ScreenError::AdmissionTimeout {
                    required_bytes,
                    waited: start.elapsed(),
                });
            }
            info!(
                "Available memory {available} < {required_bytes}, waiting {}s",
                self.poll_interval.as_secs()
            );
            std::thread::sleep(self.poll_interval);
        }
    }
}
