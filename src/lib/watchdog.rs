//! Per-process resident-memory supervision.
//!
//! Every dispatched search job gets a watchdog: a supervisor thread that
//! samples the process's resident set size once per tick and force-kills the
//! process the moment it crosses its byte ceiling. The watchdog holds no
//! state shared with other watchdogs; it reports what happened solely
//! through its join value, which the dispatcher reads when it finalizes the
//! job outcome. A process that exits before or during polling is expected,
//! and the watchdog ends silently in that case.

use std::process::Child;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::warn;
use parking_lot::Mutex;

use crate::memory::MemoryProbe;

/// What the watchdog observed over the process's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogVerdict {
    /// The process crossed its memory ceiling and was killed at `rss` bytes.
    Killed {
        /// Resident set size observed at kill time.
        rss: u64,
    },
    /// The process went away on its own before any breach was seen.
    ProcessExited,
}

/// Supervisor for one search process.
///
/// The handle must be joined when the job outcome is finalized so that no
/// monitor threads outlive their jobs.
pub struct MemoryWatchdog {
    handle: JoinHandle<WatchdogVerdict>,
}

impl MemoryWatchdog {
    /// Start supervising `child` (whose OS pid is `pid`).
    ///
    /// The child handle is shared with the dispatcher behind a mutex; the
    /// watchdog takes the lock only to deliver the kill, never while
    /// sleeping.
    #[must_use]
    pub fn spawn(
        child: Arc<Mutex<Child>>,
        pid: u32,
        threshold_bytes: u64,
        poll_interval: Duration,
        probe: Arc<dyn MemoryProbe>,
    ) -> Self {
        let handle = thread::spawn(move || {
            supervise(&child, pid, threshold_bytes, poll_interval, probe.as_ref())
        });
        Self { handle }
    }

    /// Wait for the watchdog to finish and return what it observed.
    #[must_use]
    pub fn join(self) -> WatchdogVerdict {
        // The supervisor loop has no panicking paths; a panic here is a bug.
        self.handle.join().unwrap_or(WatchdogVerdict::ProcessExited)
    }
}

fn supervise(
    child: &Mutex<Child>,
    pid: u32,
    threshold_bytes: u64,
    poll_interval: Duration,
    probe: &dyn MemoryProbe,
) -> WatchdogVerdict {
    loop {
        let Some(rss) = probe.process_rss_bytes(pid) else {
            return WatchdogVerdict::ProcessExited;
        };
        if rss > threshold_bytes {
            let mut guard = child.lock();
            // The process may have finished between the RSS read and the
            // lock; only kill if it is still running.
            match guard.try_wait() {
                Ok(Some(_)) | Err(_) => return WatchdogVerdict::ProcessExited,
                Ok(None) => {
                    warn!("[KILL] pid {pid} resident set {rss} exceeded ceiling {threshold_bytes}");
                    let _ = guard.kill();
                    return WatchdogVerdict::Killed { rss };
                }
            }
        }
        thread::sleep(poll_interval);
    }
}
