//! Bounded worker pool for external search processes.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐    ┌──────────────────┐    ┌───────────────┐
//! │ Job queue │───>│ Worker threads   │───>│ Outcome chan  │
//! │ (channel) │    │ (N, fixed)       │    │ (collector)   │
//! └───────────┘    └──────────────────┘    └───────────────┘
//!                        │
//!                        ▼
//!            admit → spawn search → feed stdin
//!            watchdog + deadline → reap → outcome
//! ```
//!
//! Each worker takes the next [`JobSpec`] off the queue, waits for the
//! admission controller, spawns the external search process, streams the
//! assembly's sequence file to its stdin and resolves a [`JobOutcome`].
//! Job-local failures (non-zero exit, deadline kill, watchdog kill,
//! unreadable assembly) become outcome statuses and never abort the batch.
//! The only fatal path out of a worker is an admission timeout.
//!
//! A worker slot is reused only after the subprocess has been reaped and
//! its watchdog and I/O threads joined, so no resources leak across a long
//! sweep.

use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;
use log::{info, warn};
use parking_lot::Mutex;

use crate::config::ResourceConfig;
use crate::errors::Result;
use crate::job::{JobOutcome, JobSpec, JobStatus, parse_match_records};
use crate::memory::{AdmissionController, MemoryProbe, ProcMemoryProbe};
use crate::progress::ProgressTracker;
use crate::watchdog::{MemoryWatchdog, WatchdogVerdict};

/// How often a worker re-checks a running child for exit or deadline.
const REAP_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs batches of search jobs under a fixed concurrency bound.
pub struct WorkerPool {
    program: String,
    config: ResourceConfig,
    admission: Arc<AdmissionController>,
    probe: Arc<dyn MemoryProbe>,
}

impl WorkerPool {
    /// Create a pool running `program` as the external search tool.
    ///
    /// # Errors
    /// Fails on an invalid [`ResourceConfig`].
    pub fn new(program: &str, config: ResourceConfig) -> Result<Self> {
        Self::with_probe(program, config, Arc::new(ProcMemoryProbe))
    }

    /// Create a pool with an explicit memory probe (test seam).
    pub fn with_probe(
        program: &str,
        config: ResourceConfig,
        probe: Arc<dyn MemoryProbe>,
    ) -> Result<Self> {
        config.validate()?;
        let admission = Arc::new(AdmissionController::with_probe(&config, Arc::clone(&probe)));
        Ok(Self { program: program.to_string(), config, admission, probe })
    }

    /// Execute every job and return one outcome per input job.
    ///
    /// Outcome order is completion order, not input order; callers key
    /// outcomes by (assembly, mismatch level). All specs are validated
    /// before any subprocess is spawned.
    ///
    /// # Errors
    /// An invalid spec, or a fatal admission timeout. Job-local failures
    /// are reported inside the outcomes instead.
    pub fn run(&self, jobs: Vec<JobSpec>) -> Result<Vec<JobOutcome>> {
        for job in &jobs {
            job.validate()?;
        }
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let total = jobs.len();
        let workers = self.config.workers.min(total);
        let (job_tx, job_rx) = unbounded::<JobSpec>();
        let (outcome_tx, outcome_rx) = unbounded::<Result<JobOutcome>>();
        for job in jobs {
            // Receiver is alive until all workers finish; send cannot fail.
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let context = Arc::new(WorkerContext {
            program: self.program.clone(),
            config: self.config.clone(),
            admission: Arc::clone(&self.admission),
            probe: Arc::clone(&self.probe),
            aborted: AtomicBool::new(false),
            tracker: ProgressTracker::new("Resolved jobs").with_interval(10),
        });

        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let job_rx = job_rx.clone();
                let outcome_tx = outcome_tx.clone();
                let context = Arc::clone(&context);
                thread::spawn(move || {
                    while let Ok(spec) = job_rx.recv() {
                        if context.aborted.load(Ordering::Relaxed) {
                            // A fatal error is already on its way out;
                            // drain the queue without spawning more work.
                            continue;
                        }
                        let result = context.execute(spec);
                        if result.is_err() {
                            context.aborted.store(true, Ordering::Relaxed);
                        }
                        context.tracker.log_if_needed(1);
                        let _ = outcome_tx.send(result);
                    }
                })
            })
            .collect();
        drop(outcome_tx);

        let mut outcomes = Vec::with_capacity(total);
        let mut fatal = None;
        for result in outcome_rx {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => fatal = Some(e),
            }
        }
        for handle in handles {
            // Workers have no panicking paths; a panic here is a bug.
            let _ = handle.join();
        }
        context.tracker.log_final();

        match fatal {
            Some(e) => Err(e),
            None => Ok(outcomes),
        }
    }
}

/// State shared by all worker threads for one batch.
struct WorkerContext {
    program: String,
    config: ResourceConfig,
    admission: Arc<AdmissionController>,
    probe: Arc<dyn MemoryProbe>,
    aborted: AtomicBool,
    tracker: ProgressTracker,
}

impl WorkerContext {
    /// Resolve one spec into an outcome. `Err` only on fatal conditions.
    fn execute(&self, spec: JobSpec) -> Result<JobOutcome> {
        let required = self.config.min_free_memory.max(spec.memory_ceiling);
        self.admission.admit(required)?;

        let assembly = spec.assembly.name.clone();
        let contents = match std::fs::read(&spec.assembly.path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("[{assembly}] could not read assembly file: {e}");
                return Ok(JobOutcome { spec, records: Vec::new(), status: JobStatus::Failed });
            }
        };

        let mut child = match self.spawn_search(&spec) {
            Ok(child) => child,
            Err(e) => {
                warn!("[{assembly}] could not start '{}': {e}", self.program);
                return Ok(JobOutcome { spec, records: Vec::new(), status: JobStatus::Failed });
            }
        };

        let pid = child.id();
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let child = Arc::new(Mutex::new(child));

        let watchdog = MemoryWatchdog::spawn(
            Arc::clone(&child),
            pid,
            spec.memory_ceiling,
            self.config.watchdog_poll_interval,
            Arc::clone(&self.probe),
        );

        // Feed the assembly on a separate thread; a full pipe would
        // otherwise deadlock against our stdout read.
        let stdin_handle = thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                // A killed child closes the pipe mid-write; that is the
                // child's failure to report, not ours.
                let _ = stdin.write_all(&contents);
            }
        });
        let stdout_handle = thread::spawn(move || read_to_string_lossy(stdout));
        let stderr_handle = thread::spawn(move || read_to_string_lossy(stderr));

        let (exit_status, timed_out) = wait_with_deadline(&child, spec.deadline);

        let verdict = watchdog.join();
        let _ = stdin_handle.join();
        let output = stdout_handle.join().unwrap_or_default();
        let errors = stderr_handle.join().unwrap_or_default();

        let status = if timed_out {
            warn!("[{assembly}] timed out after {:?}", spec.deadline.unwrap_or_default());
            JobStatus::TimedOut
        } else if matches!(verdict, WatchdogVerdict::Killed { .. }) {
            JobStatus::MemoryKilled
        } else {
            match exit_status {
                Some(true) if errors.trim().is_empty() => JobStatus::Success,
                Some(true) => {
                    warn!("[{assembly}] search reported errors: {}", errors.trim());
                    JobStatus::Failed
                }
                _ => {
                    warn!("[{assembly}] search failed: {}", errors.trim());
                    JobStatus::Failed
                }
            }
        };

        let records = if status == JobStatus::Success {
            let records = parse_match_records(&output, &assembly);
            info!("[{assembly}] success with mismatch {}, {} records", spec.mismatches, records.len());
            records
        } else {
            Vec::new()
        };

        Ok(JobOutcome { spec, records, status })
    }

    fn spawn_search(&self, spec: &JobSpec) -> std::io::Result<Child> {
        Command::new(&self.program)
            .arg("--forward")
            .arg(&spec.forward)
            .arg("--reverse")
            .arg(&spec.reverse)
            .arg("--max-mismatch")
            .arg(spec.mismatches.to_string())
            .arg("--bed")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
    }
}

/// Wait for the child to exit, killing it if the deadline expires.
///
/// Returns the exit success flag (None if it could not be observed) and
/// whether the deadline fired.
fn wait_with_deadline(child: &Mutex<Child>, deadline: Option<Duration>) -> (Option<bool>, bool) {
    let start = Instant::now();
    loop {
        match child.lock().try_wait() {
            Ok(Some(status)) => return (Some(status.success()), false),
            Err(_) => return (None, false),
            Ok(None) => {}
        }
        if deadline.is_some_and(|d| start.elapsed() >= d) {
            let mut guard = child.lock();
            let _ = guard.kill();
            let _ = guard.wait();
            return (None, true);
        }
        thread::sleep(REAP_POLL_INTERVAL);
    }
}

fn read_to_string_lossy<R: Read>(source: Option<R>) -> String {
    let Some(mut source) = source else { return String::new() };
    let mut buf = Vec::new();
    let _ = source.read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{AssemblyId, MAX_MISMATCHES};
    use std::path::Path;

    fn spec(mismatches: u32) -> JobSpec {
        JobSpec {
            assembly: AssemblyId::from_path(Path::new("/nonexistent/a.fasta")),
            forward: "ACGT".to_string(),
            reverse: "TTAA".to_string(),
            mismatches,
            memory_ceiling: 1_000,
            deadline: None,
        }
    }

    #[test]
    fn test_invalid_spec_fails_before_spawn() {
        let pool = WorkerPool::new("definitely-not-a-real-tool", ResourceConfig::default()).unwrap();
        let err = pool.run(vec![spec(MAX_MISMATCHES + 1)]).unwrap_err();
        assert!(format!("{err}").contains("mismatches"));
    }

    #[test]
    fn test_empty_batch() {
        let pool = WorkerPool::new("search", ResourceConfig::default()).unwrap();
        assert!(pool.run(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ResourceConfig { workers: 0, ..ResourceConfig::default() };
        assert!(WorkerPool::new("search", config).is_err());
    }

    #[test]
    fn test_unreadable_assembly_is_job_local_failure() {
        // The memory ceiling is tiny so admission passes on any host.
        let config = ResourceConfig {
            min_free_memory: 1,
            ..ResourceConfig::default()
        };
        let pool = WorkerPool::new("definitely-not-a-real-tool", config).unwrap();
        let outcomes = pool.run(vec![spec(0)]).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, JobStatus::Failed);
        assert!(outcomes[0].records.is_empty());
    }
}
