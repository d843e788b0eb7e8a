//! Integration tests for the worker pool against stub search tools.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;

use ampliscreen_lib::dispatch::WorkerPool;
use ampliscreen_lib::errors::ScreenError;
use ampliscreen_lib::job::{AssemblyId, JobSpec, JobStatus};

use crate::helpers::{assembly_dir, bed_line, fast_config, marker_tool};

fn job(path: &Path, mismatches: u32, ceiling: u64, deadline: Option<Duration>) -> JobSpec {
    JobSpec {
        assembly: AssemblyId::from_path(path),
        forward: "ACGTACGT".to_string(),
        reverse: "TTGGCCAA".to_string(),
        mismatches,
        memory_ceiling: ceiling,
        deadline,
    }
}

#[test]
fn test_pool_resolves_every_job() {
    let tmp = TempDir::new().unwrap();
    let tool = marker_tool(tmp.path());
    let line = bed_line(19);
    let assemblies = assembly_dir(
        tmp.path(),
        "assemblies",
        &[("a.fasta", line.as_str()), ("b.fasta", line.as_str()), ("c.fasta", line.as_str())],
    );

    let pool = WorkerPool::new(tool.to_str().unwrap(), fast_config()).unwrap();
    let jobs: Vec<JobSpec> = ["a.fasta", "b.fasta", "c.fasta"]
        .iter()
        .map(|name| job(&assemblies.join(name), 0, 256 * 1024 * 1024, None))
        .collect();
    let outcomes = pool.run(jobs).unwrap();

    assert_eq!(outcomes.len(), 3);
    let by_name: HashMap<String, _> =
        outcomes.into_iter().map(|o| (o.spec.assembly.name.clone(), o)).collect();
    for name in ["a", "b", "c"] {
        let outcome = &by_name[name];
        assert_eq!(outcome.status, JobStatus::Success);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].amplicon_len(), 19);
    }
}

#[test]
fn test_failing_job_does_not_abort_batch() {
    let tmp = TempDir::new().unwrap();
    let tool = marker_tool(tmp.path());
    let line = bed_line(12);
    let assemblies = assembly_dir(
        tmp.path(),
        "assemblies",
        &[("good.fasta", line.as_str()), ("bad.fasta", "FAIL")],
    );

    let pool = WorkerPool::new(tool.to_str().unwrap(), fast_config()).unwrap();
    let outcomes = pool
        .run(vec![
            job(&assemblies.join("good.fasta"), 1, 256 * 1024 * 1024, None),
            job(&assemblies.join("bad.fasta"), 1, 256 * 1024 * 1024, None),
        ])
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    let by_name: HashMap<String, _> =
        outcomes.into_iter().map(|o| (o.spec.assembly.name.clone(), o)).collect();
    assert_eq!(by_name["good"].status, JobStatus::Success);
    assert_eq!(by_name["bad"].status, JobStatus::Failed);
    assert!(by_name["bad"].records.is_empty());
}

#[test]
fn test_stderr_output_alone_fails_the_job() {
    let tmp = TempDir::new().unwrap();
    let tool = crate::helpers::write_tool(
        tmp.path(),
        "noisy-search",
        "cat > /dev/null\necho 'ran out of index space' >&2\nexit 0",
    );
    let line = bed_line(10);
    let assemblies = assembly_dir(tmp.path(), "assemblies", &[("a.fasta", line.as_str())]);

    let pool = WorkerPool::new(tool.to_str().unwrap(), fast_config()).unwrap();
    let outcomes = pool
        .run(vec![job(&assemblies.join("a.fasta"), 0, 256 * 1024 * 1024, None)])
        .unwrap();
    assert_eq!(outcomes[0].status, JobStatus::Failed);
}

#[test]
fn test_deadline_kills_only_the_slow_job() {
    let tmp = TempDir::new().unwrap();
    let tool = marker_tool(tmp.path());
    let line = bed_line(12);
    let assemblies = assembly_dir(
        tmp.path(),
        "assemblies",
        &[("fast.fasta", line.as_str()), ("slow.fasta", "SLEEP")],
    );

    let deadline = Some(Duration::from_millis(300));
    let pool = WorkerPool::new(tool.to_str().unwrap(), fast_config()).unwrap();
    let outcomes = pool
        .run(vec![
            job(&assemblies.join("fast.fasta"), 0, 256 * 1024 * 1024, deadline),
            job(&assemblies.join("slow.fasta"), 0, 256 * 1024 * 1024, deadline),
        ])
        .unwrap();

    let by_name: HashMap<String, _> =
        outcomes.into_iter().map(|o| (o.spec.assembly.name.clone(), o)).collect();
    assert_eq!(by_name["fast"].status, JobStatus::Success);
    assert_eq!(by_name["slow"].status, JobStatus::TimedOut);
    assert!(by_name["slow"].records.is_empty());
}

#[test]
fn test_memory_ceiling_breach_is_memory_killed() {
    let tmp = TempDir::new().unwrap();
    let tool = marker_tool(tmp.path());
    let assemblies = assembly_dir(tmp.path(), "assemblies", &[("hog.fasta", "SLEEP")]);

    // A one-byte ceiling: the watchdog kills the process on its first poll.
    let pool = WorkerPool::new(tool.to_str().unwrap(), fast_config()).unwrap();
    let outcomes =
        pool.run(vec![job(&assemblies.join("hog.fasta"), 0, 1, None)]).unwrap();

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, JobStatus::MemoryKilled);
    assert!(outcomes[0].records.is_empty());
}

#[test]
fn test_admission_timeout_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let tool = marker_tool(tmp.path());
    let line = bed_line(8);
    let assemblies = assembly_dir(tmp.path(), "assemblies", &[("a.fasta", line.as_str())]);

    let mut config = fast_config();
    config.min_free_memory = u64::MAX;
    config.admission_timeout = Duration::from_millis(50);

    let pool = WorkerPool::new(tool.to_str().unwrap(), config).unwrap();
    let err = pool
        .run(vec![job(&assemblies.join("a.fasta"), 0, 1, None)])
        .unwrap_err();
    assert!(matches!(err, ScreenError::AdmissionTimeout { .. }));
}

#[test]
fn test_slots_are_reused_across_a_larger_batch() {
    let tmp = TempDir::new().unwrap();
    let tool = marker_tool(tmp.path());
    let line = bed_line(15);
    let files: Vec<(String, &str)> =
        (0..12).map(|i| (format!("asm{i:02}.fasta"), line.as_str())).collect();
    let file_refs: Vec<(&str, &str)> =
        files.iter().map(|(name, contents)| (name.as_str(), *contents)).collect();
    let assemblies = assembly_dir(tmp.path(), "assemblies", &file_refs);

    let mut config = fast_config();
    config.workers = 2;
    let pool = WorkerPool::new(tool.to_str().unwrap(), config).unwrap();
    let jobs: Vec<JobSpec> = files
        .iter()
        .map(|(name, _)| job(&assemblies.join(name), 2, 256 * 1024 * 1024, None))
        .collect();
    let outcomes = pool.run(jobs).unwrap();

    assert_eq!(outcomes.len(), 12);
    assert!(outcomes.iter().all(|o| o.status == JobStatus::Success));
}
