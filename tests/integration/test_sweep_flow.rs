//! End-to-end sweep + verdict workflows against stub search tools.

use tempfile::TempDir;

use ampliscreen_lib::dispatch::WorkerPool;
use ampliscreen_lib::job::{AssemblyCollection, CollectionRole};
use ampliscreen_lib::primers::{PrimerPair, expected_amplicon_length};
use ampliscreen_lib::report::{CheckReport, ScreenReport};
use ampliscreen_lib::sweep::SweepOrchestrator;
use ampliscreen_lib::verdict::{TestOutcome, interpret_sensitivity, interpret_specificity};

use crate::helpers::{assembly_dir, bed_line, fast_config, level_gated_tool, silent_tool};

#[test]
fn test_target_sweep_with_level_three_dropout() {
    let tmp = TempDir::new().unwrap();
    // Amplification holds through m2 and drops out at m3.
    let tool = level_gated_tool(tmp.path(), 2);
    let line = bed_line(19);
    let dir = assembly_dir(
        tmp.path(),
        "targets",
        &[("a.fasta", line.as_str()), ("b.fasta", line.as_str())],
    );

    let primers = PrimerPair::new("ACGTACGT", "TTGGCCAA").unwrap();
    let collection = AssemblyCollection::from_dir(CollectionRole::Target, &dir).unwrap();
    let config = fast_config();
    let pool = WorkerPool::new(tool.to_str().unwrap(), config.clone()).unwrap();
    let sweep = SweepOrchestrator::new(&pool, config).sweep(&primers, &collection).unwrap();

    // Every conventional target level is attempted, including the empty one.
    for level in [0, 1, 2, 3] {
        assert!(sweep.attempted(level));
        assert_eq!(sweep.level(level).unwrap().len(), 2);
    }

    assert_eq!(expected_amplicon_length(&sweep), Some(19));

    let verdict = interpret_sensitivity(&sweep, 19, collection.count()).unwrap();
    assert_eq!(verdict.outcome, TestOutcome::Passed);
    assert_eq!(verdict.failing_levels, vec!["m3".to_string()]);
    assert_eq!(verdict.assemblies, 2);
}

#[test]
fn test_neighbour_sweep_with_no_amplification_passes() {
    let tmp = TempDir::new().unwrap();
    let tool = silent_tool(tmp.path());
    let dir = assembly_dir(
        tmp.path(),
        "neighbours",
        &[
            ("n1.fasta", ">n1\nACGT\n"),
            ("n2.fasta", ">n2\nACGT\n"),
            ("n3.fasta", ">n3\nACGT\n"),
            ("n4.fasta", ">n4\nACGT\n"),
        ],
    );

    let primers = PrimerPair::new("ACGTACGT", "TTGGCCAA").unwrap();
    let collection = AssemblyCollection::from_dir(CollectionRole::Neighbour, &dir).unwrap();
    let config = fast_config();
    let pool = WorkerPool::new(tool.to_str().unwrap(), config.clone()).unwrap();
    let sweep = SweepOrchestrator::new(&pool, config).sweep(&primers, &collection).unwrap();

    // Neighbour sweeps go one level deeper than target sweeps.
    for level in [0, 1, 2, 3, 4] {
        assert!(sweep.attempted(level));
    }

    let verdict = interpret_specificity(&sweep, 19, collection.count()).unwrap();
    assert_eq!(verdict.outcome, TestOutcome::Passed);
    assert!(verdict.failing_levels.is_empty());
    assert_eq!(verdict.assemblies, 4);
}

#[test]
fn test_neighbour_amplification_fails_specificity() {
    let tmp = TempDir::new().unwrap();
    // Gate at m4 so every neighbour level reports the off-target amplicon.
    let tool = level_gated_tool(tmp.path(), 4);
    let line = bed_line(19);
    let dir = assembly_dir(tmp.path(), "neighbours", &[("n1.fasta", line.as_str())]);

    let primers = PrimerPair::new("ACGTACGT", "TTGGCCAA").unwrap();
    let collection = AssemblyCollection::from_dir(CollectionRole::Neighbour, &dir).unwrap();
    let config = fast_config();
    let pool = WorkerPool::new(tool.to_str().unwrap(), config.clone()).unwrap();
    let sweep = SweepOrchestrator::new(&pool, config).sweep(&primers, &collection).unwrap();

    let verdict = interpret_specificity(&sweep, 19, collection.count()).unwrap();
    assert_eq!(verdict.outcome, TestOutcome::Failed);
    assert_eq!(
        verdict.failing_levels,
        vec!["m0", "m1", "m2", "m3", "m4"].iter().map(ToString::to_string).collect::<Vec<_>>()
    );
}

#[test]
fn test_full_screen_report_from_both_sweeps() {
    let tmp = TempDir::new().unwrap();
    let target_tool = level_gated_tool(tmp.path(), 3);
    let line = bed_line(19);
    let target_dir = assembly_dir(
        tmp.path(),
        "targets",
        &[("t1.fasta", line.as_str()), ("t2.fasta", line.as_str())],
    );
    let neighbour_dir = assembly_dir(
        tmp.path(),
        "neighbours",
        &[("n1.fasta", ">n1\nACGT\n"), ("n2.fasta", ">n2\nACGT\n")],
    );

    let primers = PrimerPair::new("ACGTACGT", "TTGGCCAA").unwrap();
    let config = fast_config();

    let target_collection =
        AssemblyCollection::from_dir(CollectionRole::Target, &target_dir).unwrap();
    let target_pool = WorkerPool::new(target_tool.to_str().unwrap(), config.clone()).unwrap();
    let target_sweep = SweepOrchestrator::new(&target_pool, config.clone())
        .sweep(&primers, &target_collection)
        .unwrap();

    let neighbour_tool = silent_tool(tmp.path());
    let neighbour_collection =
        AssemblyCollection::from_dir(CollectionRole::Neighbour, &neighbour_dir).unwrap();
    let neighbour_pool =
        WorkerPool::new(neighbour_tool.to_str().unwrap(), config.clone()).unwrap();
    let neighbour_sweep = SweepOrchestrator::new(&neighbour_pool, config)
        .sweep(&primers, &neighbour_collection)
        .unwrap();

    let len = expected_amplicon_length(&target_sweep).unwrap();
    let sensitivity = interpret_sensitivity(&target_sweep, len, target_collection.count()).unwrap();
    let specificity =
        interpret_specificity(&neighbour_sweep, len, neighbour_collection.count()).unwrap();

    let report = ScreenReport {
        primers,
        expected_len: Some(len),
        sensitivity: CheckReport::tested("sensitivity", sensitivity, &target_sweep, len),
        specificity: CheckReport::tested("specificity", specificity, &neighbour_sweep, len),
    };

    let rows = report.summary_rows();
    assert_eq!(rows[0].outcome, "PASSED");
    assert_eq!(rows[0].assemblies, 2);
    assert_eq!(rows[0].failing_levels, "");
    assert_eq!(rows[1].outcome, "PASSED");
    assert_eq!(rows[1].assemblies, 2);

    let text = report.render_text();
    assert!(text.contains("Sensitivity: PASSED"));
    assert!(text.contains("Specificity: PASSED"));
    assert!(text.contains("m0: 2/2 correct-size hits"));

    let summary_path = tmp.path().join("summary.tsv");
    report.write_summary(&summary_path).unwrap();
    assert!(summary_path.exists());
}
