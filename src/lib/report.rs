//! Stable report shapes for downstream rendering.
//!
//! The summary row shape {check, outcome, assemblies, failing levels} is
//! rendered verbatim into human-readable reports downstream and must stay
//! stable. A check that could not be run at all (tool missing, no files
//! found) is reported as `NA`, which is distinct from a tested-and-failed
//! `FAILED`.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use itertools::Itertools;
use serde::Serialize;

use crate::job::JobStatus;
use crate::primers::PrimerPair;
use crate::sweep::SweepResult;
use crate::verdict::Verdict;

/// One summary row of the final report.
#[derive(Debug, Clone, Serialize)]
pub struct VerdictSummary {
    /// "sensitivity" or "specificity".
    pub check: String,
    /// "PASSED", "FAILED" or "NA".
    pub outcome: String,
    /// Number of assemblies the check covered.
    pub assemblies: usize,
    /// Comma-separated failing level labels, empty when none.
    pub failing_levels: String,
}

/// Per-level appendix line.
#[derive(Debug, Clone, Serialize)]
pub struct LevelDetail {
    /// "sensitivity" or "specificity".
    pub check: String,
    /// Level label, "m0".."m4".
    pub level: String,
    /// Jobs attempted at this level.
    pub jobs: usize,
    /// Outcomes with exactly one record of the expected length.
    pub correct_size_hits: usize,
    /// Jobs that did not finish successfully.
    pub failed_jobs: usize,
}

/// Result of one check, as rendered into the report.
#[derive(Debug, Clone)]
pub enum CheckReport {
    /// The check ran; verdict plus per-level appendix detail.
    Tested {
        /// The engine's verdict.
        verdict: Verdict,
        /// Appendix lines, one per mismatch level.
        detail: Vec<LevelDetail>,
    },
    /// The check could not be run at all.
    NotTested {
        /// Why (tool missing, empty directory, ...).
        reason: String,
    },
}

impl CheckReport {
    /// Build a tested report, deriving the appendix from the raw sweep.
    #[must_use]
    pub fn tested(check: &str, verdict: Verdict, sweep: &SweepResult, expected_len: usize) -> Self {
        let detail = sweep
            .levels()
            .map(|(level, outcomes)| LevelDetail {
                check: check.to_string(),
                level: format!("m{level}"),
                jobs: outcomes.len(),
                correct_size_hits: outcomes
                    .iter()
                    .filter(|o| o.is_correct_size_hit(expected_len))
                    .count(),
                failed_jobs: outcomes
                    .iter()
                    .filter(|o| o.status != JobStatus::Success)
                    .count(),
            })
            .collect();
        Self::Tested { verdict, detail }
    }

    /// Build the stable summary row for this check.
    #[must_use]
    pub fn summary(&self, check: &str) -> VerdictSummary {
        match self {
            Self::Tested { verdict, .. } => VerdictSummary {
                check: check.to_string(),
                outcome: verdict.outcome.label().to_string(),
                assemblies: verdict.assemblies,
                failing_levels: verdict.failing_levels.iter().join(", "),
            },
            Self::NotTested { .. } => VerdictSummary {
                check: check.to_string(),
                outcome: "NA".to_string(),
                assemblies: 0,
                failing_levels: String::new(),
            },
        }
    }
}

/// The full report for one primer pair.
#[derive(Debug, Clone)]
pub struct ScreenReport {
    /// The primer pair that was screened.
    pub primers: PrimerPair,
    /// Expected amplicon length the checks compared against, if known.
    pub expected_len: Option<usize>,
    /// Sensitivity (target collection) check.
    pub sensitivity: CheckReport,
    /// Specificity (neighbour collection) check.
    pub specificity: CheckReport,
}

impl ScreenReport {
    /// The two stable summary rows.
    #[must_use]
    pub fn summary_rows(&self) -> Vec<VerdictSummary> {
        vec![self.sensitivity.summary("sensitivity"), self.specificity.summary("specificity")]
    }

    /// Render the human-readable report block.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Primer pair:");
        let _ = writeln!(out, "  forward:  {}", self.primers.forward);
        let _ = writeln!(out, "  reverse:  {}", self.primers.reverse);
        if let Some(internal) = &self.primers.internal {
            let _ = writeln!(out, "  internal: {internal}");
        }
        match self.expected_len {
            Some(len) => {
                let _ = writeln!(out, "Expected amplicon length: {len}");
            }
            None => {
                let _ = writeln!(out, "Expected amplicon length: unknown");
            }
        }
        let _ = writeln!(out);
        render_check(&mut out, "Sensitivity", &self.sensitivity);
        render_check(&mut out, "Specificity", &self.specificity);
        out
    }

    /// Write the summary rows as TSV.
    pub fn write_summary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        DelimFile::default()
            .write_tsv(&path_ref, self.summary_rows())
            .with_context(|| format!("Failed to write summary: {}", path_ref.display()))
    }
}

fn render_check(out: &mut String, name: &str, report: &CheckReport) {
    match report {
        CheckReport::Tested { verdict, detail } => {
            let failing = if verdict.failing_levels.is_empty() {
                "none".to_string()
            } else {
                verdict.failing_levels.iter().join(", ")
            };
            let _ = writeln!(
                out,
                "{name}: {} ({} assemblies, failing levels: {failing})",
                verdict.outcome.label(),
                verdict.assemblies
            );
            if let Some(note) = &verdict.note {
                let _ = writeln!(out, "  note: {note}");
            }
            for line in detail {
                let _ = writeln!(
                    out,
                    "  {}: {}/{} correct-size hits, {} job failures",
                    line.level, line.correct_size_hits, line.jobs, line.failed_jobs
                );
            }
        }
        CheckReport::NotTested { reason } => {
            let _ = writeln!(out, "{name}: NA ({reason})");
        }
    }
    let _ = writeln!(out);
}
