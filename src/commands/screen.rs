//! Screen a primer pair against target and neighbour assembly collections.
//!
//! Runs the full in-silico PCR screen: a mismatch sweep over the targets
//! (which must amplify at the expected length) and over the neighbours
//! (which must not), then interprets both sweeps into a sensitivity and a
//! specificity verdict. A side that cannot be tested at all — search tool
//! missing, assembly directory empty — is reported as NA rather than
//! silently passed or failed.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use log::{info, warn};

use ampliscreen_lib::dispatch::WorkerPool;
use ampliscreen_lib::job::{AssemblyCollection, CollectionRole};
use ampliscreen_lib::primers::{self, PrimerPair};
use ampliscreen_lib::report::{CheckReport, ScreenReport};
use ampliscreen_lib::sweep::{SweepOrchestrator, SweepResult};
use ampliscreen_lib::validation::tool_on_path;
use ampliscreen_lib::verdict::{interpret_sensitivity, interpret_specificity};

use crate::commands::command::Command;
use crate::commands::common::{ResourceOptions, SearchOptions};

/// Screen a primer pair for sensitivity and specificity.
#[derive(Debug, Parser)]
#[command(
    name = "screen",
    about = "Screen a primer pair against target and neighbour assemblies",
    long_about = r#"
Screen a candidate primer pair by running the external search tool over every
assembly in the target and neighbour collections at increasing mismatch
tolerance (targets m0-m3, neighbours m0-m4).

Sensitivity passes when every target assembly yields exactly one amplicon of
the expected length at every level; failures at m3 alone are tolerated.
Specificity passes when no neighbour assembly yields an amplicon of the
expected length at any level.

The expected amplicon length is taken from the first target hit at m0 unless
--amplicon-length is given.

Example usage:
  ampliscreen screen -p primers.txt -t FUR.target -n FUR.neighbour
  ampliscreen screen --forward ACGT... --reverse TTGA... -t targets/ -n neighbours/ -o summary.tsv
"#
)]
pub struct Screen {
    /// Primer file with PRIMER_LEFT/PRIMER_RIGHT headers
    #[arg(short = 'p', long = "primers", conflicts_with_all = ["forward", "reverse"])]
    pub primer_file: Option<PathBuf>,

    /// Forward primer sequence (alternative to --primers)
    #[arg(long = "forward", requires = "reverse")]
    pub forward: Option<String>,

    /// Reverse primer sequence (alternative to --primers)
    #[arg(long = "reverse", requires = "forward")]
    pub reverse: Option<String>,

    /// Directory of target assemblies (must amplify)
    #[arg(short = 't', long = "targets")]
    pub targets: PathBuf,

    /// Directory of neighbour assemblies (must not amplify)
    #[arg(short = 'n', long = "neighbours")]
    pub neighbours: PathBuf,

    /// Expected amplicon length; derived from the target m0 hits if omitted
    #[arg(long = "amplicon-length")]
    pub amplicon_length: Option<usize>,

    /// Optional TSV file for the two summary rows
    #[arg(short = 'o', long = "summary")]
    pub summary: Option<PathBuf>,

    /// Resource limits and supervision intervals
    #[command(flatten)]
    pub resources: ResourceOptions,

    /// External search tool
    #[command(flatten)]
    pub search: SearchOptions,
}

impl Command for Screen {
    fn execute(&self) -> Result<()> {
        let primers = self.primer_pair()?;
        info!("Screening primer pair {} / {}", primers.forward, primers.reverse);

        if !tool_on_path(&self.search.program) {
            warn!("Search tool '{}' not found on PATH; nothing can be tested", self.search.program);
            let reason = format!("search tool '{}' not found on PATH", self.search.program);
            let report = ScreenReport {
                primers,
                expected_len: self.amplicon_length,
                sensitivity: CheckReport::NotTested { reason: reason.clone() },
                specificity: CheckReport::NotTested { reason },
            };
            return self.finish(&report);
        }

        let config = self.resources.to_config();
        let pool = WorkerPool::new(&self.search.program, config.clone())?;
        let orchestrator = SweepOrchestrator::new(&pool, config);

        let target_sweep = match AssemblyCollection::from_dir(CollectionRole::Target, &self.targets)
        {
            Ok(collection) => Some((orchestrator.sweep(&primers, &collection)?, collection)),
            Err(e) => {
                warn!("Skipping sensitivity check: {e}");
                None
            }
        };

        let expected_len = self.amplicon_length.or_else(|| {
            target_sweep.as_ref().and_then(|(sweep, _)| primers::expected_amplicon_length(sweep))
        });
        if expected_len.is_none() {
            warn!("Expected amplicon length could not be determined (no target hits at m0)");
        }

        let sensitivity = match &target_sweep {
            Some((sweep, collection)) => {
                sensitivity_report(sweep, expected_len, collection.count())?
            }
            None => CheckReport::NotTested {
                reason: format!("no assembly files found in '{}'", self.targets.display()),
            },
        };

        let specificity = match AssemblyCollection::from_dir(
            CollectionRole::Neighbour,
            &self.neighbours,
        ) {
            Ok(collection) => match expected_len {
                Some(len) => {
                    let sweep = orchestrator.sweep(&primers, &collection)?;
                    let verdict = interpret_specificity(&sweep, len, collection.count())?;
                    CheckReport::tested("specificity", verdict, &sweep, len)
                }
                None => CheckReport::NotTested {
                    reason: "expected amplicon length could not be determined".to_string(),
                },
            },
            Err(e) => {
                warn!("Skipping specificity check: {e}");
                CheckReport::NotTested {
                    reason: format!("no assembly files found in '{}'", self.neighbours.display()),
                }
            }
        };

        let report = ScreenReport { primers, expected_len, sensitivity, specificity };
        self.finish(&report)
    }
}

impl Screen {
    fn primer_pair(&self) -> Result<PrimerPair> {
        match (&self.primer_file, &self.forward, &self.reverse) {
            (Some(path), _, _) => Ok(primers::read_primer_file(path)?),
            (None, Some(forward), Some(reverse)) => Ok(PrimerPair::new(forward, reverse)?),
            _ => bail!("either --primers or both --forward and --reverse are required"),
        }
    }

    fn finish(&self, report: &ScreenReport) -> Result<()> {
        print!("{}", report.render_text());
        if let Some(path) = &self.summary {
            report.write_summary(path)?;
            info!("Wrote summary to {}", path.display());
        }
        Ok(())
    }
}

/// Interpret the sensitivity side. An unknown expected length means nothing
/// amplified at m0, which the engine reports as a failure at every level;
/// length zero is used as the sentinel no record can match.
fn sensitivity_report(
    sweep: &SweepResult,
    expected_len: Option<usize>,
    count: usize,
) -> Result<CheckReport> {
    let len = expected_len.unwrap_or(0);
    let verdict = interpret_sensitivity(sweep, len, count)?;
    Ok(CheckReport::tested("sensitivity", verdict, sweep, len))
}
