//! Run a single mismatch sweep over one assembly collection.
//!
//! Useful for inspecting raw search results before committing to a full
//! screen: every (assembly, mismatch level) outcome is printed per level
//! and can be dumped as a TSV of match records.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use fgoxide::io::DelimFile;
use log::info;
use serde::Serialize;

use ampliscreen_lib::dispatch::WorkerPool;
use ampliscreen_lib::job::{AssemblyCollection, CollectionRole, JobStatus};
use ampliscreen_lib::primers::PrimerPair;
use ampliscreen_lib::sweep::SweepOrchestrator;
use ampliscreen_lib::validation::validate_tool_installed;

use crate::commands::command::Command;
use crate::commands::common::{ResourceOptions, SearchOptions};

/// Collection role, as written on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    /// Assemblies that must amplify; levels m0-m3, no deadline.
    Target,
    /// Assemblies that must not amplify; levels m0-m4, deadline applies.
    Neighbour,
}

impl From<RoleArg> for CollectionRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Target => Self::Target,
            RoleArg::Neighbour => Self::Neighbour,
        }
    }
}

/// One TSV row per match record in the sweep output.
#[derive(Debug, Serialize)]
struct RecordRow {
    assembly: String,
    mismatches: u32,
    status: String,
    ref_name: String,
    start: u64,
    end: u64,
    amplicon_length: usize,
}

/// Sweep one collection across its mismatch levels.
#[derive(Debug, Parser)]
#[command(
    name = "sweep",
    about = "Run one mismatch sweep over an assembly collection",
    long_about = r#"
Run the external search tool for one primer pair over every assembly in a
collection, at every conventional mismatch level for the chosen role
(target: m0-m3, neighbour: m0-m4), and summarize what matched.

Example usage:
  ampliscreen sweep --forward ACGT... --reverse TTGA... -a targets/ --role target
  ampliscreen sweep --forward ACGT... --reverse TTGA... -a neighbours/ --role neighbour -o records.tsv
"#
)]
pub struct Sweep {
    /// Forward primer sequence
    #[arg(long = "forward")]
    pub forward: String,

    /// Reverse primer sequence
    #[arg(long = "reverse")]
    pub reverse: String,

    /// Directory of assemblies to sweep
    #[arg(short = 'a', long = "assemblies")]
    pub assemblies: PathBuf,

    /// Role of the collection
    #[arg(long = "role", value_enum)]
    pub role: RoleArg,

    /// Optional TSV file for all match records
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Resource limits and supervision intervals
    #[command(flatten)]
    pub resources: ResourceOptions,

    /// External search tool
    #[command(flatten)]
    pub search: SearchOptions,
}

impl Command for Sweep {
    fn execute(&self) -> Result<()> {
        validate_tool_installed(&self.search.program)?;
        let primers = PrimerPair::new(&self.forward, &self.reverse)?;
        let collection =
            AssemblyCollection::from_dir(self.role.into(), &self.assemblies)?;
        info!(
            "Sweeping {} {} assemblies from {}",
            collection.count(),
            collection.role.label(),
            self.assemblies.display()
        );

        let config = self.resources.to_config();
        let pool = WorkerPool::new(&self.search.program, config.clone())?;
        let result = SweepOrchestrator::new(&pool, config).sweep(&primers, &collection)?;

        for (level, outcomes) in result.levels() {
            let matched = outcomes.iter().filter(|o| !o.records.is_empty()).count();
            let failed =
                outcomes.iter().filter(|o| o.status != JobStatus::Success).count();
            println!(
                "m{level}: {matched}/{} assemblies matched, {failed} job failures",
                outcomes.len()
            );
        }

        if let Some(path) = &self.output {
            let rows: Vec<RecordRow> = result
                .levels()
                .flat_map(|(level, outcomes)| {
                    outcomes.iter().flat_map(move |outcome| {
                        outcome.records.iter().map(move |record| RecordRow {
                            assembly: outcome.spec.assembly.name.clone(),
                            mismatches: level,
                            status: format!("{:?}", outcome.status),
                            ref_name: record.ref_name.clone(),
                            start: record.start,
                            end: record.end,
                            amplicon_length: record.amplicon_len(),
                        })
                    })
                })
                .collect();
            DelimFile::default()
                .write_tsv(path, rows)
                .with_context(|| format!("Failed to write records: {}", path.display()))?;
            info!("Wrote match records to {}", path.display());
        }
        Ok(())
    }
}
