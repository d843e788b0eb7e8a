//! Mismatch-level sweep orchestration and result collection.
//!
//! A sweep tests one primer pair against every assembly in a collection at
//! each conventional mismatch level, strict to permissive. Levels are
//! independent; a level at which every job failed or matched nothing is
//! still recorded, because "no amplification at this stringency" is itself
//! a reportable result.

use std::collections::{BTreeMap, HashSet};

use log::info;

use crate::config::ResourceConfig;
use crate::dispatch::WorkerPool;
use crate::errors::{Result, ScreenError};
use crate::job::{AssemblyCollection, CollectionRole, JobOutcome, JobSpec};
use crate::logging::OperationTimer;
use crate::primers::PrimerPair;

/// All outcomes of one primer pair against one collection, keyed by
/// mismatch level.
///
/// Holds at most one outcome per (assembly, mismatch level); duplicate
/// inserts are a programming error and rejected.
#[derive(Debug, Clone)]
pub struct SweepResult {
    /// Role of the collection that was swept.
    pub role: CollectionRole,
    /// Cardinality of the collection (the expected hit count for a fully
    /// amplified level).
    pub expected_count: usize,
    levels: BTreeMap<u32, Vec<JobOutcome>>,
}

impl SweepResult {
    /// Create an empty result for a collection of `expected_count` members.
    #[must_use]
    pub fn new(role: CollectionRole, expected_count: usize) -> Self {
        Self { role, expected_count, levels: BTreeMap::new() }
    }

    /// Record the outcomes of one fully resolved mismatch level.
    ///
    /// # Errors
    /// [`ScreenError::DuplicateOutcome`] when the level was already
    /// recorded or two outcomes share an assembly.
    pub fn record_level(&mut self, level: u32, outcomes: Vec<JobOutcome>) -> Result<()> {
        if self.levels.contains_key(&level) {
            let assembly =
                outcomes.first().map_or_else(String::new, |o| o.spec.assembly.name.clone());
            return Err(ScreenError::DuplicateOutcome { assembly, level });
        }
        let mut seen = HashSet::new();
        for outcome in &outcomes {
            if !seen.insert(outcome.spec.assembly.name.clone()) {
                return Err(ScreenError::DuplicateOutcome {
                    assembly: outcome.spec.assembly.name.clone(),
                    level,
                });
            }
        }
        self.levels.insert(level, outcomes);
        Ok(())
    }

    /// Whether `level` has been attempted (even if every job failed).
    #[must_use]
    pub fn attempted(&self, level: u32) -> bool {
        self.levels.contains_key(&level)
    }

    /// Outcomes recorded at `level`.
    #[must_use]
    pub fn level(&self, level: u32) -> Option<&[JobOutcome]> {
        self.levels.get(&level).map(Vec::as_slice)
    }

    /// Iterate levels in ascending order.
    pub fn levels(&self) -> impl Iterator<Item = (u32, &[JobOutcome])> {
        self.levels.iter().map(|(level, outcomes)| (*level, outcomes.as_slice()))
    }
}

/// Drives the per-level sweep of one collection through a worker pool.
pub struct SweepOrchestrator<'a> {
    pool: &'a WorkerPool,
    config: ResourceConfig,
}

impl<'a> SweepOrchestrator<'a> {
    /// Create an orchestrator submitting to `pool` with `config` limits.
    #[must_use]
    pub fn new(pool: &'a WorkerPool, config: ResourceConfig) -> Self {
        Self { pool, config }
    }

    /// Sweep `collection` at its conventional mismatch levels.
    ///
    /// The per-job deadline applies only to neighbour collections, which
    /// are typically much larger than target collections.
    ///
    /// # Errors
    /// Only fatal conditions (invalid specs, admission timeout); job-local
    /// failures are recorded in the outcomes.
    pub fn sweep(
        &self,
        primers: &PrimerPair,
        collection: &AssemblyCollection,
    ) -> Result<SweepResult> {
        let deadline = match collection.role {
            CollectionRole::Neighbour => self.config.deadline,
            CollectionRole::Target => None,
        };

        let timer =
            OperationTimer::new(&format!("Sweeping {} collection", collection.role.label()));
        let mut result = SweepResult::new(collection.role, collection.count());
        let mut total_jobs = 0u64;

        for &level in collection.role.mismatch_levels() {
            info!(
                "Processing {} {} assemblies with mismatch={level}",
                collection.count(),
                collection.role.label()
            );
            let jobs: Vec<JobSpec> = collection
                .assemblies
                .iter()
                .map(|assembly| JobSpec {
                    assembly: assembly.clone(),
                    forward: primers.forward.clone(),
                    reverse: primers.reverse.clone(),
                    mismatches: level,
                    memory_ceiling: self.config.job_memory_ceiling,
                    deadline,
                })
                .collect();
            total_jobs += jobs.len() as u64;

            let outcomes = self.pool.run(jobs)?;
            let matched = outcomes.iter().filter(|o| !o.records.is_empty()).count();
            info!("Finished mismatch {level}: {matched} of {} jobs matched", outcomes.len());
            result.record_level(level, outcomes)?;
        }

        timer.log_completion(total_jobs);
        Ok(result)
    }
}
