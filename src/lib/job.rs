//! Job descriptors, outcomes and assembly collections.
//!
//! A [`JobSpec`] describes exactly one invocation of the external search
//! process: one assembly, one primer pair, one allowed-mismatch count. The
//! worker pool resolves every spec into a [`JobOutcome`] carrying the parsed
//! match records and a status; outcomes are keyed by (assembly, mismatch
//! level) for the sweep collector.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;

use crate::errors::{Result, ScreenError};
use crate::validation::validate_primer_sequence;

/// Upper bound on the allowed-mismatch count; sweeps never go past m4 and a
/// runaway value would make the external search quadratic.
pub const MAX_MISMATCHES: u32 = 10;

/// 0-indexed column of the amplicon sequence in the search tool's BED-style
/// tab-delimited output.
const AMPLICON_COLUMN: usize = 6;

/// Identifies one assembly inside a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssemblyId {
    /// Short name used in logs and outcome keys (the file stem).
    pub name: String,
    /// Path to the assembly's sequence file.
    pub path: PathBuf,
}

impl AssemblyId {
    /// Build an id from a sequence file path.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
        Self { name, path: path.to_path_buf() }
    }
}

/// Whether a collection's assemblies are expected to amplify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionRole {
    /// Assemblies that must amplify (sensitivity check).
    Target,
    /// Assemblies that must not amplify (specificity check).
    Neighbour,
}

impl CollectionRole {
    /// Mismatch levels conventionally swept for this role. Neighbour sweeps
    /// go one level deeper to establish confident non-amplification at the
    /// boundary used by the tolerated-failure rule.
    #[must_use]
    pub fn mismatch_levels(self) -> &'static [u32] {
        match self {
            Self::Target => &[0, 1, 2, 3],
            Self::Neighbour => &[0, 1, 2, 3, 4],
        }
    }

    /// Lower-case label used in logs and report rows.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Target => "target",
            Self::Neighbour => "neighbour",
        }
    }
}

/// A named, ordered set of assemblies with a known cardinality.
#[derive(Debug, Clone)]
pub struct AssemblyCollection {
    /// Target or neighbour.
    pub role: CollectionRole,
    /// The member assemblies, in stable (sorted) order.
    pub assemblies: Vec<AssemblyId>,
}

impl AssemblyCollection {
    /// Discover a collection from a directory of sequence files.
    ///
    /// # Errors
    /// [`ScreenError::EmptyCollection`] if the directory is missing or holds
    /// no files.
    pub fn from_dir(role: CollectionRole, dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = dir
            .read_dir()
            .map_err(|_| ScreenError::EmptyCollection { path: dir.display().to_string() })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        if paths.is_empty() {
            return Err(ScreenError::EmptyCollection { path: dir.display().to_string() });
        }
        paths.sort();
        let assemblies = paths.iter().map(|p| AssemblyId::from_path(p)).collect();
        Ok(Self { role, assemblies })
    }

    /// Number of member assemblies; the expected number of correct-size hits
    /// for a fully amplified sweep level.
    #[must_use]
    pub fn count(&self) -> usize {
        self.assemblies.len()
    }
}

/// Immutable description of one search-process invocation.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// The assembly whose sequence is fed to the search process.
    pub assembly: AssemblyId,
    /// Forward primer sequence.
    pub forward: String,
    /// Reverse primer sequence.
    pub reverse: String,
    /// Allowed mismatches for primer binding.
    pub mismatches: u32,
    /// Resident-memory ceiling for the spawned process, in bytes.
    pub memory_ceiling: u64,
    /// Optional wall-clock deadline for the process.
    pub deadline: Option<Duration>,
}

impl JobSpec {
    /// Validate the spec before anything is spawned.
    pub fn validate(&self) -> Result<()> {
        validate_primer_sequence(&self.forward, "forward primer")?;
        validate_primer_sequence(&self.reverse, "reverse primer")?;
        if self.mismatches > MAX_MISMATCHES {
            return Err(ScreenError::InvalidParameter {
                parameter: "mismatches".to_string(),
                reason: format!("{} exceeds the maximum of {MAX_MISMATCHES}", self.mismatches),
            });
        }
        Ok(())
    }
}

/// How a dispatched job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Process exited zero; stdout was parsed into match records.
    Success,
    /// Process exited non-zero or could not be run at all.
    Failed,
    /// Process was killed when its deadline expired.
    TimedOut,
    /// Process was killed by its memory watchdog.
    MemoryKilled,
}

/// One amplicon hit reported by the search process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// Sequence name the hit was found on.
    pub ref_name: String,
    /// 0-based start coordinate.
    pub start: u64,
    /// End coordinate.
    pub end: u64,
    /// The amplified sequence.
    pub amplicon: String,
}

impl MatchRecord {
    /// Length of the amplicon; the only field the verdict engine consumes.
    #[must_use]
    pub fn amplicon_len(&self) -> usize {
        self.amplicon.len()
    }
}

/// Parse the search tool's stdout into match records.
///
/// Lines with fewer columns than the amplicon column, or with unparseable
/// coordinates, are skipped with a warning and excluded from all tallies.
#[must_use]
pub fn parse_match_records(output: &str, assembly: &str) -> Vec<MatchRecord> {
    let mut records = Vec::new();
    for line in output.lines() {
        if line.is_empty() {
            continue;
        }
        match parse_match_line(line) {
            Some(record) => records.push(record),
            None => warn!("[{assembly}] skipping malformed match record: {line}"),
        }
    }
    records
}

fn parse_match_line(line: &str) -> Option<MatchRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() <= AMPLICON_COLUMN {
        return None;
    }
    let start: u64 = fields[1].parse().ok()?;
    let end: u64 = fields[2].parse().ok()?;
    Some(MatchRecord {
        ref_name: fields[0].to_string(),
        start,
        end,
        amplicon: fields[AMPLICON_COLUMN].to_string(),
    })
}

/// A resolved job: the spec it came from, its records and its status.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// The spec this outcome resolves.
    pub spec: JobSpec,
    /// Parsed match records; empty unless `status == Success`.
    pub records: Vec<MatchRecord>,
    /// How the job ended.
    pub status: JobStatus,
}

impl JobOutcome {
    /// True if this outcome is exactly one match record of the expected
    /// amplicon length. Non-success outcomes can never be hits.
    #[must_use]
    pub fn is_correct_size_hit(&self, expected_len: usize) -> bool {
        self.status == JobStatus::Success
            && self.records.len() == 1
            && self.records[0].amplicon_len() == expected_len
    }
}
