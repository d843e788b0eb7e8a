//! Primer file parsing and expected amplicon length derivation.
//!
//! The upstream primer-design step writes candidate primers as a small
//! FASTA-like text file: a header line containing `PRIMER_LEFT`,
//! `PRIMER_RIGHT` or `PRIMER_INTERNAL` is followed by the sequence on the
//! next line. Forward and reverse primers are required; the internal probe
//! is optional.

use std::fs;
use std::path::Path;

use crate::errors::{Result, ScreenError};
use crate::sweep::SweepResult;
use crate::validation::validate_primer_sequence;

const FORWARD_HEADER: &str = "PRIMER_LEFT";
const REVERSE_HEADER: &str = "PRIMER_RIGHT";
const INTERNAL_HEADER: &str = "PRIMER_INTERNAL";

/// A candidate primer pair, optionally with an internal probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimerPair {
    /// Forward (left) primer sequence.
    pub forward: String,
    /// Reverse (right) primer sequence.
    pub reverse: String,
    /// Optional internal probe sequence; carried for reporting only.
    pub internal: Option<String>,
}

impl PrimerPair {
    /// Build a validated pair from explicit sequences.
    pub fn new(forward: &str, reverse: &str) -> Result<Self> {
        validate_primer_sequence(forward, "forward primer")?;
        validate_primer_sequence(reverse, "reverse primer")?;
        Ok(Self { forward: forward.to_string(), reverse: reverse.to_string(), internal: None })
    }
}

/// Read a primer pair from a primer-design output file.
///
/// # Errors
/// [`ScreenError::InvalidFileFormat`] when the file cannot be read, a
/// required header is missing, or a sequence fails validation.
pub fn read_primer_file(path: &Path) -> Result<PrimerPair> {
    let contents = fs::read_to_string(path).map_err(|e| ScreenError::InvalidFileFormat {
        file_type: "primer".to_string(),
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_primer_file(&contents).map_err(|reason| ScreenError::InvalidFileFormat {
        file_type: "primer".to_string(),
        path: path.display().to_string(),
        reason,
    })
}

/// Parse primer file contents; returns a human-readable reason on failure.
fn parse_primer_file(contents: &str) -> std::result::Result<PrimerPair, String> {
    let lines: Vec<&str> = contents.lines().collect();
    let mut forward = None;
    let mut reverse = None;
    let mut internal = None;

    for (i, line) in lines.iter().enumerate() {
        let sequence = lines.get(i + 1).map(|s| s.trim().to_string());
        if line.contains(INTERNAL_HEADER) {
            internal = sequence;
        } else if line.contains(FORWARD_HEADER) {
            forward = sequence;
        } else if line.contains(REVERSE_HEADER) {
            reverse = sequence;
        }
    }

    let forward = forward.filter(|s| !s.is_empty()).ok_or_else(|| {
        format!("missing {FORWARD_HEADER} header or sequence")
    })?;
    let reverse = reverse.filter(|s| !s.is_empty()).ok_or_else(|| {
        format!("missing {REVERSE_HEADER} header or sequence")
    })?;

    validate_primer_sequence(&forward, "forward primer").map_err(|e| e.to_string())?;
    validate_primer_sequence(&reverse, "reverse primer").map_err(|e| e.to_string())?;

    Ok(PrimerPair { forward, reverse, internal: internal.filter(|s| !s.is_empty()) })
}

/// Expected amplicon length for a primer pair: the length of the first
/// match record at mismatch level 0 of the target sweep.
///
/// Returns `None` when nothing amplified at level 0, in which case the
/// sensitivity check is going to fail regardless of length.
#[must_use]
pub fn expected_amplicon_length(sweep: &SweepResult) -> Option<usize> {
    sweep
        .level(0)?
        .iter()
        .flat_map(|outcome| outcome.records.iter())
        .next()
        .map(super::job::MatchRecord::amplicon_len)
}
