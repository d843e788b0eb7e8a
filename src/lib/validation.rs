//! Input validation utilities
//!
//! Common validation functions for command-line parameters, file paths and
//! primer sequences, with consistent error messages built on
//! [`crate::errors`].

use std::path::Path;

use crate::errors::{Result, ScreenError};

/// IUPAC nucleotide codes accepted in primer sequences.
const IUPAC_CODES: &[u8] = b"ACGTURYSWKMBDHVN";

/// Validate that a file exists
///
/// # Arguments
/// * `path` - Path to validate
/// * `description` - Human-readable description of the file (e.g., "Primer file")
///
/// # Errors
/// Returns an error if the file does not exist
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.is_file() {
        return Err(ScreenError::InvalidFileFormat {
            file_type: description.to_string(),
            path: path_ref.display().to_string(),
            reason: "File does not exist".to_string(),
        });
    }
    Ok(())
}

/// Validate that a directory exists and holds at least one file.
///
/// # Errors
/// Returns [`ScreenError::EmptyCollection`] otherwise.
pub fn validate_dir_non_empty<P: AsRef<Path>>(path: P) -> Result<()> {
    let path_ref = path.as_ref();
    let has_files = path_ref
        .read_dir()
        .map(|mut entries| {
            entries.any(|e| e.map(|e| e.path().is_file()).unwrap_or(false))
        })
        .unwrap_or(false);
    if !has_files {
        return Err(ScreenError::EmptyCollection { path: path_ref.display().to_string() });
    }
    Ok(())
}

/// Validate a primer sequence: non-empty and IUPAC nucleotide codes only.
///
/// # Arguments
/// * `sequence` - The primer sequence
/// * `name` - Name of the parameter for error messages
///
/// # Errors
/// Returns an error for an empty sequence or a non-IUPAC character
///
/// # Example
/// ```
/// use ampliscreen_lib::validation::validate_primer_sequence;
///
/// validate_primer_sequence("ACGTRYN", "forward primer").unwrap();
/// assert!(validate_primer_sequence("", "forward primer").is_err());
/// assert!(validate_primer_sequence("ACGT-12", "forward primer").is_err());
/// ```
pub fn validate_primer_sequence(sequence: &str, name: &str) -> Result<()> {
    if sequence.is_empty() {
        return Err(ScreenError::InvalidParameter {
            parameter: name.to_string(),
            reason: "primer sequence must not be empty".to_string(),
        });
    }
    if let Some(bad) = sequence
        .bytes()
        .find(|b| !IUPAC_CODES.contains(&b.to_ascii_uppercase()))
    {
        return Err(ScreenError::InvalidParameter {
            parameter: name.to_string(),
            reason: format!("invalid nucleotide code '{}'", bad as char),
        });
    }
    Ok(())
}

/// Returns true if `tool` resolves to an executable file on the PATH.
#[must_use]
pub fn tool_on_path(tool: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else { return false };
    std::env::split_paths(&paths).any(|dir| dir.join(tool).is_file())
}

/// Validate that a required external tool is available.
///
/// # Errors
/// Returns [`ScreenError::ToolMissing`] if the tool is not on the PATH.
pub fn validate_tool_installed(tool: &str) -> Result<()> {
    if tool_on_path(tool) { Ok(()) } else { Err(ScreenError::ToolMissing { tool: tool.to_string() }) }
}
