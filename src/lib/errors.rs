//! Custom error types for ampliscreen operations.
//!
//! Only fatal, batch-aborting conditions are modelled here. Job-local
//! failures (non-zero exit, timeout, memory kill) are captured as a
//! [`crate::job::JobStatus`] and never surface as errors.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for ampliscreen operations
pub type Result<T> = std::result::Result<T, ScreenError>;

/// Error type for ampliscreen operations
#[derive(Error, Debug)]
pub enum ScreenError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// The admission controller gave up waiting for free host memory
    #[error(
        "Available memory did not reach {required_bytes} bytes within {}s",
        .waited.as_secs()
    )]
    AdmissionTimeout {
        /// Free memory required before a job may start
        required_bytes: u64,
        /// How long the controller waited before giving up
        waited: Duration,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "primer", "assembly")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// A required external tool is not on the PATH
    #[error("Required tool '{tool}' was not found on PATH")]
    ToolMissing {
        /// The executable name
        tool: String,
    },

    /// An assembly directory is missing or holds no files
    #[error("Assembly collection '{path}' does not exist or is empty")]
    EmptyCollection {
        /// The directory that was searched
        path: String,
    },

    /// A sweep recorded two outcomes for the same (assembly, mismatch) key
    #[error("Duplicate outcome for assembly '{assembly}' at mismatch level {level}")]
    DuplicateOutcome {
        /// The assembly identifier
        assembly: String,
        /// The mismatch level
        level: u32,
    },

    /// The verdict engine was invoked on a sweep with unresolved levels
    #[error("Mismatch level {level} was never attempted in this sweep")]
    MissingLevel {
        /// The absent mismatch level
        level: u32,
    },
}
