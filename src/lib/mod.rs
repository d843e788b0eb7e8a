#![deny(unsafe_code)]
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args
)]

//! # ampliscreen - In-silico Primer Screening Library
//!
//! This library screens candidate primer pairs against two assembly
//! collections: "target" genomes that must amplify and "neighbour" genomes
//! that must not. Each (assembly, allowed-mismatch) combination is tested by
//! an independent external search process, and the resulting match records
//! are reduced to a sensitivity verdict (targets) and a specificity verdict
//! (neighbours).
//!
//! ## Overview
//!
//! - **[`job`]** - Job descriptors, outcomes, match records, and assembly collections
//! - **[`dispatch`]** - Bounded worker pool that runs the external search processes
//! - **[`sweep`]** - Mismatch-level sweep orchestration and result collection
//! - **[`verdict`]** - Sensitivity/specificity interpretation of a finished sweep
//!
//! ## Resource supervision
//!
//! - **[`memory`]** - Host memory probing and job admission control
//! - **[`watchdog`]** - Per-process resident-memory supervision with forced kill
//!
//! ## Utilities
//!
//! - **[`primers`]** - Primer file parsing and expected amplicon length derivation
//! - **[`report`]** - Stable report shapes for downstream rendering
//! - **[`validation`]** - Input validation for parameters, files and tools
//! - **[`progress`]** - Progress tracking and logging
//! - **[`logging`]** - Formatting helpers and operation timing

pub mod config;
pub mod dispatch;
pub mod errors;
pub mod job;
pub mod logging;
pub mod memory;
pub mod primers;
pub mod progress;
pub mod report;
pub mod sweep;
pub mod validation;
pub mod verdict;
pub mod watchdog;
