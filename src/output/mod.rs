//! Output module for reporting pipeline state
//!
//! This module handles:
//! - Loading statistics from the ledger and the normalized store
//! - Printing them for the `--stats` command

pub mod stats;

pub use stats::{load_statistics, print_statistics, PipelineStatistics};
