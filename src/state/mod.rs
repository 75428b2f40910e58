//! Per-run state threaded through the pipeline stages
//!
//! Nothing here is process-wide: each run builds its own [`RunContext`], so sequential runs and
//! tests never observe each other's counters.
//!
//! # Components
//!
//! - `RunContext`: seen detail URLs plus the crawl budget counters
//! - `StageTally`: success/failure/skip counts every stage reports

mod run_context;
mod tally;

// Re-export main types
pub use run_context::RunContext;
pub use tally::StageTally;
