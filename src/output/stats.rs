//! Statistics over the ledger and the normalized store
//!
//! This module provides functionality for extracting and displaying pipeline statistics: how
//! far the crawl has got, how many records passed normalization, why the others are waiting for
//! review, and how much has been delivered downstream.

use crate::storage::{Ledger, NormalizedStore, RunRecord};
use crate::Result;
use std::collections::BTreeMap;

/// Pipeline statistics summary
#[derive(Debug, Clone)]
pub struct PipelineStatistics {
    /// Raw detail records in the ledger
    pub ledger_records: u64,

    /// Records that passed the validation gate
    pub normalized: u64,

    /// Normalized records already delivered
    pub synced: u64,

    /// Review-queue entries per reason code
    pub review_breakdown: BTreeMap<String, u64>,

    /// Most recent pipeline run, if any
    pub last_run: Option<RunRecord>,
}

impl PipelineStatistics {
    /// Normalized records still waiting for delivery
    pub fn pending_sync(&self) -> u64 {
        self.normalized.saturating_sub(self.synced)
    }

    pub fn needs_review(&self) -> u64 {
        self.review_breakdown.values().sum()
    }
}

/// Loads statistics from the ledger and the store
///
/// # Arguments
///
/// * `ledger` - The detail-record ledger
/// * `store` - The normalized-record store to query
///
/// # Returns
///
/// * `Ok(PipelineStatistics)` - Successfully loaded statistics
/// * `Err(CarfeedError)` - Failed to query the store
pub fn load_statistics<S>(ledger: &Ledger, store: &S) -> Result<PipelineStatistics>
where
    S: NormalizedStore + ?Sized,
{
    Ok(PipelineStatistics {
        ledger_records: ledger.len() as u64,
        normalized: store.count_normalized()?,
        synced: store.count_synced()?,
        review_breakdown: store.review_breakdown()?,
        last_run: store.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &PipelineStatistics) {
    println!("=== Pipeline Statistics ===\n");

    println!("Overview:");
    println!("  Ledger records: {}", stats.ledger_records);
    println!("  Normalized records: {}", stats.normalized);
    println!("  Needing review: {}", stats.needs_review());
    println!();

    if !stats.review_breakdown.is_empty() {
        println!("Review Queue:");
        // Sort reasons by count (descending)
        let mut reasons: Vec<_> = stats.review_breakdown.iter().collect();
        reasons.sort_by(|a, b| b.1.cmp(a.1));

        for (reason, count) in reasons {
            println!("  {}: {}", reason, count);
        }
        println!();
    }

    println!("Delivery:");
    println!("  Synced: {}", stats.synced);
    println!("  Pending: {}", stats.pending_sync());
    println!();

    match &stats.last_run {
        Some(run) => {
            println!("Last Run (#{}):", run.id);
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Status: {}", run.status.to_db_string());
            if let Some(tallies) = &run.tallies {
                println!("  Crawl: {}", tallies.crawl);
                println!("  Normalize: {}", tallies.normalize);
                println!("  Sync: {}", tallies.sync);
            }
        }
        None => println!("No pipeline runs recorded yet"),
    }
    println!();

    let total = stats.normalized + stats.needs_review();
    let acceptance_rate = if total > 0 {
        (stats.normalized as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Acceptance Rate: {:.1}% ({} / {} records passed validation)",
        acceptance_rate, stats.normalized, total
    );
}
