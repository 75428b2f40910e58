//! Storage traits and error types
//!
//! This module defines the trait interface for the normalized-record store and
//! associated error types.

use crate::models::NormalizedRecord;
use crate::storage::{ReviewEntry, RunRecord, RunStatus, RunTallies};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for normalized-record store implementations
///
/// The store is the normalize stage's output and the sync stage's input. Records are keyed by
/// detail URL; each key appears at most once among accepted records and at most once in the
/// review queue.
pub trait NormalizedStore {
    // ===== Run Management =====

    /// Creates a new pipeline run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Closes a run with its final status and per-stage tallies
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        tallies: &RunTallies,
    ) -> StorageResult<()>;

    // ===== Normalized Records =====

    /// Checks whether an accepted record exists for a detail URL
    fn contains(&self, detail_url: &str) -> StorageResult<bool>;

    /// Inserts an accepted record and drops any review entry for its URL
    ///
    /// # Returns
    ///
    /// * `true` - The record was inserted
    /// * `false` - A record for this URL already existed and was left untouched
    fn insert_normalized(&mut self, record: &NormalizedRecord, run_id: i64)
        -> StorageResult<bool>;

    /// Gets accepted records not yet delivered downstream, oldest first
    fn pending_sync(&self) -> StorageResult<Vec<NormalizedRecord>>;

    /// Marks records as delivered
    fn mark_synced(&mut self, detail_urls: &[String]) -> StorageResult<()>;

    /// Counts a failed delivery attempt and keeps its error
    fn record_sync_failure(&mut self, detail_url: &str, error: &str) -> StorageResult<()>;

    // ===== Review Queue =====

    /// Inserts or replaces the review entry for a detail URL
    fn flag_for_review(&mut self, entry: &ReviewEntry) -> StorageResult<()>;

    /// Gets every review entry, ordered by URL
    fn review_entries(&self) -> StorageResult<Vec<ReviewEntry>>;

    // ===== Statistics =====

    /// Counts accepted records
    fn count_normalized(&self) -> StorageResult<u64>;

    /// Counts accepted records already delivered
    fn count_synced(&self) -> StorageResult<u64>;

    /// Counts review entries per reason code
    fn review_breakdown(&self) -> StorageResult<BTreeMap<String, u64>>;
}
