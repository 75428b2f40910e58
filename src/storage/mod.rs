//! Storage module for persisting pipeline data
//!
//! This module handles both persisted stores of the pipeline:
//! - The JSON ledger of raw detail records, which is the crawl's resumption checkpoint
//! - The SQLite store of normalized records, the review queue and run history

mod ledger;
mod schema;
mod sqlite;
mod traits;

pub use ledger::Ledger;
pub use sqlite::SqliteStore;
pub use traits::{NormalizedStore, StorageError, StorageResult};

use crate::models::DetailRecord;
use crate::state::StageTally;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Opens or creates the normalized-record store
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized store
/// * `Err(StorageError)` - Failed to open the database
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}

/// Represents a pipeline run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub tallies: Option<RunTallies>,
}

/// Per-stage tallies of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTallies {
    pub crawl: StageTally,
    pub normalize: StageTally,
    pub sync: StageTally,
}

/// A record rejected by the validation gate
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEntry {
    pub detail_url: String,
    /// Stable machine-readable reason, used for grouping
    pub reason_code: String,
    /// Human-readable reason including the offending value
    pub reason: String,
    pub record: DetailRecord,
}

/// Status of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    /// At least one stage failed and the remaining stages were skipped
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
