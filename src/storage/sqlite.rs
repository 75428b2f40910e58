//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the NormalizedStore trait. Records are
//! kept as JSON payloads next to the columns the pipeline filters on.

use crate::models::{DetailRecord, NormalizedRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{NormalizedStore, StorageError, StorageResult};
use crate::storage::{ReviewEntry, RunRecord, RunStatus, RunTallies};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;

/// SQLite store for normalized records
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<(RunRecord, Option<String>)> {
        let run = RunRecord {
            id: row.get(0)?,
            started_at: row.get(1)?,
            finished_at: row.get(2)?,
            config_hash: row.get(3)?,
            status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
                .unwrap_or(RunStatus::Running),
            tallies: None,
        };
        Ok((run, row.get(5)?))
    }

    fn attach_tallies(
        (mut run, tallies): (RunRecord, Option<String>),
    ) -> StorageResult<RunRecord> {
        run.tallies = tallies
            .as_deref()
            .map(serde_json::from_str::<RunTallies>)
            .transpose()?;
        Ok(run)
    }
}

impl NormalizedStore for SqliteStore {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let row = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, tallies
                 FROM runs WHERE id = ?1",
                params![run_id],
                Self::run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))?;

        Self::attach_tallies(row)
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status, tallies
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                Self::run_from_row,
            )
            .optional()?;

        row.map(Self::attach_tallies).transpose()
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        tallies: &RunTallies,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tallies = serde_json::to_string(tallies)?;
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, tallies = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, tallies, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Normalized Records =====

    fn contains(&self, detail_url: &str) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM cars WHERE detail_url = ?1",
                params![detail_url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_normalized(
        &mut self,
        record: &NormalizedRecord,
        run_id: i64,
    ) -> StorageResult<bool> {
        let payload = serde_json::to_string(record)?;
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO cars (detail_url, payload, normalized_at, normalized_run)
             VALUES (?1, ?2, ?3, ?4)",
            params![record.url, payload, now, run_id],
        )?;
        tx.execute(
            "DELETE FROM review_queue WHERE detail_url = ?1",
            params![record.url],
        )?;
        tx.commit()?;

        Ok(inserted > 0)
    }

    fn pending_sync(&self) -> StorageResult<Vec<NormalizedRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM cars WHERE synced_at IS NULL ORDER BY id")?;

        let payloads = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        payloads
            .iter()
            .map(|payload| serde_json::from_str(payload).map_err(StorageError::from))
            .collect()
    }

    fn mark_synced(&mut self, detail_urls: &[String]) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE cars SET synced_at = ?1, sync_attempts = sync_attempts + 1,
                 last_sync_error = NULL WHERE detail_url = ?2",
            )?;
            for url in detail_urls {
                stmt.execute(params![now, url])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn record_sync_failure(&mut self, detail_url: &str, error: &str) -> StorageResult<()> {
        self.conn.execute(
            "UPDATE cars SET sync_attempts = sync_attempts + 1, last_sync_error = ?1
             WHERE detail_url = ?2",
            params![error, detail_url],
        )?;
        Ok(())
    }

    // ===== Review Queue =====

    fn flag_for_review(&mut self, entry: &ReviewEntry) -> StorageResult<()> {
        let payload = serde_json::to_string(&entry.record)?;
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR REPLACE INTO review_queue (detail_url, reason_code, reason, payload, flagged_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![entry.detail_url, entry.reason_code, entry.reason, payload, now],
        )?;
        Ok(())
    }

    fn review_entries(&self) -> StorageResult<Vec<ReviewEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT detail_url, reason_code, reason, payload FROM review_queue ORDER BY detail_url",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(detail_url, reason_code, reason, payload)| -> StorageResult<ReviewEntry> {
                let record: DetailRecord = serde_json::from_str(&payload)?;
                Ok(ReviewEntry {
                    detail_url,
                    reason_code,
                    reason,
                    record,
                })
            })
            .collect()
    }

    // ===== Statistics =====

    fn count_normalized(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cars", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_synced(&self) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM cars WHERE synced_at IS NOT NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn review_breakdown(&self) -> StorageResult<BTreeMap<String, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT reason_code, COUNT(*) FROM review_queue GROUP BY reason_code",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut breakdown = BTreeMap::new();
        for row in rows {
            let (code, count) = row?;
            breakdown.insert(code, count as u64);
        }
        Ok(breakdown)
    }
}
