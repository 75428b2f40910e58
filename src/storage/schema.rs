//! Database schema definitions
//!
//! This module contains the SQL schema for the normalized-record store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track pipeline runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    tallies TEXT
);

-- Normalized records accepted by the validation gate
CREATE TABLE IF NOT EXISTS cars (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    detail_url TEXT NOT NULL UNIQUE,
    payload TEXT NOT NULL,
    normalized_at TEXT NOT NULL,
    normalized_run INTEGER REFERENCES runs(id),
    synced_at TEXT,
    sync_attempts INTEGER NOT NULL DEFAULT 0,
    last_sync_error TEXT
);

CREATE INDEX IF NOT EXISTS idx_cars_synced ON cars(synced_at);

-- Records rejected by the validation gate, re-evaluated on later runs
CREATE TABLE IF NOT EXISTS review_queue (
    detail_url TEXT PRIMARY KEY,
    reason_code TEXT NOT NULL,
    reason TEXT NOT NULL,
    payload TEXT NOT NULL,
    flagged_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_review_reason ON review_queue(reason_code);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        assert!(result.is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["runs", "cars", "review_queue"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}
