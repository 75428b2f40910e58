//! Append-only JSON ledger of detail records
//!
//! The ledger is a single JSON array, read fully on load and rewritten fully after every
//! append. Each rewrite goes to a sibling temp file that is renamed over the ledger, so an
//! interrupted write leaves the previous version intact.

use crate::models::DetailRecord;
use crate::{CarfeedError, Result};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// In-memory view of the ledger file plus its URL index
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    records: Vec<DetailRecord>,
    urls: HashSet<String>,
}

impl Ledger {
    /// Loads the ledger, treating a missing or unparsable file as empty
    ///
    /// Corruption is logged and otherwise ignored; the next append replaces the file.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let records = match Self::read_records(&path) {
            Ok(Some(records)) => records,
            Ok(None) => {
                tracing::info!("No ledger at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable ledger: {}", e);
                Vec::new()
            }
        };

        Self::from_records(path, records)
    }

    /// Loads the ledger, failing when the file is missing or unparsable
    ///
    /// # Returns
    ///
    /// * `Ok(Ledger)` - The parsed ledger
    /// * `Err(CarfeedError::MissingInput)` - No ledger file exists
    /// * `Err(CarfeedError::Ledger)` - The file could not be read or parsed
    pub fn load_strict(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match Self::read_records(&path)? {
            Some(records) => Ok(Self::from_records(path, records)),
            None => Err(CarfeedError::MissingInput(format!(
                "ledger not found at {}",
                path.display()
            ))),
        }
    }

    fn from_records(path: PathBuf, records: Vec<DetailRecord>) -> Self {
        let mut urls = HashSet::with_capacity(records.len());
        let mut unique = Vec::with_capacity(records.len());

        // A hand-edited ledger may repeat a URL; the first entry wins
        for record in records {
            if urls.insert(record.detail_url.clone()) {
                unique.push(record);
            } else {
                tracing::warn!("Duplicate ledger entry for {}", record.detail_url);
            }
        }

        Self {
            path,
            records: unique,
            urls,
        }
    }

    fn read_records(path: &Path) -> Result<Option<Vec<DetailRecord>>> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ledger_error(path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Some(Vec::new()));
        }

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| ledger_error(path, e))
    }

    /// Appends a record and rewrites the ledger
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The record was appended and persisted
    /// * `Ok(false)` - A record with the same detail URL already exists; nothing changed
    /// * `Err(_)` - The rewrite failed; the in-memory ledger is left unchanged
    pub fn append(&mut self, record: DetailRecord) -> Result<bool> {
        if self.urls.contains(&record.detail_url) {
            tracing::warn!("Refusing duplicate ledger entry for {}", record.detail_url);
            return Ok(false);
        }

        let url = record.detail_url.clone();
        self.records.push(record);

        if let Err(e) = self.persist() {
            self.records.pop();
            return Err(e);
        }

        self.urls.insert(url);
        Ok(true)
    }

    fn persist(&self) -> Result<()> {
        let temp_path = self.temp_path();
        let json = serde_json::to_vec_pretty(&self.records)?;

        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
            fs::rename(&temp_path, &self.path)
        };

        write().map_err(|e| ledger_error(&self.path, e))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Checks whether a detail URL is already recorded
    pub fn contains(&self, detail_url: &str) -> bool {
        self.urls.contains(detail_url)
    }

    /// Returns the URLs of every recorded listing
    pub fn seen_urls(&self) -> impl Iterator<Item = String> + '_ {
        self.records.iter().map(|r| r.detail_url.clone())
    }

    /// Returns the records in insertion order
    pub fn records(&self) -> &[DetailRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn ledger_error(path: &Path, error: impl std::fmt::Display) -> CarfeedError {
    CarfeedError::Ledger {
        path: path.display().to_string(),
        message: error.to_string(),
    }
}
