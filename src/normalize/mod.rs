//! Field normalization stage
//!
//! Converts raw detail records from the ledger into typed [`NormalizedRecord`]s, gates them
//! through validation and merges them into the normalized store.
//!
//! # Components
//!
//! - `extract`: best-effort free-text extractors returning `Option`
//! - `policy`: the overridable brand table, fallbacks and ranges
//! - `validate`: the validation gate and its [`RejectionReason`]s

mod extract;
mod policy;
mod validate;

pub use extract::{
    classify_fuel, extract_brand, extract_count, extract_mileage, extract_power_kw,
    extract_price, extract_year, first_number, FUEL_KEYWORDS,
};
pub use policy::{NormalizePolicy, DATA_VERSION, DEFAULT_BRANDS, MAX_YEARS_AHEAD};
pub use validate::{validate, RejectionReason};

use crate::models::{DetailRecord, NormalizedRecord};
use crate::state::StageTally;
use crate::storage::{Ledger, NormalizedStore, ReviewEntry};
use crate::Result;
use chrono::{Datelike, Utc};
use std::collections::HashSet;

/// Projects and validates detail records under one policy
#[derive(Debug, Clone)]
pub struct Normalizer {
    policy: NormalizePolicy,
    reference_year: i32,
}

impl Normalizer {
    /// Creates a normalizer validating years against the current year
    pub fn new(policy: NormalizePolicy) -> Self {
        Self {
            policy,
            reference_year: Utc::now().year(),
        }
    }

    /// Pins the year that registration years are checked against
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    pub fn policy(&self) -> &NormalizePolicy {
        &self.policy
    }

    /// Derives the typed projection of a record without validating it
    ///
    /// The result has `valid` unset.
    pub fn project(&self, record: &DetailRecord) -> NormalizedRecord {
        let policy = &self.policy;
        let sections = &record.sections;
        let history = &sections.vehicle_history;
        let basic = &sections.basic_data;

        NormalizedRecord {
            title: record.title.clone(),
            subtitle: record.subtitle.clone(),
            url: record.detail_url.clone(),

            price_numeric: extract_price(&record.price_text),
            mileage_numeric: history.value("Mileage").and_then(|text| {
                extract_mileage(text, policy.mileage_scale_below, policy.mileage_scale_factor)
            }),
            year_numeric: history.value("First_registration").and_then(extract_year),
            power_kw: sections
                .technical_data
                .value("Power")
                .and_then(extract_power_kw),

            brand: extract_brand(&record.title, &policy.brands).map(str::to_string),
            fuel_type: sections
                .energy_consumption
                .value("Fuel_type")
                .and_then(classify_fuel)
                .unwrap_or(policy.fallback_fuel),

            gearbox: sections.technical_data.value("Gearbox").map(str::to_string),
            first_registration: history.value("First_registration").map(str::to_string),
            seats: basic.value("Seats").and_then(extract_count),
            doors: basic.value("Doors").and_then(extract_count),

            images: record.images.clone(),
            image_count: record.images.len(),
            seller_info: record.seller_info.clone(),
            raw_data: sections.clone(),

            scraped_at: Some(record.scraped_at.unwrap_or_else(Utc::now)),
            source: policy.source.clone(),
            data_version: DATA_VERSION.to_string(),

            valid: false,
        }
    }

    /// Projects a record and passes it through the validation gate
    ///
    /// # Returns
    ///
    /// * `Ok(NormalizedRecord)` - The valid record
    /// * `Err(RejectionReason)` - Why the record needs review
    pub fn normalize(
        &self,
        record: &DetailRecord,
    ) -> std::result::Result<NormalizedRecord, RejectionReason> {
        let mut normalized = self.project(record);
        validate(&normalized, &self.policy, self.reference_year)?;
        normalized.valid = true;
        Ok(normalized)
    }
}

/// Runs the normalize stage
///
/// Every ledger record not yet in the store is normalized, along with review entries whose
/// records are no longer in the ledger. Accepted records are inserted (which clears their
/// review entry); rejected ones are written to the review queue with their reason. A URL
/// already in the store is skipped, so the merge is idempotent.
///
/// # Returns
///
/// Accepted records as successes, rejections as failures, already-stored URLs as skips
pub fn run_normalize<S>(
    ledger: &Ledger,
    store: &mut S,
    normalizer: &Normalizer,
    run_id: i64,
) -> Result<StageTally>
where
    S: NormalizedStore + ?Sized,
{
    let mut tally = StageTally::default();

    let ledger_urls: HashSet<&str> = ledger
        .records()
        .iter()
        .map(|r| r.detail_url.as_str())
        .collect();
    let orphaned: Vec<DetailRecord> = store
        .review_entries()?
        .into_iter()
        .filter(|entry| !ledger_urls.contains(entry.detail_url.as_str()))
        .map(|entry| entry.record)
        .collect();

    tracing::info!(
        ledger = ledger.len(),
        review_only = orphaned.len(),
        "Starting normalization"
    );

    for record in ledger.records().iter().chain(orphaned.iter()) {
        if store.contains(&record.detail_url)? {
            tally.skip();
            continue;
        }

        match normalizer.normalize(record) {
            Ok(normalized) => {
                if store.insert_normalized(&normalized, run_id)? {
                    tracing::debug!("Accepted {}", record.detail_url);
                    tally.success();
                } else {
                    tally.skip();
                }
            }
            Err(reason) => {
                tracing::info!("Needs review: {} ({})", record.detail_url, reason);
                store.flag_for_review(&ReviewEntry {
                    detail_url: record.detail_url.clone(),
                    reason_code: reason.code().to_string(),
                    reason: reason.to_string(),
                    record: record.clone(),
                })?;
                tally.failure();
            }
        }
    }

    tracing::info!(
        accepted = tally.succeeded,
        rejected = tally.failed,
        skipped = tally.skipped,
        "Normalization finished"
    );

    Ok(tally)
}
