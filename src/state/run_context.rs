use crate::config::{CrawlerConfig, RateLimitConfig};
use std::collections::HashSet;

/// Crawl-wide mutable state for one pipeline run
///
/// Holds the dedup set (ledger URLs plus everything seen during this run) and the counters
/// that drive the page/record caps and the batch cooldown.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    seen_urls: HashSet<String>,

    /// Listing pages requested so far, including pages that failed to load
    pub pages_visited: u32,

    /// Detail records extracted and persisted this run
    pub new_records: u32,

    /// Detail visits that failed or were skipped by the session guard
    pub detail_failures: u32,

    /// Stubs dropped because their URL was already seen
    pub stubs_skipped: u32,

    records_since_cooldown: u32,
}

impl RunContext {
    /// Creates a context seeded with previously persisted URLs
    pub fn new<I>(seen_urls: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            seen_urls: seen_urls.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Checks whether a detail URL was already seen
    pub fn is_seen(&self, url: &str) -> bool {
        self.seen_urls.contains(url)
    }

    /// Marks a detail URL as seen
    ///
    /// # Returns
    ///
    /// * `true` - The URL was not seen before
    /// * `false` - The URL is a duplicate
    pub fn mark_seen(&mut self, url: &str) -> bool {
        self.seen_urls.insert(url.to_string())
    }

    /// Number of URLs in the dedup set
    pub fn seen_count(&self) -> usize {
        self.seen_urls.len()
    }

    /// Records that a listing page was requested
    pub fn record_page(&mut self) {
        self.pages_visited += 1;
    }

    /// Records a newly persisted detail record
    ///
    /// # Returns
    ///
    /// `true` when this record completes a batch and a cooldown is due.
    pub fn record_new(&mut self, url: &str, rate_limit: &RateLimitConfig) -> bool {
        self.seen_urls.insert(url.to_string());
        self.new_records += 1;
        self.records_since_cooldown += 1;

        if self.records_since_cooldown >= rate_limit.batch_size {
            self.records_since_cooldown = 0;
            return true;
        }
        false
    }

    /// Records a detail visit that produced no record
    pub fn record_detail_failure(&mut self) {
        self.detail_failures += 1;
    }

    /// Records a stub skipped as already seen
    pub fn record_skip(&mut self) {
        self.stubs_skipped += 1;
    }

    /// Checks whether the per-run record cap is reached
    pub fn record_cap_reached(&self, config: &CrawlerConfig) -> bool {
        self.new_records >= config.max_new_records
    }

    /// Checks whether the per-run page cap is reached
    pub fn page_cap_reached(&self, config: &CrawlerConfig) -> bool {
        self.pages_visited >= config.max_pages
    }
}
