use crate::models::FuelType;
use crate::url::origin_of;
use crate::UrlResult;
use serde::Deserialize;

/// Main configuration structure for Carfeed
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "rate-limit", default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
    pub sync: SyncConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// Listing and detail crawl configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Search results URL; the `page` query parameter is set per page
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Base for resolving relative detail links (defaults to the start URL's origin)
    #[serde(rename = "base-url", default)]
    pub base_url: Option<String>,

    /// Hard cap on result pages visited per run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Hard cap on new detail records extracted per run
    #[serde(rename = "max-new-records", default = "default_max_new_records")]
    pub max_new_records: u32,

    /// Target number of gallery images per record
    #[serde(rename = "max-images", default = "default_max_images")]
    pub max_images: usize,

    /// How long to wait for result cards on a listing page (milliseconds)
    #[serde(rename = "results-timeout-ms", default = "default_results_timeout_ms")]
    pub results_timeout_ms: u64,

    /// How long to wait for each detail section to render (milliseconds)
    #[serde(rename = "section-timeout-ms", default = "default_section_timeout_ms")]
    pub section_timeout_ms: u64,

    /// How long to wait for the image gallery to render (milliseconds)
    #[serde(rename = "gallery-timeout-ms", default = "default_gallery_timeout_ms")]
    pub gallery_timeout_ms: u64,

    /// Pause after navigating to a detail page (milliseconds)
    #[serde(rename = "settle-ms", default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl CrawlerConfig {
    /// Creates a crawler config for `start_url` with every other value at its default
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            base_url: None,
            max_pages: default_max_pages(),
            max_new_records: default_max_new_records(),
            max_images: default_max_images(),
            results_timeout_ms: default_results_timeout_ms(),
            section_timeout_ms: default_section_timeout_ms(),
            gallery_timeout_ms: default_gallery_timeout_ms(),
            settle_ms: default_settle_ms(),
        }
    }

    /// Returns the base URL for relative detail links
    ///
    /// Falls back to the origin of the start URL when `base-url` is not set.
    pub fn resolved_base_url(&self) -> UrlResult<String> {
        match &self.base_url {
            Some(base) => Ok(base.clone()),
            None => origin_of(&self.start_url),
        }
    }
}

/// Request pacing and cooldown configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Number of new records extracted between cooldowns
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: u32,

    /// Length of each cooldown (seconds)
    #[serde(rename = "cooldown-secs", default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

/// Renderer session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "request-timeout-secs", default = "default_renderer_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(rename = "https-only", default)]
    pub https_only: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_renderer_timeout_secs(),
            https_only: false,
        }
    }
}

/// File locations for the ledger and the normalized store
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the JSON detail-record ledger
    #[serde(rename = "ledger-path", default = "default_ledger_path")]
    pub ledger_path: String,

    /// Path to the SQLite database holding normalized records
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ledger_path: default_ledger_path(),
            database_path: default_database_path(),
        }
    }
}

/// Overridable normalization policy values
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizeConfig {
    /// Fuel type assigned when no fuel keyword matches
    #[serde(rename = "fallback-fuel", default = "default_fallback_fuel")]
    pub fallback_fuel: FuelType,

    /// Mileage values below this are treated as abbreviated thousands
    #[serde(rename = "mileage-scale-below", default = "default_mileage_scale")]
    pub mileage_scale_below: u64,

    #[serde(rename = "mileage-scale-factor", default = "default_mileage_scale")]
    pub mileage_scale_factor: u64,

    #[serde(rename = "min-price", default = "default_min_price")]
    pub min_price: u64,

    #[serde(rename = "max-price", default = "default_max_price")]
    pub max_price: u64,

    #[serde(rename = "min-year", default = "default_min_year")]
    pub min_year: i32,

    /// Source tag stamped on every normalized record
    #[serde(default = "default_source")]
    pub source: String,

    /// Known brand tokens; empty means the built-in table
    #[serde(default)]
    pub brands: Vec<BrandEntry>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            fallback_fuel: default_fallback_fuel(),
            mileage_scale_below: default_mileage_scale(),
            mileage_scale_factor: default_mileage_scale(),
            min_price: default_min_price(),
            max_price: default_max_price(),
            min_year: default_min_year(),
            source: default_source(),
            brands: Vec::new(),
        }
    }
}

/// A brand token and the canonical brand name it maps to
#[derive(Debug, Clone, Deserialize)]
pub struct BrandEntry {
    /// Case-insensitive token searched for in listing titles
    pub token: String,

    /// Canonical brand name
    pub name: String,
}

/// Downstream delivery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Per-record ingestion endpoint
    pub endpoint: String,

    /// Endpoint receiving the closing success count
    #[serde(rename = "summary-endpoint")]
    pub summary_endpoint: String,

    /// Pause between consecutive deliveries (milliseconds)
    #[serde(rename = "inter-request-delay-ms", default = "default_inter_request_delay_ms")]
    pub inter_request_delay_ms: u64,

    /// Pause after a connection-level failure (milliseconds)
    #[serde(rename = "connection-cooldown-ms", default = "default_connection_cooldown_ms")]
    pub connection_cooldown_ms: u64,

    #[serde(rename = "request-timeout-secs", default = "default_sync_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Value of the `notify` flag sent with each record
    #[serde(rename = "notify-per-record", default)]
    pub notify_per_record: bool,
}

/// CSS selectors for the marketplace markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    #[serde(rename = "result-card")]
    pub result_card: String,
    #[serde(rename = "card-link")]
    pub card_link: String,
    #[serde(rename = "card-title")]
    pub card_title: String,
    #[serde(rename = "card-price")]
    pub card_price: String,
    #[serde(rename = "consent-accept")]
    pub consent_accept: String,
    #[serde(rename = "gallery-next")]
    pub gallery_next: String,
    #[serde(rename = "gallery-sources")]
    pub gallery_sources: String,
    #[serde(rename = "seller-company")]
    pub seller_company: String,
    #[serde(rename = "seller-contact")]
    pub seller_contact: String,
    #[serde(rename = "seller-location")]
    pub seller_location: String,
    #[serde(rename = "phone-reveal")]
    pub phone_reveal: String,
    #[serde(rename = "phone-links")]
    pub phone_links: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            result_card: "article.cldt-summary-full-item".to_string(),
            card_link: r#"a[href^="/offers/"]"#.to_string(),
            card_title: "h2 span".to_string(),
            card_price: r#"span[class^="CurrentPrice_price"]"#.to_string(),
            consent_accept: "button[class^='_consent-accept']".to_string(),
            gallery_next: "button.image-gallery-right-nav".to_string(),
            gallery_sources: "div.image-gallery-slide picture source".to_string(),
            seller_company: r#"div.RatingsAndCompanyName_dealer__EaECM [data-cs-mask="true"]"#
                .to_string(),
            seller_contact: r#"span[class^="Contact_contactName"]"#.to_string(),
            seller_location: "button.Department_link__xMUEe".to_string(),
            phone_reveal: "#vendor-section-call-button".to_string(),
            phone_links: r#"a[href^="tel:"]"#.to_string(),
        }
    }
}

fn default_max_pages() -> u32 {
    30
}

fn default_max_new_records() -> u32 {
    10
}

fn default_max_images() -> usize {
    15
}

fn default_results_timeout_ms() -> u64 {
    20_000
}

fn default_section_timeout_ms() -> u64 {
    15_000
}

fn default_gallery_timeout_ms() -> u64 {
    20_000
}

fn default_settle_ms() -> u64 {
    2_000
}

fn default_batch_size() -> u32 {
    5
}

fn default_cooldown_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("carfeed/{}", env!("CARGO_PKG_VERSION"))
}

fn default_renderer_timeout_secs() -> u64 {
    30
}

fn default_ledger_path() -> String {
    "output.json".to_string()
}

fn default_database_path() -> String {
    "carfeed.db".to_string()
}

fn default_fallback_fuel() -> FuelType {
    FuelType::Diesel
}

fn default_mileage_scale() -> u64 {
    1_000
}

fn default_min_price() -> u64 {
    100
}

fn default_max_price() -> u64 {
    1_000_000
}

fn default_min_year() -> i32 {
    1990
}

fn default_source() -> String {
    "autoscout24_working_scraper".to_string()
}

fn default_inter_request_delay_ms() -> u64 {
    500
}

fn default_connection_cooldown_ms() -> u64 {
    5_000
}

fn default_sync_timeout_secs() -> u64 {
    60
}
