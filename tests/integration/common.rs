//! Shared fixtures for the integration tests

use carfeed::config::{
    Config, CrawlerConfig, RateLimitConfig, RendererConfig, StorageConfig, SyncConfig,
};
use carfeed::models::{DetailRecord, ListingStub};
use carfeed::normalize::{NormalizePolicy, Normalizer};
use carfeed::NormalizedRecord;
use std::path::Path;
use wiremock::{Request, Respond, ResponseTemplate};

pub const IMPORT_PATH: &str = "/ai/import-cars";
pub const SUMMARY_PATH: &str = "/ai/import-summary";

/// Creates a test configuration against a mock marketplace and ingestion service
pub fn create_test_config(server_uri: &str, dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_pages: 3,
            settle_ms: 0,
            results_timeout_ms: 10,
            section_timeout_ms: 10,
            gallery_timeout_ms: 10,
            ..CrawlerConfig::new(format!("{}/lst", server_uri))
        },
        rate_limit: RateLimitConfig {
            batch_size: 5,
            cooldown_secs: 0,
        },
        renderer: RendererConfig {
            request_timeout_secs: 5,
            ..RendererConfig::default()
        },
        storage: StorageConfig {
            ledger_path: dir.join("output.json").display().to_string(),
            database_path: dir.join("carfeed.db").display().to_string(),
        },
        normalize: Default::default(),
        sync: sync_config(server_uri),
        selectors: Default::default(),
    }
}

/// Sync settings pointing at a mock server, with no pacing
pub fn sync_config(server_uri: &str) -> SyncConfig {
    SyncConfig {
        endpoint: format!("{}{}", server_uri, IMPORT_PATH),
        summary_endpoint: format!("{}{}", server_uri, SUMMARY_PATH),
        inter_request_delay_ms: 0,
        connection_cooldown_ms: 0,
        request_timeout_secs: 5,
        notify_per_record: false,
    }
}

/// A normalized record as the normalize stage would produce it
pub fn normalized_record(url: &str) -> NormalizedRecord {
    let stub = ListingStub {
        title: "Audi A4".to_string(),
        subtitle: "Avant 2.0 TDI".to_string(),
        price_text: "€ 12,500".to_string(),
        detail_url: url.to_string(),
    };
    let mut record =
        Normalizer::new(NormalizePolicy::default()).project(&DetailRecord::from_stub(&stub));
    record.valid = true;
    record
}

/// Results page with one card per slug
pub fn results_page(cards: &[(&str, &str, &str)]) -> String {
    let cards: String = cards
        .iter()
        .map(|(slug, title, price)| {
            format!(
                r#"<article class="cldt-summary-full-item">
                    <a href="/offers/{}?utm_source=results"><h2><span>{}</span><span>Avant</span></h2></a>
                    <span class="CurrentPrice_price__Ekflz">{}</span>
                </article>"#,
                slug, title, price
            )
        })
        .collect();
    format!("<html><body><main>{}</main></body></html>", cards)
}

/// Detail page with history, technical and fuel sections
pub fn detail_page(mileage: &str, registration: &str) -> String {
    format!(
        r#"<html><body>
        <div class="image-gallery-slide"><picture>
            <source srcset="https://img.example/abc/250x188.webp 250w, https://img.example/abc/1280x960.webp 1280w">
        </picture></div>
        <button class="image-gallery-right-nav">next</button>
        <div id="listing-history-section"><dl>
            <dt>Mileage</dt><dd>{}</dd>
            <dt>First registration</dt><dd>{}</dd>
        </dl></div>
        <div id="technical-details-section"><dl>
            <dt>Power</dt><dd>110 kW (150 hp)</dd>
            <dt>Gearbox</dt><dd>Automatic</dd>
        </dl></div>
        <div id="environment-details-section"><dl>
            <dt>Fuel type</dt><dd>Diesel</dd>
        </dl></div>
        <a href="tel:+49301234567">+49 30 1234567</a>
        </body></html>"#,
        mileage, registration
    )
}

/// Answers 500 for import requests carrying the given detail URL, 200 otherwise
pub struct FailFor(pub String);

impl Respond for FailFor {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let failing = request
            .body_json::<serde_json::Value>()
            .ok()
            .and_then(|body| body["cars"][0]["url"].as_str().map(|u| u == self.0))
            .unwrap_or(false);

        if failing {
            ResponseTemplate::new(500)
        } else {
            ResponseTemplate::new(200)
        }
    }
}

/// Requests the mock server received on `path`
pub async fn requests_to(server: &wiremock::MockServer, path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == path)
        .collect()
}
