//! Crawler module for listing discovery and detail extraction
//!
//! This module contains the crawl stage of the pipeline, including:
//! - Search-results pagination and card parsing
//! - Detail page extraction (sections, gallery, seller)
//! - Session liveness checks and batch cooldowns
//!
//! Every new detail record is appended to the ledger as soon as it is extracted.

mod detail;
mod gallery;
mod guard;
mod listing;
mod sections;
mod seller;

pub use detail::{dismiss_consent, extract_detail, DetailOptions};
pub use gallery::{collect_images, image_identifier, resolution_score, ImageSet};
pub use guard::{session_alive, SessionGuard};
pub use listing::{parse_card, ListingCrawler};
pub use sections::{fill_from_definition_list, scrape_section};
pub use seller::extract_seller;

use crate::config::Config;
use crate::renderer::Renderer;
use crate::state::{RunContext, StageTally};
use crate::storage::Ledger;
use crate::Result;

/// Runs the crawl stage
///
/// Pulls unseen stubs from the results pages, extracts each detail page and appends the record
/// to the ledger. Stops at the new-record cap, the page cap, or when results run out.
///
/// # Arguments
///
/// * `renderer` - The renderer session, used for listing and detail pages alike
/// * `config` - The pipeline configuration
/// * `ledger` - The ledger receiving new records
/// * `ctx` - Run state; must already hold the ledger's URLs
///
/// # Returns
///
/// * `Ok(StageTally)` - Records extracted, detail visits failed, stubs skipped as known
/// * `Err(CarfeedError)` - The start URL is unusable or the ledger cannot be written
pub async fn run_crawl(
    renderer: &mut dyn Renderer,
    config: &Config,
    ledger: &mut Ledger,
    ctx: &mut RunContext,
) -> Result<StageTally> {
    let mut listings = ListingCrawler::new(&config.crawler, &config.selectors)?;
    let guard = SessionGuard::new(&config.rate_limit);
    let options = DetailOptions::from_config(&config.crawler);
    let mut tally = StageTally::default();

    tracing::info!(
        known = ctx.seen_count(),
        max_pages = config.crawler.max_pages,
        max_new_records = config.crawler.max_new_records,
        "Starting crawl"
    );

    while !ctx.record_cap_reached(&config.crawler) {
        let stub = match listings.next_stub(renderer, ctx).await {
            Some(stub) => stub,
            None => break,
        };

        if !guard.is_alive(renderer).await {
            tracing::warn!("Skipping {}: session not alive", stub.detail_url);
            ctx.record_detail_failure();
            tally.failure();
            continue;
        }

        tracing::info!("Extracting {}", stub.detail_url);

        let record = match extract_detail(renderer, &stub, &config.selectors, &options).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Detail extraction failed for {}: {}", stub.detail_url, e);
                ctx.record_detail_failure();
                tally.failure();
                continue;
            }
        };

        if !ledger.append(record)? {
            ctx.mark_seen(&stub.detail_url);
            tally.skip();
            continue;
        }

        tally.success();
        tracing::info!(
            total = ledger.len(),
            new = tally.succeeded,
            "Saved {}",
            stub.detail_url
        );

        let cooldown_due = ctx.record_new(&stub.detail_url, &config.rate_limit);
        if cooldown_due && !ctx.record_cap_reached(&config.crawler) {
            guard.cooldown().await;
        }
    }

    tally.skipped += ctx.stubs_skipped;

    tracing::info!(
        pages = ctx.pages_visited,
        new = tally.succeeded,
        failed = tally.failed,
        skipped = tally.skipped,
        "Crawl finished"
    );

    Ok(tally)
}
