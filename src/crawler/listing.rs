//! Search-results pagination and card parsing
//!
//! [`ListingCrawler`] is a lazy, finite sequence of [`ListingStub`]s. It loads one results page
//! at a time, buffers that page's stubs, and only moves on once the buffer is drained, so the
//! renderer is free for detail visits between pages. The sequence can only restart from page 1.

use crate::config::{CrawlerConfig, SelectorConfig};
use crate::crawler::detail::dismiss_consent;
use crate::crawler::guard::session_alive;
use crate::models::{ListingStub, NOT_AVAILABLE};
use crate::renderer::{ElementSnapshot, Renderer};
use crate::state::RunContext;
use crate::url::{build_page_url, resolve_detail_url};
use crate::{RendererError, UrlResult};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

/// Scroll used to trigger lazy hydration of the results list
const HYDRATION_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Lazy paginator over search results
pub struct ListingCrawler<'a> {
    config: &'a CrawlerConfig,
    selectors: &'a SelectorConfig,
    base_url: String,
    next_page: u32,
    buffer: VecDeque<ListingStub>,
    yielded: HashSet<String>,
    exhausted: bool,
}

impl<'a> ListingCrawler<'a> {
    /// Creates a paginator starting at page 1
    pub fn new(config: &'a CrawlerConfig, selectors: &'a SelectorConfig) -> UrlResult<Self> {
        Ok(Self {
            config,
            selectors,
            base_url: config.resolved_base_url()?,
            next_page: 1,
            buffer: VecDeque::new(),
            yielded: HashSet::new(),
            exhausted: false,
        })
    }

    /// Returns the next unseen stub, loading further pages as needed
    ///
    /// Stubs whose URL is in the run context, or was already yielded, are skipped. Returns
    /// `None` once results run out, the page cap is hit, or the session is gone.
    pub async fn next_stub(
        &mut self,
        renderer: &mut dyn Renderer,
        ctx: &mut RunContext,
    ) -> Option<ListingStub> {
        loop {
            while let Some(stub) = self.buffer.pop_front() {
                if ctx.is_seen(&stub.detail_url) || self.yielded.contains(&stub.detail_url) {
                    tracing::debug!("Skipping known listing {}", stub.detail_url);
                    ctx.record_skip();
                    continue;
                }
                self.yielded.insert(stub.detail_url.clone());
                return Some(stub);
            }

            if self.exhausted {
                return None;
            }

            if ctx.page_cap_reached(self.config) {
                tracing::info!("Page cap of {} reached", self.config.max_pages);
                self.exhausted = true;
                return None;
            }

            self.load_page(renderer, ctx).await;
        }
    }

    async fn load_page(&mut self, renderer: &mut dyn Renderer, ctx: &mut RunContext) {
        if !session_alive(renderer).await {
            tracing::error!(
                "Renderer session lost before results page {}, ending crawl",
                self.next_page
            );
            self.exhausted = true;
            return;
        }

        let page = self.next_page;
        self.next_page += 1;
        ctx.record_page();

        let page_url = match build_page_url(&self.config.start_url, page) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Cannot build URL for page {}: {}", page, e);
                self.exhausted = true;
                return;
            }
        };

        tracing::info!("Opening results page {}: {}", page, page_url);

        match renderer.navigate(&page_url).await {
            Ok(()) => {}
            Err(RendererError::SessionLost) => {
                tracing::error!("Renderer session lost on page {}, ending crawl", page);
                self.exhausted = true;
                return;
            }
            Err(e) => {
                tracing::warn!("Skipping results page {}: {}", page, e);
                return;
            }
        }

        dismiss_consent(renderer, self.selectors).await;

        if let Err(e) = renderer.evaluate_script(HYDRATION_SCRIPT).await {
            tracing::trace!("Scroll skipped: {}", e);
        }

        let timeout = Duration::from_millis(self.config.results_timeout_ms);
        if let Err(e) = renderer
            .wait_for_selector(&self.selectors.result_card, timeout)
            .await
        {
            tracing::info!("No results on page {} ({}), ending pagination", page, e);
            self.exhausted = true;
            return;
        }

        let cards = match renderer.query_all(&self.selectors.result_card).await {
            Ok(cards) => cards,
            Err(e) => {
                tracing::warn!("Could not read cards on page {}: {}", page, e);
                return;
            }
        };

        let before = self.buffer.len();
        for card in &cards {
            match parse_card(card, self.selectors, &self.base_url) {
                Some(stub) => self.buffer.push_back(stub),
                None => tracing::warn!("Result card on page {} has no detail link", page),
            }
        }

        tracing::info!(
            page,
            cards = cards.len(),
            stubs = self.buffer.len() - before,
            "Results page parsed"
        );
    }
}

/// Extracts a stub from one result card
///
/// Title, subtitle and price degrade to the sentinel independently. A card without a usable
/// detail link has no key and yields `None`.
pub fn parse_card(
    card: &ElementSnapshot,
    selectors: &SelectorConfig,
    base_url: &str,
) -> Option<ListingStub> {
    let detail_url = card_link(card, selectors, base_url)?;

    let titles = card.select(&selectors.card_title).unwrap_or_default();
    let mut titles = titles.iter().map(|t| t.non_empty_text());

    let title = titles.next().flatten();
    let subtitle = titles.next().flatten();
    let price = card
        .select_one(&selectors.card_price)
        .ok()
        .flatten()
        .and_then(|p| p.non_empty_text().map(str::to_string));

    Some(ListingStub {
        title: title.unwrap_or(NOT_AVAILABLE).to_string(),
        subtitle: subtitle.unwrap_or(NOT_AVAILABLE).to_string(),
        price_text: price.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        detail_url,
    })
}

fn card_link(card: &ElementSnapshot, selectors: &SelectorConfig, base_url: &str) -> Option<String> {
    let link = card.select_one(&selectors.card_link).ok().flatten()?;
    let href = link.attr("href")?;
    match resolve_detail_url(base_url, href) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("Unusable detail link '{}': {}", href, e);
            None
        }
    }
}
