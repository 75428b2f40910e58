//! Detail page extraction
//!
//! A detail visit produces one [`DetailRecord`]. Only the navigation itself can fail the visit;
//! every section, the gallery and the seller block degrade to sentinels on their own.

use crate::config::{CrawlerConfig, SelectorConfig};
use crate::crawler::gallery::collect_images;
use crate::crawler::sections::scrape_section;
use crate::crawler::seller::extract_seller;
use crate::models::{DetailRecord, ListingStub, ALL_SECTIONS};
use crate::renderer::Renderer;
use crate::RenderResult;
use std::time::Duration;

/// Timing and size limits for one detail visit
#[derive(Debug, Clone)]
pub struct DetailOptions {
    pub settle: Duration,
    pub section_timeout: Duration,
    pub gallery_timeout: Duration,
    pub max_images: usize,
}

impl DetailOptions {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            settle: Duration::from_millis(config.settle_ms),
            section_timeout: Duration::from_millis(config.section_timeout_ms),
            gallery_timeout: Duration::from_millis(config.gallery_timeout_ms),
            max_images: config.max_images,
        }
    }
}

/// Dismisses the consent overlay if one is showing
///
/// Idempotent; an absent overlay is not an error.
pub async fn dismiss_consent(renderer: &mut dyn Renderer, selectors: &SelectorConfig) {
    match renderer.click(&selectors.consent_accept).await {
        Ok(()) => tracing::trace!("Consent overlay dismissed"),
        Err(e) => tracing::trace!("No consent overlay: {}", e),
    }
}

/// Visits a listing's detail page and extracts its record
///
/// # Arguments
///
/// * `renderer` - The renderer session
/// * `stub` - The listing stub whose detail page is visited
/// * `selectors` - Marketplace selectors
/// * `options` - Timeouts and the image target
///
/// # Returns
///
/// * `Ok(DetailRecord)` - The extracted record, with sentinels for anything missing
/// * `Err(RendererError)` - Navigation failed or the session died during the visit
pub async fn extract_detail(
    renderer: &mut dyn Renderer,
    stub: &ListingStub,
    selectors: &SelectorConfig,
    options: &DetailOptions,
) -> RenderResult<DetailRecord> {
    renderer.navigate(&stub.detail_url).await?;

    if !options.settle.is_zero() {
        tokio::time::sleep(options.settle).await;
    }

    dismiss_consent(renderer, selectors).await;

    let mut record = DetailRecord::from_stub(stub);

    for spec in ALL_SECTIONS.iter() {
        let map = scrape_section(renderer, spec, options.section_timeout).await;
        if let Some(slot) = record.sections.section_mut(spec) {
            *slot = map;
        }
    }

    record.images =
        collect_images(renderer, selectors, options.max_images, options.gallery_timeout).await;
    record.seller_info = extract_seller(renderer, selectors).await;

    // A session that died mid-visit leaves only sentinels; such a record must not be persisted
    renderer.current_url().await?;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SectionMap, NOT_AVAILABLE, TECHNICAL_DATA};
    use crate::renderer::fixture::FixtureRenderer;
    use crate::RendererError;

    const URL: &str = "https://www.autoscout24.com/offers/vw-golf-1";

    const DETAIL_PAGE: &str = r#"
        <html><body>
        <button class="_consent-accept_abc">Accept</button>
        <div class="image-gallery-slide"><picture>
            <source srcset="https://img.example/a/250x188.webp 250w, https://img.example/a/720x540.webp 720w">
        </picture></div>
        <button class="image-gallery-right-nav">next</button>
        <div id="basic-details-section"><dl>
            <dt>Body type</dt><dd>Compact</dd>
            <dt>Seats</dt><dd>5</dd>
            <dt>Doors</dt><dd>5</dd>
        </dl></div>
        <div id="listing-history-section"><dl>
            <dt>Mileage</dt><dd>239,000 km</dd>
            <dt>First registration</dt><dd>11/2015</dd>
        </dl></div>
        <div id="environment-details-section"><dl>
            <dt>Fuel type</dt><dd>Diesel</dd>
        </dl></div>
        <span class="Contact_contactName__x1">Jana Berg</span>
        </body></html>
    "#;

    fn stub() -> ListingStub {
        ListingStub {
            title: "Volkswagen Golf".to_string(),
            subtitle: "1.6 TDI".to_string(),
            price_text: "€ 3,950".to_string(),
            detail_url: URL.to_string(),
        }
    }

    fn options() -> DetailOptions {
        DetailOptions {
            settle: Duration::ZERO,
            section_timeout: Duration::ZERO,
            gallery_timeout: Duration::ZERO,
            max_images: 15,
        }
    }

    #[tokio::test]
    async fn test_extracts_full_record() {
        let selectors = SelectorConfig::default();
        let mut renderer = FixtureRenderer::new().with_page(URL, DETAIL_PAGE);

        let record = extract_detail(&mut renderer, &stub(), &selectors, &options())
            .await
            .unwrap();

        assert_eq!(record.title, "Volkswagen Golf");
        assert_eq!(record.price_text, "€ 3,950");
        assert_eq!(record.sections.basic_data.value("Body_type"), Some("Compact"));
        assert_eq!(record.sections.vehicle_history.value("Mileage"), Some("239,000 km"));
        assert_eq!(record.sections.energy_consumption.value("Fuel_type"), Some("Diesel"));
        assert_eq!(record.images, vec!["https://img.example/a/720x540.webp"]);
        assert_eq!(record.seller_info.contact_name, "Jana Berg");
        assert_eq!(record.seller_info.company_name, NOT_AVAILABLE);
        assert!(record.scraped_at.is_some());
    }

    #[tokio::test]
    async fn test_missing_section_is_seeded() {
        let selectors = SelectorConfig::default();
        let mut renderer = FixtureRenderer::new().with_page(URL, DETAIL_PAGE);

        let record = extract_detail(&mut renderer, &stub(), &selectors, &options())
            .await
            .unwrap();

        assert_eq!(record.sections.technical_data, SectionMap::seeded(&TECHNICAL_DATA));
        assert!(!record.sections.colour_and_upholstery.is_empty());
    }

    #[tokio::test]
    async fn test_consent_is_clicked() {
        let selectors = SelectorConfig::default();
        let mut renderer = FixtureRenderer::new().with_page(URL, DETAIL_PAGE);

        extract_detail(&mut renderer, &stub(), &selectors, &options())
            .await
            .unwrap();

        assert_eq!(renderer.clicks[0], selectors.consent_accept);
    }

    #[tokio::test]
    async fn test_navigation_failure_fails_visit() {
        let selectors = SelectorConfig::default();
        let mut renderer = FixtureRenderer::new();

        let result = extract_detail(&mut renderer, &stub(), &selectors, &options()).await;
        assert!(matches!(result, Err(RendererError::Navigation { .. })));
    }

    #[tokio::test]
    async fn test_dead_session_fails_visit() {
        let selectors = SelectorConfig::default();
        let mut renderer = FixtureRenderer::new().with_dead_url(URL);

        let result = extract_detail(&mut renderer, &stub(), &selectors, &options()).await;
        assert!(matches!(result, Err(RendererError::SessionLost)));
    }
}
