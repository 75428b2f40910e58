//! Seller block extraction
//!
//! Each seller field is read independently. Revealing the phone number needs a click, and a
//! failed click never costs the other fields.

use crate::config::SelectorConfig;
use crate::models::SellerInfo;
use crate::renderer::Renderer;

/// Extracts the seller block of the current detail page
pub async fn extract_seller(renderer: &mut dyn Renderer, selectors: &SelectorConfig) -> SellerInfo {
    let mut seller = SellerInfo::default();

    if let Some(name) = first_text(renderer, &selectors.seller_company).await {
        seller.company_name = name;
    }
    if let Some(name) = first_text(renderer, &selectors.seller_contact).await {
        seller.contact_name = name;
    }
    if let Some(location) = first_text(renderer, &selectors.seller_location).await {
        seller.location = location;
    }

    seller.phones = reveal_phones(renderer, selectors).await;
    seller
}

async fn first_text(renderer: &mut dyn Renderer, css: &str) -> Option<String> {
    match renderer.query_one(css).await {
        Ok(element) => element.non_empty_text().map(str::to_string),
        Err(e) => {
            tracing::trace!("Seller field '{}' missing: {}", css, e);
            None
        }
    }
}

async fn reveal_phones(renderer: &mut dyn Renderer, selectors: &SelectorConfig) -> Vec<String> {
    if let Err(e) = renderer.click(&selectors.phone_reveal).await {
        tracing::debug!("Phone reveal failed: {}", e);
    }

    let links = match renderer.query_all(&selectors.phone_links).await {
        Ok(links) => links,
        Err(e) => {
            tracing::debug!("Phone links unreadable: {}", e);
            return Vec::new();
        }
    };

    let mut phones: Vec<String> = Vec::new();
    for phone in links.iter().filter_map(|link| link.non_empty_text()) {
        if !phones.iter().any(|p| p == phone) {
            phones.push(phone.to_string());
        }
    }
    phones
}
