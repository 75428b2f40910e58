//! Image gallery extraction
//!
//! The gallery shows one slide at a time; each slide's `<source srcset>` lists the same image at
//! several resolutions. Image URLs look like `.../<image-id>/<W>x<H>.<ext>`, so candidates are
//! grouped by identifier and only the largest rendition of each image is kept.

use crate::config::SelectorConfig;
use crate::renderer::Renderer;
use std::collections::HashMap;
use std::time::Duration;

/// Returns the image identifier: the second-to-last path segment
pub fn image_identifier(url: &str) -> Option<&str> {
    let mut segments = url.rsplit('/');
    segments.next()?;
    segments.next().filter(|id| !id.is_empty())
}

/// Returns width × height parsed from a last path segment shaped `WxH.ext`, or 0
pub fn resolution_score(url: &str) -> u64 {
    let last = url.rsplit('/').next().unwrap_or_default();
    let stem = last.split('.').next().unwrap_or_default();

    match stem.split_once('x') {
        Some((w, h)) => match (w.parse::<u64>(), h.parse::<u64>()) {
            (Ok(w), Ok(h)) => w.saturating_mul(h),
            _ => 0,
        },
        None => 0,
    }
}

/// Splits a `srcset` attribute into its candidate URLs
pub fn srcset_candidates(srcset: &str) -> impl Iterator<Item = &str> {
    srcset
        .split(',')
        .filter_map(|item| item.split_whitespace().next())
}

/// Best-resolution image per identifier, in first-sighting order
#[derive(Debug, Default)]
pub struct ImageSet {
    order: Vec<String>,
    best: HashMap<String, (String, u64)>,
}

impl ImageSet {
    /// Offers a candidate URL
    ///
    /// # Returns
    ///
    /// `true` when the candidate introduced a new identifier
    pub fn offer(&mut self, url: &str) -> bool {
        let Some(id) = image_identifier(url) else {
            return false;
        };
        let score = resolution_score(url);

        match self.best.get_mut(id) {
            Some(best) => {
                if score > best.1 {
                    *best = (url.to_string(), score);
                }
                false
            }
            None => {
                self.order.push(id.to_string());
                self.best.insert(id.to_string(), (url.to_string(), score));
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns at most `cap` URLs in first-sighting order
    pub fn into_urls(mut self, cap: usize) -> Vec<String> {
        self.order
            .iter()
            .take(cap)
            .filter_map(|id| self.best.remove(id).map(|(url, _)| url))
            .collect()
    }
}

/// Walks the gallery and collects up to `max_images` best-resolution image URLs
///
/// Returns an empty list when the gallery's advance control never renders. Stops at the
/// target count, when advancing fails, or when a slide adds no new image.
pub async fn collect_images(
    renderer: &mut dyn Renderer,
    selectors: &SelectorConfig,
    max_images: usize,
    timeout: Duration,
) -> Vec<String> {
    if max_images == 0 {
        return Vec::new();
    }

    if let Err(e) = renderer
        .wait_for_selector(&selectors.gallery_next, timeout)
        .await
    {
        tracing::debug!("No gallery: {}", e);
        return Vec::new();
    }

    let mut images = ImageSet::default();

    for slide in 0..max_images {
        let sources = match renderer.query_all(&selectors.gallery_sources).await {
            Ok(sources) => sources,
            Err(e) => {
                tracing::debug!("Gallery read failed on slide {}: {}", slide, e);
                break;
            }
        };

        let mut added = 0;
        for srcset in sources.iter().filter_map(|s| s.attr("srcset")) {
            for candidate in srcset_candidates(srcset) {
                if images.offer(candidate) {
                    added += 1;
                }
            }
        }

        if images.len() >= max_images {
            break;
        }

        if added == 0 {
            tracing::trace!("Gallery slide {} added no image, stopping", slide);
            break;
        }

        if let Err(e) = renderer.click(&selectors.gallery_next).await {
            tracing::debug!("Gallery advance failed: {}", e);
            break;
        }
    }

    tracing::debug!("Collected {} images", images.len());
    images.into_urls(max_images)
}
