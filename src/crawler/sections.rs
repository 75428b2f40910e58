//! Generic definition-list section scraper
//!
//! Every detail section is a `<dl>` of `<dt>` label / `<dd>` value pairs under a known anchor.
//! One scraper handles all five sections, parameterized by the section's expected labels.

use crate::models::{SectionMap, SectionSpec};
use crate::renderer::{ElementSnapshot, Renderer};
use std::time::Duration;

/// Scrapes one section into a closed mapping
///
/// The mapping starts with every expected key set to the sentinel. Entries are only
/// overwritten for page labels the section expects; a section that never renders keeps its
/// seeded mapping.
pub async fn scrape_section(
    renderer: &mut dyn Renderer,
    spec: &SectionSpec,
    timeout: Duration,
) -> SectionMap {
    let mut map = SectionMap::seeded(spec);
    let list_css = format!("#{} dl", spec.anchor_id);

    if let Err(e) = renderer.wait_for_selector(&list_css, timeout).await {
        tracing::debug!("Section {} not rendered: {}", spec.name, e);
        return map;
    }

    match renderer.query_one(&list_css).await {
        Ok(list) => {
            let filled = fill_from_definition_list(&mut map, spec, &list);
            tracing::trace!("Section {}: {} of {} fields", spec.name, filled, map.len());
        }
        Err(e) => tracing::debug!("Section {} vanished: {}", spec.name, e),
    }

    map
}

/// Copies matching `<dt>`/`<dd>` pairs of a definition list into the mapping
///
/// Each `<dd>` pairs with the closest preceding `<dt>`. A `<dt>` without a following `<dd>` is
/// ignored.
///
/// # Returns
///
/// The number of expected fields that were filled
pub fn fill_from_definition_list(
    map: &mut SectionMap,
    spec: &SectionSpec,
    list: &ElementSnapshot,
) -> usize {
    let items = match list.select("dt, dd") {
        Ok(items) => items,
        Err(_) => return 0,
    };

    let mut filled = 0;
    let mut label: Option<String> = None;

    for item in items {
        match item.tag.as_str() {
            "dt" => label = Some(item.text),
            "dd" => {
                let Some(label) = label.take() else { continue };
                if let Some(key) = spec.key_for_label(&label) {
                    if map.fill(key, item.text) {
                        filled += 1;
                    }
                }
            }
            _ => {}
        }
    }

    filled
}
