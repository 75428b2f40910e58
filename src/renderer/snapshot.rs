//! Owned element snapshots backed by `scraper`

use crate::{RenderResult, RendererError};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// Detached copy of one element: its tag, visible text, attributes and outer HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSnapshot {
    pub tag: String,
    /// Text content with whitespace runs collapsed to single spaces
    pub text: String,
    pub attributes: BTreeMap<String, String>,
    pub html: String,
}

impl ElementSnapshot {
    fn from_element(element: ElementRef<'_>) -> Self {
        let value = element.value();
        Self {
            tag: value.name().to_string(),
            text: collapse_whitespace(&element.text().collect::<String>()),
            attributes: value
                .attrs()
                .map(|(name, v)| (name.to_string(), v.to_string()))
                .collect(),
            html: element.html(),
        }
    }

    /// Returns an attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the text, or None when it is blank
    pub fn non_empty_text(&self) -> Option<&str> {
        Some(self.text.as_str()).filter(|t| !t.is_empty())
    }

    /// Returns descendants matching `css`, in document order
    pub fn select(&self, css: &str) -> RenderResult<Vec<ElementSnapshot>> {
        let selector = parse_selector(css)?;
        let fragment = Html::parse_fragment(&self.html);
        Ok(fragment
            .select(&selector)
            .map(ElementSnapshot::from_element)
            .collect())
    }

    /// Returns the first descendant matching `css`
    pub fn select_one(&self, css: &str) -> RenderResult<Option<ElementSnapshot>> {
        Ok(self.select(css)?.into_iter().next())
    }
}

/// Runs a CSS query against a whole HTML document
pub fn query_document(html: &str, css: &str) -> RenderResult<Vec<ElementSnapshot>> {
    let selector = parse_selector(css)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .map(ElementSnapshot::from_element)
        .collect())
}

fn parse_selector(css: &str) -> RenderResult<Selector> {
    Selector::parse(css).map_err(|_| RendererError::InvalidSelector(css.to_string()))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
