//! Renderer adapter boundary
//!
//! The crawler never talks to a browser directly. It drives a [`Renderer`]: a stateful,
//! single-navigable page session exposing navigation and query primitives. Queried elements
//! come back as owned [`ElementSnapshot`]s that can be sub-queried with CSS.
//!
//! [`StaticRenderer`] is the bundled adapter. It fetches pages over HTTP and answers queries
//! against the returned markup, which is enough for server-rendered listing pages and for
//! testing against mock servers.

#[cfg(test)]
pub(crate) mod fixture;
mod snapshot;
mod static_page;

pub use snapshot::{query_document, ElementSnapshot};
pub use static_page::StaticRenderer;

use crate::RenderResult;
use async_trait::async_trait;
use std::time::Duration;

/// Navigation and query primitives over one page session
///
/// Implementations hold exactly one current page. Every method acts on that page, so callers
/// must not interleave sessions.
#[async_trait]
pub trait Renderer: Send {
    /// Loads `url` as the current page
    async fn navigate(&mut self, url: &str) -> RenderResult<()>;

    /// Waits until at least one element matches `css`, or fails with a timeout
    async fn wait_for_selector(&mut self, css: &str, timeout: Duration) -> RenderResult<()>;

    /// Returns every element matching `css`, in document order
    async fn query_all(&mut self, css: &str) -> RenderResult<Vec<ElementSnapshot>>;

    /// Returns the first element matching `css`, or `ElementNotFound`
    async fn query_one(&mut self, css: &str) -> RenderResult<ElementSnapshot>;

    /// Clicks the first element matching `css`
    async fn click(&mut self, css: &str) -> RenderResult<()>;

    /// Runs a script in the page and returns its JSON result
    async fn evaluate_script(&mut self, script: &str) -> RenderResult<serde_json::Value>;

    /// URL of the current page; failing here means the session is gone
    async fn current_url(&mut self) -> RenderResult<String>;
}
