//! HTTP-backed renderer over server-rendered markup
//!
//! Pages are fetched with a single GET and kept as text; every query re-parses the stored
//! document with `scraper`. There is no script engine, so markup that only appears after
//! client-side hydration is invisible to this adapter.

use crate::config::RendererConfig;
use crate::renderer::snapshot::{query_document, ElementSnapshot};
use crate::renderer::Renderer;
use crate::{RenderResult, RendererError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

const BLANK_PAGE: &str = "about:blank";

/// A page loaded by [`StaticRenderer`]
#[derive(Debug, Clone)]
struct LoadedPage {
    url: String,
    body: String,
}

/// Renderer that fetches pages over HTTP without executing scripts
pub struct StaticRenderer {
    client: Client,
    page: Option<LoadedPage>,
}

impl StaticRenderer {
    /// Builds a renderer with its own HTTP client
    ///
    /// # Example
    ///
    /// ```no_run
    /// use carfeed::config::RendererConfig;
    /// use carfeed::StaticRenderer;
    ///
    /// let renderer = StaticRenderer::new(&RendererConfig::default()).unwrap();
    /// ```
    pub fn new(config: &RendererConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .https_only(config.https_only)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, page: None })
    }

    fn document(&self) -> RenderResult<&LoadedPage> {
        self.page.as_ref().ok_or(RendererError::SessionLost)
    }
}

#[async_trait]
impl Renderer for StaticRenderer {
    async fn navigate(&mut self, url: &str) -> RenderResult<()> {
        tracing::trace!("GET {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            RendererError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RendererError::Navigation {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let final_url = response.url().to_string();
        let body = response.text().await?;
        self.page = Some(LoadedPage {
            url: final_url,
            body,
        });
        Ok(())
    }

    async fn wait_for_selector(&mut self, css: &str, timeout: Duration) -> RenderResult<()> {
        // Static markup cannot change, so one check decides the outcome
        if self.query_all(css).await?.is_empty() {
            return Err(RendererError::Timeout {
                selector: css.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn query_all(&mut self, css: &str) -> RenderResult<Vec<ElementSnapshot>> {
        let page = self.document()?;
        query_document(&page.body, css)
    }

    async fn query_one(&mut self, css: &str) -> RenderResult<ElementSnapshot> {
        self.query_all(css)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RendererError::ElementNotFound(css.to_string()))
    }

    async fn click(&mut self, css: &str) -> RenderResult<()> {
        // Nothing to activate without a script engine; the target only has to exist
        self.query_one(css).await.map(|_| ())
    }

    async fn evaluate_script(&mut self, _script: &str) -> RenderResult<serde_json::Value> {
        Err(RendererError::Unsupported("evaluate_script"))
    }

    async fn current_url(&mut self) -> RenderResult<String> {
        Ok(self
            .page
            .as_ref()
            .map(|p| p.url.clone())
            .unwrap_or_else(|| BLANK_PAGE.to_string()))
    }
}
