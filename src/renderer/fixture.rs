//! In-memory renderer serving canned HTML per URL, for crawler tests

use crate::renderer::snapshot::{query_document, ElementSnapshot};
use crate::renderer::Renderer;
use crate::{RenderResult, RendererError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

#[derive(Default)]
pub(crate) struct FixtureRenderer {
    pages: HashMap<String, String>,
    current: Option<(String, String)>,
    /// Bodies swapped in, in order, each time the selector is clicked
    transitions: HashMap<String, VecDeque<String>>,
    broken_clicks: HashSet<String>,
    dead_urls: HashSet<String>,
    session_dead: bool,
    pub navigations: Vec<String>,
    pub clicks: Vec<String>,
}

impl FixtureRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_transition(mut self, css: &str, html: &str) -> Self {
        self.transitions
            .entry(css.to_string())
            .or_default()
            .push_back(html.to_string());
        self
    }

    pub fn with_broken_click(mut self, css: &str) -> Self {
        self.broken_clicks.insert(css.to_string());
        self
    }

    /// Navigating to `url` kills the session
    pub fn with_dead_url(mut self, url: &str) -> Self {
        self.dead_urls.insert(url.to_string());
        self
    }

    pub fn kill_session(&mut self) {
        self.session_dead = true;
    }

    fn body(&self) -> RenderResult<&str> {
        if self.session_dead {
            return Err(RendererError::SessionLost);
        }
        self.current
            .as_ref()
            .map(|(_, body)| body.as_str())
            .ok_or(RendererError::SessionLost)
    }
}

#[async_trait]
impl Renderer for FixtureRenderer {
    async fn navigate(&mut self, url: &str) -> RenderResult<()> {
        if self.session_dead {
            return Err(RendererError::SessionLost);
        }
        self.navigations.push(url.to_string());
        if self.dead_urls.contains(url) {
            self.session_dead = true;
            return Err(RendererError::SessionLost);
        }
        match self.pages.get(url) {
            Some(body) => {
                self.current = Some((url.to_string(), body.clone()));
                Ok(())
            }
            None => Err(RendererError::Navigation {
                url: url.to_string(),
                message: "HTTP 404".to_string(),
            }),
        }
    }

    async fn wait_for_selector(&mut self, css: &str, timeout: Duration) -> RenderResult<()> {
        if query_document(self.body()?, css)?.is_empty() {
            return Err(RendererError::Timeout {
                selector: css.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn query_all(&mut self, css: &str) -> RenderResult<Vec<ElementSnapshot>> {
        query_document(self.body()?, css)
    }

    async fn query_one(&mut self, css: &str) -> RenderResult<ElementSnapshot> {
        query_document(self.body()?, css)?
            .into_iter()
            .next()
            .ok_or_else(|| RendererError::ElementNotFound(css.to_string()))
    }

    async fn click(&mut self, css: &str) -> RenderResult<()> {
        self.query_one(css).await?;
        self.clicks.push(css.to_string());
        if self.broken_clicks.contains(css) {
            return Err(RendererError::ElementNotFound(css.to_string()));
        }
        if let Some(next) = self.transitions.get_mut(css).and_then(VecDeque::pop_front) {
            if let Some((_, body)) = self.current.as_mut() {
                *body = next;
            }
        }
        Ok(())
    }

    async fn evaluate_script(&mut self, _script: &str) -> RenderResult<serde_json::Value> {
        self.body()?;
        Ok(serde_json::Value::Null)
    }

    async fn current_url(&mut self) -> RenderResult<String> {
        if self.session_dead {
            return Err(RendererError::SessionLost);
        }
        Ok(self
            .current
            .as_ref()
            .map(|(url, _)| url.clone())
            .unwrap_or_else(|| "about:blank".to_string()))
    }
}
