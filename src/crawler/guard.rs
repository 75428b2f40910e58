//! Session liveness checks and batch cooldowns

use crate::config::RateLimitConfig;
use crate::renderer::Renderer;
use std::time::Duration;

/// Guards detail visits against dead sessions and paces batches
#[derive(Debug, Clone)]
pub struct SessionGuard {
    cooldown: Duration,
}

impl SessionGuard {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            cooldown: Duration::from_secs(config.cooldown_secs),
        }
    }

    /// Cheaply checks that the renderer session still answers
    pub async fn is_alive(&self, renderer: &mut dyn Renderer) -> bool {
        session_alive(renderer).await
    }

    /// Blocks for the configured cooldown
    pub async fn cooldown(&self) {
        if self.cooldown.is_zero() {
            return;
        }
        tracing::info!(
            cooldown_secs = self.cooldown.as_secs(),
            "Batch complete, cooling down"
        );
        tokio::time::sleep(self.cooldown).await;
    }
}

/// Checks that the renderer session still answers, before any navigation
pub async fn session_alive(renderer: &mut dyn Renderer) -> bool {
    match renderer.current_url().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Renderer session unusable: {}", e);
            false
        }
    }
}
