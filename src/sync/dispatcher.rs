//! Per-record HTTP delivery to the ingestion endpoint
//!
//! Records are sent one request at a time. A failed record never stops the pass:
//!
//! | outcome | handling |
//! |---------|----------|
//! | 2xx | delivered |
//! | other status | failure, continue |
//! | connect error, timeout, broken request | failure, connection cooldown, continue |
//!
//! After the pass, one best-effort summary carrying the success count is posted when at least
//! one record was delivered.

use crate::config::SyncConfig;
use crate::models::NormalizedRecord;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Body of one ingestion request
#[derive(Debug, Serialize)]
struct ImportRequest<'a> {
    cars: &'a [NormalizedRecord],
    notify: bool,
}

/// Body of the closing summary notification
#[derive(Debug, Serialize)]
struct SummaryRequest {
    count: u32,
}

/// Result of delivering one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The endpoint answered with a non-success status
    Rejected { status: u16 },
    /// The request never completed
    ConnectionFailed { error: String },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Error text kept for records that were not delivered
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Delivered => None,
            Self::Rejected { status } => Some(format!("HTTP {}", status)),
            Self::ConnectionFailed { error } => Some(error.clone()),
        }
    }
}

/// Outcome of one sync pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub succeeded: u32,
    pub failed: u32,
    /// Detail URLs delivered in this pass, in send order
    pub delivered: Vec<String>,
    /// Detail URLs that failed, with their error
    pub failures: Vec<(String, String)>,
    /// Whether the summary notification was accepted
    pub summary_sent: bool,
}

/// Sends normalized records to the downstream ingestion endpoint
pub struct SyncDispatcher {
    client: Client,
    config: SyncConfig,
}

impl SyncDispatcher {
    /// Builds a dispatcher with its own HTTP client
    pub fn new(config: &SyncConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(format!("carfeed/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Delivers one record
    pub async fn deliver(&self, record: &NormalizedRecord) -> DeliveryOutcome {
        let body = ImportRequest {
            cars: std::slice::from_ref(record),
            notify: self.config.notify_per_record,
        };

        match self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => DeliveryOutcome::Delivered,
            Ok(response) => DeliveryOutcome::Rejected {
                status: response.status().as_u16(),
            },
            Err(e) => DeliveryOutcome::ConnectionFailed {
                error: e.to_string(),
            },
        }
    }

    /// Delivers every record in order, then posts the summary
    ///
    /// Never fails: each record's outcome lands in the returned summary.
    pub async fn sync(&self, records: &[NormalizedRecord]) -> SyncSummary {
        let mut summary = SyncSummary::default();
        let delay = Duration::from_millis(self.config.inter_request_delay_ms);
        let cooldown = Duration::from_millis(self.config.connection_cooldown_ms);

        tracing::info!(records = records.len(), "Starting sync");

        for (index, record) in records.iter().enumerate() {
            let outcome = self.deliver(record).await;

            match &outcome {
                DeliveryOutcome::Delivered => {
                    tracing::debug!("Delivered {}", record.url);
                    summary.succeeded += 1;
                    summary.delivered.push(record.url.clone());
                }
                DeliveryOutcome::Rejected { status } => {
                    tracing::warn!("Endpoint rejected {} with HTTP {}", record.url, status);
                    summary.failed += 1;
                }
                DeliveryOutcome::ConnectionFailed { error } => {
                    tracing::warn!(
                        cooldown_ms = cooldown.as_millis() as u64,
                        "Delivery of {} failed: {}",
                        record.url,
                        error
                    );
                    summary.failed += 1;
                    if !cooldown.is_zero() {
                        tokio::time::sleep(cooldown).await;
                    }
                }
            }

            if let Some(error) = outcome.error_message() {
                summary.failures.push((record.url.clone(), error));
            }

            if index + 1 < records.len() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        if summary.succeeded > 0 {
            summary.summary_sent = self.send_summary(summary.succeeded).await;
        }

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            summary_sent = summary.summary_sent,
            "Sync finished"
        );

        summary
    }

    /// Posts the success count; failures are logged and reported as `false`
    pub async fn send_summary(&self, count: u32) -> bool {
        let result = self
            .client
            .post(&self.config.summary_endpoint)
            .json(&SummaryRequest { count })
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => {
                tracing::info!(count, "Summary notification sent");
                true
            }
            Err(e) => {
                tracing::warn!("Summary notification failed: {}", e);
                false
            }
        }
    }
}
