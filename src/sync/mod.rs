//! Sync stage: delivery of normalized records downstream
//!
//! Each run sends every record the store has not yet delivered. Delivered URLs are marked as
//! synced; the others keep an attempt count and their last error and are retried next run.

mod dispatcher;

pub use dispatcher::{DeliveryOutcome, SyncDispatcher, SyncSummary};

use crate::state::StageTally;
use crate::storage::NormalizedStore;
use crate::Result;

/// Runs the sync stage against the store's pending records
pub async fn run_sync<S>(store: &mut S, dispatcher: &SyncDispatcher) -> Result<StageTally>
where
    S: NormalizedStore + ?Sized,
{
    let pending = store.pending_sync()?;
    if pending.is_empty() {
        tracing::info!("Nothing to sync");
        return Ok(StageTally::default());
    }

    let summary = dispatcher.sync(&pending).await;

    store.mark_synced(&summary.delivered)?;
    for (url, error) in &summary.failures {
        store.record_sync_failure(url, error)?;
    }

    Ok(StageTally {
        succeeded: summary.succeeded,
        failed: summary.failed,
        skipped: 0,
    })
}
