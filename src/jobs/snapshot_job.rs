//! Market Snapshot Job
//!
//! One pass of the fetch, merge and persist pipeline. The binary runs it once
//! per process; an external scheduler (cron, systemd timer, CI schedule)
//! decides how often.
//!
//! # Processing Strategy
//!
//! 1. Fetch gold, silver, sentiment and FX concurrently
//! 2. Read the previous snapshot from the store
//! 3. Fill every failed fetch with the previous value
//! 4. Replace the stored snapshot with the merged one
//!
//! # Error Handling
//!
//! - Individual fetch failures don't stop the job
//! - An unreadable previous snapshot is treated as a first run
//! - Only a failed write is returned as an error

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::errors::AppError;
use crate::external::json_source::JsonSource;
use crate::models::Snapshot;
use crate::services::indicator_service::{fetch_indicators, EndpointSet};
use crate::services::merge_service::{self, FieldSource};
use crate::store::SnapshotStore;

// Context passed to the job
#[derive(Clone)]
pub struct JobContext {
    pub source: Arc<dyn JsonSource>,
    pub store: Arc<dyn SnapshotStore>,
    pub endpoints: Arc<EndpointSet>,
}

#[derive(Debug, Clone)]
pub struct JobResult {
    pub snapshot: Snapshot,
    pub fetched: usize,
    pub carried_forward: usize,
    pub missing: usize,
}

pub async fn run_snapshot_job(ctx: &JobContext) -> Result<JobResult, AppError> {
    let started_at = Utc::now();
    info!("🚀 Starting market snapshot job");

    let fetched = fetch_indicators(ctx.source.as_ref(), &ctx.endpoints).await;
    let previous = merge_service::load_previous(ctx.store.as_ref());
    let outcome = merge_service::merge(fetched, previous.as_ref(), started_at);

    ctx.store.save(&outcome.snapshot).map_err(|e| {
        error!("❌ Failed to persist snapshot: {}", e);
        AppError::Storage(e)
    })?;

    let result = JobResult {
        fetched: outcome.count(FieldSource::Fetched),
        carried_forward: outcome.count(FieldSource::CarriedForward),
        missing: outcome.count(FieldSource::Missing),
        snapshot: outcome.snapshot,
    };

    info!(
        "✅ Snapshot {} written: xauusd={:?} ({:?}), xagusd={:?} ({:?}), fng={:?} ({:?}), usd_thb={:?} ({:?})",
        result.snapshot.ts,
        result.snapshot.xauusd,
        outcome.xauusd,
        result.snapshot.xagusd,
        outcome.xagusd,
        result.snapshot.fng,
        outcome.fng,
        result.snapshot.usd_thb,
        outcome.usd_thb,
    );

    Ok(result)
}
