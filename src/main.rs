use std::sync::Arc;

use anyhow::Context;
use market_snapshot::config::AppConfig;
use market_snapshot::errors::AppError;
use market_snapshot::external::json_source::HttpJsonSource;
use market_snapshot::jobs::snapshot_job::{run_snapshot_job, JobContext};
use market_snapshot::logging::{init_logging, LoggingConfig};
use market_snapshot::store::lock::RunLock;
use market_snapshot::store::JsonFileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    let logging = init_logging(LoggingConfig::from_env()).context("failed to initialize logging")?;

    let result = run().await;
    if let Err(e) = &result {
        tracing::error!("❌ Run failed: {:#}", e);
    }

    // flush shipped logs before the runtime goes away
    logging.shutdown().await;
    result
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        "📊 Snapshot path: {}, FX source: {}, timeout: {:?}",
        config.snapshot_path.display(),
        config.endpoints.fx_source,
        config.timeout
    );

    let _lock = RunLock::acquire(
        RunLock::path_for(&config.snapshot_path),
        config.lock_stale_after,
    )
    .context("could not acquire run lock")?;

    let source = HttpJsonSource::new(&config.user_agent, config.timeout)
        .map_err(AppError::from)
        .context("failed to build HTTP client")?;

    let ctx = JobContext {
        source: Arc::new(source),
        store: Arc::new(JsonFileStore::new(&config.snapshot_path)),
        endpoints: Arc::new(config.endpoints),
    };

    let result = run_snapshot_job(&ctx)
        .await
        .with_context(|| format!("failed to write {}", config.snapshot_path.display()))?;

    tracing::info!(
        "Done: {} fetched, {} carried forward, {} missing",
        result.fetched,
        result.carried_forward,
        result.missing
    );

    Ok(())
}
