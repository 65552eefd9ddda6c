/// End-to-end tests for the fetch, merge and persist pipeline.
///
/// The HTTP side is replaced by a scripted `JsonSource`; storage is the real
/// `JsonFileStore` in a temporary directory. No network access is needed.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use market_snapshot::config::AppConfig;
use market_snapshot::external::json_source::{Endpoint, IndicatorError, JsonSource};
use market_snapshot::jobs::snapshot_job::{run_snapshot_job, JobContext};
use chrono::{DateTime, TimeZone, Utc};
use market_snapshot::models::{PriorSnapshot, Sentiment};
use market_snapshot::services::merge_service::load_previous;
use market_snapshot::store::{JsonFileStore, MemoryStore, SnapshotStore};
use serde_json::{json, Value};
use tempfile::tempdir;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Replies by endpoint name. Missing names fail with the stored error.
struct ScriptedSource {
    replies: HashMap<&'static str, Value>,
    failure: fn() -> IndicatorError,
}

impl ScriptedSource {
    fn new(replies: &[(&'static str, Value)]) -> Self {
        Self {
            replies: replies.iter().cloned().collect(),
            failure: || IndicatorError::BadStatus(503),
        }
    }

    fn failing_with(failure: fn() -> IndicatorError) -> Self {
        Self {
            replies: HashMap::new(),
            failure,
        }
    }
}

#[async_trait]
impl JsonSource for ScriptedSource {
    async fn get_json(&self, endpoint: &Endpoint) -> Result<Value, IndicatorError> {
        self.replies
            .get(endpoint.name)
            .cloned()
            .ok_or_else(|| (self.failure)())
    }
}

fn context(source: ScriptedSource, store: Arc<dyn SnapshotStore>) -> JobContext {
    let config = AppConfig::from_lookup(|_| None).unwrap();
    JobContext {
        source: Arc::new(source),
        store,
        endpoints: Arc::new(config.endpoints),
    }
}

fn gold(price: f64) -> (&'static str, Value) {
    ("gold", json!({"name": "Gold", "price": price, "symbol": "XAU"}))
}

fn silver(price: f64) -> (&'static str, Value) {
    ("silver", json!({"name": "Silver", "price": price, "symbol": "XAG"}))
}

fn sentiment(value: u8, classification: &str) -> (&'static str, Value) {
    (
        "sentiment",
        json!({"data": [{"value": value.to_string(), "value_classification": classification}]}),
    )
}

fn fx(rate: f64) -> (&'static str, Value) {
    ("fx", json!({"chart": {"result": [{"meta": {"regularMarketPrice": rate}}], "error": null}}))
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_mixed_run_falls_back_per_field() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data").join("latest.json");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        &path,
        r#"{"ts":"2024-01-01T00:00:00Z","xauusd":2400,"xagusd":28.5,"fng":{"value":50,"classification":"Neutral"},"usd_thb":35.0}"#,
    )
    .unwrap();

    let source = ScriptedSource::new(&[gold(2410.0), sentiment(60, "Greed")]);
    let ctx = context(source, Arc::new(JsonFileStore::new(&path)));

    let result = run_snapshot_job(&ctx).await.unwrap();

    assert_eq!(result.fetched, 2);
    assert_eq!(result.carried_forward, 2);

    let written = read_json(&path);
    assert_eq!(written["xauusd"], 2410.0);
    assert_eq!(written["xagusd"], 28.5);
    assert_eq!(written["fng"], json!({"value": 60, "classification": "Greed"}));
    assert_eq!(written["usd_thb"], 35.0);
    let written_ts = DateTime::parse_from_rfc3339(written["ts"].as_str().unwrap()).unwrap();
    assert!(written_ts > Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(written.as_object().unwrap().len(), 5);
}

#[tokio::test]
async fn test_every_endpoint_failure_mode_yields_null_not_error() {
    let failures: [fn() -> IndicatorError; 4] = [
        || IndicatorError::Network("connection reset".into()),
        || IndicatorError::Timeout,
        || IndicatorError::BadStatus(429),
        || IndicatorError::Decode("expected value at line 1 column 1".into()),
    ];

    for failure in failures {
        let store = MemoryStore::new();
        let ctx = context(ScriptedSource::failing_with(failure), Arc::new(store.clone()));

        let result = run_snapshot_job(&ctx).await.unwrap();

        assert_eq!(result.missing, 4);
        let saved = store.current().unwrap();
        assert_eq!(saved.xauusd, None);
        assert_eq!(saved.xagusd, None);
        assert_eq!(saved.fng, None);
        assert_eq!(saved.usd_thb, None);
    }
}

#[tokio::test]
async fn test_first_run_without_file_writes_nulls_for_failures() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fresh").join("latest.json");

    let source = ScriptedSource::new(&[gold(2410.0), silver(29.0), fx(36.2)]);
    let ctx = context(source, Arc::new(JsonFileStore::new(&path)));

    run_snapshot_job(&ctx).await.unwrap();

    let written = read_json(&path);
    assert!(written["fng"].is_null());
    assert_eq!(written["usd_thb"], 36.2);
}

#[tokio::test]
async fn test_corrupt_previous_file_is_treated_as_first_run() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("latest.json");
    fs::write(&path, "<html>502 Bad Gateway</html>").unwrap();

    let ctx = context(ScriptedSource::new(&[gold(2410.0)]), Arc::new(JsonFileStore::new(&path)));

    let result = run_snapshot_job(&ctx).await.unwrap();

    assert_eq!(result.fetched, 1);
    assert_eq!(result.missing, 3);
    assert_eq!(read_json(&path)["xauusd"], 2410.0);
}

#[tokio::test]
async fn test_sequential_runs_have_strictly_increasing_timestamps() {
    let dir = tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("latest.json")));

    let first = run_snapshot_job(&context(ScriptedSource::new(&[gold(2400.0)]), store.clone()))
        .await
        .unwrap();
    let second = run_snapshot_job(&context(ScriptedSource::new(&[]), store.clone()))
        .await
        .unwrap();

    assert!(second.snapshot.ts > first.snapshot.ts);
    assert_eq!(second.snapshot.xauusd, Some(2400.0));
}

#[tokio::test]
async fn test_persisted_snapshot_reads_back_unchanged() {
    let dir = tempdir().unwrap();
    let store = Arc::new(JsonFileStore::new(dir.path().join("latest.json")));
    let source = ScriptedSource::new(&[gold(2450.5), silver(28.123456789), sentiment(8, "Extreme Fear"), fx(31.282)]);

    let result = run_snapshot_job(&context(source, store.clone())).await.unwrap();
    let reread = load_previous(store.as_ref()).unwrap();

    assert_eq!(reread, PriorSnapshot::from(result.snapshot.clone()));
    assert_eq!(reread.xagusd, Some(28.123456789));
    assert_eq!(reread.fng, Some(Sentiment { value: 8, classification: "Extreme Fear".to_string() }));
}

#[tokio::test]
async fn test_previous_file_without_ts_still_supplies_fallbacks() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("latest.json");
    fs::write(&path, r#"{"xauusd":2400,"xagusd":28.5,"fng":{"value":null,"classification":"Neutral"},"usd_thb":35.0}"#)
        .unwrap();

    let source = ScriptedSource::new(&[gold(2410.0)]);
    let result = run_snapshot_job(&context(source, Arc::new(JsonFileStore::new(&path)))).await.unwrap();

    let written = read_json(&path);
    assert_eq!(written["xauusd"], 2410.0);
    assert_eq!(written["xagusd"], 28.5);
    assert_eq!(written["usd_thb"], 35.0);
    assert!(written["fng"].is_null());
    assert_eq!(result.carried_forward, 2);
}

#[tokio::test]
async fn test_previous_dated_in_the_future_does_not_pin_ts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("latest.json");
    fs::write(&path, r#"{"ts":"2099-01-01T00:00:00.000Z","xauusd":2400,"xagusd":null,"fng":null,"usd_thb":null}"#)
        .unwrap();

    let before = Utc::now();
    let result = run_snapshot_job(&context(ScriptedSource::new(&[]), Arc::new(JsonFileStore::new(&path))))
        .await
        .unwrap();

    assert!(result.snapshot.ts < Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap());
    assert!(result.snapshot.ts >= before - chrono::Duration::seconds(1));
    assert_eq!(result.snapshot.xauusd, Some(2400.0));
}
