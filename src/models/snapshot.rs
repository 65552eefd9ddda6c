use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// How far the clock may sit behind the previous snapshot and still count as
/// "the same instant" rather than a bad previous timestamp.
pub const CLOCK_TOLERANCE_MS: i64 = 1_000;

// Represents the Fear & Greed reading at the time of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentiment {
    pub value: u8,              // 0..=100
    pub classification: String, // "Extreme Fear" .. "Extreme Greed"
}

// The single persisted record. Only the latest one is ever kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    #[serde(serialize_with = "serialize_ts")]
    pub ts: DateTime<Utc>,
    pub xauusd: Option<f64>,
    pub xagusd: Option<f64>,
    pub fng: Option<Sentiment>,
    pub usd_thb: Option<f64>,
}

impl Snapshot {
    /// Snapshot with every indicator absent.
    pub fn empty(ts: DateTime<Utc>) -> Self {
        Self {
            ts,
            xauusd: None,
            xagusd: None,
            fng: None,
            usd_thb: None,
        }
    }
}

// What could be read back from a stored snapshot. Each field is judged on its
// own: absent or mistyped fields read as `None` without affecting the others.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PriorSnapshot {
    #[serde(default, deserialize_with = "lenient_ts")]
    pub ts: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient")]
    pub xauusd: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub xagusd: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub fng: Option<Sentiment>,
    #[serde(default, deserialize_with = "lenient")]
    pub usd_thb: Option<f64>,
}

impl PriorSnapshot {
    /// `None` unless `value` is a JSON object.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object()?;
        Self::deserialize(value).ok()
    }
}

impl From<Snapshot> for PriorSnapshot {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            ts: Some(snapshot.ts),
            xauusd: snapshot.xauusd,
            xagusd: snapshot.xagusd,
            fng: snapshot.fng,
            usd_thb: snapshot.usd_thb,
        }
    }
}

/// Timestamp for a new snapshot taken at `now`, truncated to milliseconds (the
/// stored precision).
///
/// `now` is used unless the previous timestamp is equal to it or slightly
/// ahead (within `CLOCK_TOLERANCE_MS`), in which case the result is previous
/// + 1 ms so consecutive snapshots stay strictly ordered. A previous timestamp
/// further ahead is not trusted and `now` is used as is.
pub fn next_timestamp(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = now.trunc_subsecs(3);
    let Some(previous) = previous.map(|ts| ts.trunc_subsecs(3)) else {
        return now;
    };

    if now > previous || previous - now > Duration::milliseconds(CLOCK_TOLERANCE_MS) {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

/// Whether `previous` lies beyond the tolerated clock skew ahead of `now`.
pub fn is_from_future(previous: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    previous.trunc_subsecs(3) - now.trunc_subsecs(3) > Duration::milliseconds(CLOCK_TOLERANCE_MS)
}

// The current run's results. `None` means the fetch failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedIndicators {
    pub xauusd: Option<f64>,
    pub xagusd: Option<f64>,
    pub fng: Option<Sentiment>,
    pub usd_thb: Option<f64>,
}

impl FetchedIndicators {
    pub fn succeeded(&self) -> usize {
        [
            self.xauusd.is_some(),
            self.xagusd.is_some(),
            self.fng.is_some(),
            self.usd_thb.is_some(),
        ]
        .iter()
        .filter(|ok| **ok)
        .count()
    }
}

fn serialize_ts<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

fn lenient_ts<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}
