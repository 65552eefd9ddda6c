use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

use crate::models::{is_from_future, next_timestamp, FetchedIndicators, PriorSnapshot, Snapshot};
use crate::store::SnapshotStore;

/// Where a merged field's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Fetched,
    CarriedForward,
    Missing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub snapshot: Snapshot,
    pub xauusd: FieldSource,
    pub xagusd: FieldSource,
    pub fng: FieldSource,
    pub usd_thb: FieldSource,
}

impl MergeOutcome {
    pub fn count(&self, source: FieldSource) -> usize {
        [self.xauusd, self.xagusd, self.fng, self.usd_thb]
            .iter()
            .filter(|s| **s == source)
            .count()
    }
}

/// Previous snapshot, if one can be read. A corrupt or unreadable file counts as none.
pub fn load_previous(store: &dyn SnapshotStore) -> Option<PriorSnapshot> {
    match store.load() {
        Ok(previous) => previous,
        Err(e) => {
            warn!("⚠️ Ignoring previous snapshot: {}", e);
            None
        }
    }
}

fn resolve<T: Clone>(current: Option<T>, previous: Option<&T>) -> (Option<T>, FieldSource) {
    match (current, previous) {
        (Some(value), _) => (Some(value), FieldSource::Fetched),
        (None, Some(prev)) => (Some(prev.clone()), FieldSource::CarriedForward),
        (None, None) => (None, FieldSource::Missing),
    }
}

/// Lay this run's results over the previous snapshot, field by field.
///
/// The timestamp comes from `now`, stepped 1 ms past the previous snapshot's
/// timestamp only when the two coincide.
pub fn merge(fetched: FetchedIndicators, previous: Option<&PriorSnapshot>, now: DateTime<Utc>) -> MergeOutcome {
    let previous_ts = previous.and_then(|p| p.ts);
    if let Some(prev_ts) = previous_ts.filter(|ts| is_from_future(*ts, now)) {
        warn!(
            "⚠️ Previous snapshot is dated {}, ahead of the clock ({}); using the current time",
            prev_ts.to_rfc3339_opts(SecondsFormat::Millis, true),
            now.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
    }
    let ts = next_timestamp(previous_ts, now);

    let (xauusd, xauusd_source) = resolve(fetched.xauusd, previous.and_then(|p| p.xauusd.as_ref()));
    let (xagusd, xagusd_source) = resolve(fetched.xagusd, previous.and_then(|p| p.xagusd.as_ref()));
    let (fng, fng_source) = resolve(fetched.fng, previous.and_then(|p| p.fng.as_ref()));
    let (usd_thb, usd_thb_source) = resolve(fetched.usd_thb, previous.and_then(|p| p.usd_thb.as_ref()));

    MergeOutcome {
        snapshot: Snapshot { ts, xauusd, xagusd, fng, usd_thb },
        xauusd: xauusd_source,
        xagusd: xagusd_source,
        fng: fng_source,
        usd_thb: usd_thb_source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;
    use crate::store::{MemoryStore, StoreError};
    use chrono::{Duration, TimeZone};

    fn previous() -> PriorSnapshot {
        PriorSnapshot::from(Snapshot {
            ts: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            xauusd: Some(2400.0),
            xagusd: Some(28.5),
            fng: Some(Sentiment { value: 50, classification: "Neutral".to_string() }),
            usd_thb: Some(35.0),
        })
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap()
    }

    #[test]
    fn test_failed_fetch_carries_previous_value_forward() {
        let outcome = merge(FetchedIndicators::default(), Some(&previous()), now());

        assert_eq!(outcome.snapshot.xauusd, Some(2400.0));
        assert_eq!(outcome.xauusd, FieldSource::CarriedForward);
        assert_eq!(outcome.count(FieldSource::CarriedForward), 4);
    }

    #[test]
    fn test_fresh_value_overwrites_previous() {
        let fetched = FetchedIndicators { xauusd: Some(2450.5), ..Default::default() };

        let outcome = merge(fetched, Some(&previous()), now());

        assert_eq!(outcome.snapshot.xauusd, Some(2450.5));
        assert_eq!(outcome.xauusd, FieldSource::Fetched);
    }

    #[test]
    fn test_first_run_without_previous_leaves_failures_null() {
        let fetched = FetchedIndicators { xauusd: Some(2410.0), ..Default::default() };

        let outcome = merge(fetched, None, now());

        assert_eq!(outcome.snapshot.fng, None);
        assert_eq!(outcome.fng, FieldSource::Missing);
        assert_eq!(outcome.count(FieldSource::Missing), 3);
        assert_eq!(outcome.snapshot.ts, now());
    }

    #[test]
    fn test_mixed_run_matches_expected_snapshot() {
        let fetched = FetchedIndicators {
            xauusd: Some(2410.0),
            xagusd: None,
            fng: Some(Sentiment { value: 60, classification: "Greed".to_string() }),
            usd_thb: None,
        };

        let outcome = merge(fetched, Some(&previous()), now());

        assert_eq!(
            outcome.snapshot,
            Snapshot {
                ts: now(),
                xauusd: Some(2410.0),
                xagusd: Some(28.5),
                fng: Some(Sentiment { value: 60, classification: "Greed".to_string() }),
                usd_thb: Some(35.0),
            }
        );
    }

    #[test]
    fn test_timestamp_is_refreshed_and_strictly_newer() {
        let prev = previous();

        let outcome = merge(FetchedIndicators::default(), Some(&prev), now());
        assert_eq!(outcome.snapshot.ts, now());

        let same_instant = merge(FetchedIndicators::default(), Some(&prev), prev.ts.unwrap());
        assert!(same_instant.snapshot.ts > prev.ts.unwrap());
    }

    #[test]
    fn test_previous_dated_in_the_future_does_not_pin_the_timestamp() {
        let prev = PriorSnapshot {
            ts: Some(Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap()),
            xauusd: Some(2400.0),
            ..Default::default()
        };
        let run_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let outcome = merge(FetchedIndicators::default(), Some(&prev), run_at);

        assert_eq!(outcome.snapshot.ts, run_at);
        assert_eq!(outcome.snapshot.xauusd, Some(2400.0));
    }

    #[test]
    fn test_previous_without_timestamp_still_supplies_fallbacks() {
        let prev = PriorSnapshot {
            ts: None,
            xagusd: Some(28.5),
            usd_thb: Some(35.0),
            ..Default::default()
        };

        let outcome = merge(FetchedIndicators::default(), Some(&prev), now());

        assert_eq!(outcome.snapshot.ts, now());
        assert_eq!(outcome.snapshot.xagusd, Some(28.5));
        assert_eq!(outcome.snapshot.usd_thb, Some(35.0));
        assert_eq!(outcome.count(FieldSource::CarriedForward), 2);
    }

    #[test]
    fn test_timestamp_is_truncated_to_millis() {
        let precise = now() + Duration::nanoseconds(1_234_567);

        let outcome = merge(FetchedIndicators::default(), None, precise);

        assert_eq!(outcome.snapshot.ts, now() + Duration::milliseconds(1));
    }

    struct Broken;

    impl SnapshotStore for Broken {
        fn load(&self) -> Result<Option<PriorSnapshot>, StoreError> {
            Err(StoreError::Io {
                path: "data/latest.json".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }

        fn save(&self, _snapshot: &Snapshot) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_unreadable_previous_counts_as_none() {
        assert_eq!(load_previous(&Broken), None);
        assert_eq!(load_previous(&MemoryStore::new()), None);

        let stored = Snapshot::empty(now());
        assert_eq!(
            load_previous(&MemoryStore::with_snapshot(stored.clone())),
            Some(PriorSnapshot::from(stored))
        );
    }
}
