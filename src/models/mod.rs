mod snapshot;

pub use snapshot::{
    is_from_future, next_timestamp, FetchedIndicators, PriorSnapshot, Sentiment, Snapshot,
    CLOCK_TOLERANCE_MS,
};
