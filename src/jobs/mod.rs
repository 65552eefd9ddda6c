//! Jobs Module
//!
//! Units of work the binary runs to completion. There is a single job today:
//! `snapshot_job` fetches the market indicators and persists the merged
//! snapshot.

pub mod snapshot_job;
