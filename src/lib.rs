//! Fetches gold, silver, the Fear & Greed index and USD/THB, merges them with
//! the last persisted snapshot, and writes the result back as JSON.

pub mod config;
pub mod errors;
pub mod external;
pub mod jobs;
pub mod logging;
pub mod models;
pub mod services;
pub mod store;
