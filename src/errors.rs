use std::path::PathBuf;

use thiserror::Error;

use crate::external::json_source::IndicatorError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("Another run holds the lock at {0}")]
    AlreadyRunning(PathBuf),
}

// Fetch failures never reach this layer; the only ones converted here come from
// building endpoints and the HTTP client out of configuration.
impl From<IndicatorError> for AppError {
    fn from(value: IndicatorError) -> Self {
        AppError::Config(value.to_string())
    }
}
