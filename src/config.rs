use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::errors::AppError;
use crate::external::json_source::Endpoint;
use crate::external::{alternative_me, gold_api};
use crate::services::indicator_service::{EndpointSet, FxSource};

pub const DEFAULT_SNAPSHOT_PATH: &str = "data/latest.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_LOCK_STALE_SECS: u64 = 900;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub snapshot_path: PathBuf,
    pub timeout: Duration,
    pub user_agent: String,
    pub lock_stale_after: Duration,
    pub endpoints: EndpointSet,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source. Unset and blank
    /// values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let fx_source = match get("FX_SOURCE") {
            Some(raw) => raw.parse::<FxSource>().map_err(AppError::Config)?,
            None => FxSource::default(),
        };

        let endpoint = |name: &'static str, prefix: &str, default_url: &str| -> Result<Endpoint, AppError> {
            let url = get(format!("{}_URL", prefix).as_str()).unwrap_or_else(|| default_url.to_string());
            let headers = match get(format!("{}_HEADERS", prefix).as_str()) {
                Some(raw) => parse_headers(&raw)
                    .map_err(|e| AppError::Config(format!("{}_HEADERS: {}", prefix, e)))?,
                None => HeaderMap::new(),
            };
            Endpoint::new(name, &url, headers).map_err(AppError::from)
        };

        let endpoints = EndpointSet {
            gold: endpoint("gold", "GOLD", gold_api::GOLD_URL)?,
            silver: endpoint("silver", "SILVER", gold_api::SILVER_URL)?,
            sentiment: endpoint("sentiment", "FNG", alternative_me::FNG_URL)?,
            fx: endpoint("fx", "FX", fx_source.default_url())?,
            fx_source,
        };

        let timeout_secs = parse_secs(get("HTTP_TIMEOUT_SECS"), "HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(AppError::Config("HTTP_TIMEOUT_SECS must be greater than 0".to_string()));
        }

        Ok(Self {
            snapshot_path: get("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
            timeout: Duration::from_secs(timeout_secs),
            user_agent: get("HTTP_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            lock_stale_after: Duration::from_secs(parse_secs(
                get("LOCK_STALE_SECS"),
                "LOCK_STALE_SECS",
                DEFAULT_LOCK_STALE_SECS,
            )?),
            endpoints,
        })
    }
}

fn parse_secs(raw: Option<String>, key: &str, default: u64) -> Result<u64, AppError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| AppError::Config(format!("{} must be a whole number of seconds, got '{}'", key, raw))),
        None => Ok(default),
    }
}

/// Parses `name: value; name2: value2` into a header map.
pub fn parse_headers(raw: &str) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();

    for pair in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, value) = pair
            .split_once(':')
            .ok_or_else(|| format!("expected 'name: value', got '{}'", pair))?;

        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| format!("invalid header name '{}': {}", name.trim(), e))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| format!("invalid value for header '{}': {}", name, e))?;

        headers.insert(name, value);
    }

    Ok(headers)
}
