use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::external::json_source::{Endpoint, IndicatorError, JsonSource};
use crate::external::{alternative_me, gold_api, open_er_api, yahoo};
use crate::models::FetchedIndicators;
use crate::services::fetch_service::fetch_or_none;

/// Which provider answers the USD -> THB lookup. Exactly one is used per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FxSource {
    /// Yahoo Finance chart API, live market rate.
    #[default]
    Yahoo,
    /// open.er-api.com daily currency table.
    OpenErApi,
}

impl FxSource {
    pub fn default_url(&self) -> &'static str {
        match self {
            FxSource::Yahoo => yahoo::USD_THB_CHART_URL,
            FxSource::OpenErApi => open_er_api::USD_RATES_URL,
        }
    }

    fn extract(&self, body: &serde_json::Value) -> Result<f64, IndicatorError> {
        match self {
            FxSource::Yahoo => yahoo::extract_regular_market_price(body),
            FxSource::OpenErApi => open_er_api::extract_thb_rate(body),
        }
    }
}

impl FromStr for FxSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" => Ok(FxSource::Yahoo),
            "open_er_api" | "open-er-api" | "exchangerate" => Ok(FxSource::OpenErApi),
            other => Err(format!(
                "Invalid FX_SOURCE: {}. Must be 'yahoo' or 'open_er_api'",
                other
            )),
        }
    }
}

impl fmt::Display for FxSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FxSource::Yahoo => write!(f, "yahoo"),
            FxSource::OpenErApi => write!(f, "open_er_api"),
        }
    }
}

/// The four endpoints polled on every run.
#[derive(Debug, Clone)]
pub struct EndpointSet {
    pub gold: Endpoint,
    pub silver: Endpoint,
    pub sentiment: Endpoint,
    pub fx: Endpoint,
    pub fx_source: FxSource,
}

/// Fetch all four indicators concurrently and wait for every one to settle.
pub async fn fetch_indicators(source: &dyn JsonSource, endpoints: &EndpointSet) -> FetchedIndicators {
    let fx_source = endpoints.fx_source;

    let (xauusd, xagusd, fng, usd_thb) = tokio::join!(
        fetch_or_none(source, &endpoints.gold, gold_api::extract_spot_price),
        fetch_or_none(source, &endpoints.silver, gold_api::extract_spot_price),
        fetch_or_none(source, &endpoints.sentiment, alternative_me::extract_sentiment),
        fetch_or_none(source, &endpoints.fx, |body| fx_source.extract(body)),
    );

    let fetched = FetchedIndicators { xauusd, xagusd, fng, usd_thb };
    info!("📊 Fetched {}/4 indicators (fx via {})", fetched.succeeded(), fx_source);
    fetched
}
