use serde::Deserialize;
use serde_json::Value;

use crate::external::json_source::IndicatorError;
use crate::external::numeric::Numeric;

/// USD -> THB spot from the v8 chart API. Tracks the live forex market closely.
pub const USD_THB_CHART_URL: &str =
    "https://query1.finance.yahoo.com/v8/finance/chart/USDTHB=X?interval=1m&range=1d";

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    description: String,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    meta: YahooMeta,
}

#[derive(Debug, Deserialize)]
struct YahooMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<Numeric>,
}

/// `chart.result[0].meta.regularMarketPrice`.
pub fn extract_regular_market_price(body: &Value) -> Result<f64, IndicatorError> {
    let response = YahooChartResponse::deserialize(body)
        .map_err(|e| IndicatorError::Extract(e.to_string()))?;

    if let Some(error) = response.chart.error {
        return Err(IndicatorError::Extract(error.description));
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| IndicatorError::Extract("missing result".into()))?;

    result
        .meta
        .regular_market_price
        .ok_or_else(|| IndicatorError::Extract("missing regularMarketPrice".into()))?
        .positive("regularMarketPrice")
}
