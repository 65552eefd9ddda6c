//! open.er-api.com currency-pair lookup.
//!
//! Alternative USD -> THB source, selected with `FX_SOURCE=open_er_api`.
//! Rates refresh once a day, so they lag the live market the Yahoo source tracks.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::external::json_source::IndicatorError;
use crate::external::numeric::Numeric;

pub const USD_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    result: Option<String>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    rates: Option<HashMap<String, Numeric>>,
}

/// `rates.THB` from the latest USD table.
pub fn extract_thb_rate(body: &Value) -> Result<f64, IndicatorError> {
    let response = LatestRatesResponse::deserialize(body)
        .map_err(|e| IndicatorError::Extract(e.to_string()))?;

    if let Some(result) = response.result.as_deref() {
        if result != "success" {
            return Err(IndicatorError::Extract(format!(
                "result={} ({})",
                result,
                response.error_type.as_deref().unwrap_or("unknown error")
            )));
        }
    }

    response
        .rates
        .as_ref()
        .and_then(|rates| rates.get("THB"))
        .ok_or_else(|| IndicatorError::Extract("missing rates.THB".into()))?
        .positive("rates.THB")
}
