//! alternative.me crypto Fear & Greed index.

use serde::Deserialize;
use serde_json::Value;

use crate::external::json_source::IndicatorError;
use crate::external::numeric::Numeric;
use crate::models::Sentiment;

pub const FNG_URL: &str = "https://api.alternative.me/fng/";

#[derive(Debug, Deserialize)]
struct FngResponse {
    #[serde(default)]
    data: Option<Vec<FngEntry>>,
}

#[derive(Debug, Deserialize)]
struct FngEntry {
    value: Numeric,
    #[serde(default)]
    value_classification: Option<String>,
}

/// Latest reading, i.e. the first entry of `data`.
pub fn extract_sentiment(body: &Value) -> Result<Sentiment, IndicatorError> {
    let response = FngResponse::deserialize(body)
        .map_err(|e| IndicatorError::Extract(e.to_string()))?;

    let entry = response
        .data
        .and_then(|entries| entries.into_iter().next())
        .ok_or_else(|| IndicatorError::Extract("empty data list".into()))?;

    let raw = entry.value.finite("value")?;
    if raw.fract() != 0.0 || !(0.0..=100.0).contains(&raw) {
        return Err(IndicatorError::Extract(format!(
            "value out of range 0-100: {}",
            raw
        )));
    }

    Ok(Sentiment {
        value: raw as u8,
        classification: entry.value_classification.unwrap_or_default(),
    })
}
