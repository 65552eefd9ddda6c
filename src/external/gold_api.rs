//! gold-api.com spot prices (XAU, XAG). Free, no API key required.

use serde::Deserialize;
use serde_json::Value;

use crate::external::json_source::IndicatorError;
use crate::external::numeric::Numeric;

pub const GOLD_URL: &str = "https://api.gold-api.com/price/XAU";
pub const SILVER_URL: &str = "https://api.gold-api.com/price/XAG";

// The API answers `{"name": "Gold", "price": 2400.1, "symbol": "XAU", ...}`,
// but a bare number body is accepted as well.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SpotPriceBody {
    Wrapped { price: Numeric },
    Bare(Numeric),
}

/// Spot price in USD per troy ounce.
pub fn extract_spot_price(body: &Value) -> Result<f64, IndicatorError> {
    let parsed = SpotPriceBody::deserialize(body)
        .map_err(|_| IndicatorError::Extract("no numeric price in body".into()))?;

    match parsed {
        SpotPriceBody::Wrapped { price } => price.finite("price"),
        SpotPriceBody::Bare(price) => price.finite("body"),
    }
}
