use serde_json::Value;
use tracing::{debug, warn};

use crate::external::json_source::{Endpoint, IndicatorError, JsonSource};

/// GET `endpoint` and run `extract` over the JSON body.
///
/// Every failure, from a refused connection to a body of the wrong shape,
/// ends in `None` plus a warning. Callers fall back to the previous snapshot.
pub async fn fetch_or_none<T, F>(source: &dyn JsonSource, endpoint: &Endpoint, extract: F) -> Option<T>
where
    F: FnOnce(&Value) -> Result<T, IndicatorError>,
{
    let body = match source.get_json(endpoint).await {
        Ok(body) => body,
        Err(e) => {
            warn!("⚠️ Fetch failed for {} ({}): {}", endpoint.name, endpoint.url, e);
            return None;
        }
    };

    match extract(&body) {
        Ok(value) => {
            debug!("✓ Fetched {} from {}", endpoint.name, endpoint.url);
            Some(value)
        }
        Err(e) => {
            warn!("⚠️ Could not read {} from {}: {}", endpoint.name, endpoint.url, e);
            None
        }
    }
}
