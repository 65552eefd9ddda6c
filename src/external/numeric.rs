use serde::Deserialize;

use crate::external::json_source::IndicatorError;

/// A JSON number, or a string holding one. Several providers quote their numbers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// Finite value or an extraction error. `NaN` and infinities never get through.
    pub(crate) fn finite(&self, field: &str) -> Result<f64, IndicatorError> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                IndicatorError::Extract(format!("{} is not numeric: {:?}", field, s))
            })?,
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(IndicatorError::Extract(format!("{} is not finite", field)))
        }
    }

    /// Finite and strictly positive. Used for rates where zero means "no quote".
    pub(crate) fn positive(&self, field: &str) -> Result<f64, IndicatorError> {
        let value = self.finite(field)?;
        if value > 0.0 {
            Ok(value)
        } else {
            Err(IndicatorError::Extract(format!("{} is not positive: {}", field, value)))
        }
    }
}
