//! Numeric field extraction from API responses.

use serde_json::Value;

use super::SourceError;

/// Parse `body` and read the number at `pointer` (RFC 6901, e.g. `/current/temperature_2m`).
///
/// Numeric strings such as `"612.5"` are accepted since some sensor APIs quote
/// their values.
pub fn extract_reading(
    body: &str,
    pointer: &str,
) -> Result<f32, SourceError> {
    let doc: Value = serde_json::from_str(body).map_err(|_| SourceError::InvalidJson)?;
    let field = doc.pointer(pointer).ok_or(SourceError::MissingField)?;

    let value = match field {
        Value::Number(n) => n.as_f64().ok_or(SourceError::NotNumeric)? as f32,
        Value::String(s) => s
            .trim()
            .parse::<f32>()
            .map_err(|_| SourceError::NotNumeric)?,
        _ => return Err(SourceError::NotNumeric),
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(SourceError::NotNumeric)
    }
}
