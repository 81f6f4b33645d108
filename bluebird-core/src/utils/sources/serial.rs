//! Text form of a reading on the gateway → controller serial link.

extern crate alloc;

use alloc::{format, string::String};

use super::SourceError;

pub const CO2_MARKER: &str = "CO2 concentration: ";

/// Find the marker anywhere in the line and parse the number after it.
pub fn parse_co2_line(line: &str) -> Result<f32, SourceError> {
    let start = line.find(CO2_MARKER).ok_or(SourceError::MarkerNotFound)?;
    let rest = line[start + CO2_MARKER.len()..].trim();
    let number = rest.split_whitespace().next().unwrap_or("");
    let value = number
        .parse::<f32>()
        .map_err(|_| SourceError::NotNumeric)?;
    if !value.is_finite() {
        return Err(SourceError::NotNumeric);
    }
    tracing::debug!(value, "stored CO2 concentration");
    Ok(value)
}

pub fn format_co2_line(value: f32) -> String {
    format!("{}{:.2}", CO2_MARKER, value)
}
