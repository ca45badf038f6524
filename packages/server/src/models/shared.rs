use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::error::AppError;

/// Naive layouts accepted in addition to RFC 3339; read as UTC.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an ISO 8601 timestamp supplied by a client.
///
/// Offsets (including a trailing `Z`) are kept as given. A timestamp without
/// an offset is taken to be UTC.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<FixedOffset>, AppError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts);
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| {
            AppError::Validation(format!(
                "{field} must be an ISO 8601 timestamp such as 2024-01-01T00:00:00Z, got '{raw}'"
            ))
        })
}

/// Parse an optional timestamp field of a PATCH body.
pub fn parse_optional_timestamp(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<DateTime<FixedOffset>>, AppError> {
    raw.map(|r| parse_timestamp(field, r)).transpose()
}
