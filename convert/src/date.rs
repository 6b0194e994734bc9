//! Date values on the wire.
//!
//! The server sends dates as epoch milliseconds or as ISO text. Text comes
//! in three shapes: full RFC 3339 with an offset, a local date-time without
//! offset (`2017-12-03T10:15:30`, optionally with fractional seconds) and a
//! bare date (`2007-12-03T` or `2007-12-03`). Values without an offset are
//! taken as UTC. Outgoing dates are always RFC 3339.

#[cfg(test)]
#[path = "date_test.rs"]
mod date_test;

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time};

use crate::error::ConvertError;

/// Parse a wire date (number of milliseconds or ISO text).
///
/// # Errors
///
/// Returns [`ConvertError::InvalidDate`] for anything else.
pub fn parse_date(value: &Value) -> Result<OffsetDateTime, ConvertError> {
    match value {
        Value::Number(n) => {
            let millis = n
                .as_i64()
                .ok_or_else(|| ConvertError::InvalidDate(format!("timestamp out of range: {n}")))?;
            from_millis(millis)
        }
        Value::String(text) => parse_text(text),
        other => Err(ConvertError::InvalidDate(other.to_string())),
    }
}

/// Format a date for the server.
///
/// # Errors
///
/// Returns [`ConvertError::InvalidDate`] when the date cannot be expressed in RFC 3339.
pub fn format_date(date: OffsetDateTime) -> Result<String, ConvertError> {
    date.format(&Rfc3339)
        .map_err(|e| ConvertError::InvalidDate(e.to_string()))
}

fn from_millis(millis: i64) -> Result<OffsetDateTime, ConvertError> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|e| ConvertError::InvalidDate(format!("{millis}: {e}")))
}

fn parse_text(text: &str) -> Result<OffsetDateTime, ConvertError> {
    let invalid = || ConvertError::InvalidDate(text.to_owned());

    if let Ok(parsed) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(parsed);
    }

    let date_only = text.strip_suffix('T').unwrap_or(text);
    if !date_only.contains('T') {
        let date = Date::parse(date_only, format_description!("[year]-[month]-[day]")).map_err(|_| invalid())?;
        return Ok(PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc());
    }

    let (base, fraction) = match text.split_once('.') {
        Some((base, fraction)) => (base, Some(fraction)),
        None => (text, None),
    };
    let local = PrimitiveDateTime::parse(base, format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"))
        .map_err(|_| invalid())?;

    let nanos = match fraction {
        Some(digits) => fraction_nanos(digits).ok_or_else(invalid)?,
        None => 0,
    };
    Ok(local.assume_utc() + Duration::nanoseconds(nanos))
}

/// `"5"` is 500ms, `"123456"` is 123456µs; digits past nanoseconds are dropped.
fn fraction_nanos(digits: &str) -> Option<i64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let kept: String = digits.chars().take(9).collect();
    let scale = 10_i64.pow(9 - u32::try_from(kept.len()).unwrap_or(9));
    match kept.parse::<i64>() {
        Ok(n) => Some(n * scale),
        Err(_) => None,
    }
}
