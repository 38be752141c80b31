//! Timestamp normalization for historian queries.
//!
//! The query endpoints want integer Unix seconds; callers hold anything from
//! raw epoch numbers to calendar text. [`TimeSpec`] covers the accepted
//! forms and [`to_unix_seconds`] collapses them.

use crate::error::TimeError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// A point in time in any of the forms accepted by the query operations.
#[derive(Debug, Clone)]
pub enum TimeSpec {
    /// Unix seconds, used as-is.
    Unix(i64),
    /// Fractional Unix seconds, truncated to whole seconds.
    Seconds(f64),
    /// Calendar text, e.g. `"2023-11-14T22:13:20Z"` or `"2023-11-14"`.
    Text(String),
    /// An already-resolved instant.
    Instant(DateTime<Utc>),
}

impl From<i64> for TimeSpec {
    fn from(secs: i64) -> Self {
        TimeSpec::Unix(secs)
    }
}

impl From<f64> for TimeSpec {
    fn from(secs: f64) -> Self {
        TimeSpec::Seconds(secs)
    }
}

impl From<&str> for TimeSpec {
    fn from(text: &str) -> Self {
        TimeSpec::Text(text.to_string())
    }
}

impl From<String> for TimeSpec {
    fn from(text: String) -> Self {
        TimeSpec::Text(text)
    }
}

impl From<DateTime<Utc>> for TimeSpec {
    fn from(instant: DateTime<Utc>) -> Self {
        TimeSpec::Instant(instant)
    }
}

/// Collapse a time spec to integer Unix seconds.
pub fn to_unix_seconds(spec: &TimeSpec) -> Result<i64, TimeError> {
    match spec {
        TimeSpec::Unix(secs) => Ok(*secs),
        TimeSpec::Seconds(secs) => Ok(*secs as i64),
        TimeSpec::Text(text) => parse_time(text).map(|dt| dt.timestamp()),
        TimeSpec::Instant(instant) => Ok(instant.timestamp()),
    }
}

/// Parse calendar text into a UTC instant. Naive values are taken as UTC.
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, TimeError> {
    let trimmed = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
    for fmt in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(TimeError {
        input: s.to_string(),
    })
}
