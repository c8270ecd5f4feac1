//! Time utilities: timestamp patterns and float-day durations.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const DEFAULT_RECORD_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const MICROS_PER_DAY: f64 = 86_400_000_000.0;

/// Longest span accepted for roster periods and durations (10,000 years).
pub const MAX_SPAN_DAYS: f64 = 3_652_500.0;

/// Timestamp patterns for interactive entry and persisted records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFormats {
    pub input: String,
    pub record: String,
}

impl Default for TimeFormats {
    fn default() -> Self {
        Self {
            input: DEFAULT_INPUT_FORMAT.to_string(),
            record: DEFAULT_RECORD_FORMAT.to_string(),
        }
    }
}

impl TimeFormats {
    /// Parse a user-typed time like "2026-02-20 23:59".
    pub fn parse_input(&self, text: &str) -> Result<NaiveDateTime> {
        parse_with(text, &self.input)
    }

    /// Parse a persisted timestamp like "2026-02-20 23:59:00.000000".
    pub fn parse_record(&self, text: &str) -> Result<NaiveDateTime> {
        parse_with(text, &self.record)
    }

    pub fn format_record(&self, ts: NaiveDateTime) -> String {
        ts.format(&self.record).to_string()
    }

    pub fn format_input(&self, ts: NaiveDateTime) -> String {
        ts.format(&self.input).to_string()
    }
}

fn parse_with(text: &str, pattern: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, pattern)
        .map_err(|_| Error::format(text, format!("timestamp ({pattern})")))
}

/// Parse a strictly positive, finite number of days.
pub fn parse_duration_days(text: &str) -> Result<Duration> {
    let text = text.trim();
    let days: f64 = text
        .parse()
        .map_err(|_| Error::format(text, "number of days"))?;
    if !days.is_finite() || days <= 0.0 {
        return Err(Error::format(text, "positive number of days"));
    }
    span_from_days(days)
}

/// [`from_days`] for untrusted input: rejects non-finite values and spans
/// longer than [`MAX_SPAN_DAYS`] in either direction.
pub fn span_from_days(days: f64) -> Result<Duration> {
    if !days.is_finite() || days.abs() > MAX_SPAN_DAYS {
        return Err(Error::format(
            days.to_string(),
            format!("number of days up to {MAX_SPAN_DAYS}"),
        ));
    }
    Ok(from_days(days))
}

/// A span as one float day count (`days + seconds / 86400`).
pub fn as_days(span: Duration) -> f64 {
    match span.num_microseconds() {
        Some(us) => us as f64 / MICROS_PER_DAY,
        None => span.num_milliseconds() as f64 / (MICROS_PER_DAY / 1000.0),
    }
}

/// Inverse of [`as_days`], rounded to the nearest microsecond. Values past
/// `i64` microseconds saturate; use [`span_from_days`] for parsed input.
pub fn from_days(days: f64) -> Duration {
    Duration::microseconds((days * MICROS_PER_DAY).round() as i64)
}

/// Serialize a [`Duration`] as a float day count.
pub mod serde_days {
    use chrono::Duration;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(span: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(super::as_days(*span))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let days = f64::deserialize(d)?;
        super::span_from_days(days).map_err(D::Error::custom)
    }
}
