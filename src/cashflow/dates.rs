//! Date normalization at the input boundary
//!
//! Every accepted date representation is reduced to signed elapsed days from
//! an origin before the solver sees it.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::{XirrError, XirrResult};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// A value that can be placed on a timeline relative to another value of the same type
pub trait TransactionDate {
    /// Signed elapsed days from `origin` to `self` (fractional for date-times)
    fn days_since(&self, origin: &Self) -> f64;
}

impl TransactionDate for NaiveDate {
    fn days_since(&self, origin: &Self) -> f64 {
        (*self - *origin).num_days() as f64
    }
}

impl TransactionDate for NaiveDateTime {
    fn days_since(&self, origin: &Self) -> f64 {
        (*self - *origin).num_milliseconds() as f64 / MILLIS_PER_DAY
    }
}

impl<Tz: TimeZone> TransactionDate for DateTime<Tz> {
    fn days_since(&self, origin: &Self) -> f64 {
        self.naive_utc().days_since(&origin.naive_utc())
    }
}

/// Elapsed days of each date from `dates[0]`, in input order
pub fn elapsed_days<D: TransactionDate>(dates: &[D]) -> Vec<f64> {
    match dates.first() {
        Some(origin) => dates.iter().map(|d| d.days_since(origin)).collect(),
        None => Vec::new(),
    }
}

/// Convert a Unix epoch timestamp in milliseconds to a UTC date-time
pub fn from_timestamp_millis(millis: i64) -> XirrResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| XirrError::invalid_date(millis.to_string(), "timestamp out of range"))
}

/// Parse an ISO-8601 calendar date, naive date-time, or RFC 3339 instant
///
/// Offsets are normalized to UTC; bare dates are taken at midnight.
pub fn parse_date(input: &str) -> XirrResult<NaiveDateTime> {
    let trimmed = input.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.naive_utc());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(datetime);
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(datetime);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(XirrError::invalid_date(
        input,
        "expected YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS or an RFC 3339 timestamp",
    ))
}
