//! Julian date ↔ calendar conversions.
//!
//! Horizons epochs are TDB Julian dates; the offset between TDB and UTC (about a
//! minute) is ignored here since these helpers only label grid axes and build
//! query windows at day resolution.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::EphemerisError;

/// Julian date of 1970-01-01T00:00:00.
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Parse a `YYYY-MM-DD` string.
pub fn parse_date(text: &str) -> Result<NaiveDate, EphemerisError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| EphemerisError::InvalidDate(text.to_string()))
}

/// Julian date at 00:00 of the given calendar day.
pub fn julian_date(date: NaiveDate) -> f64 {
    julian_date_time(date.and_time(chrono::NaiveTime::MIN))
}

pub fn julian_date_time(datetime: NaiveDateTime) -> f64 {
    let millis = datetime.and_utc().timestamp_millis();
    UNIX_EPOCH_JD + millis as f64 / MILLIS_PER_DAY
}

/// Calendar instant for a Julian date, rounded to the millisecond.
pub fn calendar(jd: f64) -> Option<DateTime<Utc>> {
    if !jd.is_finite() {
        return None;
    }
    let millis = ((jd - UNIX_EPOCH_JD) * MILLIS_PER_DAY).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

/// `YYYY-MM-DD` label for a Julian date, falling back to the raw number.
pub fn format_date(jd: f64) -> String {
    match calendar(jd) {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => format!("{jd:.3}"),
    }
}
