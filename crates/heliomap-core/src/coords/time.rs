use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::consts::{DAYS_PER_CENTURY, J2000_JD, TT_MINUS_UTC_SECONDS, UNIX_EPOCH_JD};
use crate::error::{HelioError, Result};

const SECONDS_PER_DAY: f64 = 86_400.0;

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Julian day (UTC) of an instant.
pub fn julian_day(t: &DateTime<Utc>) -> f64 {
    t.timestamp_micros() as f64 / 1e6 / SECONDS_PER_DAY + UNIX_EPOCH_JD
}

/// Julian ephemeris day (TT). Uses a fixed TT - UTC offset.
pub fn julian_ephemeris_day(t: &DateTime<Utc>) -> f64 {
    julian_day(t) + TT_MINUS_UTC_SECONDS / SECONDS_PER_DAY
}

/// Julian centuries of TT since J2000.0.
pub fn julian_centuries(t: &DateTime<Utc>) -> f64 {
    (julian_ephemeris_day(t) - J2000_JD) / DAYS_PER_CENTURY
}

/// Parse a FITS `DATE-OBS` style timestamp. Accepts ISO 8601 with or without
/// fractional seconds and a trailing `Z`, or a bare date (midnight UTC).
pub fn parse_obstime(s: &str) -> Result<DateTime<Utc>> {
    let trimmed = s.trim().trim_end_matches('Z');

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(HelioError::UnsupportedFormat(format!(
        "unparseable observation time '{s}'"
    )))
}
