//! Conversions between spreadsheet date serials and calendar dates
//!
//! Serials count days since an epoch with the time of day as the fraction.
//! The 1900 system inherits the fictitious 1900-02-29 (serial 60) from Lotus
//! 1-2-3, so serials below 61 are shifted by one day relative to the real
//! calendar and 60 itself has no date.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

const MS_PER_DAY: f64 = 86_400_000.0;

fn epoch(date_1904: bool) -> Option<NaiveDateTime> {
    let date = if date_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    };
    date.and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Convert a serial to a date-time, or `None` for negative, non-finite or
/// non-existent serials
pub fn serial_to_datetime(serial: f64, date_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }

    let mut days = serial;
    if !date_1904 {
        if (60.0..61.0).contains(&serial) {
            return None;
        }
        if serial < 60.0 {
            days += 1.0;
        }
    }

    let ms = (days * MS_PER_DAY).round() as i64;
    epoch(date_1904)?.checked_add_signed(Duration::milliseconds(ms))
}

/// Convert a date-time to its serial in the given date system
pub fn datetime_to_serial(dt: NaiveDateTime, date_1904: bool) -> f64 {
    let Some(base) = epoch(date_1904) else {
        return 0.0;
    };
    let ms = dt.signed_duration_since(base).num_milliseconds() as f64;
    let mut serial = ms / MS_PER_DAY;
    if !date_1904 && serial < 61.0 {
        serial -= 1.0;
    }
    serial
}

/// Convert the ISO-8601 text of a `t="d"` cell to a serial
///
/// A bare time of day becomes a fraction below 1, as the application does.
pub fn iso8601_to_serial(s: &str, date_1904: bool) -> Option<f64> {
    let s = s.trim().trim_end_matches('Z');
    let datetime = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        });
    if let Some(dt) = datetime {
        return Some(datetime_to_serial(dt, date_1904));
    }

    let time = NaiveTime::parse_from_str(s, "%H:%M:%S%.f").ok()?;
    let midnight = NaiveTime::from_hms_opt(0, 0, 0)?;
    let ms = time.signed_duration_since(midnight).num_milliseconds() as f64;
    Some(ms / MS_PER_DAY)
}
