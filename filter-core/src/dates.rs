//! Day-resolution handling of ISO-8601 date values.
//!
//! Date fields are binned and compared on a linear axis measured in whole
//! days since 1970-01-01, so a bin width of `1` is one day.

use time::Date;
use time::Month;

const UNIX_EPOCH_JULIAN_DAY: i32 = 2_440_588;

/// Parses `YYYY`, `YYYY-MM`, `YYYY-MM-DD` (optionally followed by a
/// `THH:MM:SS` time, which is ignored) into days since the Unix epoch.
/// Anything else is rejected.
pub fn parse_date_days(value: &str) -> Option<f64> {
    let value = value.trim();
    let (date, time) = match value.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (value, None),
    };
    if let Some(time) = time
        && !is_clock_time(time)
    {
        return None;
    }

    let mut parts = date.split('-');
    let year: i32 = digits(parts.next()?, 4)?.parse().ok()?;
    let month: u8 = match parts.next() {
        Some(part) => digits(part, 2)?.parse().ok()?,
        None => 1,
    };
    let day: u8 = match parts.next() {
        Some(part) => digits(part, 2)?.parse().ok()?,
        None => 1,
    };
    if parts.next().is_some() || (time.is_some() && date.len() != "YYYY-MM-DD".len()) {
        return None;
    }
    let month = Month::try_from(month).ok()?;
    let date = Date::from_calendar_date(year, month, day).ok()?;
    Some(f64::from(date.to_julian_day() - UNIX_EPOCH_JULIAN_DAY))
}

fn digits(part: &str, width: usize) -> Option<&str> {
    (part.len() == width && part.bytes().all(|b| b.is_ascii_digit())).then_some(part)
}

/// `HH:MM:SS`; the value itself is not used.
fn is_clock_time(time: &str) -> bool {
    let mut parts = time.split(':');
    let fields_ok = (0..3).all(|_| parts.next().and_then(|part| digits(part, 2)).is_some());
    fields_ok && parts.next().is_none()
}
