//! Permissive date/time parsing for the `Timestamp` type.
//!
//! Accepted shapes, after trimming:
//!
//! - delimited dates `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY.MM.DD` with one or two
//!   digit month and day, optionally followed by `T` or a space and a time
//!   `hh:mm[:ss[.fff]]`, optionally followed by `Z` or a `±hh[:]mm` offset
//! - compact dates `YYYYMMDD` with an optional `[T]hhmm[ss]` time
//! - partial dates `YYYY-MM` and `YYYY` (first day of the period)
//! - month-first `MM/DD/YYYY`
//! - dates with English month names (`19 Oct 1995`, `October 19, 1995`)
//!
//! Values with an offset are converted to UTC; the result is always a naive
//! UTC timestamp.
//!
//! A value whose shape is recognised but whose day does not exist in that
//! month is [`DateParseError::DayOutOfRange`]. A real date outside the
//! nanosecond timestamp range (roughly 1677..2262) is
//! [`DateParseError::OutOfBounds`]. Everything else is
//! [`DateParseError::Unrecognized`].

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use thiserror::Error;

/// Errors produced by [`parse_timestamp`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    /// The value is shaped like a date but names a day the month does not have.
    #[error("day is out of range for month: {value}")]
    DayOutOfRange { value: String },

    /// The date exists but cannot be stored as nanoseconds since the epoch.
    #[error("date is outside the nanosecond timestamp range: {value}")]
    OutOfBounds { value: String },

    /// The value cannot be read as a date at all.
    #[error("unknown date format: {value}")]
    Unrecognized { value: String },
}

static DELIMITED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})(?:[T ](\d{1,2}):(\d{1,2})(?::(\d{1,2})(?:\.(\d{1,9}))?)?)?\s*(Z|[+-]\d{2}:?\d{2})?$",
    )
    .expect("valid delimited date regex")
});

static COMPACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})(\d{2})(\d{2})(?:T?(\d{2})(\d{2})(\d{2})?)?$")
        .expect("valid compact date regex")
});

static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[-/](\d{1,2})$").expect("valid year-month regex"));

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})$").expect("valid year regex"));

static MONTH_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("valid month-first regex")
});

const NAMED_MONTH_FORMATS: &[&str] = &[
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Date and time components pulled out of a recognised shape.
#[derive(Debug, Default, Clone, Copy)]
struct Parts {
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    nanosecond: u32,
    offset_minutes: i32,
}

/// Parses a raw value into a naive UTC timestamp.
///
/// # Examples
///
/// ```
/// use prep_common::{DateParseError, parse_timestamp};
///
/// let ts = parse_timestamp("1998-3-25").unwrap();
/// assert_eq!(ts.to_string(), "1998-03-25 00:00:00");
///
/// assert!(matches!(
///     parse_timestamp("1995-10-40"),
///     Err(DateParseError::DayOutOfRange { .. })
/// ));
/// assert!(matches!(
///     parse_timestamp("birthday"),
///     Err(DateParseError::Unrecognized { .. })
/// ));
/// ```
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, DateParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(unrecognized(value));
    }

    if let Some(parts) = match_delimited(trimmed)
        .or_else(|| match_compact(trimmed))
        .or_else(|| match_partial(trimmed))
        .or_else(|| match_month_first(trimmed))
    {
        return assemble(parts, value).and_then(|ts| representable(ts, value));
    }

    for format in NAMED_MONTH_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return representable(date.and_time(NaiveTime::MIN), value);
        }
    }

    Err(unrecognized(value))
}

fn representable(ts: NaiveDateTime, original: &str) -> Result<NaiveDateTime, DateParseError> {
    match timestamp_to_nanos(&ts) {
        Some(_) => Ok(ts),
        None => Err(DateParseError::OutOfBounds {
            value: original.to_string(),
        }),
    }
}

/// Converts nanoseconds since the Unix epoch into a naive UTC timestamp.
pub fn timestamp_from_nanos(nanos: i64) -> NaiveDateTime {
    DateTime::from_timestamp_nanos(nanos).naive_utc()
}

/// Converts a naive UTC timestamp into nanoseconds since the Unix epoch.
///
/// Returns `None` outside the representable range (roughly 1677..2262).
pub fn timestamp_to_nanos(value: &NaiveDateTime) -> Option<i64> {
    value.and_utc().timestamp_nanos_opt()
}

fn unrecognized(value: &str) -> DateParseError {
    DateParseError::Unrecognized {
        value: value.to_string(),
    }
}

fn capture_u32(caps: &regex::Captures<'_>, index: usize) -> u32 {
    caps.get(index)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(0)
}

fn match_delimited(value: &str) -> Option<Parts> {
    let caps = DELIMITED.captures(value)?;
    let nanosecond = caps
        .get(7)
        .map(|m| {
            let digits = m.as_str();
            let padded = format!("{digits:0<9}");
            padded.parse::<u32>().unwrap_or(0)
        })
        .unwrap_or(0);
    let offset_minutes = caps.get(8).map_or(0, |m| parse_offset(m.as_str()));
    Some(Parts {
        year: caps[1].parse().ok()?,
        month: capture_u32(&caps, 2),
        day: capture_u32(&caps, 3),
        hour: capture_u32(&caps, 4),
        minute: capture_u32(&caps, 5),
        second: capture_u32(&caps, 6),
        nanosecond,
        offset_minutes,
    })
}

fn match_compact(value: &str) -> Option<Parts> {
    let caps = COMPACT.captures(value)?;
    Some(Parts {
        year: caps[1].parse().ok()?,
        month: capture_u32(&caps, 2),
        day: capture_u32(&caps, 3),
        hour: capture_u32(&caps, 4),
        minute: capture_u32(&caps, 5),
        second: capture_u32(&caps, 6),
        ..Parts::default()
    })
}

fn match_partial(value: &str) -> Option<Parts> {
    if let Some(caps) = YEAR_MONTH.captures(value) {
        return Some(Parts {
            year: caps[1].parse().ok()?,
            month: capture_u32(&caps, 2),
            day: 1,
            ..Parts::default()
        });
    }
    let caps = YEAR.captures(value)?;
    Some(Parts {
        year: caps[1].parse().ok()?,
        month: 1,
        day: 1,
        ..Parts::default()
    })
}

fn match_month_first(value: &str) -> Option<Parts> {
    let caps = MONTH_FIRST.captures(value)?;
    Some(Parts {
        year: caps[3].parse().ok()?,
        month: capture_u32(&caps, 1),
        day: capture_u32(&caps, 2),
        ..Parts::default()
    })
}

/// Parses `Z`, `+hh:mm`, `+hhmm` (and the `-` forms) into minutes east of UTC.
fn parse_offset(raw: &str) -> i32 {
    if raw == "Z" {
        return 0;
    }
    let sign = if raw.starts_with('-') { -1 } else { 1 };
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let hours = digits.get(0..2).and_then(|h| h.parse::<i32>().ok()).unwrap_or(0);
    let minutes = digits.get(2..4).and_then(|m| m.parse::<i32>().ok()).unwrap_or(0);
    sign * (hours * 60 + minutes)
}

fn assemble(parts: Parts, original: &str) -> Result<NaiveDateTime, DateParseError> {
    if !(1..=12).contains(&parts.month) {
        return Err(unrecognized(original));
    }
    let date = NaiveDate::from_ymd_opt(parts.year, parts.month, parts.day).ok_or_else(|| {
        DateParseError::DayOutOfRange {
            value: original.to_string(),
        }
    })?;
    let time =
        NaiveTime::from_hms_nano_opt(parts.hour, parts.minute, parts.second, parts.nanosecond)
            .ok_or_else(|| unrecognized(original))?;
    let local = date.and_time(time);
    local
        .checked_sub_signed(Duration::minutes(i64::from(parts.offset_minutes)))
        .ok_or_else(|| unrecognized(original))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_timestamp("1995-10-19").unwrap(), ymd(1995, 10, 19));
        assert_eq!(parse_timestamp("1998-3-25").unwrap(), ymd(1998, 3, 25));
        assert_eq!(parse_timestamp("2001/02/03").unwrap(), ymd(2001, 2, 3));
        assert_eq!(parse_timestamp(" 2001.02.03 ").unwrap(), ymd(2001, 2, 3));
    }

    #[test]
    fn parses_times_and_offsets() {
        let ts = parse_timestamp("2020-01-02T03:04:05").unwrap();
        assert_eq!(ts.to_string(), "2020-01-02 03:04:05");

        let ts = parse_timestamp("2020-01-02 03:04:05.25").unwrap();
        assert_eq!(ts.to_string(), "2020-01-02 03:04:05.250");

        let ts = parse_timestamp("2020-01-02T09:00:00+09:00").unwrap();
        assert_eq!(ts.to_string(), "2020-01-02 00:00:00");

        let ts = parse_timestamp("2020-01-02T09:00Z").unwrap();
        assert_eq!(ts.to_string(), "2020-01-02 09:00:00");
    }

    #[test]
    fn parses_compact_partial_and_named_forms() {
        assert_eq!(parse_timestamp("19951019").unwrap(), ymd(1995, 10, 19));
        assert_eq!(parse_timestamp("1995-10").unwrap(), ymd(1995, 10, 1));
        assert_eq!(parse_timestamp("1995").unwrap(), ymd(1995, 1, 1));
        assert_eq!(parse_timestamp("10/19/1995").unwrap(), ymd(1995, 10, 19));
        assert_eq!(parse_timestamp("19 Oct 1995").unwrap(), ymd(1995, 10, 19));
        assert_eq!(
            parse_timestamp("October 19, 1995").unwrap(),
            ymd(1995, 10, 19)
        );
    }

    #[test]
    fn impossible_day_is_out_of_range() {
        for value in ["1995-10-40", "2023-02-30", "2023-04-31", "20230230"] {
            assert!(
                matches!(
                    parse_timestamp(value),
                    Err(DateParseError::DayOutOfRange { .. })
                ),
                "{value}"
            );
        }
    }

    #[test]
    fn garbage_is_unrecognized() {
        for value in ["birthday", "", "1995-13-01", "2020-01-01T25:00", "12:30"] {
            assert!(
                matches!(
                    parse_timestamp(value),
                    Err(DateParseError::Unrecognized { .. })
                ),
                "{value}"
            );
        }
    }

    #[test]
    fn dates_beyond_nanosecond_range_are_out_of_bounds() {
        for value in ["2300-01-01", "1600-12-31", "1 Jan 2263"] {
            assert!(
                matches!(
                    parse_timestamp(value),
                    Err(DateParseError::OutOfBounds { .. })
                ),
                "{value}"
            );
        }
        assert_eq!(parse_timestamp("2262-01-01").unwrap(), ymd(2262, 1, 1));
    }

    #[test]
    fn nanos_round_trip_epoch() {
        let ts = timestamp_from_nanos(0);
        assert_eq!(ts, ymd(1970, 1, 1));
        assert_eq!(timestamp_to_nanos(&ymd(1970, 1, 2)), Some(86_400_000_000_000));
    }

    proptest! {
        #[test]
        fn any_real_calendar_day_parses(y in 1700i32..2200, m in 1u32..=12, d in 1u32..=28) {
            let value = format!("{y:04}-{m}-{d}");
            prop_assert_eq!(parse_timestamp(&value).unwrap(), ymd(y, m, d));
        }
    }
}
