// src/utils/datetime.rs

//! Lenient date/time parsing.
//!
//! Carrier pages embed dates in prose ("now arriving Feb 10, 2024 by 5 PM").
//! `parse_datetime` first tries the whole string against common formats and
//! then scans for an embedded date. Values without an offset are taken as
//! UTC; everything is returned in UTC.

use std::sync::OnceLock;

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use regex::{Captures, Regex};

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
    "%Y-%m-%d %H:%M:%S %z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const NAIVE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
    "%a, %b %d, %Y",
];

/// Parse a date/time string leniently. Returns `None` when nothing usable is found.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let text = value.trim();
    if text.is_empty() {
        return None;
    }
    parse_exact(text).or_else(|| parse_embedded(text))
}

/// ISO-8601 rendering in UTC with a `Z` suffix.
pub fn to_iso(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_exact(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    let zulu = text
        .strip_suffix('Z')
        .or_else(|| text.strip_suffix('z'))
        .or_else(|| text.strip_suffix(" UTC"))
        .or_else(|| text.strip_suffix(" GMT"));
    if let Some(stripped) = zulu {
        return parse_naive(stripped.trim_end());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(text, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    parse_naive(text)
}

fn parse_naive(text: &str) -> Option<DateTime<Utc>> {
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(Utc.from_utc_datetime(&dt));
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
        }
    }
    None
}

fn iso_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?)?(?:Z|[+-]\d{2}:?\d{2})?",
        )
        .expect("static iso regex")
    })
}

const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";
const TIME: &str = r"(?:,?\s+(?:at|by)?\s*(\d{1,2})(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)?)?";

fn month_first_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)\b{MONTH}\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b{TIME}"
        ))
        .expect("static month-first regex")
    })
}

fn day_first_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+{MONTH}\.?,?\s+(\d{{4}})\b{TIME}"
        ))
        .expect("static day-first regex")
    })
}

fn numeric_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"(?i)\b(\d{{1,2}})/(\d{{1,2}})/(\d{{4}})\b{TIME}"))
            .expect("static numeric date regex")
    })
}

fn parse_embedded(text: &str) -> Option<DateTime<Utc>> {
    iso_pattern()
        .find(text)
        .and_then(|found| parse_exact(found.as_str()))
        .or_else(|| {
            let caps = month_first_pattern().captures(text)?;
            let month = month_number(&caps[1])?;
            assemble(caps[3].parse().ok()?, month, caps[2].parse().ok()?, &caps, 4)
        })
        .or_else(|| {
            let caps = day_first_pattern().captures(text)?;
            let month = month_number(&caps[2])?;
            assemble(caps[3].parse().ok()?, month, caps[1].parse().ok()?, &caps, 4)
        })
        .or_else(|| {
            let caps = numeric_pattern().captures(text)?;
            assemble(caps[3].parse().ok()?, caps[1].parse().ok()?, caps[2].parse().ok()?, &caps, 4)
        })
}

/// Build a UTC timestamp from date parts plus the optional time captures
/// starting at `time_group` (hour, minute, meridiem).
fn assemble(
    year: i32,
    month: u32,
    day: u32,
    caps: &Captures<'_>,
    time_group: usize,
) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let mut hour: u32 = caps
        .get(time_group)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    let minute: u32 = caps
        .get(time_group + 1)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    let meridiem = caps
        .get(time_group + 2)
        .map(|m| m.as_str().to_ascii_lowercase().replace('.', ""));

    // A bare number after the date without a colon or meridiem is not a time.
    if caps.get(time_group + 1).is_none() && meridiem.is_none() {
        hour = 0;
    }
    match meridiem.as_deref() {
        Some("pm") if hour < 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }

    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}

fn month_number(name: &str) -> Option<u32> {
    let key: String = name.to_ascii_lowercase().chars().take(3).collect();
    let month = match key.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_parse_rfc3339_variants() {
        assert_eq!(
            parse_datetime("2024-01-03T12:00:00Z"),
            Some(utc("2024-01-03T12:00:00Z"))
        );
        assert_eq!(
            parse_datetime("2024-01-03T14:00:00+02:00"),
            Some(utc("2024-01-03T12:00:00Z"))
        );
    }

    #[test]
    fn test_naive_values_are_utc() {
        assert_eq!(
            parse_datetime("2024-02-08 09:30"),
            Some(utc("2024-02-08T09:30:00Z"))
        );
        assert_eq!(parse_datetime("2024-02-08"), Some(utc("2024-02-08T00:00:00Z")));
        assert_eq!(parse_datetime("02/08/2024"), Some(utc("2024-02-08T00:00:00Z")));
        assert_eq!(
            parse_datetime("February 8, 2024"),
            Some(utc("2024-02-08T00:00:00Z"))
        );
    }

    #[test]
    fn test_rfc2822() {
        assert_eq!(
            parse_datetime("Sat, 10 Feb 2024 08:00:00 +0100"),
            Some(utc("2024-02-10T07:00:00Z"))
        );
    }

    #[test]
    fn test_invalid_embedded_date_tries_later_forms() {
        assert_eq!(
            parse_datetime("Was due Feb 30, 2024, now rescheduled to 3/4/2024"),
            Some(utc("2024-03-04T00:00:00Z"))
        );
        assert_eq!(parse_datetime("Due Feb 30, 2024"), None);
    }

    #[test]
    fn test_embedded_in_prose() {
        assert_eq!(
            parse_datetime("Delayed by weather, new ETA 2024-02-10T06:00:00Z at the hub"),
            Some(utc("2024-02-10T06:00:00Z"))
        );
        assert_eq!(
            parse_datetime("Service alert: now arriving Feb 10, 2024 by 5 PM"),
            Some(utc("2024-02-10T17:00:00Z"))
        );
        assert_eq!(
            parse_datetime("Storm backlog, expected 12th March 2024"),
            Some(utc("2024-03-12T00:00:00Z"))
        );
        assert_eq!(
            parse_datetime("Exception: rescheduled to 3/4/2024 at 9:15 am"),
            Some(utc("2024-03-04T09:15:00Z"))
        );
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("Shipment delayed due to weather"), None);
        assert_eq!(parse_datetime("2024-13-45"), None);
    }

    #[test]
    fn test_to_iso() {
        assert_eq!(to_iso(&utc("2024-02-10T00:00:00Z")), "2024-02-10T00:00:00Z");
        assert_eq!(
            to_iso(&utc("2024-02-10T00:00:00.250Z")),
            "2024-02-10T00:00:00.250Z"
        );
    }
}
