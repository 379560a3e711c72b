use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::contract::Format;

/// Parse a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

pub fn parse_timezone(value: &str) -> Option<Tz> {
    value.parse::<Tz>().ok()
}

/// Whether `value` is a hyphenated version 4 UUID.
pub fn is_uuid_v4(value: &str) -> bool {
    value.len() == 36
        && Uuid::parse_str(value)
            .map(|id| id.get_version_num() == 4)
            .unwrap_or(false)
}

/// Check a string against a format, returning a message on mismatch.
pub fn check(format: Format, value: &str) -> Option<String> {
    let ok = match format {
        Format::Date => parse_date(value).is_some(),
        Format::DateTime => parse_timestamp(value).is_some(),
        Format::UuidV4 => is_uuid_v4(value),
        Format::Timezone => parse_timezone(value).is_some(),
    };
    if ok {
        return None;
    }

    let expected = match format {
        Format::Date => "a calendar date (YYYY-MM-DD)",
        Format::DateTime => "an RFC 3339 timestamp",
        Format::UuidV4 => "a version 4 UUID",
        Format::Timezone => "an IANA time zone name",
    };
    Some(format!("{value:?} is not {expected}"))
}
