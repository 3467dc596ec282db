//! Timestamp parsing and display helpers
//!
//! The compose form hands over wall-clock input like `2026-05-01T09:30`
//! (no offset); the API speaks RFC 3339. Naive input is read in the local
//! time zone. Display helpers fall back to the raw string when it does not
//! parse, so a malformed server value never hides a row.

use chrono::{DateTime, Duration, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use super::result::{Error, Result};
use super::validation::{min_delivery_lead, Field};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Format used by datetime-local style inputs
pub const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Parse an RFC 3339 timestamp, or a naive one in the local time zone
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    parse_timestamp_in(value, &Local)
}

/// Parse an RFC 3339 timestamp, or a naive one in `tz`
pub fn parse_timestamp_in<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        // Ambiguous (DST fold) times resolve to the earlier instant
        .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Normalize a delivery time to `YYYY-MM-DDTHH:MM:SS.mmmZ`
pub fn to_iso_utc(value: &str) -> Result<String> {
    parse_timestamp(value)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| Error::validation(Field::DeliveryTime, format!("Invalid delivery time: {}", value)))
}

fn format_with<Tz: TimeZone>(value: &str, tz: &Tz, pattern: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match parse_timestamp_in(value, tz) {
        Some(dt) => dt.with_timezone(tz).format(pattern).to_string(),
        None => value.to_string(),
    }
}

/// `2026-05-01 09:30` in `tz`
pub fn format_date_time_in<Tz: TimeZone>(value: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format_with(value, tz, "%Y-%m-%d %H:%M")
}

/// `2026-05-01` in `tz`
pub fn format_date_in<Tz: TimeZone>(value: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format_with(value, tz, "%Y-%m-%d")
}

/// `09:30` in `tz`
pub fn format_time_in<Tz: TimeZone>(value: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format_with(value, tz, "%H:%M")
}

pub fn format_date_time(value: &str) -> String {
    format_date_time_in(value, &Local)
}

pub fn format_date(value: &str) -> String {
    format_date_in(value, &Local)
}

pub fn format_time(value: &str) -> String {
    format_time_in(value, &Local)
}

/// Human distance between `value` and `now`, e.g. "in 3 days" or "5 minutes ago"
pub fn format_relative_time(value: &str, now: DateTime<Utc>) -> String {
    let Some(dt) = parse_timestamp(value) else {
        return value.to_string();
    };

    let delta = dt - now;
    let future = delta > Duration::zero();
    let secs = delta.num_seconds().abs();

    let phrase = match secs {
        0..=44 => return "just now".to_string(),
        45..=89 => "1 minute".to_string(),
        90..=2_699 => format!("{} minutes", (secs + 30) / 60),
        2_700..=5_399 => "about 1 hour".to_string(),
        5_400..=86_399 => format!("about {} hours", (secs + 1_800) / 3_600),
        86_400..=172_799 => "1 day".to_string(),
        172_800..=2_591_999 => format!("{} days", (secs + 43_200) / 86_400),
        2_592_000..=31_535_999 => {
            let months = ((secs + 1_296_000) / 2_592_000).max(1);
            if months == 1 {
                "about 1 month".to_string()
            } else {
                format!("{} months", months)
            }
        }
        _ => {
            let years = secs / 31_536_000;
            if years == 1 {
                "about 1 year".to_string()
            } else {
                format!("about {} years", years)
            }
        }
    };

    if future {
        format!("in {}", phrase)
    } else {
        format!("{} ago", phrase)
    }
}

/// True iff `value` parses and lies after `now`
pub fn is_future_date(value: &str, now: DateTime<Utc>) -> bool {
    parse_timestamp(value).is_some_and(|dt| dt > now)
}

/// Earliest delivery time the compose form accepts, as local input text
pub fn min_delivery_time(now: DateTime<Utc>) -> String {
    min_delivery_time_in(now, &Local)
}

pub fn min_delivery_time_in<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    // Round up to a whole minute so the value itself passes validation
    let earliest = now + min_delivery_lead();
    let floor = earliest
        - Duration::seconds(earliest.timestamp().rem_euclid(60))
        - Duration::nanoseconds(i64::from(earliest.timestamp_subsec_nanos()));
    let rounded = if floor < earliest {
        floor + Duration::minutes(1)
    } else {
        floor
    };
    rounded.with_timezone(tz).format(INPUT_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_timestamp("2026-05-01T09:30:00+02:00").unwrap();
        assert_eq!(dt, at("2026-05-01T07:30:00Z"));
    }

    #[test]
    fn test_parse_naive_uses_given_zone() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let dt = parse_timestamp_in("2026-05-01T09:30", &tz).unwrap();
        assert_eq!(dt, at("2026-05-01T01:30:00Z"));

        let dt = parse_timestamp_in("2026-05-01 09:30:15", &Utc).unwrap();
        assert_eq!(dt, at("2026-05-01T09:30:15Z"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("tomorrow").is_none());
        assert!(parse_timestamp("2026-13-01T09:30").is_none());
    }

    #[test]
    fn test_to_iso_utc_normalizes() {
        assert_eq!(
            to_iso_utc("2026-05-01T09:30:00+02:00").unwrap(),
            "2026-05-01T07:30:00.000Z"
        );
        let err = to_iso_utc("soon").unwrap_err();
        assert!(matches!(err, Error::Validation { field: Field::DeliveryTime, .. }));
    }

    #[test]
    fn test_formatting_falls_back_to_input() {
        assert_eq!(format_date_time_in("2026-05-01T09:30:00Z", &Utc), "2026-05-01 09:30");
        assert_eq!(format_date_in("2026-05-01T09:30:00Z", &Utc), "2026-05-01");
        assert_eq!(format_time_in("2026-05-01T09:30:00Z", &Utc), "09:30");
        assert_eq!(format_date_time_in("garbled", &Utc), "garbled");
    }

    #[test]
    fn test_relative_time() {
        let now = at("2026-05-01T12:00:00Z");
        assert_eq!(format_relative_time("2026-05-01T12:00:10Z", now), "just now");
        assert_eq!(format_relative_time("2026-05-01T12:05:00Z", now), "in 5 minutes");
        assert_eq!(format_relative_time("2026-05-01T09:00:00Z", now), "about 3 hours ago");
        assert_eq!(format_relative_time("2026-05-04T12:00:00Z", now), "in 3 days");
        assert_eq!(format_relative_time("2027-05-01T12:00:00Z", now), "in about 1 year");
        assert_eq!(format_relative_time("n/a", now), "n/a");
    }

    #[test]
    fn test_is_future_date() {
        let now = at("2026-05-01T12:00:00Z");
        assert!(is_future_date("2026-05-01T12:00:01Z", now));
        assert!(!is_future_date("2026-05-01T12:00:00Z", now));
        assert!(!is_future_date("bogus", now));
    }

    #[test]
    fn test_min_delivery_time_is_accepted() {
        let now = at("2026-05-01T12:00:30Z");
        let min = min_delivery_time_in(now, &Utc);
        assert_eq!(min, "2026-05-01T12:06");
        let parsed = parse_timestamp_in(&min, &Utc).unwrap();
        assert!(parsed >= now + min_delivery_lead());
    }
}
