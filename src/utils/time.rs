use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ISO_DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

/// Naive layouts accepted for date-times without an offset
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Check a string against the literal `YYYY-MM-DD` shape
pub fn is_iso_date(value: &str) -> bool {
    ISO_DATE.is_match(value)
}

/// Parse a date-time string, reading naive values as UTC
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    parse_instant_in(value, &Tz::UTC)
}

/// Parse a date-time string, reading naive values in `zone`
///
/// Accepts RFC 3339, RFC 2822, naive `YYYY-MM-DDTHH:MM[:SS[.fff]]` and a bare
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_instant_in(value: &str, zone: &Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return local_to_utc(&naive, zone);
        }
    }

    // Date-only strings are midnight UTC
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Read a wall-clock time in `zone`
///
/// Ambiguous times take the earlier instant. Times inside a spring-forward
/// gap are shifted forward by one hour (02:30 becomes 03:30).
fn local_to_utc(naive: &NaiveDateTime, zone: &Tz) -> Option<DateTime<Utc>> {
    let local = match zone.from_local_datetime(naive) {
        LocalResult::None => zone.from_local_datetime(&(*naive + Duration::hours(1))),
        resolved => resolved,
    };
    local.earliest().map(|dt| dt.with_timezone(&Utc))
}

/// Format an instant as ISO-8601 UTC with millisecond precision
pub fn to_iso_utc(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Milliseconds since the unix epoch
pub fn epoch_millis(instant: &DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

/// Resolve an optional IANA zone name, falling back to `default`
pub fn zone_or(name: Option<&str>, default: Tz) -> Tz {
    name.and_then(|n| n.parse::<Tz>().ok()).unwrap_or(default)
}
