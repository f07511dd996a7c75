mod phrase;

pub use phrase::{CueOffset, DatePhraseResolver, RelativeCueResolver};

use crate::components::calendar::Event;
use crate::utils::time::{is_iso_date, parse_instant_in, to_iso_utc, zone_or};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;

lazy_static! {
    static ref EMAIL: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Which end of the event a time error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Bound::Start => "start",
            Bound::End => "end",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Event summary is required")]
    MissingSummary,

    #[error("Event {0} time is required")]
    MissingTime(Bound),

    #[error("Event {0} must have either dateTime or date")]
    EmptyTime(Bound),

    #[error("Invalid date-time format: {0}")]
    InvalidDateTime(String),

    #[error("Invalid date format: {0}. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Cannot normalize date-time: {0}")]
    Unresolvable(String),
}

impl ValidationError {
    /// Whether this error came from date normalization rather than validation
    pub fn is_normalization(&self) -> bool {
        matches!(self, ValidationError::Unresolvable(_))
    }
}

/// Structural checks and date normalization applied to parsed events
pub trait EventRules: Send + Sync {
    /// Check the event, returning it unchanged when valid
    fn validate(&self, event: Event) -> Result<Event, ValidationError>;

    /// Rewrite start/end date-times to absolute UTC instants
    fn normalize_dates(&self, event: Event) -> Result<Event, ValidationError>;
}

/// Default rule set
///
/// Validation stops at the first violated rule. Normalization resolves
/// relative cues through a [`DatePhraseResolver`]; naive date-times are read
/// in the event time's own zone, or `default_zone` when it has none.
#[derive(Clone)]
pub struct EventValidator {
    resolver: Arc<dyn DatePhraseResolver>,
    default_zone: Tz,
}

impl Default for EventValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl EventValidator {
    pub fn new() -> Self {
        Self {
            resolver: Arc::new(RelativeCueResolver::default()),
            default_zone: Tz::UTC,
        }
    }

    /// Replace the date phrase resolver
    pub fn with_resolver(mut self, resolver: Arc<dyn DatePhraseResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Zone for naive date-times without a timeZone
    pub fn with_default_zone(mut self, zone: Tz) -> Self {
        self.default_zone = zone;
        self
    }

    /// Normalize against an explicit reference instant
    pub fn normalize_dates_at(
        &self,
        mut event: Event,
        now: DateTime<Utc>,
    ) -> Result<Event, ValidationError> {
        for time in [event.start.as_mut(), event.end.as_mut()].into_iter().flatten() {
            // Empty dateTime values are left as they are
            let Some(raw) = time.date_time_value().map(str::to_string) else {
                continue;
            };
            let zone = zone_or(time.time_zone.as_deref(), self.default_zone);
            time.date_time = Some(self.normalize_date_time(&raw, zone, now)?);
        }
        Ok(event)
    }

    fn normalize_date_time(
        &self,
        raw: &str,
        zone: Tz,
        now: DateTime<Utc>,
    ) -> Result<String, ValidationError> {
        let instant = match self.resolver.resolve(raw, now) {
            Some(instant) => instant,
            None => parse_instant_in(raw, &zone)
                .ok_or_else(|| ValidationError::Unresolvable(raw.to_string()))?,
        };
        Ok(to_iso_utc(&instant))
    }

    fn check_required(event: &Event) -> Result<(), ValidationError> {
        match event.summary.as_deref() {
            Some(summary) if !summary.trim().is_empty() => {}
            _ => return Err(ValidationError::MissingSummary),
        }

        let start = event
            .start
            .as_ref()
            .ok_or(ValidationError::MissingTime(Bound::Start))?;
        let end = event
            .end
            .as_ref()
            .ok_or(ValidationError::MissingTime(Bound::End))?;

        if !start.has_value() {
            return Err(ValidationError::EmptyTime(Bound::Start));
        }
        if !end.has_value() {
            return Err(ValidationError::EmptyTime(Bound::End));
        }
        Ok(())
    }

    fn check_formats(&self, event: &Event) -> Result<(), ValidationError> {
        let times = [event.start.as_ref(), event.end.as_ref()];

        for time in times.iter().flatten() {
            if let Some(date_time) = time.date_time_value() {
                let zone = zone_or(time.time_zone.as_deref(), self.default_zone);
                if parse_instant_in(date_time, &zone).is_none() {
                    return Err(ValidationError::InvalidDateTime(date_time.to_string()));
                }
            }
        }

        for time in times.iter().flatten() {
            if let Some(date) = time.date_value() {
                if !is_iso_date(date) {
                    return Err(ValidationError::InvalidDate(date.to_string()));
                }
            }
        }
        Ok(())
    }

    fn check_attendees(event: &Event) -> Result<(), ValidationError> {
        let Some(attendees) = &event.attendees else {
            return Ok(());
        };

        for email in attendees.iter().filter_map(|a| a.email()) {
            if !EMAIL.is_match(email) {
                return Err(ValidationError::InvalidEmail(email.to_string()));
            }
        }
        Ok(())
    }
}

impl EventRules for EventValidator {
    fn validate(&self, event: Event) -> Result<Event, ValidationError> {
        Self::check_required(&event)?;
        self.check_formats(&event)?;
        Self::check_attendees(&event)?;
        Ok(event)
    }

    fn normalize_dates(&self, event: Event) -> Result<Event, ValidationError> {
        self.normalize_dates_at(event, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::calendar::{Attendee, AttendeeRecord, EventTime};
    use crate::utils::time::parse_instant;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn event() -> Event {
        Event {
            summary: Some("Planning".to_string()),
            start: Some(EventTime::at("2024-01-15T14:00:00+09:00", "Asia/Tokyo")),
            end: Some(EventTime::at("2024-01-15T15:00:00+09:00", "Asia/Tokyo")),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_event_passes_unchanged() {
        let validator = EventValidator::new();
        let input = event();
        assert_eq!(validator.validate(input.clone()).unwrap(), input);
    }

    #[test]
    fn test_required_fields_in_order() {
        let validator = EventValidator::new();

        let mut e = event();
        e.summary = Some("   ".to_string());
        e.start = None;
        assert_eq!(validator.validate(e).unwrap_err(), ValidationError::MissingSummary);

        let mut e = event();
        e.start = None;
        let err = validator.validate(e).unwrap_err();
        assert_eq!(err.to_string(), "Event start time is required");

        let mut e = event();
        e.end = None;
        let err = validator.validate(e).unwrap_err();
        assert_eq!(err.to_string(), "Event end time is required");

        let mut e = event();
        e.start = Some(EventTime::default());
        let err = validator.validate(e).unwrap_err();
        assert_eq!(err.to_string(), "Event start must have either dateTime or date");

        let mut e = event();
        e.end = Some(EventTime {
            time_zone: Some("UTC".to_string()),
            ..Default::default()
        });
        assert_eq!(
            validator.validate(e).unwrap_err(),
            ValidationError::EmptyTime(Bound::End)
        );
    }

    #[test]
    fn test_date_formats() {
        let validator = EventValidator::new();

        let mut e = event();
        e.start = Some(EventTime::all_day("2024-01-15"));
        e.end = Some(EventTime::all_day("2024-01-16"));
        assert!(validator.validate(e).is_ok());

        for bad in ["2024/01/15", "15-01-2024", "2024-1-5", "tomorrow"] {
            let mut e = event();
            e.end = Some(EventTime::all_day(bad));
            assert_eq!(
                validator.validate(e).unwrap_err(),
                ValidationError::InvalidDate(bad.to_string())
            );
        }
    }

    #[test]
    fn test_unparsable_date_time() {
        let validator = EventValidator::new();
        let mut e = event();
        e.start = Some(EventTime::at("half past never", "UTC"));
        let err = validator.validate(e).unwrap_err();
        assert_eq!(err.to_string(), "Invalid date-time format: half past never");
    }

    #[test]
    fn test_attendees() {
        let validator = EventValidator::new();

        let mut e = event();
        e.attendees = Some(vec![
            Attendee::Email("john@example.com".to_string()),
            Attendee::Record(AttendeeRecord {
                email: Some("jane@example.co.jp".to_string()),
                ..Default::default()
            }),
            Attendee::Record(AttendeeRecord::default()),
            Attendee::Other(json!(7)),
        ]);
        assert!(validator.validate(e).is_ok());

        for bad in ["john", "john@example", "jo hn@example.com", "@example.com"] {
            let mut e = event();
            e.attendees = Some(vec![Attendee::Email(bad.to_string())]);
            assert_eq!(
                validator.validate(e).unwrap_err(),
                ValidationError::InvalidEmail(bad.to_string())
            );
        }
    }

    #[test]
    fn test_normalize_absolute() {
        let validator = EventValidator::new();
        let normalized = validator.normalize_dates(event()).unwrap();
        let start = normalized.start.unwrap();
        assert_eq!(start.date_time.as_deref(), Some("2024-01-15T05:00:00.000Z"));
        assert_eq!(start.time_zone.as_deref(), Some("Asia/Tokyo"));
    }

    #[test]
    fn test_normalize_naive_uses_event_zone() {
        let validator = EventValidator::new();
        let mut e = event();
        e.start = Some(EventTime::at("2024-01-15T14:00:00", "Europe/Helsinki"));
        e.end = Some(EventTime {
            date_time: Some("2024-01-15T15:00:00".to_string()),
            ..Default::default()
        });

        let normalized = validator.normalize_dates(e).unwrap();
        assert_eq!(
            normalized.start.unwrap().date_time.as_deref(),
            Some("2024-01-15T12:00:00.000Z")
        );
        assert_eq!(
            normalized.end.unwrap().date_time.as_deref(),
            Some("2024-01-15T15:00:00.000Z")
        );
    }

    #[test]
    fn test_normalize_relative_cues() {
        let validator = EventValidator::new();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();

        let mut e = event();
        e.start = Some(EventTime::at("tomorrow at 2pm", "UTC"));
        e.end = Some(EventTime::at("Next Month", "UTC"));

        let normalized = validator.normalize_dates_at(e, now).unwrap();
        assert_eq!(
            normalized.start.unwrap().date_time.as_deref(),
            Some("2024-03-11T08:00:00.000Z")
        );
        assert_eq!(
            normalized.end.unwrap().date_time.as_deref(),
            Some("2024-04-10T08:00:00.000Z")
        );
    }

    #[test]
    fn test_tomorrow_matches_system_date() {
        let validator = EventValidator::new();
        let mut e = event();
        e.start = Some(EventTime::at("tomorrow", "UTC"));

        let before = Utc::now();
        let normalized = validator.normalize_dates(e).unwrap();
        let after = Utc::now();

        let start = parse_instant(normalized.start.unwrap().date_time.as_deref().unwrap()).unwrap();
        let expected = [
            (before + Duration::days(1)).date_naive(),
            (after + Duration::days(1)).date_naive(),
        ];
        assert!(expected.contains(&start.date_naive()));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let validator = EventValidator::new();
        let once = validator.normalize_dates(event()).unwrap();
        let twice = validator.normalize_dates(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_rejects_unknown_phrase() {
        let validator = EventValidator::new();
        let mut e = event();
        e.end = Some(EventTime::at("after lunch", "UTC"));
        let err = validator.normalize_dates(e).unwrap_err();
        assert!(err.is_normalization());
        assert_eq!(err.to_string(), "Cannot normalize date-time: after lunch");
    }

    #[test]
    fn test_all_day_dates_left_alone() {
        let validator = EventValidator::new();
        let mut e = event();
        e.start = Some(EventTime::all_day("2024-01-15"));
        let normalized = validator.normalize_dates(e).unwrap();
        assert_eq!(normalized.start.unwrap(), EventTime::all_day("2024-01-15"));
    }

    #[test]
    fn test_custom_resolver() {
        struct Always(DateTime<Utc>);

        impl DatePhraseResolver for Always {
            fn resolve(&self, _phrase: &str, _now: DateTime<Utc>) -> Option<DateTime<Utc>> {
                Some(self.0)
            }
        }

        let fixed = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let validator = EventValidator::new().with_resolver(Arc::new(Always(fixed)));
        let normalized = validator.normalize_dates(event()).unwrap();
        assert_eq!(
            normalized.end.unwrap().date_time.as_deref(),
            Some("2030-01-01T00:00:00.000Z")
        );
    }

    #[test]
    fn test_empty_date_time_beside_date_is_absent() {
        let validator = EventValidator::new();
        let mut e = event();
        let all_day = EventTime {
            date_time: Some(String::new()),
            date: Some("2024-01-15".to_string()),
            time_zone: None,
        };
        e.start = Some(all_day.clone());
        e.end = Some(all_day.clone());

        let validated = validator.validate(e).unwrap();
        let normalized = validator.normalize_dates(validated).unwrap();
        assert_eq!(normalized.start, Some(all_day));
    }

    #[test]
    fn test_empty_strings_hit_the_either_rule() {
        let validator = EventValidator::new();
        let mut e = event();
        e.start = Some(EventTime {
            date_time: Some(String::new()),
            date: Some(String::new()),
            time_zone: None,
        });

        let err = validator.validate(e).unwrap_err();
        assert_eq!(err, ValidationError::EmptyTime(Bound::Start));
        assert_eq!(err.to_string(), "Event start must have either dateTime or date");
    }

    #[test]
    fn test_empty_record_email_is_skipped() {
        let validator = EventValidator::new();

        let mut e = event();
        e.attendees = Some(vec![Attendee::Record(AttendeeRecord {
            email: Some(String::new()),
            display_name: Some("Guest".to_string()),
            ..Default::default()
        })]);
        assert!(validator.validate(e).is_ok());

        let mut e = event();
        e.attendees = Some(vec![Attendee::Email(String::new())]);
        assert_eq!(
            validator.validate(e).unwrap_err(),
            ValidationError::InvalidEmail(String::new())
        );
    }

    #[test]
    fn test_naive_time_in_dst_gap_is_accepted() {
        let validator = EventValidator::new();
        let mut e = event();
        e.start = Some(EventTime::at("2024-03-10T02:30:00", "America/New_York"));
        e.end = Some(EventTime::at("2024-03-10T04:00:00", "America/New_York"));

        let normalized = validator
            .normalize_dates(validator.validate(e).unwrap())
            .unwrap();
        assert_eq!(
            normalized.start.unwrap().date_time.as_deref(),
            Some("2024-03-10T07:30:00.000Z")
        );
    }
}
