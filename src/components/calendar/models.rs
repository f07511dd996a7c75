use crate::utils::time::{epoch_millis, to_iso_utc};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Google Calendar style event record
///
/// Every field is optional at the type level so that incomplete records
/// coming from a model or a caller can still be parsed and then reported by
/// the validator. Fields this type does not know about are kept in `extra`
/// and written back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<Attendee>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<Transparency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Reminders>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Start or end of an event
///
/// `date_time` holds either an absolute instant or, before normalization, a
/// relative phrase such as "tomorrow at 2pm".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    /// A timed start/end in the given zone
    pub fn at(date_time: impl Into<String>, time_zone: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            date: None,
            time_zone: Some(time_zone.into()),
        }
    }

    /// An all-day start/end
    pub fn all_day(date: impl Into<String>) -> Self {
        Self {
            date_time: None,
            date: Some(date.into()),
            time_zone: None,
        }
    }

    /// The `dateTime` value, with an empty string counted as absent
    pub fn date_time_value(&self) -> Option<&str> {
        self.date_time.as_deref().filter(|v| !v.is_empty())
    }

    /// The `date` value, with an empty string counted as absent
    pub fn date_value(&self) -> Option<&str> {
        self.date.as_deref().filter(|v| !v.is_empty())
    }

    /// Whether either form carries a value
    pub fn has_value(&self) -> bool {
        self.date_time_value().is_some() || self.date_value().is_some()
    }
}

/// One attendee entry
///
/// Models and callers send either a bare email or an object; anything else
/// is carried along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Attendee {
    Email(String),
    Record(AttendeeRecord),
    Other(Value),
}

impl Attendee {
    /// The email to validate, if this entry carries one
    ///
    /// A record with an empty email carries none; a bare empty string is
    /// still returned so that it fails validation.
    pub fn email(&self) -> Option<&str> {
        match self {
            Attendee::Email(email) => Some(email),
            Attendee::Record(record) => record.email.as_deref().filter(|e| !e.is_empty()),
            Attendee::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Default,
    Public,
    Private,
    Confidential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transparency {
    Opaque,
    Transparent,
}

/// Reminder configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<Vec<ReminderOverride>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<ReminderMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMethod {
    Email,
    Popup,
}

/// Query options for listing events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_max: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default = "default_single_events")]
    pub single_events: bool,
    #[serde(default = "default_order_by")]
    pub order_by: String,
}

fn default_max_results() -> u32 {
    10
}

fn default_single_events() -> bool {
    true
}

fn default_order_by() -> String {
    "startTime".to_string()
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            time_min: None,
            time_max: None,
            max_results: default_max_results(),
            single_events: default_single_events(),
            order_by: default_order_by(),
        }
    }
}

/// Structured partial update sent by clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attendees: Option<Vec<String>>,
}

impl EventUpdate {
    /// Build the full event stored for `event_id`
    ///
    /// Missing times default to `now` and one hour later; attendee emails
    /// become attendee records.
    pub fn into_event(self, event_id: &str, default_summary: &str, now: DateTime<Utc>) -> Event {
        let start = self.start.unwrap_or_else(|| to_iso_utc(&now));
        let end = self
            .end
            .unwrap_or_else(|| to_iso_utc(&(now + Duration::hours(1))));
        let attendees = self
            .attendees
            .unwrap_or_default()
            .into_iter()
            .map(|email| {
                Attendee::Record(AttendeeRecord {
                    email: Some(email),
                    ..Default::default()
                })
            })
            .collect();

        Event {
            kind: Some("calendar#event".to_string()),
            etag: Some(format!("\"{}\"", epoch_millis(&now))),
            id: Some(event_id.to_string()),
            summary: Some(self.title.unwrap_or_else(|| default_summary.to_string())),
            description: self.description,
            location: self.location,
            start: Some(EventTime {
                date_time: Some(start),
                ..Default::default()
            }),
            end: Some(EventTime {
                date_time: Some(end),
                ..Default::default()
            }),
            attendees: Some(attendees),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_keeps_unknown_fields() {
        let raw = json!({
            "summary": "Standup",
            "start": { "dateTime": "2024-01-15T09:00:00Z" },
            "end": { "dateTime": "2024-01-15T09:15:00Z" },
            "hangoutLink": "https://meet.example.com/abc",
            "colorId": "4"
        });

        let event: Event = serde_json::from_value(raw).unwrap();
        assert_eq!(event.color_id.as_deref(), Some("4"));
        assert_eq!(
            event.extra.get("hangoutLink"),
            Some(&json!("https://meet.example.com/abc"))
        );

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["hangoutLink"], "https://meet.example.com/abc");
        assert_eq!(back["start"]["dateTime"], "2024-01-15T09:00:00Z");
        assert!(back.get("location").is_none());
    }

    #[test]
    fn test_attendee_shapes() {
        let attendees: Vec<Attendee> = serde_json::from_value(json!([
            "john@example.com",
            { "email": "jane@example.com", "displayName": "Jane" },
            { "displayName": "No Email" },
            42
        ]))
        .unwrap();

        assert_eq!(attendees[0].email(), Some("john@example.com"));
        assert_eq!(attendees[1].email(), Some("jane@example.com"));
        assert_eq!(attendees[2].email(), None);
        assert!(matches!(attendees[3], Attendee::Other(_)));
    }

    #[test]
    fn test_list_options_defaults() {
        let options: ListOptions = serde_json::from_value(json!({ "timeMin": "2024-01-01T00:00:00Z" })).unwrap();
        assert_eq!(options.max_results, 10);
        assert!(options.single_events);
        assert_eq!(options.order_by, "startTime");
        assert_eq!(options.time_min.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_update_into_event() {
        use chrono::TimeZone;

        let now = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
        let update = EventUpdate {
            title: None,
            start: Some("2024-03-11T09:00:00Z".to_string()),
            attendees: Some(vec!["ann@example.com".to_string()]),
            ..Default::default()
        };

        let event = update.into_event("evt-1", "Updated Event", now);
        assert_eq!(event.id.as_deref(), Some("evt-1"));
        assert_eq!(event.summary.as_deref(), Some("Updated Event"));
        assert_eq!(
            event.start.unwrap().date_time.as_deref(),
            Some("2024-03-11T09:00:00Z")
        );
        assert_eq!(
            event.end.unwrap().date_time.as_deref(),
            Some("2024-03-10T09:00:00.000Z")
        );
        let attendees = event.attendees.unwrap();
        assert_eq!(attendees[0].email(), Some("ann@example.com"));
    }
}
