use crate::components::calendar::models::{EventStatus, Transparency, Visibility};
use crate::components::calendar::{Event, EventTime};
use crate::utils::time::{epoch_millis, to_iso_utc};
use chrono::{DateTime, Duration, Utc};

/// Length of a generated event
pub const DEFAULT_DURATION_MS: i64 = 60 * 60 * 1000;

/// Deterministic stand-in for a model answer
///
/// Starts at `now`, lasts one hour, and embeds the raw input verbatim in
/// the summary and description.
pub fn mock_event(input: &str, now: DateTime<Utc>) -> Event {
    let end = now + Duration::milliseconds(DEFAULT_DURATION_MS);
    let stamp = epoch_millis(&now);

    Event {
        kind: Some("calendar#event".to_string()),
        etag: Some(format!("\"{}\"", stamp)),
        id: Some(format!("mock_{}", stamp)),
        summary: Some(format!("Event from: {}", input)),
        description: Some(format!("Generated from: {}", input)),
        start: Some(EventTime::at(to_iso_utc(&now), "UTC")),
        end: Some(EventTime::at(to_iso_utc(&end), "UTC")),
        attendees: Some(Vec::new()),
        status: Some(EventStatus::Confirmed),
        visibility: Some(Visibility::Default),
        transparency: Some(Transparency::Opaque),
        ..Default::default()
    }
}
