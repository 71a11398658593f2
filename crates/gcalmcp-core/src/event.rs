//! Calendar event records.
//!
//! [`Event`] mirrors the Calendar API `Event` resource closely enough to
//! render it, and keeps every field it does not model in [`Event::extra`] so
//! nothing the API returned is lost. Start and end values are kept as the
//! strings the API sent: ordering relies on the ISO-8601 text itself.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Start or end of an event.
///
/// Exactly one of `date_time` (timed events) or `date` (all-day events) is
/// normally present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// RFC 3339 timestamp for timed events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    /// `YYYY-MM-DD` for all-day events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// IANA timezone the event was written in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    /// Creates a timed value.
    pub fn from_date_time(date_time: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            ..Default::default()
        }
    }

    /// Creates an all-day value.
    pub fn from_date(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Default::default()
        }
    }

    /// Builder method to set the timezone.
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = Some(time_zone.into());
        self
    }

    /// The string used for chronological ordering: `dateTime`, else `date`,
    /// else empty.
    pub fn sort_key(&self) -> &str {
        self.date_time
            .as_deref()
            .or(self.date.as_deref())
            .unwrap_or("")
    }

}

/// An event attendee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

impl Attendee {
    /// Creates an attendee with only an email address.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }
}

/// A reminder override (`email` or `popup`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: String,
    pub minutes: u32,
}

/// Reminder settings of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    #[serde(default)]
    pub use_default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<ReminderOverride>,
}

/// A calendar event as returned by the events endpoints.
///
/// Decoding never fails on an object: a known field whose value has an
/// unexpected shape is left untouched in [`Event::extra`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Map<String, Value>")]
pub struct Event {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventDateTime>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<Attendee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Reminders>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recurrence: Vec<String>,
    /// Fields of the API resource not modelled above, or not in the modelled
    /// shape.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    /// Creates an event with an id and a summary.
    pub fn new(id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            summary: Some(summary.into()),
            ..Default::default()
        }
    }

    /// Builder method to set a timed start.
    pub fn with_start(mut self, start: EventDateTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Builder method to set the end.
    pub fn with_end(mut self, end: EventDateTime) -> Self {
        self.end = Some(end);
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Returns the summary, falling back to "Untitled" when blank.
    pub fn effective_title(&self) -> &str {
        self.summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Untitled")
    }

    /// Key used when ordering events from several calendars.
    pub fn start_key(&self) -> &str {
        self.start.as_ref().map(EventDateTime::sort_key).unwrap_or("")
    }

    /// Produces the merged form of this event, tagged with its source
    /// calendar.
    pub fn tagged(self, calendar_id: impl Into<String>) -> TaggedEvent {
        TaggedEvent {
            calendar_id: calendar_id.into(),
            event: self,
        }
    }
}

impl From<Map<String, Value>> for Event {
    fn from(mut fields: Map<String, Value>) -> Self {
        Self {
            id: take(&mut fields, "id"),
            summary: take(&mut fields, "summary"),
            description: take(&mut fields, "description"),
            location: take(&mut fields, "location"),
            status: take(&mut fields, "status"),
            html_link: take(&mut fields, "htmlLink"),
            color_id: take(&mut fields, "colorId"),
            start: take(&mut fields, "start"),
            end: take(&mut fields, "end"),
            attendees: take(&mut fields, "attendees").unwrap_or_default(),
            reminders: take(&mut fields, "reminders"),
            recurrence: take(&mut fields, "recurrence").unwrap_or_default(),
            extra: fields,
        }
    }
}

/// Removes `key` from `fields` when it is null or decodes as `T`.
fn take<T: DeserializeOwned>(fields: &mut Map<String, Value>, key: &str) -> Option<T> {
    if fields.get(key)?.is_null() {
        fields.remove(key);
        return None;
    }
    let value = T::deserialize(fields.get(key)?).ok()?;
    fields.remove(key);
    Some(value)
}

/// An event together with the calendar it was fetched from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedEvent {
    pub calendar_id: String,
    #[serde(flatten)]
    pub event: Event,
}

impl TaggedEvent {
    /// Key used when ordering events from several calendars.
    pub fn start_key(&self) -> &str {
        self.event.start_key()
    }
}
