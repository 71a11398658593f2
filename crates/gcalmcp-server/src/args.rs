//! Tool argument validation.
//!
//! Raw `tools/call` arguments are deserialized into loose `Raw*` structs and
//! then checked into the typed argument structs the tools run with. Every
//! rule violation is a [`ValidationError`] that names the offending field.

use chrono::Duration;
use gcalmcp_core::{Attendee, Event, EventDateTime, ReminderOverride, Reminders, time};
use gcalmcp_google::batch::MAX_BATCH_SIZE;
use gcalmcp_google::{EventFilters, FreeBusyItem, FreeBusyRequest};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

/// Longest free/busy window accepted.
pub const MAX_FREE_BUSY_DAYS: i64 = 92;

/// A tool argument that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid arguments: {field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Which calendars a listing covers, resolved once from `calendarId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarSelection {
    /// One calendar: listed with a direct call.
    Single(String),
    /// 2 to 50 calendars: listed through the batch endpoint.
    Multiple(Vec<String>),
}

impl CalendarSelection {
    /// Resolves `calendarId`: a string, an array of 1 to 50 strings, or a
    /// string holding such an array as JSON.
    ///
    /// A string that looks like JSON but does not decode to an array is used
    /// as a literal calendar id.
    pub fn parse(value: &Value) -> Result<Self, ValidationError> {
        match value {
            Value::String(text) => {
                if text.trim_start().starts_with('[') {
                    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) {
                        return Self::from_array(&items);
                    }
                }
                if text.trim().is_empty() {
                    return Err(ValidationError::new("calendarId", "must not be empty"));
                }
                Ok(Self::Single(text.clone()))
            }
            Value::Array(items) => Self::from_array(items),
            _ => Err(ValidationError::new(
                "calendarId",
                "must be a string or an array of strings",
            )),
        }
    }

    fn from_array(items: &[Value]) -> Result<Self, ValidationError> {
        if items.is_empty() || items.len() > MAX_BATCH_SIZE {
            return Err(ValidationError::new(
                "calendarId",
                format!(
                    "must contain between 1 and {} calendar ids, got {}",
                    MAX_BATCH_SIZE,
                    items.len()
                ),
            ));
        }

        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            match item.as_str() {
                Some(id) if !id.trim().is_empty() => ids.push(id.to_string()),
                _ => {
                    return Err(ValidationError::new(
                        "calendarId",
                        "every calendar id must be a non-empty string",
                    ));
                }
            }
        }

        if ids.len() == 1 {
            Ok(Self::Single(ids.remove(0)))
        } else {
            Ok(Self::Multiple(ids))
        }
    }
}

fn deserialize<T: DeserializeOwned>(arguments: &Map<String, Value>) -> Result<T, ValidationError> {
    serde_json::from_value(Value::Object(arguments.clone()))
        .map_err(|e| ValidationError::new("arguments", e.to_string()))
}

fn required(field: &str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(ValidationError::new(field, "must not be empty")),
        None => Err(ValidationError::new(field, "is required")),
    }
}

fn timestamp(field: &str, value: String) -> Result<String, ValidationError> {
    if time::is_timestamp_with_offset(&value) {
        Ok(value)
    } else {
        Err(ValidationError::new(
            field,
            format!(
                "'{}' must be an RFC 3339 date-time with a timezone offset, \
                 e.g. 2024-01-01T09:00:00Z or 2024-01-01T09:00:00+02:00",
                value
            ),
        ))
    }
}

fn optional_timestamp(field: &str, value: Option<String>) -> Result<Option<String>, ValidationError> {
    value.map(|v| timestamp(field, v)).transpose()
}

fn filters(time_min: Option<String>, time_max: Option<String>) -> Result<EventFilters, ValidationError> {
    let time_min = timestamp("timeMin", required("timeMin", time_min)?)?;
    let mut filters = EventFilters::new(time_min);
    if let Some(time_max) = optional_timestamp("timeMax", time_max)? {
        filters = filters.with_time_max(time_max);
    }
    Ok(filters)
}

/// Arguments of `list-events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEventsArgs {
    pub calendars: CalendarSelection,
    pub filters: EventFilters,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawListEventsArgs {
    calendar_id: Option<Value>,
    time_min: Option<String>,
    time_max: Option<String>,
}

impl ListEventsArgs {
    /// Validates raw `list-events` arguments.
    pub fn parse(arguments: &Map<String, Value>) -> Result<Self, ValidationError> {
        let raw: RawListEventsArgs = deserialize(arguments)?;
        let calendar_id = raw
            .calendar_id
            .ok_or_else(|| ValidationError::new("calendarId", "is required"))?;

        Ok(Self {
            calendars: CalendarSelection::parse(&calendar_id)?,
            filters: filters(raw.time_min, raw.time_max)?,
        })
    }
}

/// Arguments of `search-events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEventsArgs {
    pub calendar_id: String,
    pub query: String,
    pub filters: EventFilters,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSearchEventsArgs {
    calendar_id: Option<String>,
    query: Option<String>,
    time_min: Option<String>,
    time_max: Option<String>,
}

impl SearchEventsArgs {
    /// Validates raw `search-events` arguments.
    pub fn parse(arguments: &Map<String, Value>) -> Result<Self, ValidationError> {
        let raw: RawSearchEventsArgs = deserialize(arguments)?;
        Ok(Self {
            calendar_id: required("calendarId", raw.calendar_id)?,
            query: required("query", raw.query)?,
            filters: filters(raw.time_min, raw.time_max)?,
        })
    }
}

#[derive(Deserialize)]
struct RawAttendee {
    email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReminders {
    #[serde(default)]
    use_default: bool,
    #[serde(default)]
    overrides: Vec<ReminderOverride>,
}

/// Event fields shared by `create-event` and `update-event`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEventFields {
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    start: Option<String>,
    end: Option<String>,
    time_zone: Option<String>,
    attendees: Option<Vec<RawAttendee>>,
    color_id: Option<String>,
    reminders: Option<RawReminders>,
    recurrence: Option<Vec<String>>,
}

impl RawEventFields {
    /// Copies the optional fields onto `event`.
    fn apply(self, event: &mut Event) -> Result<(), ValidationError> {
        let time_zone = self.time_zone;
        let at = |field: &str, value: String| {
            let value = timestamp(field, value)?;
            let mut time = EventDateTime::from_date_time(value);
            if let Some(tz) = &time_zone {
                time = time.with_time_zone(tz.clone());
            }
            Ok::<_, ValidationError>(time)
        };

        if let Some(summary) = self.summary {
            event.summary = Some(summary);
        }
        event.description = self.description.or(event.description.take());
        event.location = self.location.or(event.location.take());
        if let Some(start) = self.start {
            event.start = Some(at("start", start)?);
        }
        if let Some(end) = self.end {
            event.end = Some(at("end", end)?);
        }
        if let Some(attendees) = self.attendees {
            event.attendees = attendees
                .into_iter()
                .map(|a| required("attendees.email", a.email).map(Attendee::new))
                .collect::<Result<_, _>>()?;
        }
        if let Some(color_id) = self.color_id {
            event.color_id = Some(required("colorId", Some(color_id))?);
        }
        if let Some(reminders) = self.reminders {
            for reminder in &reminders.overrides {
                if reminder.method != "email" && reminder.method != "popup" {
                    return Err(ValidationError::new(
                        "reminders.overrides.method",
                        format!("'{}' must be 'email' or 'popup'", reminder.method),
                    ));
                }
            }
            event.reminders = Some(Reminders {
                use_default: reminders.use_default,
                overrides: reminders.overrides,
            });
        }
        if let Some(recurrence) = self.recurrence {
            event.recurrence = recurrence;
        }
        Ok(())
    }
}

/// Arguments of `create-event`.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateEventArgs {
    pub calendar_id: String,
    pub event: Event,
}

impl CreateEventArgs {
    /// Validates raw `create-event` arguments.
    pub fn parse(arguments: &Map<String, Value>) -> Result<Self, ValidationError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            calendar_id: Option<String>,
        }
        let raw: Raw = deserialize(arguments)?;
        let calendar_id = required("calendarId", raw.calendar_id)?;

        let fields: RawEventFields = deserialize(arguments)?;
        let summary = required("summary", fields.summary.clone())?;
        required("start", fields.start.clone())?;
        required("end", fields.end.clone())?;

        let mut event = Event {
            summary: Some(summary),
            ..Event::default()
        };
        fields.apply(&mut event)?;

        Ok(Self { calendar_id, event })
    }
}

/// Arguments of `update-event`; `changes` only carries the fields to patch.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateEventArgs {
    pub calendar_id: String,
    pub event_id: String,
    pub changes: Event,
}

impl UpdateEventArgs {
    /// Validates raw `update-event` arguments.
    pub fn parse(arguments: &Map<String, Value>) -> Result<Self, ValidationError> {
        let (calendar_id, event_id) = event_ref(arguments)?;

        let mut changes = Event::default();
        deserialize::<RawEventFields>(arguments)?.apply(&mut changes)?;
        if changes == Event::default() {
            return Err(ValidationError::new("arguments", "no fields to update"));
        }

        Ok(Self {
            calendar_id,
            event_id,
            changes,
        })
    }
}

/// Arguments of `delete-event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEventArgs {
    pub calendar_id: String,
    pub event_id: String,
}

impl DeleteEventArgs {
    /// Validates raw `delete-event` arguments.
    pub fn parse(arguments: &Map<String, Value>) -> Result<Self, ValidationError> {
        let (calendar_id, event_id) = event_ref(arguments)?;
        Ok(Self {
            calendar_id,
            event_id,
        })
    }
}

fn event_ref(arguments: &Map<String, Value>) -> Result<(String, String), ValidationError> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Raw {
        calendar_id: Option<String>,
        event_id: Option<String>,
    }
    let raw: Raw = deserialize(arguments)?;
    Ok((
        required("calendarId", raw.calendar_id)?,
        required("eventId", raw.event_id)?,
    ))
}

/// Arguments of `get-freebusy`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeBusyArgs {
    pub request: FreeBusyRequest,
}

impl FreeBusyArgs {
    /// Validates raw `get-freebusy` arguments.
    pub fn parse(arguments: &Map<String, Value>) -> Result<Self, ValidationError> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            time_min: Option<String>,
            time_max: Option<String>,
            time_zone: Option<String>,
            items: Option<Vec<RawAttendeeId>>,
        }
        #[derive(Deserialize)]
        struct RawAttendeeId {
            id: Option<String>,
        }

        let raw: Raw = deserialize(arguments)?;
        let time_min = timestamp("timeMin", required("timeMin", raw.time_min)?)?;
        let time_max = timestamp("timeMax", required("timeMax", raw.time_max)?)?;

        match time::window_span(&time_min, &time_max) {
            Some(span) if span <= Duration::zero() => {
                return Err(ValidationError::new("timeMax", "must be after timeMin"));
            }
            Some(span) if span > Duration::days(MAX_FREE_BUSY_DAYS) => {
                return Err(ValidationError::new(
                    "timeMax",
                    format!("window must not exceed {} days", MAX_FREE_BUSY_DAYS),
                ));
            }
            _ => {}
        }

        let items = raw.items.unwrap_or_default();
        if items.is_empty() {
            return Err(ValidationError::new("items", "must list at least one calendar"));
        }
        let items = items
            .into_iter()
            .map(|item| required("items.id", item.id).map(|id| FreeBusyItem { id }))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            request: FreeBusyRequest {
                time_min,
                time_max,
                time_zone: raw.time_zone,
                items,
            },
        })
    }
}
