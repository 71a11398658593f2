//! Event search and mutation tools.

use serde_json::{Map, Value, json};

use gcalmcp_core::{format_event, format_single_calendar};
use gcalmcp_google::{AuthorizedClient, CalendarService};

use super::ToolOutput;
use crate::args::{CreateEventArgs, DeleteEventArgs, SearchEventsArgs, UpdateEventArgs};

fn timestamp_property(description: &str) -> Value {
    json!({"type": "string", "format": "date-time", "description": description})
}

fn event_properties() -> Map<String, Value> {
    let properties = json!({
        "summary": {"type": "string", "description": "Event title"},
        "description": {"type": "string"},
        "location": {"type": "string"},
        "start": timestamp_property("Start, RFC 3339 with offset"),
        "end": timestamp_property("End, RFC 3339 with offset"),
        "timeZone": {"type": "string", "description": "IANA timezone, e.g. Europe/Paris"},
        "attendees": {
            "type": "array",
            "items": {
                "type": "object",
                "properties": {"email": {"type": "string", "format": "email"}},
                "required": ["email"]
            }
        },
        "colorId": {"type": "string", "description": "Event color id, see list-colors"},
        "reminders": {
            "type": "object",
            "properties": {
                "useDefault": {"type": "boolean"},
                "overrides": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "method": {"type": "string", "enum": ["email", "popup"]},
                            "minutes": {"type": "integer", "minimum": 0}
                        },
                        "required": ["method", "minutes"]
                    }
                }
            }
        },
        "recurrence": {
            "type": "array",
            "items": {"type": "string"},
            "description": "RRULE, EXRULE, RDATE or EXDATE lines"
        }
    });
    match properties {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn object_schema(mut properties: Map<String, Value>, extra: Value, required: &[&str]) -> Value {
    if let Value::Object(extra) = extra {
        properties.extend(extra);
    }
    json!({"type": "object", "properties": properties, "required": required})
}

pub(super) fn search_schema() -> Value {
    object_schema(
        Map::new(),
        json!({
            "calendarId": {"type": "string"},
            "query": {"type": "string", "description": "Free text matched against event fields"},
            "timeMin": timestamp_property("Start of the window, RFC 3339 with offset"),
            "timeMax": timestamp_property("End of the window, RFC 3339 with offset")
        }),
        &["calendarId", "query", "timeMin"],
    )
}

pub(super) fn create_schema() -> Value {
    object_schema(
        event_properties(),
        json!({"calendarId": {"type": "string"}}),
        &["calendarId", "summary", "start", "end"],
    )
}

pub(super) fn update_schema() -> Value {
    object_schema(
        event_properties(),
        json!({"calendarId": {"type": "string"}, "eventId": {"type": "string"}}),
        &["calendarId", "eventId"],
    )
}

pub(super) fn delete_schema() -> Value {
    object_schema(
        Map::new(),
        json!({"calendarId": {"type": "string"}, "eventId": {"type": "string"}}),
        &["calendarId", "eventId"],
    )
}

pub(super) async fn search(client: &dyn AuthorizedClient, arguments: &Map<String, Value>) -> ToolOutput {
    let args = SearchEventsArgs::parse(arguments)?;
    let events = CalendarService::new(client)
        .search_events(&args.calendar_id, &args.query, &args.filters)
        .await?;
    Ok(format_single_calendar(&events))
}

pub(super) async fn create(client: &dyn AuthorizedClient, arguments: &Map<String, Value>) -> ToolOutput {
    let args = CreateEventArgs::parse(arguments)?;
    let event = CalendarService::new(client)
        .insert_event(&args.calendar_id, &args.event)
        .await?;
    Ok(format!("Event created:\n{}", format_event(&event)))
}

pub(super) async fn update(client: &dyn AuthorizedClient, arguments: &Map<String, Value>) -> ToolOutput {
    let args = UpdateEventArgs::parse(arguments)?;
    let event = CalendarService::new(client)
        .patch_event(&args.calendar_id, &args.event_id, &args.changes)
        .await?;
    Ok(format!("Event updated:\n{}", format_event(&event)))
}

pub(super) async fn delete(client: &dyn AuthorizedClient, arguments: &Map<String, Value>) -> ToolOutput {
    let args = DeleteEventArgs::parse(arguments)?;
    CalendarService::new(client)
        .delete_event(&args.calendar_id, &args.event_id)
        .await?;
    Ok(format!("Event {} deleted.", args.event_id))
}
