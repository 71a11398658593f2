//! Result of a multi-calendar event listing.
//!
//! A [`BatchOutcome`] is assembled through [`BatchOutcomeBuilder`]: events
//! and per-calendar failures are appended in calendar order, and
//! [`BatchOutcomeBuilder::finish`] applies the final chronological ordering.
//! Once finished the outcome is read-only.

use serde::Serialize;
use serde_json::Value;

use crate::event::{Event, TaggedEvent};

/// A calendar whose sub-request failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarError {
    /// The calendar the failing sub-request addressed.
    pub calendar_id: String,
    /// HTTP status of the sub-response.
    pub status: u16,
    /// The sub-response body (JSON, or a string for non-JSON bodies).
    pub error: Value,
}

impl CalendarError {
    /// Creates a new calendar error.
    pub fn new(calendar_id: impl Into<String>, status: u16, error: Value) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            status,
            error,
        }
    }

    /// Human-readable message extracted from the error body.
    ///
    /// Google error bodies look like `{"error": {"code": 404, "message": ...}}`;
    /// anything else is rendered as-is.
    pub fn message(&self) -> String {
        let detail = match &self.error {
            Value::Object(map) => map
                .get("error")
                .and_then(|e| match e {
                    Value::Object(inner) => inner.get("message").and_then(Value::as_str),
                    Value::String(s) => Some(s.as_str()),
                    _ => None,
                })
                .map(str::to_string)
                .unwrap_or_else(|| self.error.to_string()),
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            Value::Null | Value::String(_) => "no response body".to_string(),
            other => other.to_string(),
        };
        format!("{} (HTTP {})", detail, self.status)
    }
}

/// Merged events and failures of a batch listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    events: Vec<TaggedEvent>,
    errors: Vec<CalendarError>,
}

impl BatchOutcome {
    /// Events in chronological order.
    pub fn events(&self) -> &[TaggedEvent] {
        &self.events
    }

    /// Failures in calendar order.
    pub fn errors(&self) -> &[CalendarError] {
        &self.errors
    }

    /// Returns true if at least one calendar failed.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Incremental builder for [`BatchOutcome`].
#[derive(Debug, Default)]
pub struct BatchOutcomeBuilder {
    events: Vec<TaggedEvent>,
    errors: Vec<CalendarError>,
}

impl BatchOutcomeBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the events of one calendar, tagging each with `calendar_id`.
    pub fn push_events<I>(&mut self, calendar_id: &str, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        self.events
            .extend(events.into_iter().map(|event| event.tagged(calendar_id)));
    }

    /// Records a failed calendar.
    pub fn push_error(&mut self, error: CalendarError) {
        self.errors.push(error);
    }

    /// Sorts the collected events by start key and freezes the outcome.
    ///
    /// The sort is stable: events with equal keys keep their insertion
    /// order, i.e. per-calendar order, then calendar request order.
    pub fn finish(mut self) -> BatchOutcome {
        self.events.sort_by(|a, b| a.start_key().cmp(b.start_key()));
        BatchOutcome {
            events: self.events,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventDateTime;
    use serde_json::json;

    fn timed(id: &str, start: &str) -> Event {
        Event::new(id, id).with_start(EventDateTime::from_date_time(start))
    }

    fn all_day(id: &str, date: &str) -> Event {
        Event::new(id, id).with_start(EventDateTime::from_date(date))
    }

    fn ids(outcome: &BatchOutcome) -> Vec<&str> {
        outcome
            .events()
            .iter()
            .map(|e| e.event.id.as_deref().unwrap())
            .collect()
    }

    #[test]
    fn all_day_sorts_before_timed_on_same_day() {
        let mut builder = BatchOutcomeBuilder::new();
        builder.push_events("work", vec![timed("b", "2024-01-15T09:00:00Z")]);
        builder.push_events("primary", vec![all_day("a", "2024-01-15")]);

        let outcome = builder.finish();
        assert_eq!(ids(&outcome), vec!["a", "b"]);
    }

    #[test]
    fn equal_keys_keep_insertion_order() {
        let mut builder = BatchOutcomeBuilder::new();
        builder.push_events(
            "one",
            vec![timed("x", "2024-01-15T09:00:00Z"), timed("y", "2024-01-15T09:00:00Z")],
        );
        builder.push_events("two", vec![timed("z", "2024-01-15T09:00:00Z")]);

        let outcome = builder.finish();
        assert_eq!(ids(&outcome), vec!["x", "y", "z"]);
        assert_eq!(outcome.events()[2].calendar_id, "two");
    }

    #[test]
    fn events_without_start_come_first() {
        let mut builder = BatchOutcomeBuilder::new();
        builder.push_events("c", vec![timed("late", "2024-02-01T00:00:00Z")]);
        builder.push_events("c", vec![Event::new("none", "none")]);

        let outcome = builder.finish();
        assert_eq!(ids(&outcome), vec!["none", "late"]);
    }

    #[test]
    fn errors_keep_order() {
        let mut builder = BatchOutcomeBuilder::new();
        builder.push_error(CalendarError::new("a", 404, json!("gone")));
        builder.push_error(CalendarError::new("b", 403, json!("denied")));

        let outcome = builder.finish();
        assert!(outcome.has_errors());
        let cals: Vec<_> = outcome.errors().iter().map(|e| e.calendar_id.as_str()).collect();
        assert_eq!(cals, vec!["a", "b"]);
    }

    #[test]
    fn error_message_from_google_body() {
        let err = CalendarError::new(
            "missing@example.com",
            404,
            json!({"error": {"code": 404, "message": "Not Found"}}),
        );
        assert_eq!(err.message(), "Not Found (HTTP 404)");
    }

    #[test]
    fn error_message_from_raw_text() {
        let err = CalendarError::new("c", 502, json!("Bad Gateway\n"));
        assert_eq!(err.message(), "Bad Gateway (HTTP 502)");

        let err = CalendarError::new("c", 500, Value::Null);
        assert_eq!(err.message(), "no response body (HTTP 500)");
    }
}
