//! Text rendering of events and batch outcomes for tool results.
//!
//! Every event is rendered as one block:
//!
//! ```text
//! Team sync (evt123)
//! Location: Room 4
//! Start: 2024-01-15T09:00:00Z
//! End: 2024-01-15T09:30:00Z
//! Attendees: alice@example.com (accepted)
//! ```
//!
//! Blocks are separated by a blank line. Multi-calendar listings add a
//! `Found N events across M calendars:` header, group blocks under
//! `Calendar: <id>` headings in request order, and end with an `Errors:`
//! section when any calendar failed.

use crate::event::{Event, EventDateTime};
use crate::outcome::BatchOutcome;

/// Renders a single event block (no trailing newline).
pub fn format_event(event: &Event) -> String {
    let mut lines = vec![format!(
        "{} ({})",
        event.effective_title(),
        event.id.as_deref().unwrap_or("no id")
    )];

    if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
        lines.push(format!("Location: {}", location));
    }

    lines.push(format!("Start: {}", time_text(event.start.as_ref())));
    lines.push(format!("End: {}", time_text(event.end.as_ref())));

    if !event.attendees.is_empty() {
        let attendees: Vec<String> = event
            .attendees
            .iter()
            .map(|a| {
                format!(
                    "{} ({})",
                    a.email
                        .as_deref()
                        .or(a.display_name.as_deref())
                        .unwrap_or("unknown"),
                    a.response_status.as_deref().unwrap_or("unknown")
                )
            })
            .collect();
        lines.push(format!("Attendees: {}", attendees.join(", ")));
    }

    if let Some(color_id) = &event.color_id {
        lines.push(format!("Color ID: {}", color_id));
    }

    if let Some(reminders) = &event.reminders {
        if !reminders.overrides.is_empty() {
            let overrides: Vec<String> = reminders
                .overrides
                .iter()
                .map(|r| format!("{} {} min", r.method, r.minutes))
                .collect();
            lines.push(format!("Reminders: {}", overrides.join(", ")));
        } else if reminders.use_default {
            lines.push("Reminders: default".to_string());
        }
    }

    lines.join("\n")
}

fn time_text(time: Option<&EventDateTime>) -> &str {
    match time.map(EventDateTime::sort_key) {
        Some(text) if !text.is_empty() => text,
        _ => "unspecified",
    }
}

/// Renders a list of events, blocks separated by a blank line.
pub fn format_event_list<'a, I>(events: I) -> String
where
    I: IntoIterator<Item = &'a Event>,
{
    events
        .into_iter()
        .map(format_event)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders the direct single-calendar listing.
pub fn format_single_calendar(events: &[Event]) -> String {
    if events.is_empty() {
        return "No events found.".to_string();
    }
    format_event_list(events)
}

/// Renders a merged multi-calendar outcome.
///
/// `calendar_ids` is the requested id list; duplicates count once in the
/// header and share one group.
pub fn format_batch_outcome(outcome: &BatchOutcome, calendar_ids: &[String]) -> String {
    let mut distinct: Vec<&str> = Vec::new();
    for id in calendar_ids {
        if !distinct.contains(&id.as_str()) {
            distinct.push(id);
        }
    }

    let mut sections = vec![format!(
        "Found {} events across {} calendars:",
        outcome.events().len(),
        distinct.len()
    )];

    for calendar_id in &distinct {
        let events: Vec<&Event> = outcome
            .events()
            .iter()
            .filter(|e| e.calendar_id == *calendar_id)
            .map(|e| &e.event)
            .collect();
        if events.is_empty() {
            continue;
        }
        sections.push(format!(
            "Calendar: {}\n{}",
            calendar_id,
            format_event_list(events)
        ));
    }

    if outcome.has_errors() {
        let lines: Vec<String> = outcome
            .errors()
            .iter()
            .map(|e| format!("- {}: {}", e.calendar_id, e.message()))
            .collect();
        sections.push(format!("Errors:\n{}", lines.join("\n")));
    }

    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Attendee, ReminderOverride, Reminders};
    use crate::outcome::{BatchOutcomeBuilder, CalendarError};
    use serde_json::json;

    fn timed(id: &str, summary: &str, start: &str, end: &str) -> Event {
        Event::new(id, summary)
            .with_start(EventDateTime::from_date_time(start))
            .with_end(EventDateTime::from_date_time(end))
    }

    #[test]
    fn event_block_minimal() {
        let event = timed("e1", "Standup", "2024-01-15T09:00:00Z", "2024-01-15T09:15:00Z");
        assert_eq!(
            format_event(&event),
            "Standup (e1)\nStart: 2024-01-15T09:00:00Z\nEnd: 2024-01-15T09:15:00Z"
        );
    }

    #[test]
    fn event_block_full() {
        let mut event = timed("e2", "Planning", "2024-01-15T10:00:00Z", "2024-01-15T11:00:00Z")
            .with_location("Room 4");
        event.attendees = vec![
            Attendee {
                response_status: Some("accepted".to_string()),
                ..Attendee::new("alice@example.com")
            },
            Attendee::new("bob@example.com"),
        ];
        event.color_id = Some("5".to_string());
        event.reminders = Some(Reminders {
            use_default: false,
            overrides: vec![ReminderOverride {
                method: "popup".to_string(),
                minutes: 10,
            }],
        });

        insta::assert_snapshot!(format_event(&event), @r"
        Planning (e2)
        Location: Room 4
        Start: 2024-01-15T10:00:00Z
        End: 2024-01-15T11:00:00Z
        Attendees: alice@example.com (accepted), bob@example.com (unknown)
        Color ID: 5
        Reminders: popup 10 min
        ");
    }

    #[test]
    fn event_block_all_day_without_id() {
        let mut event = Event::default();
        event.start = Some(EventDateTime::from_date("2024-01-15"));
        assert_eq!(
            format_event(&event),
            "Untitled (no id)\nStart: 2024-01-15\nEnd: unspecified"
        );
    }

    #[test]
    fn single_calendar_empty() {
        assert_eq!(format_single_calendar(&[]), "No events found.");
    }

    #[test]
    fn single_calendar_has_no_grouping_header() {
        let events = vec![
            timed("a", "One", "2024-01-15T09:00:00Z", "2024-01-15T10:00:00Z"),
            timed("b", "Two", "2024-01-16T09:00:00Z", "2024-01-16T10:00:00Z"),
        ];
        let text = format_single_calendar(&events);
        assert!(!text.contains("Calendar:"));
        assert!(!text.contains("Found"));
        assert_eq!(text.matches("\n\n").count(), 1);
    }

    #[test]
    fn batch_outcome_grouped_with_errors() {
        let mut builder = BatchOutcomeBuilder::new();
        builder.push_events(
            "primary",
            vec![timed("p1", "Dentist", "2024-01-15T14:00:00Z", "2024-01-15T15:00:00Z")],
        );
        builder.push_error(CalendarError::new(
            "gone@example.com",
            404,
            json!({"error": {"code": 404, "message": "Not Found"}}),
        ));
        builder.push_events(
            "work@example.com",
            vec![timed("w1", "Standup", "2024-01-15T09:00:00Z", "2024-01-15T09:15:00Z")],
        );
        let outcome = builder.finish();

        let ids = vec![
            "primary".to_string(),
            "gone@example.com".to_string(),
            "work@example.com".to_string(),
        ];

        insta::assert_snapshot!(format_batch_outcome(&outcome, &ids), @r"
        Found 2 events across 3 calendars:

        Calendar: primary
        Dentist (p1)
        Start: 2024-01-15T14:00:00Z
        End: 2024-01-15T15:00:00Z

        Calendar: work@example.com
        Standup (w1)
        Start: 2024-01-15T09:00:00Z
        End: 2024-01-15T09:15:00Z

        Errors:
        - gone@example.com: Not Found (HTTP 404)
        ");
    }

    #[test]
    fn batch_outcome_counts_distinct_calendars() {
        let outcome = BatchOutcomeBuilder::new().finish();
        let ids = vec!["primary".to_string(), "primary".to_string()];
        assert_eq!(
            format_batch_outcome(&outcome, &ids),
            "Found 0 events across 1 calendars:"
        );
    }

    #[test]
    fn batch_outcome_group_keeps_chronological_order() {
        let mut builder = BatchOutcomeBuilder::new();
        builder.push_events(
            "primary",
            vec![
                timed("late", "Late", "2024-01-15T18:00:00Z", "2024-01-15T19:00:00Z"),
                timed("early", "Early", "2024-01-15T08:00:00Z", "2024-01-15T09:00:00Z"),
            ],
        );
        builder.push_events(
            "team",
            vec![timed("mid", "Mid", "2024-01-15T12:00:00Z", "2024-01-15T13:00:00Z")],
        );
        let outcome = builder.finish();
        let text = format_batch_outcome(&outcome, &["primary".to_string(), "team".to_string()]);

        let early = text.find("Early (early)").unwrap();
        let late = text.find("Late (late)").unwrap();
        assert!(early < late);
        assert!(text.starts_with("Found 3 events across 2 calendars:"));
    }
}
