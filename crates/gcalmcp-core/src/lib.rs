//! Core types: events, batch outcomes, timestamps, text rendering

pub mod event;
pub mod format;
pub mod outcome;
pub mod time;
pub mod tracing;

pub use event::{Attendee, Event, EventDateTime, ReminderOverride, Reminders, TaggedEvent};
pub use format::{format_batch_outcome, format_event, format_event_list, format_single_calendar};
pub use outcome::{BatchOutcome, BatchOutcomeBuilder, CalendarError};
pub use time::{is_timestamp_with_offset, parse_timestamp, window_span};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
