//! Merging per-calendar sub-responses into one [`BatchOutcome`].

use gcalmcp_core::{BatchOutcome, BatchOutcomeBuilder, CalendarError, Event};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::response::SubResponse;
use crate::error::{ProviderError, ProviderResult};

/// Merges `responses[i]` as the answer for `calendar_ids[i]`.
///
/// Both slices must have the same length; a mismatch is an internal error.
/// A failing calendar is recorded in the outcome's errors and never hides
/// the events of the others.
pub fn merge(calendar_ids: &[String], responses: &[SubResponse]) -> ProviderResult<BatchOutcome> {
    if calendar_ids.len() != responses.len() {
        return Err(ProviderError::internal(format!(
            "batch returned {} responses for {} calendars",
            responses.len(),
            calendar_ids.len()
        )));
    }

    Ok(merge_pairs(
        calendar_ids
            .iter()
            .map(String::as_str)
            .zip(responses.iter()),
    ))
}

/// Merges already-correlated `(calendar id, sub-response)` pairs.
pub(crate) fn merge_pairs<'a, I>(pairs: I) -> BatchOutcome
where
    I: IntoIterator<Item = (&'a str, &'a SubResponse)>,
{
    let mut builder = BatchOutcomeBuilder::new();

    for (calendar_id, response) in pairs {
        if response.is_success() {
            match events_of(response) {
                Ok(events) => {
                    debug!(calendar_id, count = events.len(), "calendar merged");
                    builder.push_events(calendar_id, events);
                }
                Err(reason) => {
                    warn!(calendar_id, %reason, "unreadable events listing");
                    builder.push_error(CalendarError::new(
                        calendar_id,
                        response.status,
                        json!({"error": {"message": reason}}),
                    ));
                }
            }
        } else {
            debug!(calendar_id, status = response.status, "calendar failed");
            builder.push_error(CalendarError::new(
                calendar_id,
                response.status,
                response.body.to_value(),
            ));
        }
    }

    builder.finish()
}

/// Decodes the `items` of a successful listing. A non-object item makes
/// the whole listing unreadable, as it does for a direct events call.
fn events_of(response: &SubResponse) -> Result<Vec<Event>, String> {
    let Some(items) = response
        .body
        .as_json()
        .and_then(|body| body.get("items"))
        .and_then(Value::as_array)
    else {
        return Ok(Vec::new());
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(Event::from(fields.clone())),
            _ => Err(format!("event item {} is not an object", index + 1)),
        })
        .collect()
}
