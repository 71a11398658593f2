//! `list-events`: one calendar directly, several through the batch endpoint.

use serde_json::{Map, Value, json};
use tracing::debug;

use gcalmcp_core::{format_batch_outcome, format_single_calendar};
use gcalmcp_google::batch::list_events_batch;
use gcalmcp_google::{AuthorizedClient, CalendarService, ProviderResult};

use super::ToolOutput;
use crate::args::{CalendarSelection, ListEventsArgs};

pub(super) fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "calendarId": {
                "oneOf": [
                    {
                        "type": "string",
                        "description": "Calendar id ('primary' for the main calendar), or a JSON array of ids"
                    },
                    {
                        "type": "array",
                        "items": {"type": "string"},
                        "minItems": 1,
                        "maxItems": 50,
                        "description": "Up to 50 calendar ids, fetched in one request"
                    }
                ]
            },
            "timeMin": {
                "type": "string",
                "format": "date-time",
                "description": "Start of the window, RFC 3339 with offset (e.g. 2024-01-01T00:00:00Z)"
            },
            "timeMax": {
                "type": "string",
                "format": "date-time",
                "description": "End of the window, RFC 3339 with offset"
            }
        },
        "required": ["calendarId", "timeMin"]
    })
}

pub(super) async fn run(client: &dyn AuthorizedClient, arguments: &Map<String, Value>) -> ToolOutput {
    let args = ListEventsArgs::parse(arguments)?;
    Ok(BatchListEventsHandler::new(client).list(&args).await?)
}

/// Lists events for a [`CalendarSelection`].
///
/// A single calendar never touches the batch endpoint; 2 to 50 calendars
/// cost exactly one network call.
pub struct BatchListEventsHandler<'a> {
    client: &'a dyn AuthorizedClient,
}

impl<'a> BatchListEventsHandler<'a> {
    pub fn new(client: &'a dyn AuthorizedClient) -> Self {
        Self { client }
    }

    /// Fetches and renders the events selected by `args`.
    pub async fn list(&self, args: &ListEventsArgs) -> ProviderResult<String> {
        match &args.calendars {
            CalendarSelection::Single(calendar_id) => {
                debug!(calendar_id = %calendar_id, "listing events of a single calendar");
                let events = CalendarService::new(self.client)
                    .list_events(calendar_id, &args.filters)
                    .await?;
                Ok(format_single_calendar(&events))
            }
            CalendarSelection::Multiple(calendar_ids) => {
                let outcome = list_events_batch(self.client, calendar_ids, &args.filters).await?;
                Ok(format_batch_outcome(&outcome, calendar_ids))
            }
        }
    }
}
