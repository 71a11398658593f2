//! Calendar tools exposed through `tools/list` and `tools/call`.
//!
//! Each tool validates its arguments, performs its Calendar API calls through
//! an [`AuthorizedClient`] and renders plain text. Failures never leave this
//! module as errors: [`Tool::call`] folds them into an `Error: ...` result.

mod calendars;
mod events;
mod list_events;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use gcalmcp_google::{AuthorizedClient, ProviderError};
use gcalmcp_protocol::{ToolDefinition, ToolResult};

use crate::args::ValidationError;

pub use list_events::BatchListEventsHandler;

/// Failure of a single tool call.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The arguments were rejected before any API call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The Calendar API call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ToolError {
    /// Text placed after `Error: ` in the tool result.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Provider(e) => e.user_message(),
        }
    }
}

/// Result of a tool body: rendered text or a failure.
pub type ToolOutput = Result<String, ToolError>;

/// The tools this server offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    ListCalendars,
    ListEvents,
    SearchEvents,
    ListColors,
    CreateEvent,
    UpdateEvent,
    DeleteEvent,
    GetFreeBusy,
}

impl Tool {
    /// Every tool, in the order `tools/list` reports them.
    pub const ALL: [Tool; 8] = [
        Tool::ListCalendars,
        Tool::ListEvents,
        Tool::SearchEvents,
        Tool::ListColors,
        Tool::CreateEvent,
        Tool::UpdateEvent,
        Tool::DeleteEvent,
        Tool::GetFreeBusy,
    ];

    /// Wire name of the tool.
    pub fn name(self) -> &'static str {
        match self {
            Tool::ListCalendars => "list-calendars",
            Tool::ListEvents => "list-events",
            Tool::SearchEvents => "search-events",
            Tool::ListColors => "list-colors",
            Tool::CreateEvent => "create-event",
            Tool::UpdateEvent => "update-event",
            Tool::DeleteEvent => "delete-event",
            Tool::GetFreeBusy => "get-freebusy",
        }
    }

    /// Looks a tool up by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    /// Name, description and input schema advertised to clients.
    pub fn definition(self) -> ToolDefinition {
        let (description, input_schema) = match self {
            Tool::ListCalendars => (
                "List all calendars available to the authenticated user.",
                calendars::list_calendars_schema(),
            ),
            Tool::ListEvents => (
                "List events from one calendar, or from up to 50 calendars in a single request.",
                list_events::schema(),
            ),
            Tool::SearchEvents => (
                "Search events in a calendar by free text.",
                events::search_schema(),
            ),
            Tool::ListColors => (
                "List the color ids available for calendars and events.",
                calendars::list_colors_schema(),
            ),
            Tool::CreateEvent => ("Create a calendar event.", events::create_schema()),
            Tool::UpdateEvent => (
                "Update fields of an existing calendar event.",
                events::update_schema(),
            ),
            Tool::DeleteEvent => ("Delete a calendar event.", events::delete_schema()),
            Tool::GetFreeBusy => (
                "Query busy intervals of one or more calendars.",
                calendars::free_busy_schema(),
            ),
        };

        ToolDefinition {
            name: self.name().to_string(),
            description: description.to_string(),
            input_schema,
        }
    }

    /// Runs the tool and renders its result, success or failure.
    pub async fn call(
        self,
        client: &dyn AuthorizedClient,
        arguments: &Map<String, Value>,
    ) -> ToolResult {
        let output = match self {
            Tool::ListCalendars => calendars::list_calendars(client).await,
            Tool::ListEvents => list_events::run(client, arguments).await,
            Tool::SearchEvents => events::search(client, arguments).await,
            Tool::ListColors => calendars::list_colors(client).await,
            Tool::CreateEvent => events::create(client, arguments).await,
            Tool::UpdateEvent => events::update(client, arguments).await,
            Tool::DeleteEvent => events::delete(client, arguments).await,
            Tool::GetFreeBusy => calendars::free_busy(client, arguments).await,
        };

        match output {
            Ok(text) => {
                debug!(tool = self.name(), bytes = text.len(), "tool call succeeded");
                ToolResult::text(text)
            }
            Err(e) => {
                warn!(tool = self.name(), error = %e, "tool call failed");
                ToolResult::error(e.user_message())
            }
        }
    }
}

/// Definitions of every tool.
pub fn definitions() -> Vec<ToolDefinition> {
    Tool::ALL.into_iter().map(Tool::definition).collect()
}
