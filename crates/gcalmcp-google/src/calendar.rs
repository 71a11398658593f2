//! Typed Calendar API v3 calls.
//!
//! Each method is a single request through an [`AuthorizedClient`]; there
//! is no pagination, retry or caching here. Multi-calendar listing lives in
//! [`crate::batch`].

use std::collections::BTreeMap;

use gcalmcp_core::Event;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

use crate::client::{ApiRequest, AuthorizedClient};
use crate::error::{ProviderError, ProviderResult};

/// Path prefix of every Calendar API v3 endpoint.
pub const CALENDAR_API_PATH: &str = "/calendar/v3";

/// Time window applied to event listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilters {
    /// Lower bound (exclusive) on event end time, RFC 3339.
    pub time_min: String,
    /// Upper bound (exclusive) on event start time, RFC 3339.
    pub time_max: Option<String>,
}

impl EventFilters {
    /// Creates filters with only a lower bound.
    pub fn new(time_min: impl Into<String>) -> Self {
        Self {
            time_min: time_min.into(),
            time_max: None,
        }
    }

    /// Builder method to set the upper bound.
    #[must_use]
    pub fn with_time_max(mut self, time_max: impl Into<String>) -> Self {
        self.time_max = Some(time_max.into());
        self
    }

    /// Query string for an events listing: recurring events expanded,
    /// ordered by start time.
    pub fn query_string(&self) -> String {
        self.query_with(None)
    }

    fn query_with(&self, text: Option<&str>) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("singleEvents", "true");
        query.append_pair("orderBy", "startTime");
        query.append_pair("timeMin", &self.time_min);
        if let Some(time_max) = &self.time_max {
            query.append_pair("timeMax", time_max);
        }
        if let Some(text) = text {
            query.append_pair("q", text);
        }
        query.finish()
    }
}

/// Path (without query) of a calendar's events collection.
pub fn events_path(calendar_id: &str) -> String {
    format!(
        "{}/calendars/{}/events",
        CALENDAR_API_PATH,
        urlencoding::encode(calendar_id)
    )
}

fn event_path(calendar_id: &str, event_id: &str) -> String {
    format!(
        "{}/{}",
        events_path(calendar_id),
        urlencoding::encode(event_id)
    )
}

/// Body of an events listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventList {
    #[serde(default)]
    pub items: Vec<Event>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// An entry of the user's calendar list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub summary_override: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub access_role: Option<String>,
}

impl CalendarListEntry {
    /// Display name: the user's override, else the calendar summary, else the id.
    pub fn display_name(&self) -> &str {
        self.summary_override
            .as_deref()
            .or(self.summary.as_deref())
            .unwrap_or(&self.id)
    }
}

#[derive(Debug, Deserialize)]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
}

/// A background/foreground color pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorDefinition {
    pub background: String,
    pub foreground: String,
}

/// The color palettes available for calendars and events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    #[serde(default)]
    pub calendar: BTreeMap<String, ColorDefinition>,
    #[serde(default)]
    pub event: BTreeMap<String, ColorDefinition>,
}

/// A calendar to query for free/busy information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeBusyItem {
    pub id: String,
}

/// Body of a free/busy query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeBusyRequest {
    pub time_min: String,
    pub time_max: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    pub items: Vec<FreeBusyItem>,
}

/// A busy interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub start: String,
    pub end: String,
}

/// A per-calendar free/busy failure (e.g. `notFound`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeBusyError {
    #[serde(default)]
    pub domain: Option<String>,
    pub reason: String,
}

/// Free/busy answer for one calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeBusyCalendar {
    #[serde(default)]
    pub busy: Vec<TimePeriod>,
    #[serde(default)]
    pub errors: Vec<FreeBusyError>,
}

/// Body of a free/busy answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeBusyResponse {
    #[serde(default)]
    pub time_min: Option<String>,
    #[serde(default)]
    pub time_max: Option<String>,
    #[serde(default)]
    pub calendars: BTreeMap<String, FreeBusyCalendar>,
}

/// Calendar API calls made on behalf of one client.
pub struct CalendarService<'a> {
    client: &'a dyn AuthorizedClient,
}

impl<'a> CalendarService<'a> {
    /// Wraps `client`.
    pub fn new(client: &'a dyn AuthorizedClient) -> Self {
        Self { client }
    }

    /// Lists the events of one calendar.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        filters: &EventFilters,
    ) -> ProviderResult<Vec<Event>> {
        let path = format!("{}?{}", events_path(calendar_id), filters.query_string());
        let list: EventList = self.get_json(path).await?;
        if list.next_page_token.is_some() {
            debug!(calendar_id, "events listing truncated to the first page");
        }
        Ok(list.items)
    }

    /// Free-text search within one calendar.
    pub async fn search_events(
        &self,
        calendar_id: &str,
        query: &str,
        filters: &EventFilters,
    ) -> ProviderResult<Vec<Event>> {
        let path = format!(
            "{}?{}",
            events_path(calendar_id),
            filters.query_with(Some(query))
        );
        let list: EventList = self.get_json(path).await?;
        Ok(list.items)
    }

    /// Lists the calendars of the authenticated user.
    pub async fn list_calendars(&self) -> ProviderResult<Vec<CalendarListEntry>> {
        let path = format!("{}/users/me/calendarList", CALENDAR_API_PATH);
        let list: CalendarListResponse = self.get_json(path).await?;
        Ok(list.items)
    }

    /// Returns the color palettes.
    pub async fn list_colors(&self) -> ProviderResult<ColorPalette> {
        self.get_json(format!("{}/colors", CALENDAR_API_PATH)).await
    }

    /// Queries busy intervals.
    pub async fn free_busy(&self, request: &FreeBusyRequest) -> ProviderResult<FreeBusyResponse> {
        let body = to_json(request)?;
        let request = ApiRequest::new(Method::POST, format!("{}/freeBusy", CALENDAR_API_PATH))
            .with_json(body);
        self.send_json(request).await
    }

    /// Creates an event and returns it as stored.
    pub async fn insert_event(&self, calendar_id: &str, event: &Event) -> ProviderResult<Event> {
        let request =
            ApiRequest::new(Method::POST, events_path(calendar_id)).with_json(to_json(event)?);
        self.send_json(request).await
    }

    /// Updates the fields set on `changes` and returns the stored event.
    pub async fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        changes: &Event,
    ) -> ProviderResult<Event> {
        let request = ApiRequest::new(Method::PATCH, event_path(calendar_id, event_id))
            .with_json(to_json(changes)?);
        self.send_json(request).await
    }

    /// Deletes an event.
    pub async fn delete_event(&self, calendar_id: &str, event_id: &str) -> ProviderResult<()> {
        self.client
            .send(ApiRequest::delete(event_path(calendar_id, event_id)))
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: String) -> ProviderResult<T> {
        self.send_json(ApiRequest::get(path)).await
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> ProviderResult<T> {
        self.client
            .send(request)
            .await?
            .error_for_status()?
            .json_body()
    }
}

fn to_json<T: Serialize>(value: &T) -> ProviderResult<Value> {
    serde_json::to_value(value).map_err(|e| {
        ProviderError::internal(format!("failed to serialize request body: {}", e)).with_source(e)
    })
}
