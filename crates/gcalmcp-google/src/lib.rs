//! Google Calendar API access for gcalmcp.
//!
//! - [`AuthorizedClient`] - the authenticated-call capability, with the
//!   `reqwest`-backed [`GoogleClient`]
//! - [`CalendarService`] - typed single-request Calendar API calls
//! - [`batch`] - multi-calendar listing through the batch endpoint
//! - [`ProviderError`] - every failure of the above
//!
//! ```ignore
//! use gcalmcp_google::{GoogleClient, GoogleConfig, EventFilters, batch};
//!
//! let client = GoogleClient::new(&GoogleConfig::default(), token)?;
//! let ids = vec!["primary".to_string(), "team@example.com".to_string()];
//! let outcome = batch::list_events_batch(&client, &ids, &EventFilters::new(time_min)).await?;
//! ```

pub mod batch;
pub mod calendar;
pub mod client;
pub mod config;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use calendar::{
    CalendarListEntry, CalendarService, ColorDefinition, ColorPalette, EventFilters,
    FreeBusyCalendar, FreeBusyError, FreeBusyItem, FreeBusyRequest, FreeBusyResponse, TimePeriod,
};
pub use client::{ApiBody, ApiRequest, ApiResponse, AuthorizedClient, BoxFuture, GoogleClient};
pub use config::{DEFAULT_API_BASE, GoogleConfig};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
