//! Multi-calendar event listing over the Calendar API batch endpoint.
//!
//! ```text
//! calendar ids ──▶ BatchEnvelope ──▶ execute (1 POST) ──▶ parse ──▶ merge ──▶ BatchOutcome
//! ```
//!
//! The batch protocol does not echo which calendar a sub-response belongs
//! to; the N-th part answers the N-th sub-request. [`BatchCorrelation`] is
//! the one place that pairing is kept.

pub mod executor;
pub mod merge;
pub mod request;
pub mod response;

use gcalmcp_core::BatchOutcome;
use tracing::{info, warn};

pub use executor::{RawBatchResponse, execute};
pub use merge::merge;
pub use request::{BATCH_PATH, BatchEnvelope, MAX_BATCH_SIZE, SubRequest};
pub use response::{
    SubResponse, SubResponseBody, boundary_from_content_type, parse_batch_response,
};

use crate::calendar::EventFilters;
use crate::client::AuthorizedClient;
use crate::error::{ProviderError, ProviderResult};

/// A calendar, the sub-request sent for it and, once received, its answer.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchEntry {
    pub calendar_id: String,
    pub request: SubRequest,
    pub response: Option<SubResponse>,
}

/// Calendar ids paired with their sub-requests and sub-responses by position.
#[derive(Debug, Clone)]
pub struct BatchCorrelation {
    envelope: BatchEnvelope,
    entries: Vec<BatchEntry>,
}

impl BatchCorrelation {
    /// Builds the envelope for `calendar_ids` and records one entry per id.
    pub fn new(calendar_ids: &[String], filters: &EventFilters) -> ProviderResult<Self> {
        Self::from_envelope(calendar_ids, BatchEnvelope::build(calendar_ids, filters)?)
    }

    /// Pairs an already-built envelope with the ids it was built from.
    pub fn from_envelope(calendar_ids: &[String], envelope: BatchEnvelope) -> ProviderResult<Self> {
        if calendar_ids.len() != envelope.requests().len() {
            return Err(ProviderError::internal(format!(
                "{} calendar ids for {} sub-requests",
                calendar_ids.len(),
                envelope.requests().len()
            )));
        }

        let entries = calendar_ids
            .iter()
            .zip(envelope.requests())
            .map(|(calendar_id, request)| BatchEntry {
                calendar_id: calendar_id.clone(),
                request: request.clone(),
                response: None,
            })
            .collect();

        Ok(Self { envelope, entries })
    }

    /// The envelope to send.
    pub fn envelope(&self) -> &BatchEnvelope {
        &self.envelope
    }

    /// Entries in request order.
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// Attaches sub-responses in stream order.
    ///
    /// Fails with an internal error when the count differs from the number
    /// of sub-requests; nothing is attached in that case.
    pub fn attach_responses(&mut self, responses: Vec<SubResponse>) -> ProviderResult<()> {
        if responses.len() != self.entries.len() {
            return Err(ProviderError::internal(format!(
                "batch returned {} responses for {} calendars",
                responses.len(),
                self.entries.len()
            )));
        }

        for (index, (entry, response)) in self.entries.iter_mut().zip(responses).enumerate() {
            let expected = format!("item{}>", index + 1);
            if let Some(content_id) = &response.content_id {
                if !content_id.ends_with(&expected) {
                    warn!(
                        calendar_id = %entry.calendar_id,
                        content_id = %content_id,
                        "sub-response Content-ID does not match its position"
                    );
                }
            }
            entry.response = Some(response);
        }
        Ok(())
    }

    /// Merges the attached responses.
    pub fn merge(&self) -> ProviderResult<BatchOutcome> {
        let pairs = self
            .entries
            .iter()
            .map(|entry| {
                entry
                    .response
                    .as_ref()
                    .map(|response| (entry.calendar_id.as_str(), response))
                    .ok_or_else(|| {
                        ProviderError::internal(format!(
                            "no response attached for calendar {}",
                            entry.calendar_id
                        ))
                    })
            })
            .collect::<ProviderResult<Vec<_>>>()?;

        Ok(merge::merge_pairs(pairs))
    }
}

/// Lists the events of 1 to [`MAX_BATCH_SIZE`] calendars in one batch call.
///
/// Per-calendar failures end up in the outcome; batch-level failures
/// (token, transport, malformed response) are returned as errors.
pub async fn list_events_batch(
    client: &dyn AuthorizedClient,
    calendar_ids: &[String],
    filters: &EventFilters,
) -> ProviderResult<BatchOutcome> {
    let mut correlation = BatchCorrelation::new(calendar_ids, filters)?;

    info!(calendar_count = calendar_ids.len(), "listing events in batch");

    let raw = execute(client, correlation.envelope()).await?;
    let boundary = boundary_from_content_type(&raw.content_type)?;
    let responses = parse_batch_response(&raw.body, &boundary)?;
    correlation.attach_responses(responses)?;

    let outcome = correlation.merge()?;
    info!(
        events = outcome.events().len(),
        failed_calendars = outcome.errors().len(),
        "batch listing complete"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiBody, ApiResponse};
    use crate::error::ProviderErrorCode;
    use crate::testing::{RecordingClient, batch_response, batch_response_body};

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn filters() -> EventFilters {
        EventFilters::new("2024-01-01T00:00:00Z")
    }

    #[test]
    fn build_then_parse_keeps_positions() {
        let calendars = ids(&["primary", "work@example.com", "team"]);
        let mut correlation = BatchCorrelation::new(&calendars, &filters()).unwrap();

        let raw = batch_response_body(
            "resp",
            &[
                (200, r#"{"items": [{"id": "p"}]}"#),
                (200, r#"{"items": [{"id": "w"}]}"#),
                (200, r#"{"items": [{"id": "t"}]}"#),
            ],
        );
        let responses = parse_batch_response(&raw, "resp").unwrap();
        assert_eq!(responses.len(), correlation.entries().len());
        correlation.attach_responses(responses).unwrap();

        for (entry, (calendar, event_id)) in correlation
            .entries()
            .iter()
            .zip([("primary", "p"), ("work@example.com", "w"), ("team", "t")])
        {
            assert_eq!(entry.calendar_id, calendar);
            assert!(entry.request.path().contains(&calendar_path(calendar)));
            let body = entry.response.as_ref().unwrap().body.as_json().unwrap();
            assert_eq!(body["items"][0]["id"], event_id);
        }
    }

    fn calendar_path(calendar: &str) -> String {
        format!("calendars/{}/events", urlencoding::encode(calendar))
    }

    #[test]
    fn attach_rejects_count_mismatch() {
        let mut correlation = BatchCorrelation::new(&ids(&["a", "b"]), &filters()).unwrap();
        let raw = batch_response_body("r", &[(200, "{}")]);
        let responses = parse_batch_response(&raw, "r").unwrap();

        let err = correlation.attach_responses(responses).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InternalError);
        assert!(correlation.entries().iter().all(|e| e.response.is_none()));
    }

    #[test]
    fn merge_before_attach_is_internal() {
        let correlation = BatchCorrelation::new(&ids(&["a", "b"]), &filters()).unwrap();
        let err = correlation.merge().unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InternalError);
    }

    #[tokio::test]
    async fn one_network_call_for_many_calendars() {
        for count in [2usize, 7, 50] {
            let calendars: Vec<String> = (0..count).map(|i| format!("cal{}@example.com", i)).collect();
            let parts: Vec<(u16, &str)> = (0..count).map(|_| (200, r#"{"items": []}"#)).collect();
            let client = RecordingClient::new().with_response(batch_response("resp", &parts));

            let outcome = list_events_batch(&client, &calendars, &filters()).await.unwrap();

            assert_eq!(client.call_count(), 1);
            assert!(outcome.events().is_empty());
            match &client.requests()[0].body {
                Some(ApiBody::Raw { body, .. }) => {
                    assert_eq!(body.matches("Content-Type: application/http").count(), count);
                }
                other => panic!("unexpected body: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn partial_failure_end_to_end() {
        let client = RecordingClient::new().with_response(batch_response(
            "resp",
            &[
                (200, r#"{"items": [{"id": "a1", "start": {"dateTime": "2024-01-15T11:00:00Z"}}]}"#),
                (404, r#"{"error": {"code": 404, "message": "Not Found"}}"#),
                (200, r#"{"items": [{"id": "c1", "start": {"date": "2024-01-15"}}]}"#),
            ],
        ));

        let outcome = list_events_batch(&client, &ids(&["a", "b", "c"]), &filters())
            .await
            .unwrap();

        let events: Vec<(&str, &str)> = outcome
            .events()
            .iter()
            .map(|e| (e.calendar_id.as_str(), e.event.id.as_deref().unwrap()))
            .collect();
        assert_eq!(events, vec![("c", "c1"), ("a", "a1")]);
        assert_eq!(outcome.errors().len(), 1);
        assert_eq!(outcome.errors()[0].calendar_id, "b");
    }

    #[tokio::test]
    async fn malformed_response_aborts_the_batch() {
        let client = RecordingClient::new().with_response(ApiResponse::new(
            200,
            Some("multipart/mixed; boundary=resp"),
            "--resp\r\nContent-Type: application/http\r\n\r\nHTTP/1.1 200 OK\r\n\r\n{}",
        ));

        let err = list_events_batch(&client, &ids(&["a", "b"]), &filters())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
    }

    #[tokio::test]
    async fn response_count_mismatch_is_internal() {
        let client = RecordingClient::new()
            .with_response(batch_response("resp", &[(200, r#"{"items": []}"#)]));

        let err = list_events_batch(&client, &ids(&["a", "b"]), &filters())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InternalError);
    }

    #[tokio::test]
    async fn too_many_calendars_send_nothing() {
        let client = RecordingClient::new();
        let calendars: Vec<String> = (0..51).map(|i| format!("cal{}", i)).collect();

        let err = list_events_batch(&client, &calendars, &filters())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
        assert_eq!(client.call_count(), 0);
    }
}
