//! Multipart batch request construction.
//!
//! ```text
//! --batch_<uuid>
//! Content-Type: application/http
//! Content-ID: <item1>
//!
//! GET /calendar/v3/calendars/primary/events?singleEvents=true&... HTTP/1.1
//!
//! --batch_<uuid>
//! ...
//!
//! --batch_<uuid>--
//! ```

use crate::calendar::{EventFilters, events_path};
use crate::error::{ProviderError, ProviderResult};

/// Largest number of sub-requests a batch may carry.
pub const MAX_BATCH_SIZE: usize = 50;

/// Path of the Calendar API batch endpoint.
pub const BATCH_PATH: &str = "/batch/calendar/v3";

/// One events listing carried inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubRequest {
    method: &'static str,
    path: String,
}

impl SubRequest {
    /// Listing of `calendar_id`'s events within `filters`.
    pub fn list_events(calendar_id: &str, filters: &EventFilters) -> Self {
        Self {
            method: "GET",
            path: format!("{}?{}", events_path(calendar_id), filters.query_string()),
        }
    }

    /// HTTP method of the sub-request.
    pub fn method(&self) -> &str {
        self.method
    }

    /// Path and query of the sub-request.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn request_line(&self) -> String {
        format!("{} {} HTTP/1.1", self.method, self.path)
    }
}

/// Serialized multipart body plus the boundary it was built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEnvelope {
    boundary: String,
    requests: Vec<SubRequest>,
}

impl BatchEnvelope {
    /// Builds one sub-request per calendar id, in order.
    ///
    /// Fails with a configuration error for an empty id list or more than
    /// [`MAX_BATCH_SIZE`] ids.
    pub fn build(calendar_ids: &[String], filters: &EventFilters) -> ProviderResult<Self> {
        Self::build_with_boundary(
            calendar_ids,
            filters,
            format!("batch_{}", uuid::Uuid::new_v4().simple()),
        )
    }

    /// Same as [`BatchEnvelope::build`] with a caller-chosen boundary.
    pub fn build_with_boundary(
        calendar_ids: &[String],
        filters: &EventFilters,
        boundary: impl Into<String>,
    ) -> ProviderResult<Self> {
        if calendar_ids.is_empty() {
            return Err(ProviderError::configuration(
                "batch request needs at least one calendar id",
            ));
        }
        if calendar_ids.len() > MAX_BATCH_SIZE {
            return Err(ProviderError::configuration(format!(
                "batch request supports at most {} calendars, got {}",
                MAX_BATCH_SIZE,
                calendar_ids.len()
            )));
        }

        Ok(Self {
            boundary: boundary.into(),
            requests: calendar_ids
                .iter()
                .map(|id| SubRequest::list_events(id, filters))
                .collect(),
        })
    }

    /// Boundary separating the parts.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Sub-requests in Content-ID order.
    pub fn requests(&self) -> &[SubRequest] {
        &self.requests
    }

    /// Value of the batch POST's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/mixed; boundary={}", self.boundary)
    }

    /// The multipart body. Part N carries `Content-ID: <itemN>`.
    pub fn body(&self) -> String {
        let parts: Vec<String> = self
            .requests
            .iter()
            .enumerate()
            .map(|(index, request)| {
                format!(
                    "--{}\r\nContent-Type: application/http\r\nContent-ID: <item{}>\r\n\r\n{}",
                    self.boundary,
                    index + 1,
                    request.request_line()
                )
            })
            .collect();

        format!("{}\r\n\r\n--{}--", parts.join("\r\n\r\n"), self.boundary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn sub_request_paths_follow_calendar_order() {
        let envelope = BatchEnvelope::build(
            &ids(&["primary", "work@example.com"]),
            &EventFilters::new("2024-01-01T00:00:00Z"),
        )
        .unwrap();

        let paths: Vec<&str> = envelope.requests().iter().map(SubRequest::path).collect();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].contains("calendars/primary/events"));
        assert!(paths[1].contains("calendars/work%40example.com/events"));
        for path in paths {
            assert!(path.contains(
                "singleEvents=true&orderBy=startTime&timeMin=2024-01-01T00%3A00%3A00Z"
            ));
        }
    }

    #[test]
    fn time_max_only_when_present() {
        let filters = EventFilters::new("2024-01-01T00:00:00Z");
        let envelope = BatchEnvelope::build(&ids(&["a", "b"]), &filters).unwrap();
        assert!(!envelope.requests()[0].path().contains("timeMax"));

        let filters = filters.with_time_max("2024-02-01T00:00:00Z");
        let envelope = BatchEnvelope::build(&ids(&["a", "b"]), &filters).unwrap();
        assert!(envelope.requests()[1]
            .path()
            .ends_with("&timeMax=2024-02-01T00%3A00%3A00Z"));
    }

    #[test]
    fn body_layout() {
        let envelope = BatchEnvelope::build_with_boundary(
            &ids(&["primary", "team"]),
            &EventFilters::new("2024-01-01T00:00:00Z"),
            "batch_test",
        )
        .unwrap();

        assert_eq!(envelope.content_type(), "multipart/mixed; boundary=batch_test");
        insta::assert_snapshot!(envelope.body().replace("\r\n", "\n"), @r"
        --batch_test
        Content-Type: application/http
        Content-ID: <item1>

        GET /calendar/v3/calendars/primary/events?singleEvents=true&orderBy=startTime&timeMin=2024-01-01T00%3A00%3A00Z HTTP/1.1

        --batch_test
        Content-Type: application/http
        Content-ID: <item2>

        GET /calendar/v3/calendars/team/events?singleEvents=true&orderBy=startTime&timeMin=2024-01-01T00%3A00%3A00Z HTTP/1.1

        --batch_test--
        ");
    }

    #[test]
    fn body_uses_crlf() {
        let envelope = BatchEnvelope::build_with_boundary(
            &ids(&["primary", "team"]),
            &EventFilters::new("2024-01-01T00:00:00Z"),
            "b",
        )
        .unwrap();
        let body = envelope.body();
        assert!(body.starts_with("--b\r\nContent-Type: application/http\r\n"));
        assert!(body.ends_with("HTTP/1.1\r\n\r\n--b--"));
        assert!(!body.replace("\r\n", "").contains('\n'));
    }

    #[test]
    fn duplicates_are_kept() {
        let envelope = BatchEnvelope::build(
            &ids(&["primary", "primary"]),
            &EventFilters::new("2024-01-01T00:00:00Z"),
        )
        .unwrap();
        assert_eq!(envelope.requests().len(), 2);
        assert!(envelope.body().contains("Content-ID: <item2>"));
    }

    #[test]
    fn boundaries_are_unique() {
        let filters = EventFilters::new("2024-01-01T00:00:00Z");
        let a = BatchEnvelope::build(&ids(&["x", "y"]), &filters).unwrap();
        let b = BatchEnvelope::build(&ids(&["x", "y"]), &filters).unwrap();
        assert!(a.boundary().starts_with("batch_"));
        assert_ne!(a.boundary(), b.boundary());
    }

    #[test]
    fn rejects_empty_and_oversized() {
        let filters = EventFilters::new("2024-01-01T00:00:00Z");

        let err = BatchEnvelope::build(&[], &filters).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);

        let too_many: Vec<String> = (0..51).map(|i| format!("cal{}", i)).collect();
        let err = BatchEnvelope::build(&too_many, &filters).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);

        assert!(BatchEnvelope::build(&too_many[..50], &filters).is_ok());
    }
}
