//! Multipart batch response parsing.
//!
//! Each part of the response wraps one embedded HTTP response:
//!
//! ```text
//! --batch_abc
//! Content-Type: application/http
//! Content-ID: <response-item1>
//!
//! HTTP/1.1 200 OK
//! Content-Type: application/json; charset=UTF-8
//!
//! {"items": [...]}
//! --batch_abc--
//! ```
//!
//! Parts come back in the order of the sub-requests. Any framing defect
//! fails the whole parse: a partial result could no longer be matched to
//! its calendars by position.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::error::{ProviderError, ProviderResult};

static BOUNDARY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*boundary\s*=\s*(?:"([^"]+)"|([^;\s]+))"#)
        .expect("Invalid boundary regex")
});

static STATUS_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^HTTP/\d(?:\.\d)?\s+(\d{3})(?:\s.*)?$").expect("Invalid status line regex")
});

/// Body of an embedded response.
#[derive(Debug, Clone, PartialEq)]
pub enum SubResponseBody {
    Json(Value),
    Text(String),
}

impl SubResponseBody {
    /// The body as a JSON value; text becomes a JSON string, and an empty
    /// body becomes `null`.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Json(value) => value.clone(),
            Self::Text(text) if text.is_empty() => Value::Null,
            Self::Text(text) => Value::String(text.clone()),
        }
    }

    /// Returns the JSON body, if the body is JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }
}

/// One embedded HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct SubResponse {
    pub status: u16,
    /// Headers of the embedded response, names lowercased, in order.
    pub headers: Vec<(String, String)>,
    pub body: SubResponseBody,
    /// `Content-ID` of the enclosing part, if it had one.
    pub content_id: Option<String>,
}

impl SubResponse {
    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Looks up an embedded response header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Extracts the `boundary` parameter of a multipart `Content-Type`.
pub fn boundary_from_content_type(content_type: &str) -> ProviderResult<String> {
    let media_type = content_type.split(';').next().unwrap_or("").trim();
    if !media_type.eq_ignore_ascii_case("multipart/mixed") {
        return Err(ProviderError::invalid_response(format!(
            "batch response is not multipart/mixed: {}",
            content_type
        )));
    }

    BOUNDARY_REGEX
        .captures(content_type)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            ProviderError::invalid_response(format!(
                "batch response Content-Type has no boundary: {}",
                content_type
            ))
        })
}

/// Splits a batch response body into its embedded responses, in stream
/// order.
pub fn parse_batch_response(raw: &str, boundary: &str) -> ProviderResult<Vec<SubResponse>> {
    // A delimiter only counts at the start of a line. The leading line break
    // lets a delimiter on the very first line match too.
    let delimiter = format!("\n--{}", boundary);
    let framed = format!("\n{}", raw);

    let Some(first) = framed.find(&delimiter) else {
        return Err(ProviderError::invalid_response(
            "batch response contains no boundary delimiter",
        ));
    };

    let mut responses = Vec::new();
    let mut closed = false;

    for segment in framed[first + delimiter.len()..].split(&delimiter) {
        if segment.starts_with("--") {
            closed = true;
            break;
        }
        let part = segment
            .strip_prefix("\r\n")
            .or_else(|| segment.strip_prefix('\n'))
            .ok_or_else(|| {
                ProviderError::invalid_response("boundary delimiter not followed by a line break")
            })?;
        responses.push(parse_part(part, responses.len() + 1)?);
    }

    if !closed {
        return Err(ProviderError::invalid_response(
            "batch response is truncated: closing boundary missing",
        ));
    }

    Ok(responses)
}

fn parse_part(part: &str, position: usize) -> ProviderResult<SubResponse> {
    let (outer_headers, http) = split_head(part).ok_or_else(|| {
        ProviderError::invalid_response(format!("part {} has no header terminator", position))
    })?;

    let content_id = parse_headers(outer_headers)
        .into_iter()
        .find(|(name, _)| name == "content-id")
        .map(|(_, value)| value);

    let (head, body) = split_head(http).unwrap_or((http, ""));
    let mut lines = head.lines();
    let status_line = lines.next().unwrap_or("").trim_end();
    let status = STATUS_LINE_REGEX
        .captures(status_line)
        .and_then(|caps| caps[1].parse::<u16>().ok())
        .ok_or_else(|| {
            ProviderError::invalid_response(format!(
                "part {} has an invalid status line: {:?}",
                position, status_line
            ))
        })?;

    let headers = parse_headers(&lines.collect::<Vec<_>>().join("\n"));
    let body = decode_body(&headers, body.trim(), position);

    Ok(SubResponse {
        status,
        headers,
        body,
        content_id,
    })
}

/// Splits at the first blank line, accepting CRLF or bare LF line endings.
fn split_head(text: &str) -> Option<(&str, &str)> {
    let crlf = text.find("\r\n\r\n").map(|i| (i, 4));
    let lf = text.find("\n\n").map(|i| (i, 2));
    let (index, len) = match (crlf, lf) {
        (Some(a), Some(b)) => {
            if a.0 <= b.0 {
                a
            } else {
                b
            }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => return None,
    };
    Some((&text[..index], &text[index + len..]))
}

fn parse_headers(block: &str) -> Vec<(String, String)> {
    block
        .lines()
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            Some((name.trim().to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

fn decode_body(headers: &[(String, String)], body: &str, position: usize) -> SubResponseBody {
    let is_json = headers.iter().any(|(name, value)| {
        name == "content-type" && value.to_ascii_lowercase().starts_with("application/json")
    });

    if !is_json || body.is_empty() {
        return SubResponseBody::Text(body.to_string());
    }

    match serde_json::from_str(body) {
        Ok(value) => SubResponseBody::Json(value),
        Err(e) => {
            warn!(position, error = %e, "sub-response body is not valid JSON, keeping raw text");
            SubResponseBody::Text(body.to_string())
        }
    }
}
