//! Wire-level response descriptor.
//!
//! # Responsibilities
//! - Hold status, reason phrase, headers and body of one response
//! - Keep header names case-insensitive with last-write-wins semantics
//! - Stay immutable once built; the transport only reads it
//!
//! # Design Decisions
//! - Headers live in an `http::HeaderMap`, which normalizes names to lowercase
//! - Bodies are fully materialized `Bytes`; the pipeline never streams

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use thiserror::Error;

/// Rejected header name or value.
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("invalid header name {0:?}")]
    Name(String),

    #[error("invalid value for header {name}")]
    Value { name: String },
}

/// A response ready to be written. Built once per request.
#[derive(Debug, Clone)]
pub struct ResponseDescriptor {
    status: StatusCode,
    reason_phrase: String,
    headers: HeaderMap,
    body: Bytes,
}

impl ResponseDescriptor {
    pub fn builder(status: StatusCode) -> ResponseDescriptorBuilder {
        ResponseDescriptorBuilder::new(status)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn reason_phrase(&self) -> &str {
        &self.reason_phrase
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn into_parts(self) -> (StatusCode, String, HeaderMap, Bytes) {
        (self.status, self.reason_phrase, self.headers, self.body)
    }
}

/// Mutable staging area for a [`ResponseDescriptor`].
#[derive(Debug, Clone)]
pub struct ResponseDescriptorBuilder {
    status: StatusCode,
    reason_phrase: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl ResponseDescriptorBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason_phrase: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Override the reason phrase. Defaults to the canonical one for the status.
    pub fn reason_phrase(mut self, reason: impl Into<String>) -> Self {
        self.reason_phrase = Some(reason.into());
        self
    }

    /// Set a header, replacing any value stored under the same name in any case.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Textual variant of [`header`](Self::header).
    pub fn try_header(self, name: &str, value: &str) -> Result<Self, HeaderError> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| HeaderError::Name(name.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|_| HeaderError::Value {
            name: name.to_string(),
        })?;
        Ok(self.header(header_name, header_value))
    }

    /// Merge `headers`; names already present are replaced by the incoming values.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> ResponseDescriptor {
        let reason_phrase = self
            .reason_phrase
            .unwrap_or_else(|| self.status.canonical_reason().unwrap_or_default().to_string());
        ResponseDescriptor {
            status: self.status,
            reason_phrase,
            headers: self.headers,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn header_names_are_case_insensitive_last_write_wins() {
        let response = ResponseDescriptor::builder(StatusCode::OK)
            .try_header("X-RateLimit-Limit", "10")
            .unwrap()
            .try_header("x-ratelimit-limit", "20")
            .unwrap()
            .build();

        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.header("X-RATELIMIT-LIMIT"), Some("20"));
    }

    #[test]
    fn reason_defaults_to_canonical() {
        let response = ResponseDescriptor::builder(StatusCode::NOT_FOUND).build();
        assert_eq!(response.reason_phrase(), "Not Found");
        assert!(response.body().is_empty());
    }

    #[test]
    fn merged_headers_replace_existing() {
        let mut incoming = HeaderMap::new();
        incoming.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let response = ResponseDescriptor::builder(StatusCode::OK)
            .header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .headers(incoming)
            .build();
        assert_eq!(response.header("content-type"), Some("application/json"));
    }

    #[test]
    fn invalid_header_rejected() {
        let err = ResponseDescriptor::builder(StatusCode::OK)
            .try_header("bad header", "x")
            .unwrap_err();
        assert!(matches!(err, HeaderError::Name(_)));
    }
}
