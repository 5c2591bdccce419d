//! Per-request message carrier.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use uuid::Uuid;

use crate::pipeline::state::PipelineState;

/// Header used to correlate a request across logs.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Unique identifier for a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random request ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Reuse the caller's `x-request-id` when it is valid text, otherwise generate one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| Self(v.to_string()))
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inbound message plus the mutable state processors work on.
///
/// Owned by exactly one in-flight request; moved through the pipeline by value
/// and handed back to the completion callback once the response is written.
#[derive(Debug)]
pub struct RequestContext {
    id: RequestId,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    payload: Bytes,
    received_at: Instant,
    state: PipelineState,
    attributes: HashMap<String, String>,
    response_status: Option<StatusCode>,
    response_headers: HeaderMap,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            id: RequestId::generate(),
            method,
            uri,
            headers: HeaderMap::new(),
            payload: Bytes::new(),
            received_at: Instant::now(),
            state: PipelineState::Received,
            attributes: HashMap::new(),
            response_status: None,
            response_headers: HeaderMap::new(),
        }
    }

    /// Build a context from an already-parsed request.
    pub fn from_parts(method: Method, uri: Uri, headers: HeaderMap, payload: Bytes) -> Self {
        let id = RequestId::from_headers(&headers);
        Self {
            id,
            headers,
            payload,
            ..Self::new(method, uri)
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Metadata-only copy (id, method, URI, timing, state). Used when the
    /// original context is lost inside a panicking processor.
    pub(crate) fn detached(&self) -> Self {
        Self {
            id: self.id.clone(),
            method: self.method.clone(),
            uri: self.uri.clone(),
            headers: HeaderMap::new(),
            payload: Bytes::new(),
            received_at: self.received_at,
            state: self.state,
            attributes: HashMap::new(),
            response_status: None,
            response_headers: HeaderMap::new(),
        }
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn set_payload(&mut self, payload: impl Into<Bytes>) {
        self.payload = payload.into();
    }

    pub fn received_at(&self) -> Instant {
        self.received_at
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Move to `next`. Invalid transitions are a pipeline bug: they trip a
    /// debug assertion and are logged in release builds.
    pub(crate) fn transition(&mut self, next: PipelineState) {
        let valid = self.state.can_transition_to(next);
        debug_assert!(valid, "invalid pipeline transition {} -> {}", self.state, next);
        if !valid {
            tracing::error!(request_id = %self.id, from = %self.state, to = %next, "Invalid pipeline transition");
        }
        tracing::trace!(request_id = %self.id, from = %self.state, to = %next, "Pipeline transition");
        self.state = next;
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn response_status(&self) -> Option<StatusCode> {
        self.response_status
    }

    pub fn set_response_status(&mut self, status: StatusCode) {
        self.response_status = Some(status);
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.response_headers
    }

    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.response_headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_reuses_header() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc-123"));
        let ctx = RequestContext::from_parts(Method::GET, Uri::from_static("/"), headers, Bytes::new());
        assert_eq!(ctx.id().as_str(), "abc-123");
    }

    #[test]
    fn request_id_generated_when_missing() {
        let a = RequestContext::new(Method::GET, Uri::from_static("/"));
        let b = RequestContext::new(Method::GET, Uri::from_static("/"));
        assert_ne!(a.id(), b.id());
        assert!(Uuid::parse_str(a.id().as_str()).is_ok());
    }

    #[test]
    fn detached_keeps_identity_only() {
        let mut ctx = RequestContext::new(Method::POST, Uri::from_static("/orders"))
            .with_payload("body");
        ctx.set_attribute("k", "v");
        let copy = ctx.detached();
        assert_eq!(copy.id(), ctx.id());
        assert_eq!(copy.method(), &Method::POST);
        assert!(copy.payload().is_empty());
        assert_eq!(copy.attribute("k"), None);
    }

    #[test]
    fn new_context_starts_received() {
        let ctx = RequestContext::new(Method::GET, Uri::from_static("/"));
        assert_eq!(ctx.state(), PipelineState::Received);
    }
}
