//! Bridge between the pipeline's write callbacks and hyper.
//!
//! The pipeline hands a [`ResponseDescriptor`] to an [`HttpResponseSlot`]; the
//! handler turns it into an axum response whose body is a [`DeliveryStream`].
//! hyper drives the stream while writing to the socket, and the stream reports
//! the outcome through the status callback:
//!
//! - the body was fully handed over and hyper asked for more: success
//! - hyper dropped the stream before taking the body: connection closed
//!
//! Success means hyper took the whole body from the stream. It is reported
//! before the bytes are flushed to the socket, so it does not prove the peer
//! received them.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Method};
use axum::response::Response;
use futures_util::Stream;
use hyper::ext::ReasonPhrase;
use tokio::sync::oneshot;

use crate::http::response::ResponseDescriptor;
use crate::pipeline::callback::{ResponseReadyCallback, ResponseStatusCallback, SendError};

/// What the pipeline hands over to the HTTP handler.
pub type ResponseHandoff = (ResponseDescriptor, ResponseStatusCallback);

/// Transport callback that passes the response back to the waiting handler.
#[derive(Debug)]
pub struct HttpResponseSlot {
    tx: oneshot::Sender<ResponseHandoff>,
}

/// Create a slot and the receiver the handler awaits.
pub fn response_slot() -> (HttpResponseSlot, oneshot::Receiver<ResponseHandoff>) {
    let (tx, rx) = oneshot::channel();
    (HttpResponseSlot { tx }, rx)
}

impl ResponseReadyCallback for HttpResponseSlot {
    fn response_ready(self, response: ResponseDescriptor, status: ResponseStatusCallback) {
        // The handler future was dropped, so the client is gone.
        if let Err((_, status)) = self.tx.send((response, status)) {
            status.response_send_failure(SendError::ConnectionClosed);
        }
    }
}

/// Convert a descriptor into an axum response that reports its own delivery.
pub fn into_http_response(
    method: &Method,
    descriptor: ResponseDescriptor,
    status: ResponseStatusCallback,
) -> Response {
    let (status_code, reason_phrase, mut headers, body) = descriptor.into_parts();

    if !headers.contains_key(header::CONTENT_LENGTH) {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
    }
    // HEAD responses never carry a body, so there is nothing left to write.
    let body = if *method == Method::HEAD { Bytes::new() } else { body };

    let mut response = Response::new(Body::from_stream(DeliveryStream::new(body, status)));
    *response.status_mut() = status_code;
    *response.headers_mut() = headers;

    match ReasonPhrase::try_from(reason_phrase.into_bytes()) {
        Ok(phrase) => {
            response.extensions_mut().insert(phrase);
        }
        Err(e) => tracing::debug!(error = %e, "Ignoring invalid reason phrase"),
    }

    response
}

/// Single-chunk body stream that resolves the status callback.
pub struct DeliveryStream {
    body: Option<Bytes>,
    status: Option<ResponseStatusCallback>,
}

impl DeliveryStream {
    pub fn new(body: Bytes, status: ResponseStatusCallback) -> Self {
        Self {
            body: (!body.is_empty()).then_some(body),
            status: Some(status),
        }
    }
}

impl Stream for DeliveryStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(body) = self.body.take() {
            return Poll::Ready(Some(Ok(body)));
        }
        if let Some(status) = self.status.take() {
            status.response_send_successfully();
        }
        Poll::Ready(None)
    }
}

impl Drop for DeliveryStream {
    fn drop(&mut self) {
        if let Some(status) = self.status.take() {
            if self.body.is_none() {
                status.response_send_successfully();
            } else {
                status.response_send_failure(SendError::ConnectionClosed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use futures_util::StreamExt;
    use std::sync::{Arc, Mutex};

    fn recording() -> (ResponseStatusCallback, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let status = ResponseStatusCallback::new(move |result| {
            sink.lock().unwrap().push(match result {
                Ok(()) => "ok".to_string(),
                Err(e) => e.to_string(),
            });
        });
        (status, seen)
    }

    #[tokio::test]
    async fn drained_stream_reports_success() {
        let (status, seen) = recording();
        let mut stream = DeliveryStream::new(Bytes::from_static(b"hello"), status);

        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from_static(b"hello"));
        assert!(seen.lock().unwrap().is_empty());
        assert!(stream.next().await.is_none());
        drop(stream);

        assert_eq!(*seen.lock().unwrap(), vec!["ok".to_string()]);
    }

    #[test]
    fn dropped_before_body_reports_connection_closed() {
        let (status, seen) = recording();
        drop(DeliveryStream::new(Bytes::from_static(b"hello"), status));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("connection closed"));
    }

    #[test]
    fn empty_body_counts_as_delivered() {
        let (status, seen) = recording();
        drop(DeliveryStream::new(Bytes::new(), status));
        assert_eq!(*seen.lock().unwrap(), vec!["ok".to_string()]);
    }

    #[test]
    fn closed_slot_reports_connection_closed() {
        let (slot, rx) = response_slot();
        drop(rx);
        let (status, seen) = recording();
        slot.response_ready(ResponseDescriptor::builder(StatusCode::OK).build(), status);
        assert!(seen.lock().unwrap()[0].contains("connection closed"));
    }

    #[test]
    fn response_carries_status_headers_and_reason() {
        let descriptor = ResponseDescriptor::builder(StatusCode::TOO_MANY_REQUESTS)
            .reason_phrase("Slow Down")
            .body("API calls exceeded")
            .build();
        let (status, _seen) = recording();
        let response = into_http_response(&Method::GET, descriptor, status);

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "18");
        let phrase = response.extensions().get::<ReasonPhrase>().unwrap();
        assert_eq!(phrase.as_bytes(), b"Slow Down");
    }
}
