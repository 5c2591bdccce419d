//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define pipeline metrics (requests, latency, throttling, send failures)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `pipeline_requests_total` (counter): completed deliveries by disposition, status
//! - `pipeline_request_duration_seconds` (histogram): receipt to write completion
//! - `pipeline_throttled_total` (counter): requests refused by admission control
//! - `pipeline_send_failures_total` (counter): failed writes by path
//!
//! # Design Decisions
//! - Metric calls are no-ops until a recorder is installed, so tests need no setup
//! - Labels limited to low-cardinality values

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one request whose response write concluded.
pub fn record_request(disposition: &'static str, status: u16, elapsed: Duration) {
    counter!(
        "pipeline_requests_total",
        "disposition" => disposition,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("pipeline_request_duration_seconds", "disposition" => disposition)
        .record(elapsed.as_secs_f64());
}

/// Record a request refused by admission control.
pub fn record_throttled() {
    counter!("pipeline_throttled_total").increment(1);
}

/// Record a failed response write. `path` is `response` or `discard`.
pub fn record_send_failure(path: &'static str) {
    counter!("pipeline_send_failures_total", "path" => path).increment(1);
}
