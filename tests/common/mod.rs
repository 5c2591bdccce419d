//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use response_pipeline::config::PipelineConfig;
use response_pipeline::lifecycle::{start, RunningServer};
use response_pipeline::processing::MessageProcessor;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Loopback config on an ephemeral port, with exporters and admin off.
pub fn test_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.observability.metrics_enabled = false;
    config.admin.enabled = false;
    config
}

/// Same as [`test_config`] with a fixed-window quota.
pub fn throttled_config(limit: i64, period_ms: i64) -> PipelineConfig {
    let mut config = test_config();
    config.throttling.enabled = true;
    config.throttling.limit = limit;
    config.throttling.period_ms = period_ms;
    config
}

/// Start a server running `chain` and return once it accepts connections.
pub async fn start_server<P>(config: PipelineConfig, chain: P) -> RunningServer
where
    P: MessageProcessor + 'static,
{
    start(config, Arc::new(chain)).await.unwrap()
}

pub fn url(server: &RunningServer, path: &str) -> String {
    format!("http://{}{}", server.address(), path)
}

/// Send a raw HTTP/1.1 request and return the full response text.
pub async fn raw_request(server: &RunningServer, request: &str) -> String {
    let mut stream = TcpStream::connect(server.address()).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

/// Poll `check` until it returns true or the deadline passes.
///
/// Write outcomes are reported after the client may already hold the
/// response, so statistics settle slightly later.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check().await
}
