//! Startup orchestration.
//!
//! # Responsibilities
//! - Wire the pipeline from configuration
//! - Bind the listener and begin accepting traffic
//! - Hand back a handle that can stop the server
//!
//! # Design Decisions
//! - Fail fast: a bind error is returned before anything is spawned
//! - Configuration is expected to be validated by the loader

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::PipelineConfig;
use crate::http::{HttpServer, ServerError};
use crate::lifecycle::Shutdown;
use crate::pipeline::ResponsePipeline;
use crate::processing::MessageProcessor;

/// A server accepting traffic on a background task.
#[derive(Debug)]
pub struct RunningServer {
    address: SocketAddr,
    pipeline: Arc<ResponsePipeline>,
    shutdown: Shutdown,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl RunningServer {
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn pipeline(&self) -> &Arc<ResponsePipeline> {
        &self.pipeline
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Wait for the server task to finish.
    pub async fn wait(self) -> Result<(), ServerError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(ServerError::Io(std::io::Error::other(e))),
        }
    }

    /// Trigger shutdown and wait for in-flight requests to drain.
    pub async fn stop(self) -> Result<(), ServerError> {
        self.shutdown.trigger();
        self.wait().await
    }
}

/// Bind `config.listener.bind_address` and serve `chain` behind a new pipeline.
pub async fn start(
    config: PipelineConfig,
    chain: Arc<dyn MessageProcessor>,
) -> Result<RunningServer, ServerError> {
    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| ServerError::Bind { address, source })?;
    let address = listener.local_addr()?;

    let server = HttpServer::new(config, chain);
    let pipeline = server.pipeline().clone();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tracing::info!(address = %address, "Listening for connections");
    Ok(RunningServer {
        address,
        pipeline,
        shutdown,
        handle,
    })
}
