//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the pipeline handler
//! - Wire up middleware (tracing, body limit, request ID)
//! - Translate each HTTP exchange into one pipeline run
//! - Serve the admin API on its own listener when enabled
//! - Drain in-flight requests on shutdown

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin::{setup_admin_router, AdminState};
use crate::config::PipelineConfig;
use crate::http::transport::{into_http_response, response_slot};
use crate::pipeline::{LoggingCompletion, RequestContext, ResponsePipeline};
use crate::processing::MessageProcessor;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ResponsePipeline>,
}

/// HTTP listener fronting one response pipeline.
pub struct HttpServer {
    router: Router,
    config: PipelineConfig,
    pipeline: Arc<ResponsePipeline>,
}

impl HttpServer {
    /// Create a server whose pipeline runs `chain` for every admitted request.
    pub fn new(config: PipelineConfig, chain: Arc<dyn MessageProcessor>) -> Self {
        let pipeline = Arc::new(ResponsePipeline::from_config(&config, chain));
        Self::with_pipeline(config, pipeline)
    }

    /// Create a server around an already wired pipeline.
    pub fn with_pipeline(config: PipelineConfig, pipeline: Arc<ResponsePipeline>) -> Self {
        let state = AppState {
            pipeline: pipeline.clone(),
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            pipeline,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &PipelineConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(pipeline_handler))
            .route("/{*path}", any(pipeline_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.listener.max_body_size))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn pipeline(&self) -> &Arc<ResponsePipeline> {
        &self.pipeline
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            endpoint = %self.pipeline.statistics().name(),
            throttling = self.pipeline.admission().is_enabled(),
            "HTTP server starting"
        );

        let admin = if self.config.admin.enabled {
            Some(self.spawn_admin(shutdown.resubscribe()).await?)
        } else {
            None
        };

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        if let Some(admin) = admin {
            if let Err(e) = admin.await {
                tracing::error!(error = %e, "Admin server task failed");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    async fn spawn_admin(
        &self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<tokio::task::JoinHandle<()>, ServerError> {
        let address = self.config.admin.bind_address.clone();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind { address, source })?;
        let addr = listener.local_addr()?;

        let state = AdminState::new(
            self.pipeline.statistics().clone(),
            self.config.admin.api_key.as_str(),
        );
        let app = setup_admin_router(state).layer(TraceLayer::new_for_http());

        tracing::info!(address = %addr, "Admin API listening");
        Ok(tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.recv().await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Admin server error");
            }
        }))
    }
}

/// Runs one request through the pipeline and writes whatever it produced.
async fn pipeline_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = RequestContext::from_parts(method.clone(), uri, headers, body);
    let request_id = ctx.id().clone();

    tracing::debug!(
        request_id = %request_id,
        method = %ctx.method(),
        path = %ctx.uri().path(),
        "Request received"
    );

    let (slot, handoff) = response_slot();
    let completion = LoggingCompletion::new(request_id.clone());
    let disposition = state.pipeline.process(ctx, slot, completion).await;

    match handoff.await {
        Ok((descriptor, status)) => {
            tracing::debug!(
                request_id = %request_id,
                disposition = disposition.as_str(),
                status = descriptor.status().as_u16(),
                "Response ready"
            );
            into_http_response(&method, descriptor, status)
        }
        Err(_) => {
            tracing::error!(request_id = %request_id, "Pipeline produced no response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
