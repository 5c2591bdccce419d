//! Response pipeline server.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ admission ──refused──▶ discard (429)
//!                                        │
//!                                        ▼
//!                                  processing chain
//!                                        │
//!                                        ▼
//!     Client Response              response builder
//!     ◀────────────── transport ◀──────┘
//!                        │
//!                        └──▶ write outcome ──▶ statistics, completion
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use response_pipeline::config::{load_config, PipelineConfig};
use response_pipeline::lifecycle::{start, wait_for_signal};
use response_pipeline::observability::{logging, metrics};
use response_pipeline::processing::{Echo, ProcessorChain};

#[derive(Parser)]
#[command(name = "response-pipeline")]
#[command(about = "HTTP endpoint with admission control and delivery tracking", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "response-pipeline starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        throttling = config.throttling.enabled,
        limit = config.throttling.limit,
        period_ms = config.throttling.period_ms,
        statistics = config.statistics.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let chain = Arc::new(ProcessorChain::new().then(Echo));
    let running = start(config, chain).await?;

    let shutdown = running.shutdown().clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    running.wait().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
