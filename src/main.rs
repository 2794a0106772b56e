//! Bandwidth Hero image proxy (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌───────────────────────────────────────────────────────────┐
//!                   │                       IMAGE PROXY                          │
//!                   │                                                            │
//!   GET /           │  ┌────────────┐                        ┌────────────────┐  │
//!   ────────────────┼─▶│  response  │──┐                  ┌─▶│    upstream    │──┼──▶ Image
//!                   │  │ (rr-style) │  │  ┌────────────┐  │  │    fetcher     │  │    origin
//!   POST /invoke    │  └────────────┘  ├─▶│  pipeline  │──┤  └────────────────┘  │
//!   ────────────────┼─▶┌────────────┐  │  │            │  │  ┌────────────────┐  │
//!                   │  │   event    │──┘  └─────┬──────┘  └─▶│ gate+compressor│  │
//!                   │  │  adapter   │           │            └────────────────┘  │
//!                   │  └────────────┘           ▼                                │
//!                   │                    ┌────────────┐                          │
//!                   │                    │  headers   │ (CSP patch, flatten)     │
//!                   │                    └────────────┘                          │
//!                   │                                                            │
//!                   │  config · observability · lifecycle                        │
//!                   └───────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use bandwidth_hero_proxy::config::load_or_default;
use bandwidth_hero_proxy::lifecycle::{spawn_signal_handler, Shutdown};
use bandwidth_hero_proxy::observability::{logging, metrics};
use bandwidth_hero_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "bandwidth-hero-proxy")]
#[command(about = "Image compression proxy", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "BHP_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    logging::init_logging(&config.observability);

    tracing::info!("bandwidth-hero-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        strategy = ?config.options.strategy,
        fetch_timeout_secs = config.timeouts.fetch_secs,
        compress_timeout_secs = config.timeouts.compress_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
