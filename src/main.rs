//! rpc-gateway
//!
//! Declarative HTTP → gRPC gateway built with Tokio, Axum and Tonic.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌───────────────────────────────────────────────────┐
//!                         │                    RPC GATEWAY                    │
//!                         │                                                   │
//!   HTTP request          │  ┌─────────┐    ┌──────────┐    ┌─────────────┐   │
//!   ──────────────────────┼─▶│  http   │───▶│ routing  │───▶│   schema    │   │
//!                         │  │ server  │    │  table   │    │  resolver   │   │
//!                         │  └─────────┘    └──────────┘    └──────┬──────┘   │
//!                         │                                        │          │
//!                         │                                        ▼          │
//!   Envelope              │  ┌──────────┐   ┌──────────┐    ┌─────────────┐   │   gRPC
//!   ◀─────────────────────┼──│ response │◀──│ gateway  │◀──▶│ rpc client  │◀──┼──▶ service
//!                         │  │normalizer│   │dispatcher│    │  registry   │   │
//!                         │  └──────────┘   └──────────┘    └─────────────┘   │
//!                         │                                                   │
//!                         │  config (+watcher) · admin · observability ·      │
//!                         │  lifecycle                                        │
//!                         └───────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use rpc_gateway::admin::{self, AdminState};
use rpc_gateway::config::{load_config, watcher::ConfigWatcher, GatewayConfig};
use rpc_gateway::lifecycle::{signals, Shutdown};
use rpc_gateway::observability::{logging, metrics};
use rpc_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "rpc-gateway")]
#[command(about = "HTTP to gRPC gateway driven by a route table", long_about = None)]
struct Args {
    /// Path to the TOML configuration. Watched for route changes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("rpc-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        schema_dir = %config.schema.dir,
        schema_cache = config.schema.cache,
        rpc_timeout_secs = config.timeouts.rpc_secs,
        "Configuration loaded"
    );

    let server = GatewayServer::new(config.clone())?;
    let dispatcher = server.dispatcher();

    if config.schema.preload {
        dispatcher.preload()?;
    }

    // Route table hot reload; the watcher handle must outlive the server.
    let (config_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (updates, Some(watcher.run()?))
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    if config.admin.enabled {
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        let state = AdminState::new(dispatcher.clone(), &config.admin.api_key);
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(admin_listener, state, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
