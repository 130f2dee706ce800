//! Service gateway binary.
//!
//! ```text
//!     Client ──▶ /api/{service}/{path} ──▶ routing ──▶ forwarding ──▶ downstream service
//!                                                          │
//!     Client ◀── buffered or streamed response ◀───────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use service_gateway::config::{load_config, GatewayConfig};
use service_gateway::lifecycle::{signals, Shutdown};
use service_gateway::observability::{logging, metrics};
use service_gateway::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "service-gateway", version, about = "Reverse proxy for named downstream services")]
struct Cli {
    /// Path to a TOML config file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address (e.g. 127.0.0.1:8080).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "service-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.0.len(),
        connect_timeout_secs = config.timeouts.connect_secs,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    for service in config.services.iter() {
        tracing::info!(service = %service.name, base_url = %service.base_url, "Service registered");
    }

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let server = HttpServer::new(config);

    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    server.run(listener, rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
