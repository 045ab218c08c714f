//! VMS instances gateway
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ routing::Dispatcher ──▶ api controller
//!                     (request id,      (RouteTable,           (instances pool,
//!                      timeout, trace)   first match wins)       vms client)
//!     Client Response
//!     ◀────────────── JSON / bytes / redirect
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use vms_gateway::api::build_dispatcher;
use vms_gateway::config::{load_config, GatewayConfig};
use vms_gateway::instances::{InstancePool, InstanceStore, MemoryStore, SqliteStore};
use vms_gateway::observability::{logging, metrics};
use vms_gateway::vms::OfflineConnector;
use vms_gateway::{HttpServer, Shutdown};

#[derive(Debug, Parser)]
#[command(name = "vms-gateway", version, about = "HTTP gateway for VMS instances")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind, overriding the configuration.
    #[arg(long)]
    ip: Option<IpAddr>,

    /// Port to bind, overriding the configuration.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    let mut bind_address: SocketAddr = config.listener.bind_address.parse()?;
    if let Some(ip) = cli.ip {
        bind_address.set_ip(ip);
    }
    if let Some(port) = cli.port {
        bind_address.set_port(port);
    }
    config.listener.bind_address = bind_address.to_string();

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "vms-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        refresh_interval_secs = config.vms.refresh_interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let store: Arc<dyn InstanceStore> = match &config.store.path {
        Some(path) => Arc::new(SqliteStore::open(path).await?),
        None => {
            tracing::warn!("No store path configured, instances are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };
    let connector = Arc::new(OfflineConnector::new(config.vms.clone()));
    let pool = Arc::new(InstancePool::new(Arc::clone(&store), connector));
    pool.pull().await?;

    let dispatcher = Arc::new(build_dispatcher(store, Arc::clone(&pool))?);

    let shutdown = Shutdown::new();
    let _signals = shutdown.trigger_on_signal();

    if config.vms.refresh_interval_secs > 0 {
        let interval = Duration::from_secs(config.vms.refresh_interval_secs);
        tokio::spawn(Arc::clone(&pool).run_refresher(interval, shutdown.subscribe()));
    }

    let listener = TcpListener::bind(bind_address).await?;
    HttpServer::new(config, dispatcher)
        .run(listener, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
