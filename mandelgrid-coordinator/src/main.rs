use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mandelgrid_core::GridConfig;
use mandelgrid_coordinator::{Coordinator, Server, ServerConfig};

/// Distributed Mandelbrot chunk coordinator.
///
/// Hands pending chunk addresses to workers, caches completed chunks, and
/// serves them to viewers.
#[derive(Parser, Debug)]
#[command(name = "mandelgrid-coordinator", version)]
struct Cli {
    /// Address to serve viewer chunk requests on.
    #[arg(long, default_value = "0.0.0.0:4000")]
    viewer_addr: SocketAddr,

    /// Address to serve worker pull/push sessions on.
    #[arg(long, default_value = "0.0.0.0:4001")]
    worker_addr: SocketAddr,

    /// Seconds a worker may hold an assignment before it is reclaimed.
    #[arg(long, default_value_t = 300)]
    lease_secs: u64,

    /// Seconds between lease-expiry sweeps.
    #[arg(long, default_value_t = 10)]
    sweep_secs: u64,

    /// Per-read socket timeout in seconds.
    #[arg(long, default_value_t = 60)]
    read_timeout_secs: u64,

    /// Number of state shards; contention granularity for the chunk table.
    #[arg(long, default_value_t = 16)]
    shards: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = GridConfig::default();
    config.validate()?;
    info!(?config, "starting coordinator");

    let coordinator = Arc::new(Coordinator::new(
        config,
        Duration::from_secs(cli.lease_secs),
        cli.shards,
    ));
    let server = Server::bind(
        coordinator,
        ServerConfig {
            viewer_addr: cli.viewer_addr,
            worker_addr: cli.worker_addr,
            read_timeout: Duration::from_secs(cli.read_timeout_secs),
            lease_sweep_interval: Duration::from_secs(cli.sweep_secs),
        },
    )
    .await?;

    server.run().await?;
    Ok(())
}
