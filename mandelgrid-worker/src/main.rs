//! Worker node: a synchronous pull → compute → push loop.
//!
//! One workload is in flight at a time; the compute step is blocking and
//! resource-intensive, so nothing else is attempted while it runs. Transport
//! errors end the current cycle only — the next cycle retries from a fresh
//! connection.

mod client;

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use client::CoordinatorClient;
use mandelgrid_compute::compute_chunk;
use mandelgrid_core::GridConfig;

/// Mandelbrot chunk worker.
///
/// Pulls workloads from a coordinator, computes them on the CPU, and pushes
/// the results back. Exits when no work is available unless `--poll-secs`
/// keeps it waiting for more.
#[derive(Parser, Debug)]
#[command(name = "mandelgrid-worker", version)]
struct Cli {
    /// Coordinator worker-port address, e.g. 192.168.1.10:4001.
    #[arg(long)]
    server: SocketAddr,

    /// Keep polling at this interval when no work is available, instead of
    /// exiting.
    #[arg(long)]
    poll_secs: Option<u64>,

    /// Per-read socket timeout in seconds.
    #[arg(long, default_value_t = 60)]
    read_timeout_secs: u64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = GridConfig::default();
    config.validate()?;
    let client = CoordinatorClient::new(cli.server, Duration::from_secs(cli.read_timeout_secs));
    info!(server = %cli.server, "worker starting");

    loop {
        let addr = match client.pull_workload() {
            Ok(Some(addr)) => addr,
            Ok(None) => {
                let Some(poll) = cli.poll_secs else {
                    info!("no work available, exiting");
                    return Ok(());
                };
                std::thread::sleep(Duration::from_secs(poll));
                continue;
            }
            Err(error) => {
                warn!(%error, "pull failed");
                let Some(poll) = cli.poll_secs else {
                    return Err(error.into());
                };
                std::thread::sleep(Duration::from_secs(poll));
                continue;
            }
        };

        info!(%addr, "workload received");
        let window = addr.window(&config)?;
        let started = Instant::now();
        let chunk = compute_chunk(&window, &config);
        info!(%addr, elapsed_ms = started.elapsed().as_millis(), "chunk computed");

        match client.push_result(addr, &chunk) {
            Ok(true) => info!(%addr, "result accepted"),
            // A rejected result means the lease moved while we computed;
            // the work is simply discarded and the loop continues.
            Ok(false) => warn!(%addr, "result rejected"),
            Err(error) => warn!(%addr, %error, "push failed"),
        }
    }
}
