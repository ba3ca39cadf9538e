//! Viewer client: fetch one chunk from a coordinator and write it out as a
//! colorized PNG.

mod client;
mod color;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use image::RgbImage;
use tracing::info;
use tracing_subscriber::EnvFilter;

use client::{fetch_chunk, FetchOutcome};
use mandelgrid_core::{ChunkAddress, GridConfig};

/// Mandelbrot chunk viewer.
///
/// Requests the chunk at (level, index-real, index-imag) from a coordinator
/// and renders it to a PNG. A chunk that has not been computed yet is
/// reported as unavailable; ask again once a worker has picked it up.
#[derive(Parser, Debug)]
#[command(name = "mandelgrid-viewer", version)]
struct Cli {
    /// Coordinator viewer-port address, e.g. 192.168.1.10:4000.
    #[arg(long)]
    server: SocketAddr,

    /// Subdivision level (the square splits into level × level chunks).
    #[arg(long)]
    level: u32,

    /// Chunk index along the real axis.
    #[arg(long)]
    index_real: u32,

    /// Chunk index along the imaginary axis.
    #[arg(long)]
    index_imag: u32,

    /// Output PNG path.
    #[arg(long, default_value = "chunk.png")]
    output: PathBuf,

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

    let addr = ChunkAddress::new(cli.level, cli.index_real, cli.index_imag);
    addr.validate()?;

    let chunk = match fetch_chunk(
        cli.server,
        addr,
        &config,
        Duration::from_secs(cli.read_timeout_secs),
    )? {
        FetchOutcome::Chunk(chunk) => chunk,
        FetchOutcome::NotAvailable => {
            println!("chunk {addr} isn't available yet");
            return Ok(());
        }
        FetchOutcome::Rejected => bail!("coordinator rejected the request for chunk {addr}"),
    };

    let width = chunk.width() as u32;
    let rgb = color::colorize(&chunk);
    let img = RgbImage::from_raw(width, width, rgb)
        .context("colorized buffer does not match the chunk dimensions")?;
    img.save(&cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    info!(%addr, output = %cli.output.display(), "chunk written");
    Ok(())
}
