//! Single-shot TCP front end for the coordinator.
//!
//! Every connection performs exactly one request/response exchange and then
//! closes; there is no pipelining and no long-lived per-connection state.
//! One lightweight task is spawned per connection, so a slow or hostile peer
//! can stall only its own exchange. All reads fully drain the declared
//! length (`read_exact`) and carry a bounded timeout; end-of-stream or
//! timeout mid-message kills that request only, never the process.
//!
//! The viewer and worker dialects share no handshake byte, so each gets its
//! own listening port rather than a sniffing prelude.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mandelgrid_core::{
    ChunkAddress, Error, Result, SubmissionReply, ViewerStatus, WorkerMessageTag, WorkloadReply,
    ADDRESS_WIRE_LEN,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::state::{ChunkRequestOutcome, Coordinator, SubmitOutcome, WorkloadOutcome};

/// Network-facing settings for the coordinator.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address serving viewer chunk requests.
    pub viewer_addr: SocketAddr,
    /// Address serving worker pull/push sessions.
    pub worker_addr: SocketAddr,
    /// Upper bound on any single socket read; a stalled peer costs at most
    /// this per exchange.
    pub read_timeout: Duration,
    /// How often expired leases are swept back to pending.
    pub lease_sweep_interval: Duration,
}

pub struct Server {
    coordinator: Arc<Coordinator>,
    viewer_listener: TcpListener,
    worker_listener: TcpListener,
    read_timeout: Duration,
    lease_sweep_interval: Duration,
}

impl Server {
    pub async fn bind(coordinator: Arc<Coordinator>, config: ServerConfig) -> io::Result<Self> {
        let viewer_listener = TcpListener::bind(config.viewer_addr).await?;
        let worker_listener = TcpListener::bind(config.worker_addr).await?;
        Ok(Self {
            coordinator,
            viewer_listener,
            worker_listener,
            read_timeout: config.read_timeout,
            lease_sweep_interval: config.lease_sweep_interval,
        })
    }

    /// Actual viewer address, useful when bound to port 0.
    pub fn viewer_addr(&self) -> io::Result<SocketAddr> {
        self.viewer_listener.local_addr()
    }

    /// Actual worker address, useful when bound to port 0.
    pub fn worker_addr(&self) -> io::Result<SocketAddr> {
        self.worker_listener.local_addr()
    }

    /// Accept connections forever; returns only if a listener fails.
    pub async fn run(self) -> io::Result<()> {
        info!(
            viewer = %self.viewer_addr()?,
            worker = %self.worker_addr()?,
            "coordinator listening"
        );

        let sweeper = Arc::clone(&self.coordinator);
        let sweep_interval = self.lease_sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            loop {
                ticker.tick().await;
                sweeper.reclaim_expired(Instant::now());
            }
        });

        loop {
            tokio::select! {
                conn = self.viewer_listener.accept() => {
                    let (stream, peer) = conn?;
                    let coordinator = Arc::clone(&self.coordinator);
                    let limit = self.read_timeout;
                    tokio::spawn(async move {
                        if let Err(error) = handle_viewer(stream, coordinator, limit).await {
                            debug!(%peer, %error, "viewer session failed");
                        }
                    });
                }
                conn = self.worker_listener.accept() => {
                    let (stream, peer) = conn?;
                    let coordinator = Arc::clone(&self.coordinator);
                    let limit = self.read_timeout;
                    tokio::spawn(async move {
                        if let Err(error) = handle_worker(stream, peer, coordinator, limit).await {
                            warn!(%peer, %error, "worker session failed");
                        }
                    });
                }
            }
        }
    }
}

async fn read_exact_timed(stream: &mut TcpStream, buf: &mut [u8], limit: Duration) -> Result<()> {
    timeout(limit, stream.read_exact(buf))
        .await
        .map_err(|_| Error::Transport(io::Error::new(io::ErrorKind::TimedOut, "read timed out")))??;
    Ok(())
}

/// One viewer exchange: a 12-byte address in, a status byte out, and on
/// `Accept` a length-prefixed encoded chunk.
async fn handle_viewer(
    mut stream: TcpStream,
    coordinator: Arc<Coordinator>,
    limit: Duration,
) -> Result<()> {
    let mut buf = [0u8; ADDRESS_WIRE_LEN];
    read_exact_timed(&mut stream, &mut buf, limit).await?;
    let addr = ChunkAddress::from_wire_bytes(&buf);

    match coordinator.request_chunk(addr) {
        ChunkRequestOutcome::Ready(encoded) => {
            let mut reply = Vec::with_capacity(5 + encoded.len());
            reply.push(ViewerStatus::Accept.as_byte());
            reply.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
            reply.extend_from_slice(&encoded);
            stream.write_all(&reply).await?;
            debug!(%addr, bytes = encoded.len(), "served chunk");
        }
        ChunkRequestOutcome::NotAvailable => {
            stream.write_all(&[ViewerStatus::NotAvailable.as_byte()]).await?;
        }
        ChunkRequestOutcome::Rejected => {
            stream.write_all(&[ViewerStatus::Reject.as_byte()]).await?;
        }
    }
    Ok(())
}

/// One worker exchange, either a pull or a push depending on the leading
/// tag byte.
async fn handle_worker(
    mut stream: TcpStream,
    peer: SocketAddr,
    coordinator: Arc<Coordinator>,
    limit: Duration,
) -> Result<()> {
    let mut tag = [0u8; 1];
    read_exact_timed(&mut stream, &mut tag, limit).await?;

    match WorkerMessageTag::from_byte(tag[0])? {
        WorkerMessageTag::Request => match coordinator.request_workload(peer.ip()) {
            WorkloadOutcome::Assigned(addr) => {
                let mut reply = Vec::with_capacity(1 + ADDRESS_WIRE_LEN);
                reply.push(WorkloadReply::Available.as_byte());
                reply.extend_from_slice(&addr.to_wire_bytes());
                stream.write_all(&reply).await?;
            }
            WorkloadOutcome::NoneAvailable => {
                stream.write_all(&[WorkloadReply::NotAvailable.as_byte()]).await?;
            }
        },
        WorkerMessageTag::Response => {
            let mut buf = [0u8; ADDRESS_WIRE_LEN];
            read_exact_timed(&mut stream, &mut buf, limit).await?;
            let addr = ChunkAddress::from_wire_bytes(&buf);

            // Decide before the payload: a stale holder is turned away
            // without streaming megabytes of doomed bytes.
            if !coordinator.holds_lease(peer.ip(), addr) {
                stream.write_all(&[SubmissionReply::Reject.as_byte()]).await?;
                debug!(%peer, %addr, "refused submission up front");
                return Ok(());
            }
            stream.write_all(&[SubmissionReply::Accept.as_byte()]).await?;

            let mut payload = vec![0u8; coordinator.chunk_len()];
            read_exact_timed(&mut stream, &mut payload, limit).await?;

            // The lease may have moved while the payload streamed; the state
            // machine re-checks and has the final word.
            match coordinator.submit_result(peer.ip(), addr, payload)? {
                SubmitOutcome::Accepted => {}
                SubmitOutcome::Rejected => {
                    warn!(%peer, %addr, "submission lost its lease while streaming");
                }
            }
        }
    }
    Ok(())
}
