//! End-to-end wire tests: a coordinator bound to real sockets, exercised by
//! hand-rolled viewer and worker exchanges.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use mandelgrid_compute::compute_chunk;
use mandelgrid_core::{
    decode_chunk, ChunkAddress, GridConfig, SubmissionReply, ViewerStatus, WorkerMessageTag,
    WorkloadReply,
};
use mandelgrid_coordinator::{Coordinator, Server, ServerConfig};

fn test_config() -> GridConfig {
    GridConfig {
        min_axis: -2.0,
        max_axis: 2.0,
        chunk_width: 8,
        max_iterations: 64,
    }
}

async fn start_server(lease: Duration) -> (SocketAddr, SocketAddr) {
    let coordinator = Arc::new(Coordinator::new(test_config(), lease, 4));
    let server = Server::bind(
        coordinator,
        ServerConfig {
            viewer_addr: "127.0.0.1:0".parse().unwrap(),
            worker_addr: "127.0.0.1:0".parse().unwrap(),
            read_timeout: Duration::from_secs(5),
            lease_sweep_interval: Duration::from_millis(20),
        },
    )
    .await
    .unwrap();
    let viewer = server.viewer_addr().unwrap();
    let worker = server.worker_addr().unwrap();
    tokio::spawn(server.run());
    (viewer, worker)
}

async fn viewer_request(
    server: SocketAddr,
    addr: ChunkAddress,
) -> (ViewerStatus, Option<Vec<u8>>) {
    let mut stream = TcpStream::connect(server).await.unwrap();
    stream.write_all(&addr.to_wire_bytes()).await.unwrap();

    let mut status = [0u8; 1];
    stream.read_exact(&mut status).await.unwrap();
    let status = ViewerStatus::from_byte(status[0]).unwrap();
    if status != ViewerStatus::Accept {
        return (status, None);
    }
    let mut len = [0u8; 4];
    stream.read_exact(&mut len).await.unwrap();
    let mut body = vec![0u8; u32::from_le_bytes(len) as usize];
    stream.read_exact(&mut body).await.unwrap();
    (status, Some(body))
}

async fn pull_workload(server: SocketAddr) -> Option<ChunkAddress> {
    let mut stream = TcpStream::connect(server).await.unwrap();
    stream
        .write_all(&[WorkerMessageTag::Request.as_byte()])
        .await
        .unwrap();

    let mut status = [0u8; 1];
    stream.read_exact(&mut status).await.unwrap();
    match WorkloadReply::from_byte(status[0]).unwrap() {
        WorkloadReply::Available => {
            let mut buf = [0u8; 12];
            stream.read_exact(&mut buf).await.unwrap();
            Some(ChunkAddress::from_wire_bytes(&buf))
        }
        WorkloadReply::NotAvailable => None,
    }
}

async fn push_result(server: SocketAddr, addr: ChunkAddress, bytes: &[u8]) -> SubmissionReply {
    let mut stream = TcpStream::connect(server).await.unwrap();
    let mut msg = vec![WorkerMessageTag::Response.as_byte()];
    msg.extend_from_slice(&addr.to_wire_bytes());
    stream.write_all(&msg).await.unwrap();

    let mut status = [0u8; 1];
    stream.read_exact(&mut status).await.unwrap();
    let reply = SubmissionReply::from_byte(status[0]).unwrap();
    if reply == SubmissionReply::Accept {
        stream.write_all(bytes).await.unwrap();
        // Keep the connection open until the server has drained the payload.
        let mut eof = [0u8; 1];
        let _ = stream.read(&mut eof).await;
    }
    reply
}

#[tokio::test]
async fn full_cycle_from_miss_to_served_chunk() {
    let (viewer, worker) = start_server(Duration::from_secs(60)).await;
    let config = test_config();
    let addr = ChunkAddress::new(2, 1, 0);

    // Viewer miss registers demand.
    let (status, body) = viewer_request(viewer, addr).await;
    assert_eq!(status, ViewerStatus::NotAvailable);
    assert!(body.is_none());

    // Worker pulls exactly that address.
    assert_eq!(pull_workload(worker).await, Some(addr));

    // Compute and push the raw grid.
    let chunk = compute_chunk(&addr.window(&config).unwrap(), &config);
    assert_eq!(
        push_result(worker, addr, chunk.as_bytes()).await,
        SubmissionReply::Accept
    );

    // Viewer now receives the identical grid, tag-prefixed and framed.
    let (status, body) = viewer_request(viewer, addr).await;
    assert_eq!(status, ViewerStatus::Accept);
    let decoded = decode_chunk(&body.unwrap(), &config).unwrap();
    assert_eq!(decoded, chunk);

    // No further work outstanding.
    assert_eq!(pull_workload(worker).await, None);
}

#[tokio::test]
async fn duplicate_submission_is_refused_before_the_payload() {
    let (viewer, worker) = start_server(Duration::from_secs(60)).await;
    let addr = ChunkAddress::new(2, 0, 1);

    viewer_request(viewer, addr).await;
    assert_eq!(pull_workload(worker).await, Some(addr));

    let grid = vec![3u8; test_config().chunk_len()];
    assert_eq!(
        push_result(worker, addr, &grid).await,
        SubmissionReply::Accept
    );
    // The second offer is rejected at the status byte; no bytes stream.
    assert_eq!(
        push_result(worker, addr, &grid).await,
        SubmissionReply::Reject
    );

    // The cached chunk is untouched.
    let (_, body) = viewer_request(viewer, addr).await;
    let decoded = decode_chunk(&body.unwrap(), &test_config()).unwrap();
    assert_eq!(decoded.as_bytes(), grid.as_slice());
}

#[tokio::test]
async fn unsolicited_submission_is_rejected() {
    let (_, worker) = start_server(Duration::from_secs(60)).await;
    let addr = ChunkAddress::new(5, 4, 4);
    assert_eq!(
        push_result(worker, addr, &[]).await,
        SubmissionReply::Reject
    );
}

#[tokio::test]
async fn malformed_viewer_address_is_rejected() {
    let (viewer, _) = start_server(Duration::from_secs(60)).await;
    let (status, body) = viewer_request(viewer, ChunkAddress::new(0, 0, 0)).await;
    assert_eq!(status, ViewerStatus::Reject);
    assert!(body.is_none());

    let (status, _) = viewer_request(viewer, ChunkAddress::new(3, 3, 0)).await;
    assert_eq!(status, ViewerStatus::Reject);
}

#[tokio::test]
async fn unknown_worker_tag_closes_the_connection() {
    let (_, worker) = start_server(Duration::from_secs(60)).await;
    let mut stream = TcpStream::connect(worker).await.unwrap();
    stream.write_all(&[0x7F]).await.unwrap();

    // The server drops the session without replying.
    let mut buf = [0u8; 1];
    let read = stream.read(&mut buf).await.unwrap();
    assert_eq!(read, 0);
}

#[tokio::test]
async fn expired_lease_is_handed_out_again() {
    let (viewer, worker) = start_server(Duration::ZERO).await;
    let addr = ChunkAddress::new(2, 1, 1);

    viewer_request(viewer, addr).await;
    assert_eq!(pull_workload(worker).await, Some(addr));

    // The sweeper runs every 20ms with a zero lease; the assignment must
    // come back around.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(pull_workload(worker).await, Some(addr));
}
