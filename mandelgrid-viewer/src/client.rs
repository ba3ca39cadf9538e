//! Blocking client for the coordinator's viewer dialect.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use mandelgrid_core::{decode_chunk, Chunk, ChunkAddress, GridConfig, Result, ViewerStatus};

/// Result of asking the coordinator for a chunk. `Rejected` and
/// `NotAvailable` are ordinary outcomes, not errors.
#[derive(Debug)]
pub enum FetchOutcome {
    Chunk(Chunk),
    NotAvailable,
    Rejected,
}

/// One viewer exchange: send the 12-byte address, read the status byte, and
/// on accept read the length-prefixed encoded chunk.
pub fn fetch_chunk(
    server: SocketAddr,
    addr: ChunkAddress,
    config: &GridConfig,
    read_timeout: Duration,
) -> Result<FetchOutcome> {
    let mut stream = TcpStream::connect(server)?;
    stream.set_read_timeout(Some(read_timeout))?;
    stream.write_all(&addr.to_wire_bytes())?;

    let mut status = [0u8; 1];
    stream.read_exact(&mut status)?;
    match ViewerStatus::from_byte(status[0])? {
        ViewerStatus::NotAvailable => Ok(FetchOutcome::NotAvailable),
        ViewerStatus::Reject => Ok(FetchOutcome::Rejected),
        ViewerStatus::Accept => {
            let mut len = [0u8; 4];
            stream.read_exact(&mut len)?;
            let mut body = vec![0u8; u32::from_le_bytes(len) as usize];
            stream.read_exact(&mut body)?;
            Ok(FetchOutcome::Chunk(decode_chunk(&body, config)?))
        }
    }
}
