//! Blocking client for the coordinator's worker dialect.
//!
//! Each exchange is one connection: connect, speak once, close. The compute
//! step between a pull and its push dominates the connection overhead, so
//! there is nothing to gain from keep-alive here.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use mandelgrid_core::{
    Chunk, ChunkAddress, Result, SubmissionReply, WorkerMessageTag, WorkloadReply,
    ADDRESS_WIRE_LEN,
};

pub struct CoordinatorClient {
    server: SocketAddr,
    read_timeout: Duration,
}

impl CoordinatorClient {
    pub fn new(server: SocketAddr, read_timeout: Duration) -> Self {
        Self {
            server,
            read_timeout,
        }
    }

    fn connect(&self) -> Result<TcpStream> {
        let stream = TcpStream::connect(self.server)?;
        stream.set_read_timeout(Some(self.read_timeout))?;
        Ok(stream)
    }

    /// Pull exchange: ask for one pending workload. `None` means the
    /// coordinator has nothing to hand out right now.
    pub fn pull_workload(&self) -> Result<Option<ChunkAddress>> {
        let mut stream = self.connect()?;
        stream.write_all(&[WorkerMessageTag::Request.as_byte()])?;

        let mut status = [0u8; 1];
        stream.read_exact(&mut status)?;
        match WorkloadReply::from_byte(status[0])? {
            WorkloadReply::Available => {
                let mut buf = [0u8; ADDRESS_WIRE_LEN];
                stream.read_exact(&mut buf)?;
                Ok(Some(ChunkAddress::from_wire_bytes(&buf)))
            }
            WorkloadReply::NotAvailable => Ok(None),
        }
    }

    /// Push exchange: offer a computed chunk. Only after the coordinator
    /// accepts is the raw grid streamed; `Ok(false)` means the submission
    /// was rejected (typically a reassigned lease) and the bytes were never
    /// sent.
    pub fn push_result(&self, addr: ChunkAddress, chunk: &Chunk) -> Result<bool> {
        let mut stream = self.connect()?;
        let mut msg = Vec::with_capacity(1 + ADDRESS_WIRE_LEN);
        msg.push(WorkerMessageTag::Response.as_byte());
        msg.extend_from_slice(&addr.to_wire_bytes());
        stream.write_all(&msg)?;

        let mut status = [0u8; 1];
        stream.read_exact(&mut status)?;
        match SubmissionReply::from_byte(status[0])? {
            SubmissionReply::Accept => {
                stream.write_all(chunk.as_bytes())?;
                Ok(true)
            }
            SubmissionReply::Reject => Ok(false),
        }
    }
}
