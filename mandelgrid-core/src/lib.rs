pub mod chunk;
pub mod chunk_address;
pub mod codec;
pub mod config;
pub mod error;
pub mod wire;

pub use chunk::Chunk;
pub use chunk_address::{ChunkAddress, ChunkWindow, ADDRESS_WIRE_LEN};
pub use codec::{decode_chunk, encode_chunk};
pub use config::GridConfig;
pub use error::{Error, Result};
pub use wire::{SubmissionReply, ViewerStatus, WorkerMessageTag, WorkloadReply};
