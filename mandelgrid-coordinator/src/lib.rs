pub mod server;
pub mod state;

pub use server::{Server, ServerConfig};
pub use state::{ChunkRequestOutcome, Coordinator, SubmitOutcome, WorkerId, WorkloadOutcome};
