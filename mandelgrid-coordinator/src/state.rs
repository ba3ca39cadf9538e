//! The coordinator state machine: pending/assigned/completed bookkeeping and
//! the chunk cache.
//!
//! Per-address lifecycle:
//!
//! ```text
//! Unseen → Pending → Assigned(worker, lease_start) → Completed(chunk)
//!             ↑            │
//!             └────────────┘  lease expiry
//! ```
//!
//! `Completed` is terminal; the stored chunk is immutable. State lives in
//! hash-sharded maps so transitions for one address serialize against each
//! other while unrelated addresses never contend on the same lock. A separate
//! FIFO queue records the order addresses first became pending, giving
//! oldest-pending-first assignment.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use mandelgrid_core::{encode_chunk, Chunk, ChunkAddress, GridConfig, Result};
use tracing::{debug, info, warn};

/// Identity a workload lease is held under.
///
/// The baseline wire protocol carries no explicit worker identity, and a
/// worker's pull and push arrive on separate connections, so the peer IP
/// stands in: it is the one identifier stable across both connections.
pub type WorkerId = IpAddr;

/// Outcome of a viewer chunk request.
#[derive(Debug)]
pub enum ChunkRequestOutcome {
    /// The chunk is complete; the payload is its tag-prefixed encoding.
    Ready(Vec<u8>),
    /// Not computed yet. Demand has been registered, so a worker will
    /// eventually pick the address up; the viewer is never blocked on that.
    NotAvailable,
    /// The address does not name a cell of its level's grid.
    Rejected,
}

/// Outcome of a worker pull.
#[derive(Debug, PartialEq, Eq)]
pub enum WorkloadOutcome {
    Assigned(ChunkAddress),
    NoneAvailable,
}

/// Outcome of a worker push.
#[derive(Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    Rejected,
}

enum Slot {
    Pending,
    Assigned {
        worker: WorkerId,
        lease_start: Instant,
    },
    Completed {
        /// Tag-prefixed encoding, ready to serve to viewers. Border chunks
        /// RLE-compress by orders of magnitude, so the cache stores the
        /// encoded form.
        encoded: Vec<u8>,
    },
}

pub struct Coordinator {
    config: GridConfig,
    lease: Duration,
    shards: Vec<Mutex<HashMap<ChunkAddress, Slot>>>,
    /// Addresses in the order they first became pending. Entries are lazily
    /// revalidated against the slot on pop, so stale or duplicate entries
    /// are harmless.
    pending: Mutex<VecDeque<ChunkAddress>>,
}

/// Recover the guard even if a holder panicked; the maps stay structurally
/// valid because every critical section is a handful of infallible moves.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Coordinator {
    pub fn new(config: GridConfig, lease: Duration, shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        Self {
            config,
            lease,
            shards: (0..shard_count)
                .map(|_| Mutex::new(HashMap::new()))
                .collect(),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Number of raw bytes in one submitted chunk.
    pub fn chunk_len(&self) -> usize {
        self.config.chunk_len()
    }

    fn shard(&self, addr: &ChunkAddress) -> &Mutex<HashMap<ChunkAddress, Slot>> {
        let mut hasher = DefaultHasher::new();
        addr.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % self.shards.len()]
    }

    /// Viewer path. Serves the cached encoding if the chunk is complete and
    /// otherwise answers immediately; an unseen address is registered as
    /// pending so workers will pick it up.
    pub fn request_chunk(&self, addr: ChunkAddress) -> ChunkRequestOutcome {
        if addr.validate().is_err() {
            debug!(%addr, "rejecting malformed chunk request");
            return ChunkRequestOutcome::Rejected;
        }
        let newly_pending = {
            let mut shard = lock(self.shard(&addr));
            match shard.get(&addr) {
                Some(Slot::Completed { encoded }) => {
                    return ChunkRequestOutcome::Ready(encoded.clone());
                }
                Some(Slot::Pending) | Some(Slot::Assigned { .. }) => false,
                None => {
                    shard.insert(addr, Slot::Pending);
                    true
                }
            }
        };
        if newly_pending {
            debug!(%addr, "registered demand for unseen chunk");
            lock(&self.pending).push_back(addr);
        }
        ChunkRequestOutcome::NotAvailable
    }

    /// Worker pull path. Pops the oldest pending address and assigns it to
    /// the caller. Exactly one concurrent caller can win any given address:
    /// the queue pop hands out each entry once, and the Pending check under
    /// the shard lock filters entries the queue no longer speaks for.
    pub fn request_workload(&self, worker: WorkerId) -> WorkloadOutcome {
        loop {
            let Some(addr) = lock(&self.pending).pop_front() else {
                return WorkloadOutcome::NoneAvailable;
            };
            let mut shard = lock(self.shard(&addr));
            match shard.get_mut(&addr) {
                Some(slot @ Slot::Pending) => {
                    *slot = Slot::Assigned {
                        worker,
                        lease_start: Instant::now(),
                    };
                    info!(%addr, %worker, "workload assigned");
                    return WorkloadOutcome::Assigned(addr);
                }
                // Stale queue entry (already assigned or completed through
                // another path); keep popping.
                _ => continue,
            }
        }
    }

    /// Whether `worker` currently holds the lease on `addr`. The server uses
    /// this to refuse a push before the payload is streamed; the final
    /// authority remains [`submit_result`].
    ///
    /// [`submit_result`]: Coordinator::submit_result
    pub fn holds_lease(&self, worker: WorkerId, addr: ChunkAddress) -> bool {
        let shard = lock(self.shard(&addr));
        matches!(
            shard.get(&addr),
            Some(Slot::Assigned { worker: holder, .. }) if *holder == worker
        )
    }

    /// Worker push path. Accepts only from the current lease holder; a late,
    /// duplicate, or reassigned submission is rejected without touching the
    /// stored state, which is what keeps an already-accepted chunk immutable
    /// under worker slowness or crash.
    ///
    /// Returns a format error (nothing stored) if `bytes` is not exactly one
    /// raw chunk.
    pub fn submit_result(
        &self,
        worker: WorkerId,
        addr: ChunkAddress,
        bytes: Vec<u8>,
    ) -> Result<SubmitOutcome> {
        let chunk = Chunk::from_bytes(bytes, &self.config)?;
        let mut shard = lock(self.shard(&addr));
        match shard.get_mut(&addr) {
            Some(slot @ Slot::Assigned { .. }) => {
                let holds = matches!(
                    slot,
                    Slot::Assigned { worker: holder, .. } if *holder == worker
                );
                if !holds {
                    warn!(%addr, %worker, "rejecting submission from stale lease holder");
                    return Ok(SubmitOutcome::Rejected);
                }
                *slot = Slot::Completed {
                    encoded: encode_chunk(&chunk),
                };
                info!(%addr, %worker, "chunk completed");
                Ok(SubmitOutcome::Accepted)
            }
            Some(Slot::Completed { .. }) => {
                debug!(%addr, %worker, "rejecting duplicate submission for completed chunk");
                Ok(SubmitOutcome::Rejected)
            }
            Some(Slot::Pending) | None => {
                warn!(%addr, %worker, "rejecting unsolicited submission");
                Ok(SubmitOutcome::Rejected)
            }
        }
    }

    /// Revert every assignment whose lease has run out, making the address
    /// assignable again. Returns the number of reclaimed workloads.
    ///
    /// This is the hardening that bounds the damage from a worker that
    /// vanishes mid-computation; without it an assigned address would starve
    /// forever.
    pub fn reclaim_expired(&self, now: Instant) -> usize {
        let mut reclaimed = Vec::new();
        for shard in &self.shards {
            let mut shard = lock(shard);
            for (addr, slot) in shard.iter_mut() {
                if let Slot::Assigned { lease_start, .. } = slot {
                    if now.saturating_duration_since(*lease_start) >= self.lease {
                        *slot = Slot::Pending;
                        reclaimed.push(*addr);
                    }
                }
            }
        }
        if !reclaimed.is_empty() {
            info!(count = reclaimed.len(), "reclaimed expired workloads");
            let mut pending = lock(&self.pending);
            pending.extend(reclaimed.iter().copied());
        }
        reclaimed.len()
    }
}
