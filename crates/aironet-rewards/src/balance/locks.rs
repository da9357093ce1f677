//! Concurrency primitives for balance mutation
//!
//! Every write to a miner's balance happens under that miner's async lock,
//! and every in-flight top-up holds a process-wide reservation on its
//! ledger hash, so one hash can be in verification at most once at a time.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

/// Registry of per-miner async locks, created on first use.
///
/// The registry's own mutex is only held while cloning a lock out, never
/// across an await. Callers must re-read the miner after acquiring the
/// returned lock; the copy they looked up before waiting may be stale.
pub struct MinerLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl MinerLocks {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The lock guarding `miner_id`'s balance, shared by every caller that
    /// asks for the same id.
    pub fn lock_for(&self, miner_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(miner_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

impl Default for MinerLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// In-flight ledger-hash reservations.
///
/// A reservation covers the whole verify-and-credit sequence of a top-up
/// and is released when the guard drops, so two concurrent submissions of
/// one hash cannot both pass the replay check against the history.
#[derive(Clone, Default)]
pub struct HashReservations {
    held: Arc<Mutex<HashSet<String>>>,
}

/// Guard for one reserved hash; dropping it releases the reservation.
pub struct ReservedHash {
    held: Arc<Mutex<HashSet<String>>>,
    hash: String,
}

impl HashReservations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `hash` for the calling task; `None` when another task
    /// already holds it.
    pub fn reserve(&self, hash: &str) -> Option<ReservedHash> {
        let mut held = self.held.lock().unwrap();
        if held.insert(hash.to_string()) {
            Some(ReservedHash {
                held: self.held.clone(),
                hash: hash.to_string(),
            })
        } else {
            None
        }
    }
}

impl Drop for ReservedHash {
    fn drop(&mut self) {
        if let Ok(mut held) = self.held.lock() {
            held.remove(&self.hash);
        }
    }
}
