//! Per-key lock arena for the capacity ledger
//!
//! Every mutation of a (location, date) ledger row and of the reservations
//! that hold capacity against it happens while holding that key's mutex.
//! Unrelated keys never share a lock. Entries are created lazily and swept
//! by a background task once no task holds or waits on them.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::domain::inventory::LedgerKey;
use crate::shared::errors::{DomainError, DomainResult};
use crate::shared::shutdown::ShutdownSignal;

/// Held for the duration of one ledger transaction.
pub type KeyGuard = OwnedMutexGuard<()>;

pub struct KeyedLocks {
    locks: DashMap<LedgerKey, Arc<Mutex<()>>>,
    timeout: Duration,
}

pub type SharedKeyedLocks = Arc<KeyedLocks>;

impl KeyedLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    /// Acquire the lock for `key`, waiting at most the configured timeout.
    ///
    /// Expiry surfaces as [`DomainError::Contention`] so callers can retry.
    pub async fn acquire(&self, key: &LedgerKey) -> DomainResult<KeyGuard> {
        // Clone the Arc while the shard is locked so a concurrent sweep sees
        // the extra reference and leaves the entry alone.
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        match tokio::time::timeout(self.timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                metrics::counter!("ledger_lock_timeouts_total").increment(1);
                warn!(key = %key, timeout_ms = self.timeout.as_millis() as u64, "Ledger lock timed out");
                Err(DomainError::Contention(format!(
                    "ledger {} is busy, try again",
                    key
                )))
            }
        }
    }

    /// Drop entries nobody holds or waits on. Returns how many were removed.
    pub fn evict_idle(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let after = self.locks.len();
        metrics::gauge!("ledger_locks_active").set(after as f64);
        before - after
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Spawn the periodic sweeper; it stops when `shutdown` fires.
    pub fn start_eviction(self: &Arc<Self>, every: Duration, shutdown: ShutdownSignal) {
        let locks = Arc::clone(self);
        tokio::spawn(async move {
            info!(interval_secs = every.as_secs(), "Ledger lock sweeper started");
            let mut interval = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let removed = locks.evict_idle();
                        if removed > 0 {
                            debug!(removed, remaining = locks.len(), "Evicted idle ledger locks");
                        }
                    }
                    _ = shutdown.wait() => break,
                }
            }
            info!("Ledger lock sweeper stopped");
        });
    }
}
