//! Per-address transaction status with automatic expiry.
//!
//! A status stays visible while the transaction is in flight. Once it
//! reaches [`TxStatus::Success`] or [`TxStatus::Error`] it is shown for
//! the configured TTL and then disappears on the next read.

use std::collections::BTreeMap;
use std::time::Duration;

use alloy_primitives::Address;
use commitboard_types::TxStatus;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct StatusEntry {
    status: TxStatus,
    finished_at: Option<Instant>,
}

/// Transient transaction status for each address.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    ttl: Duration,
    entries: BTreeMap<Address, StatusEntry>,
}

impl StatusBoard {
    /// Create a board whose terminal statuses expire after `ttl`.
    pub const fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: BTreeMap::new(),
        }
    }

    /// Record a new status for `address`.
    pub fn set(&mut self, address: Address, status: TxStatus) {
        let finished_at = status.is_terminal().then(Instant::now);
        self.entries.insert(
            address,
            StatusEntry {
                status,
                finished_at,
            },
        );
    }

    /// Current status for `address`, if any and not yet expired.
    pub fn get(&self, address: &Address) -> Option<TxStatus> {
        let entry = self.entries.get(address)?;
        if self.expired(entry) {
            return None;
        }
        Some(entry.status.clone())
    }

    /// Whether a transaction for `address` is still in flight.
    pub fn is_pending(&self, address: &Address) -> bool {
        self.entries
            .get(address)
            .is_some_and(|e| !e.status.is_terminal())
    }

    /// Drop expired entries.
    pub fn prune(&mut self) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, e| e.finished_at.is_none_or(|at| at.elapsed() < ttl));
    }

    fn expired(&self, entry: &StatusEntry) -> bool {
        entry
            .finished_at
            .is_some_and(|at| at.elapsed() >= self.ttl)
    }
}
