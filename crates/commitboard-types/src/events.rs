//! Raw contract events as collected from the chain.
//!
//! Events are append-only and never mutated after collection. Each carries
//! its [`ChainPosition`] so the reconciler can order a clear against a set
//! even when both land in the same block with the same timestamp.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Position of a log within the chain: block number, then log index.
///
/// Ordering is lexicographic, which matches the order in which the
/// contract emitted the events.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct ChainPosition {
    /// Block the log was included in.
    #[ts(type = "number")]
    pub block_number: u64,
    /// Index of the log within its block.
    #[ts(type = "number")]
    pub log_index: u64,
}

impl ChainPosition {
    /// Create a position from a block number and log index.
    pub const fn new(block_number: u64, log_index: u64) -> Self {
        Self {
            block_number,
            log_index,
        }
    }
}

/// A `CommitSet(address,string,uint256)` event.
///
/// Emitted once per `setCommit` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CommitEvent {
    /// The address that published the commit.
    #[ts(as = "String")]
    pub user: Address,
    /// The commitment text.
    pub message: String,
    /// Contract-reported unix timestamp in seconds.
    #[ts(type = "number")]
    pub timestamp: u64,
    /// Where the log sits in the chain.
    pub position: ChainPosition,
    /// Hash of the transaction that emitted the log.
    #[ts(as = "String")]
    pub tx_hash: B256,
}

/// A `CommitCleared(address,uint256)` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ClearEvent {
    /// The address that cleared its commit.
    #[ts(as = "String")]
    pub user: Address,
    /// Contract-reported unix timestamp in seconds.
    #[ts(type = "number")]
    pub timestamp: u64,
    /// Where the log sits in the chain.
    pub position: ChainPosition,
    /// Hash of the transaction that emitted the log.
    #[ts(as = "String")]
    pub tx_hash: B256,
}

/// Everything one collection pass read from the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitHistory {
    /// All `CommitSet` events in the scanned range, in chain order.
    pub commits: Vec<CommitEvent>,
    /// All `CommitCleared` events in the scanned range, in chain order.
    pub clears: Vec<ClearEvent>,
    /// The head block the scan ran up to.
    pub latest_block: u64,
}

impl CommitHistory {
    /// Sort both event lists into chain order.
    ///
    /// RPC nodes return logs in order within one `eth_getLogs` call, but a
    /// chunked scan or a merged source may not.
    pub fn sort(&mut self) {
        self.commits.sort_by_key(|e| e.position);
        self.clears.sort_by_key(|e| e.position);
    }

    /// Whether the scan found no events at all.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty() && self.clears.is_empty()
    }
}
