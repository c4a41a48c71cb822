//! Event collection: scan the contract's logs and decode them into a
//! [`CommitHistory`].
//!
//! The collector keeps every decoded event it has seen and the next block
//! it has not scanned. Each refresh only asks the node for
//! `next_block..=head`, in fixed-size chunks with both event signatures in
//! one filter, then returns the whole cached history so the replay always
//! sees the complete log. The cursor advances per chunk, so a failed
//! refresh resumes where it stopped.
//!
//! Without a configured deployment block, the first refresh binary
//! searches `eth_getCode` for the block where the contract appeared.

use alloy::eips::BlockId;
use alloy::providers::Provider;
use alloy::rpc::types::{BlockNumberOrTag, Filter, Log};
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;
use commitboard_core::config::ChainConfig;
use commitboard_core::poller::{HistorySource, SourceError};
use commitboard_types::{ChainPosition, ClearEvent, CommitEvent, CommitHistory};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::abi::{CommitCleared, CommitSet};
use crate::error::ChainError;
use crate::provider::ChainProvider;

/// A decoded contract event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEvent {
    /// A `CommitSet` log.
    Commit(CommitEvent),
    /// A `CommitCleared` log.
    Clear(ClearEvent),
}

/// Saturating conversion for `uint256` timestamps.
fn timestamp_to_u64(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Decode one log.
///
/// Returns `Ok(None)` for logs that are pending, removed, or carry an
/// unknown signature.
///
/// # Errors
///
/// Returns [`ChainError::Abi`] if a known event fails to decode.
pub fn decode_log(log: &Log) -> Result<Option<DecodedEvent>, ChainError> {
    if log.removed {
        return Ok(None);
    }
    let (Some(block), Some(index)) = (log.block_number, log.log_index) else {
        return Ok(None);
    };
    let position = ChainPosition::new(block, index);
    let tx_hash = log.transaction_hash.unwrap_or_default();

    match log.topics().first() {
        Some(sig) if *sig == CommitSet::SIGNATURE_HASH => {
            let ev = log.log_decode::<CommitSet>()?.inner.data;
            Ok(Some(DecodedEvent::Commit(CommitEvent {
                user: ev.user,
                message: ev.message,
                timestamp: timestamp_to_u64(ev.timestamp),
                position,
                tx_hash,
            })))
        }
        Some(sig) if *sig == CommitCleared::SIGNATURE_HASH => {
            let ev = log.log_decode::<CommitCleared>()?.inner.data;
            Ok(Some(DecodedEvent::Clear(ClearEvent {
                user: ev.user,
                timestamp: timestamp_to_u64(ev.timestamp),
                position,
                tx_hash,
            })))
        }
        _ => Ok(None),
    }
}

/// Inclusive block ranges covering `from..=to` in steps of `chunk`.
pub fn block_chunks(from: u64, to: u64, chunk: u64) -> Vec<(u64, u64)> {
    let step = chunk.max(1);
    let mut ranges = Vec::new();
    let mut start = from;
    while start <= to {
        let end = start.saturating_add(step.saturating_sub(1)).min(to);
        ranges.push((start, end));
        if end == u64::MAX {
            break;
        }
        start = end.saturating_add(1);
    }
    ranges
}

/// Lowest block at which `contract` has code, searching `0..=head`.
///
/// # Errors
///
/// Returns [`ChainError::NotDeployed`] if there is no code at `head`, or
/// the RPC error of any `eth_getCode` call.
pub async fn find_deployment_block(
    provider: &ChainProvider,
    contract: Address,
    head: u64,
) -> Result<u64, ChainError> {
    if !has_code(provider, contract, head).await? {
        return Err(ChainError::NotDeployed {
            address: contract,
            head,
        });
    }
    let (mut low, mut high) = (0_u64, head);
    while low < high {
        let mid = low.saturating_add(high.saturating_sub(low) / 2);
        if has_code(provider, contract, mid).await? {
            high = mid;
        } else {
            low = mid.saturating_add(1);
        }
    }
    Ok(low)
}

async fn has_code(
    provider: &ChainProvider,
    contract: Address,
    block: u64,
) -> Result<bool, ChainError> {
    let code = provider
        .get_code_at(contract)
        .block_id(BlockId::number(block))
        .await?;
    Ok(!code.is_empty())
}

/// Events decoded so far and the first block not yet scanned.
#[derive(Debug, Default)]
struct ScanCache {
    commits: Vec<CommitEvent>,
    clears: Vec<ClearEvent>,
    next_block: Option<u64>,
}

/// Scans the commitment contract's event history.
pub struct EventCollector {
    provider: ChainProvider,
    contract: Address,
    deployment_block: Option<u64>,
    chunk_size: u64,
    cache: Mutex<ScanCache>,
}

impl EventCollector {
    /// Create a collector for the contract in `config`.
    pub fn new(provider: ChainProvider, config: &ChainConfig) -> Self {
        Self {
            provider,
            contract: config.contract_address,
            deployment_block: config.deployment_block,
            chunk_size: config.log_chunk_size,
            cache: Mutex::new(ScanCache::default()),
        }
    }

    fn filter(&self, from: u64, to: u64) -> Filter {
        Filter::new()
            .address(self.contract)
            .event_signature(vec![CommitSet::SIGNATURE_HASH, CommitCleared::SIGNATURE_HASH])
            .from_block(BlockNumberOrTag::Number(from))
            .to_block(BlockNumberOrTag::Number(to))
    }

    async fn first_block(&self, head: u64) -> Result<u64, ChainError> {
        if let Some(block) = self.deployment_block {
            return Ok(block);
        }
        let block = find_deployment_block(&self.provider, self.contract, head).await?;
        info!(contract = %self.contract, deployment_block = block, "Located contract deployment");
        Ok(block)
    }

    /// Every `CommitSet` and `CommitCleared` event up to the current head,
    /// in chain order.
    ///
    /// Only blocks past the previous scan are fetched.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] if any RPC call or decode fails. Chunks
    /// completed before the failure stay cached.
    pub async fn collect(&self) -> Result<CommitHistory, ChainError> {
        let mut cache = self.cache.lock().await;
        let head = self.provider.get_block_number().await?;
        let start = match cache.next_block {
            Some(block) => block,
            None => self.first_block(head).await?,
        };
        cache.next_block = Some(start);

        let ranges = block_chunks(start, head, self.chunk_size);
        let mut found = 0_usize;
        for &(from, to) in &ranges {
            let logs = self.provider.get_logs(&self.filter(from, to)).await?;
            let decoded = logs
                .iter()
                .filter_map(|log| decode_log(log).transpose())
                .collect::<Result<Vec<_>, _>>()?;
            debug!(from, to, logs = logs.len(), "log chunk fetched");

            found = found.saturating_add(decoded.len());
            for event in decoded {
                match event {
                    DecodedEvent::Commit(ev) => cache.commits.push(ev),
                    DecodedEvent::Clear(ev) => cache.clears.push(ev),
                }
            }
            cache.next_block = Some(to.saturating_add(1));
        }

        let mut history = CommitHistory {
            commits: cache.commits.clone(),
            clears: cache.clears.clone(),
            latest_block: head,
        };
        drop(cache);
        history.sort();

        if found > 0 {
            info!(
                latest_block = head,
                chunks = ranges.len(),
                new_events = found,
                commits = history.commits.len(),
                clears = history.clears.len(),
                "event history extended"
            );
        } else {
            debug!(latest_block = head, chunks = ranges.len(), "no new events");
        }
        Ok(history)
    }
}

impl HistorySource for EventCollector {
    async fn fetch_history(&self) -> Result<CommitHistory, SourceError> {
        self.collect().await.map_err(SourceError::new)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use alloy_primitives::{B256, Bytes, LogData};

    use super::*;
    use crate::provider::connect;
    use crate::test_node::TestNode;

    const CONTRACT: Address = Address::repeat_byte(0x3b);

    fn log_from(data: LogData, block: u64, index: u64) -> Log {
        Log {
            inner: alloy_primitives::Log {
                address: CONTRACT,
                data,
            },
            block_number: Some(block),
            log_index: Some(index),
            transaction_hash: Some(B256::repeat_byte(0xcc)),
            ..Log::default()
        }
    }

    fn set_log(user: Address, message: &str, timestamp: u64, block: u64) -> Log {
        let ev = CommitSet {
            user,
            message: message.to_owned(),
            timestamp: U256::from(timestamp),
        };
        log_from(ev.encode_log_data(), block, 0)
    }

    fn clear_log(user: Address, timestamp: u64, block: u64) -> Log {
        let ev = CommitCleared {
            user,
            timestamp: U256::from(timestamp),
        };
        log_from(ev.encode_log_data(), block, 1)
    }

    async fn collector_for(
        node: TestNode,
        deployment_block: Option<u64>,
    ) -> (Arc<TestNode>, EventCollector) {
        let (node, url) = match node.spawn().await {
            Ok(spawned) => spawned,
            Err(e) => panic!("test node failed to start: {e}"),
        };
        let config = ChainConfig {
            rpc_url: url,
            contract_address: CONTRACT,
            deployment_block,
            log_chunk_size: 10,
            ..ChainConfig::default()
        };
        match connect(&config) {
            Ok(provider) => (node, EventCollector::new(provider, &config)),
            Err(e) => panic!("connect failed: {e}"),
        }
    }

    #[test]
    fn decodes_commit_set() {
        let user = Address::repeat_byte(0xa1);
        let log = set_log(user, "ship it", 1_773_500_000, 42);
        match decode_log(&log) {
            Ok(Some(DecodedEvent::Commit(ev))) => {
                assert_eq!(ev.user, user);
                assert_eq!(ev.message, "ship it");
                assert_eq!(ev.timestamp, 1_773_500_000);
                assert_eq!(ev.position, ChainPosition::new(42, 0));
                assert_eq!(ev.tx_hash, B256::repeat_byte(0xcc));
            }
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn decodes_commit_cleared() {
        let user = Address::repeat_byte(0xb0);
        let log = clear_log(user, 1_773_500_100, 43);
        match decode_log(&log) {
            Ok(Some(DecodedEvent::Clear(ev))) => {
                assert_eq!(ev.user, user);
                assert_eq!(ev.timestamp, 1_773_500_100);
                assert_eq!(ev.position, ChainPosition::new(43, 1));
            }
            other => panic!("expected clear, got {other:?}"),
        }
    }

    #[test]
    fn skips_pending_removed_and_unknown_logs() {
        let user = Address::repeat_byte(0xa1);

        let mut pending = set_log(user, "x", 1, 1);
        pending.block_number = None;
        assert!(matches!(decode_log(&pending), Ok(None)));

        let mut removed = set_log(user, "x", 1, 1);
        removed.removed = true;
        assert!(matches!(decode_log(&removed), Ok(None)));

        let unknown = log_from(
            LogData::new_unchecked(vec![B256::repeat_byte(0x99)], Bytes::new()),
            1,
            0,
        );
        assert!(matches!(decode_log(&unknown), Ok(None)));
    }

    #[test]
    fn truncated_payload_is_an_abi_error() {
        let full = set_log(Address::repeat_byte(0xa1), "hello", 1, 1);
        let topics = full.topics().to_vec();
        let data: Bytes = full
            .data()
            .data
            .iter()
            .take(10)
            .copied()
            .collect::<Vec<u8>>()
            .into();
        let log = log_from(LogData::new_unchecked(topics, data), 1, 0);
        assert!(matches!(decode_log(&log), Err(ChainError::Abi { .. })));
    }

    #[test]
    fn huge_timestamp_saturates() {
        assert_eq!(timestamp_to_u64(U256::MAX), u64::MAX);
        assert_eq!(timestamp_to_u64(U256::from(7)), 7);
    }

    #[test]
    fn chunks_cover_range_exactly() {
        assert_eq!(block_chunks(0, 25, 10), vec![(0, 9), (10, 19), (20, 25)]);
        assert_eq!(block_chunks(5, 5, 10), vec![(5, 5)]);
        assert!(block_chunks(10, 5, 10).is_empty());
    }

    #[test]
    fn zero_chunk_size_still_progresses() {
        assert_eq!(block_chunks(0, 2, 0), vec![(0, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn chunks_stop_at_max_block() {
        let start = u64::MAX.saturating_sub(1);
        assert_eq!(block_chunks(start, u64::MAX, 10), vec![(start, u64::MAX)]);
    }

    #[tokio::test]
    async fn collect_spans_several_chunks() {
        let alice = Address::repeat_byte(0xa1);
        let bob = Address::repeat_byte(0xb0);
        let node = TestNode::new(8453);
        node.set_head(25);
        node.push_logs([
            set_log(alice, "first", 100, 3),
            set_log(bob, "second", 200, 14),
            clear_log(alice, 300, 22),
        ]);
        let (node, collector) = collector_for(node, Some(0)).await;

        let history = match collector.collect().await {
            Ok(history) => history,
            Err(e) => panic!("collect failed: {e}"),
        };
        assert_eq!(node.count("eth_getLogs"), 3);
        assert_eq!(history.latest_block, 25);
        assert_eq!(history.commits.len(), 2);
        assert_eq!(history.clears.len(), 1);
        assert_eq!(history.commits.first().map(|c| c.user), Some(alice));
        assert_eq!(history.commits.last().map(|c| c.message.as_str()), Some("second"));
    }

    #[tokio::test]
    async fn refresh_only_scans_new_blocks() {
        let alice = Address::repeat_byte(0xa1);
        let node = TestNode::new(8453);
        node.set_head(9);
        node.push_logs([set_log(alice, "early", 100, 4)]);
        let (node, collector) = collector_for(node, Some(0)).await;

        assert!(collector.collect().await.is_ok());
        assert_eq!(node.count("eth_getLogs"), 1);

        node.push_logs([set_log(alice, "late", 200, 12)]);
        node.set_head(15);
        let history = match collector.collect().await {
            Ok(history) => history,
            Err(e) => panic!("collect failed: {e}"),
        };
        assert_eq!(node.count("eth_getLogs"), 2);
        let messages: Vec<&str> = history.commits.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["early", "late"]);
        assert_eq!(history.latest_block, 15);

        // Head unchanged: nothing left to scan, cached history still returned.
        let again = collector.collect().await.ok();
        assert_eq!(node.count("eth_getLogs"), 2);
        assert_eq!(again.map(|h| h.commits.len()), Some(2));
    }

    #[tokio::test]
    async fn locates_deployment_block_when_unset() {
        let node = TestNode::new(8453);
        node.set_head(1_000);
        node.set_deployed_at(637);
        let (node, collector) = collector_for(node, None).await;

        let found = find_deployment_block(&collector.provider, CONTRACT, 1_000).await;
        assert_eq!(found.ok(), Some(637));

        assert!(collector.collect().await.is_ok());
        // 637..=1000 in chunks of ten.
        assert_eq!(node.count("eth_getLogs"), 37);
    }

    #[tokio::test]
    async fn missing_contract_code_is_reported() {
        let node = TestNode::new(8453);
        node.set_head(50);
        node.set_deployed_at(u64::MAX);
        let (_node, collector) = collector_for(node, None).await;

        assert!(matches!(
            collector.collect().await,
            Err(ChainError::NotDeployed { head: 50, .. })
        ));
    }
}
