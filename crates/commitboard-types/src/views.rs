//! Derived views computed from the event history.
//!
//! None of these are persisted. Every refresh rebuilds them from scratch
//! and replaces the previous set wholesale.

use std::collections::BTreeMap;

use alloy_primitives::{Address, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Badge;
use crate::events::{ChainPosition, CommitEvent};

/// The current commit for one address.
///
/// Exists iff the address's most recent contract action was `setCommit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LiveCommit {
    /// The committing address.
    #[ts(as = "String")]
    pub user: Address,
    /// The commitment text.
    pub message: String,
    /// Contract-reported unix timestamp in seconds.
    #[ts(type = "number")]
    pub timestamp: u64,
    /// Where the originating `CommitSet` log sits in the chain.
    pub position: ChainPosition,
    /// Hash of the originating transaction.
    #[ts(as = "String")]
    pub tx_hash: B256,
}

impl From<&CommitEvent> for LiveCommit {
    fn from(event: &CommitEvent) -> Self {
        Self {
            user: event.user,
            message: event.message.clone(),
            timestamp: event.timestamp,
            position: event.position,
            tx_hash: event.tx_hash,
        }
    }
}

/// Per-address counters derived from the full `CommitSet` history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UserStats {
    /// Consecutive calendar days with a commit, counted back from today.
    pub streak: u32,
    /// Number of `CommitSet` events ever emitted by the address.
    pub total_commits: u32,
}

/// One row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LeaderboardEntry {
    /// The ranked address.
    #[ts(as = "String")]
    pub address: Address,
    /// Total commits for the address.
    pub commits: u32,
    /// Current streak for the address.
    pub streak: u32,
    /// Ranking score: `streak * 10 + commits`.
    #[ts(type = "number")]
    pub score: u64,
}

/// The value `getCommit(address)` returns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OnChainCommit {
    /// Stored message (empty when cleared or never set).
    pub message: String,
    /// Unix timestamp of the last update (zero when never set).
    #[ts(type = "number")]
    pub updated_at: u64,
}

/// Everything the dashboard needs to render one user's panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UserProfile {
    /// The address the profile describes.
    #[ts(as = "String")]
    pub address: Address,
    /// Streak and commit count.
    pub stats: UserStats,
    /// Earned badges in display order.
    pub badges: Vec<Badge>,
    /// Whether today's puzzle is solved for this address.
    pub puzzle_solved: bool,
    /// The address's entry in the live feed, if any.
    pub live_commit: Option<LiveCommit>,
}

/// The full projection produced by one refresh.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerView {
    /// Live commits, newest first.
    pub feed: Vec<LiveCommit>,
    /// Top addresses by score.
    pub leaderboard: Vec<LeaderboardEntry>,
    /// Stats for every address that ever committed.
    pub stats: BTreeMap<Address, UserStats>,
    /// Head block the underlying history was read up to.
    pub latest_block: u64,
    /// When the view was computed.
    pub computed_at: Option<DateTime<Utc>>,
}

impl LedgerView {
    /// Stats for an address, zeroed if it never committed.
    pub fn stats_for(&self, address: &Address) -> UserStats {
        self.stats.get(address).copied().unwrap_or_default()
    }

    /// The live commit for an address, if it has one.
    pub fn live_commit_for(&self, address: &Address) -> Option<&LiveCommit> {
        self.feed.iter().find(|c| &c.user == address)
    }
}

/// Format an address as `0x1234...abcd` for compact display.
pub fn short_address(address: &Address) -> String {
    let full = format!("{address:#x}");
    let head = full.get(..6).unwrap_or(&full);
    let tail = full.get(full.len().saturating_sub(4)..).unwrap_or_default();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_address_keeps_prefix_and_suffix() {
        let address = Address::repeat_byte(0xab);
        assert_eq!(short_address(&address), "0xabab...abab");
    }

    #[test]
    fn stats_for_unknown_address_is_zero() {
        let view = LedgerView::default();
        assert_eq!(view.stats_for(&Address::ZERO), UserStats::default());
        assert!(view.live_commit_for(&Address::ZERO).is_none());
    }

    #[test]
    fn live_commit_copies_event_fields() {
        let event = CommitEvent {
            user: Address::repeat_byte(0x01),
            message: "gm".to_owned(),
            timestamp: 42,
            position: ChainPosition::new(7, 2),
            tx_hash: B256::repeat_byte(0x02),
        };
        let live = LiveCommit::from(&event);
        assert_eq!(live.user, event.user);
        assert_eq!(live.message, "gm");
        assert_eq!(live.position, ChainPosition::new(7, 2));
    }

    #[test]
    fn u64_fields_are_numbers_in_bindings() {
        assert!(LiveCommit::decl().contains("timestamp: number"));
        assert!(LeaderboardEntry::decl().contains("score: number"));
        assert!(OnChainCommit::decl().contains("updated_at: number"));
    }
}
