//! Per-address statistics over the full `CommitSet` history.
//!
//! Stats count every commit an address ever published, including ones it
//! later replaced or cleared. Clearing removes a commit from the live feed,
//! not from the builder's record.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use chrono::{DateTime, TimeZone};
use commitboard_types::{CommitEvent, UserStats};

use crate::streak::calculate_streak;

/// Commit timestamps for one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserHistory {
    /// The address.
    pub address: Address,
    /// Timestamps of every commit by the address, in input order.
    pub timestamps: Vec<u64>,
}

impl UserHistory {
    /// Number of commits, saturating at `u32::MAX`.
    pub fn commit_count(&self) -> u32 {
        u32::try_from(self.timestamps.len()).unwrap_or(u32::MAX)
    }

    /// Streak and count for this address as of `now`.
    pub fn stats<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> UserStats {
        UserStats {
            streak: calculate_streak(self.timestamps.iter().copied(), now),
            total_commits: self.commit_count(),
        }
    }
}

/// Group commits by author, keeping the order in which authors first appear.
pub fn group_by_user(commits: &[CommitEvent]) -> Vec<UserHistory> {
    let mut slots: BTreeMap<Address, usize> = BTreeMap::new();
    let mut groups: Vec<UserHistory> = Vec::new();
    for commit in commits {
        let slot = *slots.entry(commit.user).or_insert_with(|| {
            groups.push(UserHistory {
                address: commit.user,
                timestamps: Vec::new(),
            });
            groups.len().saturating_sub(1)
        });
        if let Some(group) = groups.get_mut(slot) {
            group.timestamps.push(commit.timestamp);
        }
    }
    groups
}

/// Stats for one address.
///
/// An address that never committed gets zeroed stats.
pub fn user_stats<Tz: TimeZone>(
    commits: &[CommitEvent],
    address: &Address,
    now: &DateTime<Tz>,
) -> UserStats {
    let history = UserHistory {
        address: *address,
        timestamps: commits
            .iter()
            .filter(|c| &c.user == address)
            .map(|c| c.timestamp)
            .collect(),
    };
    history.stats(now)
}

/// Stats for every address that appears in the history.
pub fn all_stats<Tz: TimeZone>(
    commits: &[CommitEvent],
    now: &DateTime<Tz>,
) -> BTreeMap<Address, UserStats> {
    group_by_user(commits)
        .into_iter()
        .map(|history| (history.address, history.stats(now)))
        .collect()
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use chrono::Utc;
    use commitboard_types::ChainPosition;

    use super::*;

    fn commit(who: u8, timestamp: u64, block: u64) -> CommitEvent {
        CommitEvent {
            user: Address::repeat_byte(who),
            message: String::from("build"),
            timestamp,
            position: ChainPosition::new(block, 0),
            tx_hash: B256::ZERO,
        }
    }

    #[test]
    fn groups_keep_first_appearance_order() {
        let commits = vec![commit(3, 1, 1), commit(1, 2, 2), commit(3, 3, 3), commit(2, 4, 4)];
        let groups = group_by_user(&commits);
        let order: Vec<_> = groups.iter().map(|g| g.address).collect();
        assert_eq!(
            order,
            vec![
                Address::repeat_byte(3),
                Address::repeat_byte(1),
                Address::repeat_byte(2)
            ]
        );
        assert_eq!(groups.first().map(UserHistory::commit_count), Some(2));
    }

    #[test]
    fn user_stats_counts_full_history() {
        let now = DateTime::<Utc>::from_timestamp(1_773_597_600, 0).unwrap_or_default();
        let today = 1_773_597_000;
        let commits = vec![
            commit(1, today, 1),
            commit(1, today - 86_400, 2),
            commit(2, today, 3),
            commit(1, today - 10 * 86_400, 4),
        ];
        let stats = user_stats(&commits, &Address::repeat_byte(1), &now);
        assert_eq!(stats.total_commits, 3);
        assert_eq!(stats.streak, 2);
    }

    #[test]
    fn unknown_user_has_zero_stats() {
        let now = Utc::now();
        let stats = user_stats(&[], &Address::ZERO, &now);
        assert_eq!(stats, UserStats::default());
    }

    #[test]
    fn all_stats_covers_every_author() {
        let now = Utc::now();
        let commits = vec![commit(1, 1, 1), commit(2, 2, 2)];
        let stats = all_stats(&commits, &now);
        assert_eq!(stats.len(), 2);
        assert_eq!(
            stats.get(&Address::repeat_byte(2)).map(|s| s.total_commits),
            Some(1)
        );
    }
}
