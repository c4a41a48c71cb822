//! Leaderboard ranking.
//!
//! Score is `streak * 10 + commits`. Ranking uses a stable sort, so
//! addresses with equal scores keep the order in which they first appear
//! in the history.

use chrono::{DateTime, TimeZone};
use commitboard_types::{CommitEvent, LeaderboardEntry, UserStats};

use crate::stats::group_by_user;

/// Weight of one streak day relative to one commit.
pub const STREAK_WEIGHT: u64 = 10;

/// Default number of leaderboard rows.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 5;

/// Ranking score for a set of stats.
pub fn score(stats: UserStats) -> u64 {
    u64::from(stats.streak)
        .saturating_mul(STREAK_WEIGHT)
        .saturating_add(u64::from(stats.total_commits))
}

/// Rank every address in the history, best first.
pub fn rank<Tz: TimeZone>(commits: &[CommitEvent], now: &DateTime<Tz>) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = group_by_user(commits)
        .into_iter()
        .map(|history| {
            let stats = history.stats(now);
            LeaderboardEntry {
                address: history.address,
                commits: stats.total_commits,
                streak: stats.streak,
                score: score(stats),
            }
        })
        .collect();
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries
}

/// The top `limit` addresses.
pub fn leaderboard<Tz: TimeZone>(
    commits: &[CommitEvent],
    now: &DateTime<Tz>,
    limit: usize,
) -> Vec<LeaderboardEntry> {
    let mut entries = rank(commits, now);
    entries.truncate(limit);
    entries
}
