//! Full replay: raw history in, complete [`LedgerView`] out.

use chrono::{DateTime, TimeZone, Utc};
use commitboard_types::{CommitHistory, LedgerView};
use tracing::debug;

use crate::leaderboard::leaderboard;
use crate::reconcile::reconcile;
use crate::stats::all_stats;

/// Rebuild every derived view from a collected history.
///
/// Pure apart from the debug log: the same history and `now` always give
/// the same view.
pub fn replay<Tz: TimeZone>(
    history: &CommitHistory,
    now: &DateTime<Tz>,
    leaderboard_limit: usize,
) -> LedgerView {
    let feed = reconcile(&history.commits, &history.clears);
    let stats = all_stats(&history.commits, now);
    let board = leaderboard(&history.commits, now, leaderboard_limit);

    debug!(
        commits = history.commits.len(),
        clears = history.clears.len(),
        live = feed.len(),
        builders = stats.len(),
        latest_block = history.latest_block,
        "history replayed"
    );

    LedgerView {
        feed,
        leaderboard: board,
        stats,
        latest_block: history.latest_block,
        computed_at: Some(now.with_timezone(&Utc)),
    }
}
