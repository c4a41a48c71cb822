//! Commit history replay for the Commitboard indexer.
//!
//! The contract stores only the current commit for each address. Everything
//! with a time dimension (the live feed, daily streaks, lifetime counts,
//! badges, leaderboard) is derived here by replaying raw event logs.
//!
//! All functions are pure and stateless: they take event slices and a
//! reference time and return fresh values. Nothing is patched in place.
//!
//! # Modules
//!
//! - [`reconcile`] -- clear resolution and live-commit projection
//! - [`streak`] -- consecutive-day streak counting
//! - [`stats`] -- per-address grouping and counters
//! - [`achievements`] -- badge thresholds
//! - [`leaderboard`] -- scoring and stable ranking
//! - [`replay`] -- one-call rebuild of the full [`LedgerView`]
//!
//! [`LedgerView`]: commitboard_types::LedgerView

pub mod achievements;
pub mod leaderboard;
pub mod reconcile;
pub mod replay;
pub mod stats;
pub mod streak;

pub use achievements::achievements;
pub use leaderboard::{DEFAULT_LEADERBOARD_LIMIT, leaderboard, rank, score};
pub use reconcile::{project, reconcile, resolve_clears};
pub use replay::replay;
pub use stats::{UserHistory, all_stats, group_by_user, user_stats};
pub use streak::{calculate_streak, calendar_date};
