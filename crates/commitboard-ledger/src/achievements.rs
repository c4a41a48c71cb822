//! Badge derivation.
//!
//! Badges are a pure function of a user's streak, total commit count, and
//! whether they solved today's puzzle. Thresholds only ever compare with
//! `>=`, so a badge earned at a lower count stays earned at a higher one.

use commitboard_types::Badge;

/// Total commits needed for [`Badge::FirstCommit`].
pub const FIRST_COMMIT_THRESHOLD: u32 = 1;
/// Streak needed for [`Badge::ThreeDayStreak`].
pub const THREE_DAY_STREAK_THRESHOLD: u32 = 3;
/// Streak needed for [`Badge::WeekWarrior`].
pub const WEEK_STREAK_THRESHOLD: u32 = 7;
/// Streak needed for [`Badge::MonthMaster`].
pub const MONTH_STREAK_THRESHOLD: u32 = 30;
/// Total commits needed for [`Badge::CommittedBuilder`].
pub const PROLIFIC_THRESHOLD: u32 = 10;

/// Whether a single badge is earned.
pub const fn is_earned(badge: Badge, streak: u32, total_commits: u32, puzzle_solved: bool) -> bool {
    match badge {
        Badge::FirstCommit => total_commits >= FIRST_COMMIT_THRESHOLD,
        Badge::ThreeDayStreak => streak >= THREE_DAY_STREAK_THRESHOLD,
        Badge::WeekWarrior => streak >= WEEK_STREAK_THRESHOLD,
        Badge::MonthMaster => streak >= MONTH_STREAK_THRESHOLD,
        Badge::CommittedBuilder => total_commits >= PROLIFIC_THRESHOLD,
        Badge::PuzzleSolver => puzzle_solved,
    }
}

/// All earned badges, in display order.
pub fn achievements(streak: u32, total_commits: u32, puzzle_solved: bool) -> Vec<Badge> {
    Badge::ALL
        .into_iter()
        .filter(|badge| is_earned(*badge, streak, total_commits, puzzle_solved))
        .collect()
}
