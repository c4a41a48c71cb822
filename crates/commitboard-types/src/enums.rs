//! Enumeration types for badges and transaction status.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Badges
// ---------------------------------------------------------------------------

/// An achievement derived from a user's streak, commit count, and puzzle flag.
///
/// Variants are declared in display order. Badges are never stored; they are
/// recomputed from stats on every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Badge {
    /// At least one commit ever.
    FirstCommit,
    /// Streak of three days or more.
    ThreeDayStreak,
    /// Streak of seven days or more.
    WeekWarrior,
    /// Streak of thirty days or more.
    MonthMaster,
    /// Ten or more commits in total.
    CommittedBuilder,
    /// Solved today's puzzle.
    PuzzleSolver,
}

impl Badge {
    /// All badges in display order.
    pub const ALL: [Self; 6] = [
        Self::FirstCommit,
        Self::ThreeDayStreak,
        Self::WeekWarrior,
        Self::MonthMaster,
        Self::CommittedBuilder,
        Self::PuzzleSolver,
    ];

    /// Human-readable badge name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstCommit => "First Commit",
            Self::ThreeDayStreak => "3-Day Streak",
            Self::WeekWarrior => "Week Warrior",
            Self::MonthMaster => "Month Master",
            Self::CommittedBuilder => "Committed Builder",
            Self::PuzzleSolver => "Puzzle Solver",
        }
    }

    /// Emoji shown next to the badge name.
    pub const fn icon(self) -> &'static str {
        match self {
            Self::FirstCommit => "\u{1f3af}",
            Self::ThreeDayStreak => "\u{1f525}",
            Self::WeekWarrior => "\u{26a1}",
            Self::MonthMaster => "\u{1f451}",
            Self::CommittedBuilder => "\u{1f3d7}\u{fe0f}",
            Self::PuzzleSolver => "\u{1f9e9}",
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction status
// ---------------------------------------------------------------------------

/// Progress of a user-submitted contract transaction.
///
/// `Sending` and `Confirming` persist until replaced. `Success` and `Error`
/// are terminal and expire after a short display window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "state", content = "detail")]
pub enum TxStatus {
    /// Transaction handed to the wallet provider.
    Sending,
    /// Transaction accepted, waiting for a receipt.
    Confirming,
    /// Receipt received with a success status.
    Success,
    /// Submission, confirmation, or execution failed.
    Error(String),
}

impl TxStatus {
    /// Whether this status ends the transaction flow.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error(_))
    }

    /// Short status line for display.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Sending => "\u{23f3} Sending...",
            Self::Confirming => "\u{23f3} Confirming...",
            Self::Success => "\u{2705} Success!",
            Self::Error(_) => "\u{274c} Error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_names_are_unique() {
        let mut names: Vec<_> = Badge::ALL.iter().map(|b| b.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Badge::ALL.len());
    }

    #[test]
    fn only_success_and_error_are_terminal() {
        assert!(!TxStatus::Sending.is_terminal());
        assert!(!TxStatus::Confirming.is_terminal());
        assert!(TxStatus::Success.is_terminal());
        assert!(TxStatus::Error("reverted".to_owned()).is_terminal());
    }

    #[test]
    fn tx_status_serializes_tagged() {
        let json = serde_json::to_value(TxStatus::Error("rejected".to_owned()))
            .unwrap_or_default();
        assert_eq!(json["state"], "Error");
        assert_eq!(json["detail"], "rejected");
    }
}
