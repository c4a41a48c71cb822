//! Daily puzzle rotation and per-address solved flags.
//!
//! The puzzle of the day is picked from a configured rotation by day of
//! year. Solving it sets a `puzzle_<dayIndex>` flag for the solver, which
//! only feeds the puzzle badge. Flags belong to the calendar day they were
//! set on and are dropped when the day rolls over.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use chrono::NaiveDate;
use serde::Serialize;

use crate::clock::puzzle_day_index;
use crate::config::PuzzleConfig;

/// The public face of today's puzzle. The answer is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyPuzzle {
    /// Position in the rotation.
    pub day_index: usize,
    /// The riddle.
    pub question: String,
    /// Hint text.
    pub hint: String,
}

/// Storage key for a day's solved flag.
pub fn flag_key(day_index: usize) -> String {
    format!("puzzle_{day_index}")
}

/// Normalize a submitted answer for comparison.
fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// The configured puzzle rotation.
#[derive(Debug, Clone, Default)]
pub struct PuzzleBook {
    puzzles: Vec<PuzzleConfig>,
}

impl PuzzleBook {
    /// Build a book from configured puzzles.
    pub const fn new(puzzles: Vec<PuzzleConfig>) -> Self {
        Self { puzzles }
    }

    /// Whether any puzzle is configured.
    pub const fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    /// Rotation index for a date, if the book is not empty.
    pub fn day_index(&self, date: NaiveDate) -> Option<usize> {
        puzzle_day_index(date, self.puzzles.len())
    }

    fn entry(&self, date: NaiveDate) -> Option<(usize, &PuzzleConfig)> {
        let index = self.day_index(date)?;
        self.puzzles.get(index).map(|p| (index, p))
    }

    /// The puzzle for a date.
    pub fn puzzle_for(&self, date: NaiveDate) -> Option<DailyPuzzle> {
        self.entry(date).map(|(day_index, puzzle)| DailyPuzzle {
            day_index,
            question: puzzle.question.clone(),
            hint: puzzle.hint.clone(),
        })
    }

    /// Check an answer against the puzzle for a date.
    ///
    /// A submission is accepted when, trimmed and lower-cased, it equals
    /// or contains the expected answer. Returns `None` if no puzzle is
    /// configured.
    pub fn check(&self, date: NaiveDate, answer: &str) -> Option<bool> {
        let (_, puzzle) = self.entry(date)?;
        let expected = normalize(&puzzle.answer);
        let given = normalize(answer);
        Some(!given.is_empty() && given.contains(&expected))
    }
}

/// Solved flags for the current calendar day.
#[derive(Debug, Clone, Default)]
pub struct PuzzleFlags {
    date: Option<NaiveDate>,
    flags: BTreeMap<Address, BTreeMap<String, String>>,
}

impl PuzzleFlags {
    /// Create an empty flag store.
    pub const fn new() -> Self {
        Self {
            date: None,
            flags: BTreeMap::new(),
        }
    }

    /// Drop yesterday's flags when the day changes.
    fn roll_to(&mut self, date: NaiveDate) {
        if self.date != Some(date) {
            self.flags.clear();
            self.date = Some(date);
        }
    }

    /// Record that `address` solved the puzzle with `day_index` on `date`.
    pub fn mark_solved(&mut self, address: Address, date: NaiveDate, day_index: usize) {
        self.roll_to(date);
        self.flags
            .entry(address)
            .or_default()
            .insert(flag_key(day_index), "true".to_owned());
    }

    /// Whether `address` has solved the puzzle with `day_index` on `date`.
    pub fn is_solved(&self, address: &Address, date: NaiveDate, day_index: usize) -> bool {
        self.date == Some(date)
            && self
                .flags
                .get(address)
                .and_then(|f| f.get(&flag_key(day_index)))
                .is_some_and(|v| v == "true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> PuzzleBook {
        PuzzleBook::new(vec![
            PuzzleConfig {
                question: "What has keys but no locks?".to_owned(),
                answer: "keyboard".to_owned(),
                hint: "You're using one right now...".to_owned(),
            },
            PuzzleConfig {
                question: "What gets wetter the more it dries?".to_owned(),
                answer: "Towel".to_owned(),
                hint: "Think about bathrooms...".to_owned(),
            },
        ])
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap_or_default()
    }

    #[test]
    fn puzzle_rotates_through_book() {
        let book = book();
        // Jan 1 is ordinal 1 -> index 1; Jan 2 is ordinal 2 -> index 0.
        assert_eq!(book.puzzle_for(date(1, 1)).map(|p| p.day_index), Some(1));
        assert_eq!(book.puzzle_for(date(1, 2)).map(|p| p.day_index), Some(0));
    }

    #[test]
    fn answers_are_case_and_space_insensitive() {
        let book = book();
        assert_eq!(book.check(date(1, 1), "  TOWEL "), Some(true));
        assert_eq!(book.check(date(1, 1), "a towel"), Some(true));
        assert_eq!(book.check(date(1, 1), "sponge"), Some(false));
        assert_eq!(book.check(date(1, 1), "   "), Some(false));
    }

    #[test]
    fn empty_book_has_no_puzzle() {
        let book = PuzzleBook::default();
        assert!(book.is_empty());
        assert!(book.puzzle_for(date(3, 3)).is_none());
        assert!(book.check(date(3, 3), "anything").is_none());
    }

    #[test]
    fn flags_are_per_address_and_per_day() {
        let mut flags = PuzzleFlags::new();
        let alice = Address::repeat_byte(0xa1);
        let bob = Address::repeat_byte(0xb0);

        flags.mark_solved(alice, date(2, 1), 4);
        assert!(flags.is_solved(&alice, date(2, 1), 4));
        assert!(!flags.is_solved(&bob, date(2, 1), 4));
        assert!(!flags.is_solved(&alice, date(2, 1), 5));

        // Next day: stale flags are gone.
        assert!(!flags.is_solved(&alice, date(2, 2), 4));
        flags.mark_solved(bob, date(2, 2), 5);
        assert!(!flags.is_solved(&alice, date(2, 1), 4));
        assert!(flags.is_solved(&bob, date(2, 2), 5));
    }

    #[test]
    fn flag_key_format() {
        assert_eq!(flag_key(3), "puzzle_3");
    }
}
