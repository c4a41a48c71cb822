//! Calendar clock for day boundaries.
//!
//! Streak days and the daily puzzle both depend on "today", which depends
//! on a time zone. The clock pins that zone to a fixed UTC offset from
//! configuration so every derivation in one process agrees on where a day
//! starts.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc};

use crate::config::CalendarConfig;

/// Errors that can occur when building a clock.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// The configured offset is not a valid UTC offset.
    #[error("invalid UTC offset: {minutes} minutes")]
    InvalidOffset {
        /// The rejected offset.
        minutes: i32,
    },
}

/// Wall clock in a fixed calendar zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarClock {
    offset: FixedOffset,
}

impl CalendarClock {
    /// Create a clock from calendar configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidOffset`] if the offset is a full day
    /// or more.
    pub fn new(config: &CalendarConfig) -> Result<Self, ClockError> {
        let minutes = config.utc_offset_minutes;
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
            .ok_or(ClockError::InvalidOffset { minutes })
    }

    /// A clock on UTC.
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// The configured offset.
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current time in the calendar zone.
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.at(Utc::now())
    }

    /// Convert an instant into the calendar zone.
    pub fn at(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset)
    }

    /// Today's date in the calendar zone.
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Index into a puzzle rotation for a date.
///
/// Uses the 1-based day of the year modulo the rotation length. Returns
/// `None` for an empty rotation.
pub fn puzzle_day_index(date: NaiveDate, rotation_len: usize) -> Option<usize> {
    let day_of_year = usize::try_from(date.ordinal()).ok()?;
    day_of_year.checked_rem(rotation_len)
}
