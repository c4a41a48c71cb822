//! Daily streak calculation.
//!
//! A streak is the number of consecutive calendar days, counted backward
//! from today, on which an address committed at least once. Days are taken
//! in the time zone of the supplied `now`, so the same history can yield
//! different streaks for viewers in different zones.
//!
//! The count must start today: an address whose latest commit was
//! yesterday has a streak of zero.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Calendar date of a unix timestamp in the given zone.
///
/// Returns `None` for timestamps chrono cannot represent.
pub fn calendar_date<Tz: TimeZone>(timestamp: u64, zone: &Tz) -> Option<NaiveDate> {
    let secs = i64::try_from(timestamp).ok()?;
    let utc = DateTime::<Utc>::from_timestamp(secs, 0)?;
    Some(utc.with_timezone(zone).date_naive())
}

/// Count consecutive commit days ending today.
///
/// Walks the commit dates newest first. A date whose offset from today
/// equals the current streak extends it; repeated commits on an
/// already-counted day are skipped; the first date beyond the expected
/// offset is a gap and ends the walk. Commits dated after today are
/// ignored.
pub fn calculate_streak<Tz, I>(timestamps: I, now: &DateTime<Tz>) -> u32
where
    Tz: TimeZone,
    I: IntoIterator<Item = u64>,
{
    let zone = now.timezone();
    let today = now.date_naive();

    let mut dates: Vec<NaiveDate> = timestamps
        .into_iter()
        .filter_map(|ts| calendar_date(ts, &zone))
        .collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));

    let mut streak: u32 = 0;
    for date in dates {
        let offset = today.signed_duration_since(date).num_days();
        let expected = i64::from(streak);
        if offset == expected {
            streak = streak.saturating_add(1);
        } else if offset > expected {
            break;
        }
    }
    streak
}
