//! Commit reconciliation: which commits are still live.
//!
//! The contract only stores the current commit per address, so the live
//! feed is rebuilt by replaying every `CommitSet` and `CommitCleared` log.
//!
//! Two passes:
//!
//! 1. **Clear resolution** -- a commit is superseded when its author
//!    cleared at any later chain position. A clear in a later block always
//!    carries a later or equal timestamp; ordering by position also catches
//!    a clear that lands after the set inside the same block, where the
//!    timestamps are equal.
//! 2. **Projection** -- surviving commits collapse to one per address.
//!    Last write wins by timestamp, ties go to the later chain position.
//!
//! The result is sorted newest first for presentation.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use alloy_primitives::Address;
use commitboard_types::{ChainPosition, ClearEvent, CommitEvent, LiveCommit};

/// Latest clear position per address.
fn latest_clears(clears: &[ClearEvent]) -> BTreeMap<Address, ChainPosition> {
    let mut latest: BTreeMap<Address, ChainPosition> = BTreeMap::new();
    for clear in clears {
        latest
            .entry(clear.user)
            .and_modify(|pos| {
                if clear.position > *pos {
                    *pos = clear.position;
                }
            })
            .or_insert(clear.position);
    }
    latest
}

/// Return the commits not superseded by a later clear from the same user,
/// in chain order.
pub fn resolve_clears<'a>(
    commits: &'a [CommitEvent],
    clears: &[ClearEvent],
) -> Vec<&'a CommitEvent> {
    let latest = latest_clears(clears);
    let mut surviving: Vec<&CommitEvent> = commits
        .iter()
        .filter(|commit| {
            latest
                .get(&commit.user)
                .is_none_or(|cleared_at| *cleared_at < commit.position)
        })
        .collect();
    surviving.sort_by_key(|commit| commit.position);
    surviving
}

/// Collapse surviving commits (in chain order) to one per address.
///
/// Output is sorted by timestamp descending, then by chain position
/// descending.
pub fn project(surviving: &[&CommitEvent]) -> Vec<LiveCommit> {
    let mut current: BTreeMap<Address, &CommitEvent> = BTreeMap::new();
    for &commit in surviving {
        match current.entry(commit.user) {
            Entry::Vacant(slot) => {
                slot.insert(commit);
            }
            Entry::Occupied(mut slot) => {
                if commit.timestamp >= slot.get().timestamp {
                    slot.insert(commit);
                }
            }
        }
    }

    let mut feed: Vec<LiveCommit> = current.values().map(|c| LiveCommit::from(*c)).collect();
    feed.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| b.position.cmp(&a.position))
    });
    feed
}

/// Build the live feed from raw events.
///
/// At most one [`LiveCommit`] per address; an address has one iff its most
/// recent action was a set.
pub fn reconcile(commits: &[CommitEvent], clears: &[ClearEvent]) -> Vec<LiveCommit> {
    let surviving = resolve_clears(commits, clears);
    project(&surviving)
}
