//! Shared type definitions for the Commitboard indexer.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries and reach the dashboard. Types flow downstream to `TypeScript`
//! via `ts-rs`.
//!
//! # Modules
//!
//! - [`events`] -- Raw `CommitSet` / `CommitCleared` events and chain positions
//! - [`enums`] -- Badges and transaction status
//! - [`views`] -- Derived projections (live feed, stats, leaderboard)

pub mod enums;
pub mod events;
pub mod views;

// Re-export all public types at crate root for convenience.
pub use alloy_primitives::{Address, B256};
pub use enums::{Badge, TxStatus};
pub use events::{ChainPosition, ClearEvent, CommitEvent, CommitHistory};
pub use views::{
    LeaderboardEntry, LedgerView, LiveCommit, OnChainCommit, UserProfile, UserStats,
    short_address,
};
