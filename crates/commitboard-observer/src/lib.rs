//! Observer API server for the Commitboard indexer.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/feed`) streaming a summary after every
//!   published refresh via [`tokio::sync::broadcast`]
//! - **REST endpoints** for the live feed, leaderboard, builder profiles,
//!   and the daily puzzle
//! - **Transaction endpoints** that submit `setCommit` / `clearCommit` and
//!   report progress as short-lived status
//! - **Minimal HTML dashboard** (`GET /`)
//!
//! # Architecture
//!
//! The observer reads from an in-memory [`LedgerView`] that the poller
//! replaces wholesale on each refresh. Handlers never derive anything from
//! chain data themselves; badges are the one exception, since they depend
//! on the per-request puzzle flag.
//!
//! [`LedgerView`]: commitboard_types::LedgerView

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod status;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{StartupError, spawn_observer};
pub use state::{AppState, FeedBroadcast};
