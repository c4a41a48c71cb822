//! Shared application state for the Observer API server.
//!
//! [`AppState`] holds the broadcast channel for refresh summaries, the
//! most recently published [`LedgerView`], per-address transaction
//! status, and the daily puzzle. The poller replaces the view wholesale
//! on every refresh; handlers only ever read it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use commitboard_chain::CommitContract;
use commitboard_core::clock::CalendarClock;
use commitboard_core::puzzle::{PuzzleBook, PuzzleFlags};
use commitboard_types::{LeaderboardEntry, LedgerView, LiveCommit};
use tokio::sync::{Notify, RwLock, broadcast};

use crate::status::StatusBoard;

/// Capacity of the broadcast channel for refresh summaries.
///
/// If a subscriber falls behind by more than this many messages it will
/// receive a [`broadcast::error::RecvError::Lagged`] and skip to the
/// newest message.
const BROADCAST_CAPACITY: usize = 256;

/// Default display window for finished transaction status.
const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(3);

/// JSON-serializable summary pushed over the `WebSocket` after each
/// published refresh.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FeedBroadcast {
    /// Head block the view was built from.
    pub latest_block: u64,
    /// When the view was computed.
    pub computed_at: Option<DateTime<Utc>>,
    /// Number of addresses with at least one commit.
    pub builders: usize,
    /// Live commits, newest first.
    pub feed: Vec<LiveCommit>,
    /// Current leaderboard.
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl From<&LedgerView> for FeedBroadcast {
    fn from(view: &LedgerView) -> Self {
        Self {
            latest_block: view.latest_block,
            computed_at: view.computed_at,
            builders: view.stats.len(),
            feed: view.feed.clone(),
            leaderboard: view.leaderboard.clone(),
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender for refresh summaries.
    pub tx: broadcast::Sender<FeedBroadcast>,
    /// The latest published view.
    pub view: Arc<RwLock<LedgerView>>,
    /// Transient transaction status per address.
    pub statuses: Arc<RwLock<StatusBoard>>,
    /// Solved puzzle flags per address.
    pub puzzle_flags: Arc<RwLock<PuzzleFlags>>,
    /// Daily puzzle rotation.
    pub puzzles: Arc<PuzzleBook>,
    /// Calendar zone for "today".
    pub clock: CalendarClock,
    /// Contract handle for reads and transactions (absent when running
    /// without a chain connection).
    pub contract: Option<Arc<CommitContract>>,
    /// Requests an immediate history refresh.
    pub refresh: Arc<Notify>,
}

impl AppState {
    /// Create state with an empty view, no puzzles, and no contract.
    pub fn new(clock: CalendarClock) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            view: Arc::new(RwLock::new(LedgerView::default())),
            statuses: Arc::new(RwLock::new(StatusBoard::new(DEFAULT_STATUS_TTL))),
            puzzle_flags: Arc::new(RwLock::new(PuzzleFlags::new())),
            puzzles: Arc::new(PuzzleBook::default()),
            clock,
            contract: None,
            refresh: Arc::new(Notify::new()),
        }
    }

    /// Attach the daily puzzle rotation.
    #[must_use]
    pub fn with_puzzles(mut self, puzzles: PuzzleBook) -> Self {
        self.puzzles = Arc::new(puzzles);
        self
    }

    /// Attach a contract handle.
    #[must_use]
    pub fn with_contract(mut self, contract: Arc<CommitContract>) -> Self {
        self.contract = Some(contract);
        self
    }

    /// Share the poller's refresh trigger.
    #[must_use]
    pub fn with_refresh_trigger(mut self, refresh: Arc<Notify>) -> Self {
        self.refresh = refresh;
        self
    }

    /// Set how long finished transaction status stays visible.
    #[must_use]
    pub fn with_status_ttl(mut self, ttl: Duration) -> Self {
        self.statuses = Arc::new(RwLock::new(StatusBoard::new(ttl)));
        self
    }

    /// Subscribe to the refresh broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedBroadcast> {
        self.tx.subscribe()
    }

    /// Publish a summary to all connected clients.
    ///
    /// Returns the number of receivers that received the message.
    /// Returns 0 if no clients are connected (this is not an error).
    pub fn broadcast(&self, summary: &FeedBroadcast) -> usize {
        self.tx.send(summary.clone()).unwrap_or(0)
    }

    /// Replace the published view and notify `WebSocket` clients.
    ///
    /// Returns the number of receivers that got the broadcast.
    pub async fn publish_view(&self, view: LedgerView) -> usize {
        let summary = FeedBroadcast::from(&view);
        *self.view.write().await = view;
        self.statuses.write().await.prune();
        self.broadcast(&summary)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(CalendarClock::utc())
    }
}
