//! Refresh sink that updates the Observer API state.
//!
//! After each refresh the poller hands its [`LedgerView`] here. The view
//! replaces the observer's copy and a [`FeedBroadcast`] goes out to all
//! connected `WebSocket` clients.
//!
//! [`FeedBroadcast`]: commitboard_observer::FeedBroadcast

use std::sync::Arc;

use commitboard_core::poller::RefreshSink;
use commitboard_observer::AppState;
use commitboard_types::LedgerView;
use tracing::debug;

/// Sink that bridges the poller to the Observer API.
pub struct ObserverSink {
    state: Arc<AppState>,
}

impl ObserverSink {
    /// Create a new sink backed by the given app state.
    pub const fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl RefreshSink for ObserverSink {
    async fn publish(&self, view: LedgerView) {
        let latest_block = view.latest_block;
        let live = view.feed.len();
        let receivers = self.state.publish_view(view).await;
        debug!(latest_block, live, receivers, "Feed broadcast sent");
    }
}
