//! `WebSocket` feed of published views.
//!
//! Clients connect to `GET /ws/feed`. Once a view has been published, the
//! first frame is a [`FeedBroadcast`] of the current view, so a dashboard
//! can render without a separate REST call. After that, one frame follows
//! each refresh.
//!
//! Every frame is a complete snapshot. A client that lags behind the
//! broadcast channel is sent the current view instead of the missed
//! frames, and frames no newer than the last one sent are dropped.
//!
//! [`FeedBroadcast`]: crate::state::FeedBroadcast

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::{AppState, FeedBroadcast};

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming views.
///
/// # Route
///
/// `GET /ws/feed`
pub async fn ws_feed(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Snapshot of the published view, or `None` before the first refresh.
pub async fn current_snapshot(state: &AppState) -> Option<FeedBroadcast> {
    let view = state.view.read().await;
    view.computed_at.map(|_| FeedBroadcast::from(&*view))
}

/// Per-connection sender that never goes backwards in time.
#[derive(Debug, Default)]
struct FeedCursor {
    last_sent: Option<DateTime<Utc>>,
}

impl FeedCursor {
    /// Whether `frame` is newer than anything sent so far.
    fn is_fresh(&self, frame: &FeedBroadcast) -> bool {
        match (self.last_sent, frame.computed_at) {
            (Some(sent), Some(at)) => at > sent,
            (None, _) => true,
            (Some(_), None) => false,
        }
    }

    /// Send `frame` if it is fresh. Returns `false` once the socket is
    /// gone.
    async fn send(&mut self, socket: &mut WebSocket, frame: &FeedBroadcast) -> bool {
        if !self.is_fresh(frame) {
            debug!(latest_block = frame.latest_block, "Skipping stale feed frame");
            return true;
        }
        let json = match serde_json::to_string(frame) {
            Ok(j) => j,
            Err(e) => {
                warn!("Failed to serialize feed broadcast: {e}");
                return true;
            }
        };
        if socket.send(Message::Text(json.into())).await.is_err() {
            debug!("WebSocket client disconnected (send failed)");
            return false;
        }
        self.last_sent = frame.computed_at;
        true
    }
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    // Subscribe before taking the snapshot so no refresh falls in between.
    let mut rx = state.subscribe();
    let mut cursor = FeedCursor::default();

    let open = match current_snapshot(&state).await {
        Some(snapshot) => cursor.send(&mut socket, &snapshot).await,
        None => true,
    };
    if !open {
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                let frame = match result {
                    Ok(frame) => Some(frame),
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, resending current view");
                        current_snapshot(&state).await
                    }
                    Err(RecvError::Closed) => {
                        debug!("Broadcast channel closed, shutting down WebSocket");
                        return;
                    }
                };
                let open = match frame {
                    Some(frame) => cursor.send(&mut socket, &frame).await,
                    None => true,
                };
                if !open {
                    return;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use commitboard_types::LedgerView;

    use super::*;

    fn frame_at(secs: i64, latest_block: u64) -> FeedBroadcast {
        FeedBroadcast::from(&LedgerView {
            computed_at: DateTime::<Utc>::from_timestamp(secs, 0),
            latest_block,
            ..LedgerView::default()
        })
    }

    #[tokio::test]
    async fn no_snapshot_before_first_refresh() {
        let state = AppState::default();
        assert!(current_snapshot(&state).await.is_none());
    }

    #[tokio::test]
    async fn snapshot_mirrors_published_view() {
        let state = AppState::default();
        let view = LedgerView {
            computed_at: DateTime::<Utc>::from_timestamp(1_773_500_000, 0),
            latest_block: 42,
            ..LedgerView::default()
        };
        state.publish_view(view).await;

        let snapshot = current_snapshot(&state).await;
        assert_eq!(snapshot.map(|s| s.latest_block), Some(42));
    }

    #[test]
    fn cursor_only_moves_forward() {
        let mut cursor = FeedCursor::default();
        assert!(cursor.is_fresh(&frame_at(100, 1)));

        cursor.last_sent = frame_at(100, 1).computed_at;
        assert!(!cursor.is_fresh(&frame_at(100, 1)));
        assert!(!cursor.is_fresh(&frame_at(90, 0)));
        assert!(cursor.is_fresh(&frame_at(101, 2)));
    }
}
