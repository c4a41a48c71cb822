//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// CORS allows any origin so a dashboard served elsewhere can read the
/// API.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/feed", get(ws::ws_feed))
        // REST API
        .route("/api/feed", get(handlers::get_feed))
        .route("/api/leaderboard", get(handlers::get_leaderboard))
        .route("/api/puzzle", get(handlers::get_puzzle))
        .route("/api/users/{address}", get(handlers::get_user))
        .route(
            "/api/users/{address}/commit",
            get(handlers::get_onchain_commit)
                .post(handlers::set_commit)
                .delete(handlers::clear_commit),
        )
        .route("/api/users/{address}/status", get(handlers::get_status))
        .route("/api/users/{address}/puzzle", post(handlers::answer_puzzle))
        .route("/api/suggest", post(handlers::suggest_commit))
        .route("/api/suggest/improve", post(handlers::improve_commit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
