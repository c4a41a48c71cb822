//! Observer server startup helper for embedding in the engine binary.
//!
//! [`spawn_observer`] binds the listener up front, so an occupied port
//! fails startup instead of a background task, then serves on a
//! background Tokio task.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::server::{ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the Observer server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the Observer HTTP server on a background Tokio task.
///
/// Returns a [`JoinHandle`] so the caller can abort the server during
/// shutdown.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address is invalid or the
/// port cannot be bound.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<JoinHandle<()>, StartupError> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = crate::server::serve(listener, state).await {
            tracing::error!(error = %e, "Observer server exited with error");
        }
    });

    tracing::info!(%addr, "Observer server spawned on background task");

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawns_on_ephemeral_port() {
        let config = ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 0,
        };
        let handle = spawn_observer(&config, Arc::new(AppState::default())).await;
        assert!(handle.is_ok());
        if let Ok(handle) = handle {
            handle.abort();
        }
    }
}
