//! Error types for the Observer API server.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use commitboard_chain::ChainError;

/// Errors that can occur in the Observer API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A path segment is not a valid address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A request body failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A signed transaction does not belong to the addressed builder.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The request conflicts with work already in flight.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A backing service is not configured.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The chain node rejected or failed a call.
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),
}

impl ObserverError {
    /// Classify a failed check of a builder-submitted transaction.
    ///
    /// These are client errors, unlike node failures which map to
    /// [`ObserverError::Chain`].
    pub fn rejected(e: &ChainError) -> Self {
        match e {
            ChainError::SignerMismatch { .. } => Self::Forbidden(e.to_string()),
            _ => Self::Validation(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ObserverError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::Validation(e.to_string())
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidAddress(msg) | Self::Validation(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            Self::Chain(e) => (StatusCode::BAD_GATEWAY, format!("{e}")),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
