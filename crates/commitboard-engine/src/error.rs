//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: commitboard_core::config::ConfigError,
    },

    /// Calendar clock initialization failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: commitboard_core::clock::ClockError,
    },

    /// The chain provider could not be built.
    #[error("chain error: {source}")]
    Chain {
        /// The underlying chain error.
        #[from]
        source: commitboard_chain::ChainError,
    },

    /// Observer API server failed to start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: commitboard_observer::StartupError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
