//! Chain access for the Commitboard indexer.
//!
//! Talks to an Ethereum node over HTTP through an alloy provider. ABI
//! encoding and event decoding use the `sol!` bindings in [`abi`].
//!
//! # Modules
//!
//! - [`abi`] -- Contract functions and events.
//! - [`collector`] -- Incremental, chunked log scan into a
//!   [`CommitHistory`]; implements the poller's history source.
//! - [`contract`] -- `getCommit` reads, and verification, relay and
//!   confirmation of builder-signed `setCommit` / `clearCommit`
//!   transactions.
//! - [`error`] -- [`ChainError`].
//! - [`provider`] -- Provider construction.
//!
//! [`CommitHistory`]: commitboard_types::CommitHistory
//! [`ChainError`]: error::ChainError

pub mod abi;
pub mod collector;
pub mod contract;
pub mod error;
pub mod provider;
#[cfg(any(test, feature = "test-node"))]
pub mod test_node;

pub use collector::EventCollector;
pub use contract::{CommitCall, CommitContract, SignedCommit};
pub use error::ChainError;
pub use provider::{ChainProvider, connect};
