//! Error types for chain access.

use alloy::transports::TransportError;
use alloy_primitives::{Address, B256};

/// Errors that can occur while talking to the chain node.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The configured node URL does not parse.
    #[error("invalid rpc url {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The provider call failed in transport or the node returned an
    /// error object.
    #[error("rpc error: {source}")]
    Rpc {
        /// The underlying transport error.
        #[from]
        source: TransportError,
    },

    /// ABI encoding or decoding failed.
    #[error("abi error: {source}")]
    Abi {
        /// The underlying ABI error.
        #[from]
        source: alloy_sol_types::Error,
    },

    /// The contract has no code at the head block.
    #[error("no contract code at {address} (head block {head})")]
    NotDeployed {
        /// The configured contract address.
        address: Address,
        /// Block the check ran against.
        head: u64,
    },

    /// A signed transaction could not be accepted for relay.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// A signed transaction was not signed by the expected builder.
    #[error("transaction signed by {actual}, expected {expected}")]
    SignerMismatch {
        /// Address named by the request.
        expected: Address,
        /// Address recovered from the signature.
        actual: Address,
    },

    /// No receipt could be obtained before the deadline.
    #[error("confirmation of {tx_hash} failed: {reason}")]
    Confirmation {
        /// The transaction being waited on.
        tx_hash: B256,
        /// Why waiting stopped.
        reason: String,
    },

    /// The transaction was mined but reverted.
    #[error("transaction {tx_hash} reverted")]
    Reverted {
        /// The reverted transaction.
        tx_hash: B256,
    },
}
