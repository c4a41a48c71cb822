//! Calls and transactions against the commitment contract.
//!
//! Reads go through `eth_call`. Writes arrive already signed by the
//! builder's wallet: the raw transaction is decoded, its signer recovered
//! and checked against the builder it claims to act for, and its target,
//! chain and calldata checked before it is relayed with
//! `eth_sendRawTransaction`. Confirmation waits on the provider's pending
//! transaction with a deadline.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::network::ReceiptResponse;
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy_primitives::{Address, B256, Bytes};
use alloy_sol_types::SolCall;
use commitboard_core::config::ChainConfig;
use commitboard_types::OnChainCommit;
use tracing::{info, warn};

use crate::abi::{clearCommitCall, getCommitCall, setCommitCall};
use crate::error::ChainError;
use crate::provider::ChainProvider;

/// Calldata for `setCommit(message)`.
pub fn set_commit_calldata(message: &str) -> Bytes {
    setCommitCall {
        message: message.to_owned(),
    }
    .abi_encode()
    .into()
}

/// Calldata for `clearCommit()`.
pub fn clear_commit_calldata() -> Bytes {
    clearCommitCall {}.abi_encode().into()
}

/// Calldata for `getCommit(user)`.
pub fn get_commit_calldata(user: Address) -> Bytes {
    getCommitCall { user }.abi_encode().into()
}

/// Decode the return data of `getCommit`.
///
/// # Errors
///
/// Returns [`ChainError::Abi`] if the bytes are not a valid
/// `(string, uint256)` tuple.
pub fn decode_get_commit(data: &[u8]) -> Result<OnChainCommit, ChainError> {
    let ret = getCommitCall::abi_decode_returns(data, true)?;
    Ok(OnChainCommit {
        message: ret.message,
        updated_at: u64::try_from(ret.updatedAt).unwrap_or(u64::MAX),
    })
}

/// The contract function a signed transaction calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitCall {
    /// `setCommit(message)`.
    Set {
        /// The message as signed.
        message: String,
    },
    /// `clearCommit()`.
    Clear,
}

impl CommitCall {
    /// Decode transaction input.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InvalidTransaction`] for input that is not a
    /// `setCommit` or `clearCommit` call, or [`ChainError::Abi`] if the
    /// `setCommit` arguments do not decode.
    pub fn decode(input: &[u8]) -> Result<Self, ChainError> {
        let selector = input.get(..4).ok_or_else(|| {
            ChainError::InvalidTransaction("input is shorter than a selector".to_owned())
        })?;
        if selector == setCommitCall::SELECTOR.as_slice() {
            let call = setCommitCall::abi_decode(input, true)?;
            Ok(Self::Set {
                message: call.message,
            })
        } else if selector == clearCommitCall::SELECTOR.as_slice() {
            Ok(Self::Clear)
        } else {
            Err(ChainError::InvalidTransaction(format!(
                "unknown selector {}",
                Bytes::copy_from_slice(selector)
            )))
        }
    }
}

/// A raw transaction that passed every check and can be relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCommit {
    /// Recovered signer.
    pub sender: Address,
    /// Transaction hash.
    pub tx_hash: B256,
    /// Decoded contract call.
    pub call: CommitCall,
    raw: Bytes,
}

/// A relayed transaction whose receipt has not been seen yet.
pub struct SentCommit {
    /// Hash returned by the node.
    pub tx_hash: B256,
    confirmation: Pin<Box<dyn Future<Output = Result<(), ChainError>> + Send>>,
}

impl SentCommit {
    /// Wait until the transaction is mined.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Reverted`] if it failed on chain, or
    /// [`ChainError::Confirmation`] if no receipt arrived before the
    /// deadline.
    pub async fn confirmed(self) -> Result<(), ChainError> {
        self.confirmation.await
    }
}

/// Handle on the deployed commitment contract.
pub struct CommitContract {
    provider: ChainProvider,
    address: Address,
    chain_id: u64,
    receipt_timeout: Duration,
}

impl CommitContract {
    /// Bind to the contract in `config`.
    pub fn new(provider: ChainProvider, config: &ChainConfig) -> Self {
        Self {
            provider,
            address: config.contract_address,
            chain_id: config.chain_id,
            receipt_timeout: config.receipt_timeout(),
        }
    }

    /// Contract address.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Read the current on-chain commit for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError`] if the call fails or the result does not
    /// decode.
    pub async fn get_commit(&self, user: Address) -> Result<OnChainCommit, ChainError> {
        let tx = TransactionRequest::default()
            .to(self.address)
            .input(get_commit_calldata(user).into());
        let data = self.provider.call(&tx).await?;
        decode_get_commit(&data)
    }

    /// Check a raw EIP-2718 transaction before relaying it for
    /// `expected_sender`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InvalidTransaction`] if the bytes do not
    /// decode, the signature is invalid, or the transaction targets another
    /// contract or chain; [`ChainError::SignerMismatch`] if it was signed by
    /// someone other than `expected_sender`; or any error from
    /// [`CommitCall::decode`].
    pub fn verify(
        &self,
        raw: &[u8],
        expected_sender: Address,
    ) -> Result<SignedCommit, ChainError> {
        let mut buf = raw;
        let envelope = TxEnvelope::decode_2718(&mut buf).map_err(|e| {
            ChainError::InvalidTransaction(format!("undecodable transaction: {e}"))
        })?;

        if envelope.to() != Some(self.address) {
            return Err(ChainError::InvalidTransaction(format!(
                "transaction is not addressed to {}",
                self.address
            )));
        }
        if envelope.chain_id() != Some(self.chain_id) {
            return Err(ChainError::InvalidTransaction(format!(
                "transaction is not bound to chain {}",
                self.chain_id
            )));
        }

        let sender = envelope
            .recover_signer()
            .map_err(|e| ChainError::InvalidTransaction(format!("bad signature: {e}")))?;
        if sender != expected_sender {
            return Err(ChainError::SignerMismatch {
                expected: expected_sender,
                actual: sender,
            });
        }

        Ok(SignedCommit {
            sender,
            tx_hash: *envelope.tx_hash(),
            call: CommitCall::decode(envelope.input())?,
            raw: Bytes::copy_from_slice(raw),
        })
    }

    /// Relay a verified transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::Rpc`] if the node rejects it.
    pub async fn send(&self, commit: &SignedCommit) -> Result<SentCommit, ChainError> {
        let pending = self.provider.send_raw_transaction(&commit.raw).await?;
        let tx_hash = *pending.tx_hash();
        info!(sender = %commit.sender, %tx_hash, "transaction submitted");

        let timeout = self.receipt_timeout;
        let confirmation = Box::pin(async move {
            let receipt = pending
                .with_timeout(Some(timeout))
                .get_receipt()
                .await
                .map_err(|e| ChainError::Confirmation {
                    tx_hash,
                    reason: e.to_string(),
                })?;
            if ReceiptResponse::status(&receipt) {
                info!(%tx_hash, "transaction confirmed");
                Ok(())
            } else {
                warn!(%tx_hash, "transaction reverted");
                Err(ChainError::Reverted { tx_hash })
            }
        });
        Ok(SentCommit {
            tx_hash,
            confirmation,
        })
    }
}
