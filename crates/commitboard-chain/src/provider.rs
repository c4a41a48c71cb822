//! HTTP provider for the chain node.

use alloy::providers::{Provider, ProviderBuilder, ReqwestProvider};
use commitboard_core::config::ChainConfig;

use crate::error::ChainError;

/// Provider type used by the collector and the contract handle.
pub type ChainProvider = ReqwestProvider;

/// Build an HTTP provider for the node in `config`.
///
/// The client's poll interval, which paces receipt polling, is taken
/// from `receipt_poll_interval_ms`. No request is made; an unreachable
/// node only shows up on the first call.
///
/// # Errors
///
/// Returns [`ChainError::InvalidUrl`] if the URL does not parse.
pub fn connect(config: &ChainConfig) -> Result<ChainProvider, ChainError> {
    let url = config
        .rpc_url
        .parse::<reqwest::Url>()
        .map_err(|e| ChainError::InvalidUrl {
            url: config.rpc_url.clone(),
            reason: e.to_string(),
        })?;
    let provider = ProviderBuilder::new().on_http(url);
    provider
        .client()
        .set_poll_interval(config.receipt_poll_interval());
    Ok(provider)
}

/// Chain id reported by the node.
///
/// # Errors
///
/// Returns [`ChainError::Rpc`] if the node cannot be reached.
pub async fn chain_id(provider: &ChainProvider) -> Result<u64, ChainError> {
    Ok(provider.get_chain_id().await?)
}
