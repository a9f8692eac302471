//! Token classification and metadata caching
//!
//! Tokens are classified by probing their contracts:
//! - `isApprovedForAll(owner, operator)` answering at all marks the token non-fungible,
//!   any other outcome marks it fungible
//! - `symbol()` falls back to `"???"`
//! - `decimals()` falls back to `18`
//!
//! Results live in a [`TokenCache`] owned by the caller and shared across
//! aggregations. Entries are never refreshed. Concurrent first-time lookups of
//! the same token may probe it twice; both writes store the same answer.

use std::sync::{Arc, PoisonError, RwLock};

use alloy::primitives::Address;
use futures::future::try_join_all;
use indexmap::IndexSet;
use tracing::{debug, trace};

use crate::{
    errors::{CallError, TransportError},
    traits::ContractReader,
    types::{DiffConfig, TokenInfos, TokenMetadata, TokenType},
    utils::token_utils::{call_contract, decimalsCall, isApprovedForAllCall, symbolCall},
};

/// Shared token metadata cache keyed by contract address
///
/// Cloning is cheap and yields a handle to the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    inner: Arc<RwLock<TokenInfos>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, token: &Address) -> Option<TokenMetadata> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).get(token).cloned()
    }

    pub fn contains(&self, token: &Address) -> bool {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).contains_key(token)
    }

    /// Stores metadata for `token`, replacing any previous entry
    pub fn insert(&self, token: Address, metadata: TokenMetadata) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).insert(token, metadata);
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every cached entry
    pub fn snapshot(&self) -> TokenInfos {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Resolves metadata for every token in `tokens`, probing only uncached ones
///
/// Duplicate addresses are probed once. Probes for different tokens run
/// concurrently, as do the three probes of a single token.
///
/// # Returns
/// - `Ok(TokenInfos)`: Metadata for every requested token
/// - `Err(TransportError)`: A contract could not be reached; tokens resolved
///   before the failure stay cached
pub async fn classify_tokens<R>(
    reader: &R,
    cache: &TokenCache,
    tokens: impl IntoIterator<Item = Address>,
    config: &DiffConfig,
) -> Result<TokenInfos, TransportError>
where
    R: ContractReader + ?Sized,
{
    let requested: IndexSet<Address> = tokens.into_iter().collect();
    let missing: Vec<Address> = requested.iter().copied().filter(|token| !cache.contains(token)).collect();
    debug!(requested = requested.len(), missing = missing.len(), "classifying tokens");

    try_join_all(missing.into_iter().map(|token| async move {
        let metadata = probe_token(reader, token, config).await?;
        debug!(%token, token_type = ?metadata.token_type, symbol = %metadata.symbol, "classified token");
        cache.insert(token, metadata);
        Ok::<_, TransportError>(())
    }))
    .await?;

    Ok(requested
        .into_iter()
        .filter_map(|token| cache.get(&token).map(|metadata| (token, metadata)))
        .collect())
}

/// Probes a single token contract, bypassing the cache
pub async fn probe_token<R>(reader: &R, token: Address, config: &DiffConfig) -> Result<TokenMetadata, TransportError>
where
    R: ContractReader + ?Sized,
{
    let (approval, symbol, decimals) = tokio::join!(
        call_contract(
            reader,
            token,
            isApprovedForAllCall { owner: config.probe_owner, operator: config.probe_operator },
        ),
        call_contract(reader, token, symbolCall {}),
        call_contract(reader, token, decimalsCall {}),
    );

    let token_type = match approval {
        Ok(_) => TokenType::NonFungible,
        Err(CallError::Transport(err)) => return Err(err),
        Err(err) => {
            trace!(%token, %err, "type probe failed, treating as fungible");
            TokenType::Fungible
        }
    };
    let symbol = or_fallback(symbol, config.fallback_symbol.clone(), token, "symbol")?;
    let decimals = or_fallback(decimals, config.fallback_decimals, token, "decimals")?;

    Ok(TokenMetadata { token_type, symbol, decimals })
}

fn or_fallback<T>(result: Result<T, CallError>, fallback: T, token: Address, probe: &str) -> Result<T, TransportError> {
    match result {
        Ok(value) => Ok(value),
        Err(CallError::Transport(err)) => Err(err),
        Err(err) => {
            trace!(%token, probe, %err, "probe failed, using fallback");
            Ok(fallback)
        }
    }
}
