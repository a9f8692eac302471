//! Asset-diff aggregation
//!
//! Turns decoded logs and native balance deltas into per-address asset movements:
//!
//! 1. **Native**: one movement per balance delta
//! 2. **Fungible**: `Transfer` events of fungible tokens are netted per token and
//!    holder; non-zero nets are reported, except for the zero address
//! 3. **Non-fungible**: `Transfer` events of non-fungible tokens are collapsed per
//!    token id into a previous owner and a new owner, see [`NftOwnership`]
//!
//! Output is native first, then fungible grouped by token then holder, then
//! non-fungible grouped by contract then token id. Groups keep the order in which
//! they were first encountered.

use alloy::primitives::{Address, U256};
use indexmap::IndexMap;
use num_bigint::{BigInt, Sign};
use num_traits::{Signed, Zero};

use crate::{
    errors::DiffError,
    metadata::{classify_tokens, TokenCache},
    traits::ContractReader,
    types::{
        AssetDiff, AssetType, BalanceDiff, DecodedLog, DiffConfig, TokenInfos, TokenType, TransferEvent,
        ZERO_ADDRESS,
    },
};

/// Ownership record of one non-fungible token across a transaction
///
/// Updated event by event:
/// - `first` is taken from the sender of the very first transfer seen, unless
///   that sender is the zero address (a mint); later transfers never change it
/// - `last` is cleared whenever a transfer goes to the zero address (a burn),
///   and otherwise set to the recipient only while it is empty
///
/// Because `last` is only filled while empty, a token moved `A -> B -> C`
/// reports `B` as its new owner, not `C`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NftOwnership {
    pub first: Option<Address>,
    pub last: Option<Address>,
    seen: bool,
}

impl NftOwnership {
    /// Folds one transfer into the record
    pub fn apply(&mut self, transfer: &TransferEvent) {
        if !self.seen {
            self.seen = true;
            if transfer.from != ZERO_ADDRESS {
                self.first = Some(transfer.from);
            }
        }
        if transfer.to == ZERO_ADDRESS {
            self.last = None;
        } else if self.last.is_none() {
            self.last = Some(transfer.to);
        }
    }

    /// Folds an ordered sequence of transfers of the same token
    pub fn reduce<'a>(transfers: impl IntoIterator<Item = &'a TransferEvent>) -> Self {
        let mut ownership = Self::default();
        for transfer in transfers {
            ownership.apply(transfer);
        }
        ownership
    }

    /// Whether the token ends up with a different owner than it started with
    pub fn is_moved(&self) -> bool {
        self.first != self.last
    }
}

/// Signed running balances per fungible token and holder
#[derive(Debug, Clone, Default)]
pub struct FungibleLedger {
    balances: IndexMap<Address, IndexMap<Address, BigInt>>,
}

impl FungibleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves `transfer.value` of `token` from the sender to the recipient
    pub fn record(&mut self, token: Address, transfer: &TransferEvent) {
        let amount = to_bigint(transfer.value);
        let holders = self.balances.entry(token).or_default();
        *holders.entry(transfer.from).or_default() -= &amount;
        *holders.entry(transfer.to).or_default() += amount;
    }

    /// Net change of `holder`'s balance of `token`
    pub fn balance(&self, token: &Address, holder: &Address) -> BigInt {
        self.balances
            .get(token)
            .and_then(|holders| holders.get(holder))
            .cloned()
            .unwrap_or_default()
    }

    /// Reports every non-zero net change, excluding the zero address
    pub fn into_diffs(self, metadata: &TokenInfos, config: &DiffConfig) -> Vec<AssetDiff> {
        let mut diffs = Vec::new();
        for (token, holders) in self.balances {
            let (symbol, decimals) = token_label(metadata, &token, config, config.fallback_decimals);
            for (holder, delta) in holders {
                if holder == ZERO_ADDRESS || delta.is_zero() {
                    continue;
                }
                diffs.push(AssetDiff {
                    asset_type: AssetType::Fungible,
                    amount_or_id: delta.abs().to_string(),
                    increased: delta.is_positive(),
                    address: holder,
                    token: Some(token),
                    symbol: symbol.clone(),
                    decimals,
                });
            }
        }
        diffs
    }
}

fn to_bigint(value: U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}

fn token_label(metadata: &TokenInfos, token: &Address, config: &DiffConfig, decimals: u8) -> (String, u8) {
    match metadata.get(token) {
        Some(info) => (info.symbol.clone(), decimals_for(info.token_type, info.decimals, config)),
        None => (config.fallback_symbol.clone(), decimals),
    }
}

fn decimals_for(token_type: TokenType, decimals: u8, config: &DiffConfig) -> u8 {
    match token_type {
        TokenType::Fungible => decimals,
        TokenType::NonFungible => config.nft_decimals,
    }
}

/// One native movement per balance delta
pub fn native_diffs(balance_diffs: &[BalanceDiff], config: &DiffConfig) -> Vec<AssetDiff> {
    balance_diffs
        .iter()
        .map(|diff| {
            let increased = diff.end >= diff.start;
            let magnitude = if increased { diff.end - diff.start } else { diff.start - diff.end };
            AssetDiff {
                asset_type: AssetType::Native,
                amount_or_id: magnitude.to_string(),
                increased,
                address: diff.address,
                token: None,
                symbol: config.native.symbol.clone(),
                decimals: config.native.decimals,
            }
        })
        .collect()
}

/// Nets the fungible `Transfer` events of `logs`
pub fn fungible_diffs(logs: &[DecodedLog], metadata: &TokenInfos, config: &DiffConfig) -> Vec<AssetDiff> {
    let mut ledger = FungibleLedger::new();
    for (token, transfer) in transfers_of(logs, metadata, TokenType::Fungible) {
        ledger.record(token, transfer);
    }
    ledger.into_diffs(metadata, config)
}

/// Collapses the non-fungible `Transfer` events of `logs` into ownership changes
pub fn non_fungible_diffs(logs: &[DecodedLog], metadata: &TokenInfos, config: &DiffConfig) -> Vec<AssetDiff> {
    let mut owners: IndexMap<Address, IndexMap<U256, NftOwnership>> = IndexMap::new();
    for (token, transfer) in transfers_of(logs, metadata, TokenType::NonFungible) {
        owners
            .entry(token)
            .or_default()
            .entry(transfer.value)
            .or_default()
            .apply(transfer);
    }

    let mut diffs = Vec::new();
    for (token, ids) in owners {
        let (symbol, decimals) = token_label(metadata, &token, config, config.nft_decimals);
        for (id, ownership) in ids {
            if !ownership.is_moved() {
                continue;
            }
            let movements = [(ownership.first, false), (ownership.last, true)];
            for (owner, increased) in movements {
                if let Some(address) = owner {
                    diffs.push(AssetDiff {
                        asset_type: AssetType::NonFungible,
                        amount_or_id: format!("#{id}"),
                        increased,
                        address,
                        token: Some(token),
                        symbol: symbol.clone(),
                        decimals,
                    });
                }
            }
        }
    }
    diffs
}

fn transfers_of<'a>(
    logs: &'a [DecodedLog],
    metadata: &'a TokenInfos,
    token_type: TokenType,
) -> impl Iterator<Item = (Address, &'a TransferEvent)> + 'a {
    logs.iter().filter_map(move |log| {
        let transfer = log.transfer.as_ref()?;
        let info = metadata.get(&log.address)?;
        (info.token_type == token_type).then_some((log.address, transfer))
    })
}

/// Builds all asset movements once token metadata is known
pub fn diffs_from_metadata(
    logs: &[DecodedLog],
    balance_diffs: &[BalanceDiff],
    metadata: &TokenInfos,
    config: &DiffConfig,
) -> Vec<AssetDiff> {
    let mut diffs = native_diffs(balance_diffs, config);
    diffs.extend(fungible_diffs(logs, metadata, config));
    diffs.extend(non_fungible_diffs(logs, metadata, config));
    diffs
}

/// Classifies every contract that emitted a log, then builds all asset movements
///
/// # Returns
/// - `Ok(Vec<AssetDiff>)`: Native, then fungible, then non-fungible movements
/// - `Err(DiffError::Transport)`: A token contract could not be reached
pub async fn create_asset_diffs<R>(
    reader: &R,
    cache: &TokenCache,
    logs: &[DecodedLog],
    balance_diffs: &[BalanceDiff],
    config: &DiffConfig,
) -> Result<Vec<AssetDiff>, DiffError>
where
    R: ContractReader + ?Sized,
{
    let tokens = logs.iter().map(|log| log.address);
    let metadata = classify_tokens(reader, cache, tokens, config).await?;
    Ok(diffs_from_metadata(logs, balance_diffs, &metadata, config))
}
