//! Core types for simulation asset-diff reconstruction
//!
//! This module defines the data structures that flow through the pipeline:
//! - Raw and decoded event logs
//! - Native balance deltas reported by the simulator
//! - Token metadata and classification
//! - The final per-address asset movements

use std::collections::HashMap;
use std::fmt;
pub use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::{dyn_abi::DynSolValue, primitives::utils::format_units};
use serde::{Deserialize, Serialize};

/// Sentinel "no owner" address used for mints and burns
pub const ZERO_ADDRESS: Address = Address::ZERO;

/// Mapping of chain IDs to their native token configurations
pub type ChainConfigs = HashMap<u64, TokenConfig>;

/// Mapping of token addresses to their resolved metadata
pub type TokenInfos = HashMap<Address, TokenMetadata>;

/// Token configuration including symbol and decimals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token symbol (e.g., "ETH", "USDC")
    pub symbol: String,
    /// Number of decimal places
    pub decimals: u8,
}

/// Event log as reported by the simulation provider
///
/// `topics` is `None` for non-standard logs whose payload cannot be
/// ABI-decoded; those are carried through with the raw data as their only argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics, `topics[0]` being the event selector for non-anonymous events
    pub topics: Option<Vec<B256>>,
    /// ABI-encoded non-indexed parameters
    pub data: Bytes,
}

/// Named view of a `Transfer(address,address,uint256)` event
///
/// `value` is the amount for fungible tokens and the token id for non-fungible ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

impl TransferEvent {
    /// Builds the named view from positional arguments
    ///
    /// Returns `None` unless the arguments are exactly `(address, address, uint)`.
    pub fn from_args(args: &[DynSolValue]) -> Option<Self> {
        match args {
            [DynSolValue::Address(from), DynSolValue::Address(to), DynSolValue::Uint(value, _)] => {
                Some(Self { from: *from, to: *to, value: *value })
            }
            _ => None,
        }
    }
}

/// Event log after matching against an interface
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLog {
    /// Emitting contract
    pub address: Address,
    /// Event name, `None` for opaque logs
    pub name: Option<String>,
    /// Full event signature, e.g. `Transfer(address,address,uint256)`
    pub signature: Option<String>,
    /// Decoded parameter values in declaration order
    pub args: Vec<DynSolValue>,
    /// Named transfer fields, present when the event is a well-formed `Transfer`
    pub transfer: Option<TransferEvent>,
}

impl DecodedLog {
    /// Creates a decoded log for a topic-less payload
    pub fn opaque(address: Address, data: Bytes) -> Self {
        Self {
            address,
            name: None,
            signature: None,
            args: vec![DynSolValue::Bytes(data.to_vec())],
            transfer: None,
        }
    }
}

/// Native currency balance before and after the simulated transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDiff {
    pub address: Address,
    pub start: U256,
    pub end: U256,
}

/// Token standard as inferred by probing the contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Balance-tracked token (ERC20-like)
    Fungible,
    /// Owner-of-id token (ERC721-like)
    NonFungible,
}

/// Resolved token metadata, cached per contract address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub token_type: TokenType,
    pub symbol: String,
    pub decimals: u8,
}

/// Asset class of a movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Native,
    Fungible,
    NonFungible,
}

/// Per-address asset movement reconstructed from a simulation
///
/// For native and fungible assets `amount_or_id` is the decimal magnitude of the
/// signed balance change and `increased` its sign. For non-fungible assets it is
/// the `#<id>` tag of the moved token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDiff {
    #[serde(rename = "type")]
    pub asset_type: AssetType,
    pub amount_or_id: String,
    pub increased: bool,
    pub address: Address,
    /// Token contract, `None` for the native currency
    pub token: Option<Address>,
    pub symbol: String,
    pub decimals: u8,
}

impl AssetDiff {
    /// Renders the movement as a signed, human-readable amount
    ///
    /// Native and fungible amounts are scaled by `decimals` (`-1.5 USDC`);
    /// non-fungible movements keep their id tag (`+#7 PUNK`).
    pub fn signed_display(&self) -> String {
        let sign = if self.increased { '+' } else { '-' };
        let amount = match self.asset_type {
            AssetType::NonFungible => self.amount_or_id.clone(),
            AssetType::Native | AssetType::Fungible => {
                U256::from_str_radix(&self.amount_or_id, 10)
                    .ok()
                    .and_then(|value| format_units(value, self.decimals).ok())
                    .map(|formatted| trim_fraction(&formatted))
                    .unwrap_or_else(|| self.amount_or_id.clone())
            }
        };
        format!("{sign}{amount} {}", self.symbol)
    }
}

impl fmt::Display for AssetDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.address, self.signed_display())
    }
}

fn trim_fraction(formatted: &str) -> String {
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => formatted.to_string(),
    }
}

/// Aggregation parameters
#[derive(Debug, Clone)]
pub struct DiffConfig {
    /// Symbol and decimals reported for native currency movements
    pub native: TokenConfig,
    /// First argument of the `isApprovedForAll` type probe
    pub probe_owner: Address,
    /// Second argument of the `isApprovedForAll` type probe
    pub probe_operator: Address,
    /// Symbol used when `symbol()` cannot be read
    pub fallback_symbol: String,
    /// Decimals used when `decimals()` cannot be read
    pub fallback_decimals: u8,
    /// Decimals reported on non-fungible movements
    pub nft_decimals: u8,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            native: get_default_native_token(1),
            probe_owner: Address::with_last_byte(1),
            probe_operator: Address::with_last_byte(2),
            fallback_symbol: "???".to_string(),
            fallback_decimals: 18,
            nft_decimals: 1,
        }
    }
}

impl DiffConfig {
    /// Default configuration with the native token of `chain_id`
    pub fn for_chain(chain_id: u64) -> Self {
        Self { native: get_default_native_token(chain_id), ..Default::default() }
    }

    /// Default configuration with the native token looked up in `chain_configs`,
    /// falling back to the built-in table
    pub fn from_chain_configs(chain_id: u64, chain_configs: &ChainConfigs) -> Self {
        match chain_configs.get(&chain_id) {
            Some(native) => Self { native: native.clone(), ..Default::default() },
            None => Self::for_chain(chain_id),
        }
    }
}

/// Get default native token configuration for known chains
pub fn get_default_native_token(chain_id: u64) -> TokenConfig {
    match chain_id {
        1 => TokenConfig { symbol: "ETH".into(), decimals: 18 },
        5 => TokenConfig { symbol: "GOERLI_ETH".into(), decimals: 18 },
        10 => TokenConfig { symbol: "OPT_ETH".into(), decimals: 18 },
        56 => TokenConfig { symbol: "BNB".into(), decimals: 18 },
        137 => TokenConfig { symbol: "MATIC".into(), decimals: 18 },
        42161 => TokenConfig { symbol: "ARB_ETH".into(), decimals: 18 },
        // Default to ETH configuration for unknown chains
        _ => TokenConfig { symbol: "ETH".into(), decimals: 18 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    const ALICE: Address = address!("00000000000000000000000000000000000a11ce");

    fn diff(asset_type: AssetType, amount: &str, increased: bool, decimals: u8) -> AssetDiff {
        AssetDiff {
            asset_type,
            amount_or_id: amount.to_string(),
            increased,
            address: ALICE,
            token: None,
            symbol: "TKN".to_string(),
            decimals,
        }
    }

    #[test]
    fn test_transfer_view_requires_address_address_uint() {
        let args = vec![
            DynSolValue::Address(ALICE),
            DynSolValue::Address(ZERO_ADDRESS),
            DynSolValue::Uint(U256::from(5), 256),
        ];
        let transfer = TransferEvent::from_args(&args).unwrap();
        assert_eq!(transfer.from, ALICE);
        assert_eq!(transfer.value, U256::from(5));

        assert!(TransferEvent::from_args(&args[..2]).is_none());
        let wrong = vec![
            DynSolValue::Address(ALICE),
            DynSolValue::Uint(U256::from(1), 256),
            DynSolValue::Uint(U256::from(5), 256),
        ];
        assert!(TransferEvent::from_args(&wrong).is_none());
    }

    #[test]
    fn test_signed_display() {
        assert_eq!(diff(AssetType::Fungible, "1500000", false, 6).signed_display(), "-1.5 TKN");
        assert_eq!(diff(AssetType::Native, "2000000000000000000", true, 18).signed_display(), "+2 TKN");
        assert_eq!(diff(AssetType::NonFungible, "#7", true, 1).signed_display(), "+#7 TKN");
    }

    #[test]
    fn test_asset_diff_serializes_camel_case() {
        let json = serde_json::to_value(diff(AssetType::NonFungible, "#7", true, 1)).unwrap();
        assert_eq!(json["type"], "non_fungible");
        assert_eq!(json["amountOrId"], "#7");
        assert_eq!(json["token"], serde_json::Value::Null);
    }

    #[test]
    fn test_config_for_chain() {
        assert_eq!(DiffConfig::for_chain(56).native.symbol, "BNB");
        assert_eq!(DiffConfig::for_chain(999_999).native.symbol, "ETH");

        let mut configs = ChainConfigs::new();
        configs.insert(100, TokenConfig { symbol: "XDAI".into(), decimals: 18 });
        assert_eq!(DiffConfig::from_chain_configs(100, &configs).native.symbol, "XDAI");
        assert_eq!(DiffConfig::from_chain_configs(137, &configs).native.symbol, "MATIC");
    }
}
