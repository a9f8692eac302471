//! Transaction simulation and end-to-end asset-diff reconstruction
//!
//! A simulation request is handed to a [`Simulator`]; its outcome is either a
//! revert, which is surfaced unchanged, or a set of raw logs and native balance
//! deltas that are decoded and aggregated into [`AssetDiff`]s.

use std::str::FromStr;

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolCall,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    aggregator::create_asset_diffs,
    decoder::{EventInterface, LogDecoder},
    errors::DiffError,
    metadata::TokenCache,
    traits::{ContractReader, Simulator},
    types::{AssetDiff, BalanceDiff, DiffConfig, RawLog},
};

// Entry point interface
//
// The entry point deploys `runtimeCode` into a counterfactual wallet derived from
// `walletSalt` and calls it with `callData`.
sol! {
    function exec(bytes runtimeCode, bytes callData, uint256 walletSalt) external payable;
}

/// Transaction to dry-run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationRequest {
    pub network_id: u64,
    pub from: Address,
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
    pub gas: u64,
}

impl SimulationRequest {
    /// Builds a call to the entry point's `exec` that runs `runtime_code` with no calldata
    pub fn exec(
        network_id: u64,
        from: Address,
        entry_point: Address,
        runtime_code: Bytes,
        wallet_salt: U256,
        value: U256,
        gas: u64,
    ) -> Self {
        let call = execCall { runtimeCode: runtime_code, callData: Bytes::new(), walletSalt: wallet_salt };
        Self { network_id, from, to: entry_point, input: call.abi_encode().into(), value, gas }
    }

    /// Request body in the provider's quick-simulation format
    ///
    /// Results are not persisted and gas is free, so `value` and `gas` are the
    /// only economic inputs.
    pub fn payload(&self) -> Value {
        json!({
            "save": false,
            "save_if_fails": false,
            "simulation_type": "quick",
            "network_id": self.network_id.to_string(),
            "from": self.from,
            "to": self.to,
            "input": self.input,
            "value": self.value.to_string(),
            "gas": self.gas,
            "gas_price": 0,
        })
    }
}

/// Result of a simulation
///
/// `logs` and `balance_diffs` are meaningless when `revert` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationOutcome {
    pub revert: Option<String>,
    pub logs: Vec<RawLog>,
    pub balance_diffs: Vec<BalanceDiff>,
}

impl SimulationOutcome {
    pub fn reverted(message: impl Into<String>) -> Self {
        Self { revert: Some(message.into()), ..Default::default() }
    }

    pub fn succeeded(logs: Vec<RawLog>, balance_diffs: Vec<BalanceDiff>) -> Self {
        Self { revert: None, logs, balance_diffs }
    }
}

/// Simulation provider response
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationResponse {
    pub transaction: SimulatedTransaction,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulatedTransaction {
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub transaction_info: Option<TransactionInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionInfo {
    #[serde(default)]
    pub logs: Option<Vec<SimulatedLog>>,
    #[serde(default)]
    pub balance_diff: Option<Vec<SimulatedBalance>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulatedLog {
    pub raw: RawLog,
}

/// Native balance before (`original`) and after (`dirty`) the simulation
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatedBalance {
    pub address: Address,
    pub original: String,
    pub dirty: String,
}

impl SimulationResponse {
    pub fn from_json(json: &str) -> Result<Self, DiffError> {
        serde_json::from_str(json).map_err(|e| DiffError::Response(e.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self, DiffError> {
        serde_json::from_value(value).map_err(|e| DiffError::Response(e.to_string()))
    }

    /// Converts the payload into an outcome
    ///
    /// A non-empty `error_message` marks the transaction reverted. Missing log
    /// and balance lists are treated as empty.
    pub fn into_outcome(self) -> Result<SimulationOutcome, DiffError> {
        let transaction = self.transaction;
        if let Some(message) = transaction.error_message.filter(|m| !m.is_empty()) {
            return Ok(SimulationOutcome::reverted(message));
        }
        let info = transaction
            .transaction_info
            .ok_or_else(|| DiffError::Response("missing transaction_info".to_string()))?;

        let logs = info.logs.unwrap_or_default().into_iter().map(|log| log.raw).collect();
        let balance_diffs = info
            .balance_diff
            .unwrap_or_default()
            .into_iter()
            .map(|balance| {
                Ok(BalanceDiff {
                    address: balance.address,
                    start: parse_balance(&balance.original)?,
                    end: parse_balance(&balance.dirty)?,
                })
            })
            .collect::<Result<_, DiffError>>()?;

        Ok(SimulationOutcome::succeeded(logs, balance_diffs))
    }
}

fn parse_balance(value: &str) -> Result<U256, DiffError> {
    U256::from_str(value).map_err(|e| DiffError::Response(format!("invalid balance {value:?}: {e}")))
}

/// Simulates `request` and reconstructs the asset movements it causes
///
/// Logs are decoded against `interfaces` first, then the builtin ERC20 and
/// ERC721 interfaces.
///
/// # Returns
/// - `Ok(Vec<AssetDiff>)`: Native, then fungible, then non-fungible movements
/// - `Err(DiffError::Revert)`: The transaction reverted; nothing was decoded or probed
/// - `Err(DiffError::Transport)`: The simulator or a token contract could not be reached
pub async fn simulate_asset_diffs<S, R>(
    simulator: &S,
    reader: &R,
    cache: &TokenCache,
    interfaces: &[EventInterface],
    request: &SimulationRequest,
    config: &DiffConfig,
) -> Result<Vec<AssetDiff>, DiffError>
where
    S: Simulator + ?Sized,
    R: ContractReader + ?Sized,
{
    let outcome = simulator.simulate(request).await?;
    if let Some(message) = outcome.revert {
        warn!(network_id = request.network_id, to = %request.to, %message, "simulation reverted");
        return Err(DiffError::Revert(message));
    }

    let decoder = LogDecoder::with_builtins(interfaces.iter().cloned());
    let logs = decoder.decode_logs(&outcome.logs);
    debug!(raw = outcome.logs.len(), decoded = logs.len(), balances = outcome.balance_diffs.len(), "decoded simulation logs");

    create_asset_diffs(reader, cache, &logs, &outcome.balance_diffs, config).await
}
