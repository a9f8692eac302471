//! Shared fixtures for integration tests
//!
//! - `MockReader`: in-memory token contracts answering the classifier probes,
//!   counting every call
//! - `MockSimulator`: replays a fixed outcome, counting every simulation
//! - Log builders producing real ABI encodings of ERC20/ERC721 transfers

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::atomic::{AtomicUsize, Ordering},
};

use alloy::{
    primitives::{Address, Bytes, LogData, U256},
    sol,
    sol_types::{SolCall, SolEvent, SolValue},
};
use async_trait::async_trait;
use sim_asset_diff::{
    utils::token_utils::{decimalsCall, isApprovedForAllCall, symbolCall},
    BalanceDiff, CallError, ContractReader, DiffError, RawLog, SimulationOutcome, SimulationRequest, Simulator,
    TransportError,
};

pub mod erc20 {
    alloy::sol! {
        event Transfer(address indexed from, address indexed to, uint256 value);
        event Approval(address indexed owner, address indexed spender, uint256 value);
    }
}

pub mod erc721 {
    alloy::sol! {
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
    }
}

sol! {
    event Deposit(address indexed account, uint256 amount);
}

/// Routes library tracing to the test output, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn raw(address: Address, log: LogData) -> RawLog {
    RawLog { address, topics: Some(log.topics().to_vec()), data: log.data }
}

pub fn fungible_transfer(token: Address, from: Address, to: Address, value: u64) -> RawLog {
    raw(token, erc20::Transfer { from, to, value: U256::from(value) }.encode_log_data())
}

pub fn nft_transfer(token: Address, from: Address, to: Address, id: u64) -> RawLog {
    raw(token, erc721::Transfer { from, to, tokenId: U256::from(id) }.encode_log_data())
}

pub fn approval(token: Address, owner: Address, spender: Address, value: u64) -> RawLog {
    raw(token, erc20::Approval { owner, spender, value: U256::from(value) }.encode_log_data())
}

pub fn deposit(contract: Address, account: Address, amount: u64) -> RawLog {
    raw(contract, Deposit { account, amount: U256::from(amount) }.encode_log_data())
}

pub fn opaque(address: Address, data: Bytes) -> RawLog {
    RawLog { address, topics: None, data }
}

pub fn balance(address: Address, start: u64, end: u64) -> BalanceDiff {
    BalanceDiff { address, start: U256::from(start), end: U256::from(end) }
}

#[derive(Debug, Clone)]
struct MockToken {
    non_fungible: bool,
    symbol: Option<String>,
    decimals: Option<u8>,
}

/// Token contracts keyed by address; unknown contracts revert every call
#[derive(Debug, Default)]
pub struct MockReader {
    tokens: HashMap<Address, MockToken>,
    offline: HashSet<Address>,
    calls: AtomicUsize,
}

impl MockReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fungible(mut self, token: Address, symbol: &str, decimals: u8) -> Self {
        self.tokens.insert(
            token,
            MockToken { non_fungible: false, symbol: Some(symbol.to_string()), decimals: Some(decimals) },
        );
        self
    }

    pub fn non_fungible(mut self, token: Address, symbol: &str) -> Self {
        self.tokens.insert(token, MockToken { non_fungible: true, symbol: Some(symbol.to_string()), decimals: None });
        self
    }

    pub fn offline(mut self, contract: Address) -> Self {
        self.offline.insert(contract);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContractReader for MockReader {
    async fn call(&self, contract: Address, input: Bytes) -> Result<Bytes, CallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.contains(&contract) {
            return Err(TransportError::new(contract, "connection refused").into());
        }
        let reverted = CallError::Reverted { reason: None };
        let token = self.tokens.get(&contract).ok_or(reverted.clone())?;
        let selector = &input[..4];

        if selector == isApprovedForAllCall::SELECTOR && token.non_fungible {
            return Ok(false.abi_encode().into());
        }
        if selector == symbolCall::SELECTOR {
            if let Some(symbol) = &token.symbol {
                return Ok(symbol.abi_encode().into());
            }
        }
        if selector == decimalsCall::SELECTOR {
            if let Some(decimals) = token.decimals {
                return Ok(U256::from(decimals).abi_encode().into());
            }
        }
        Err(reverted)
    }
}

/// Simulator replaying a fixed outcome
#[derive(Debug)]
pub struct MockSimulator {
    outcome: Option<SimulationOutcome>,
    calls: AtomicUsize,
}

impl MockSimulator {
    pub fn new(outcome: SimulationOutcome) -> Self {
        Self { outcome: Some(outcome), calls: AtomicUsize::new(0) }
    }

    /// Simulator whose endpoint cannot be reached
    pub fn unreachable() -> Self {
        Self { outcome: None, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Simulator for MockSimulator {
    async fn simulate(&self, _request: &SimulationRequest) -> Result<SimulationOutcome, DiffError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome
            .clone()
            .ok_or_else(|| TransportError::new("https://simulator.invalid", "connection refused").into())
    }
}
