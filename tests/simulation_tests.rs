//! Integration tests for the end-to-end simulation flow
//!
//! # Test Coverage
//! - Reverted simulations short-circuit decoding and probing
//! - Provider payloads parsed into outcomes and aggregated
//! - Caller-supplied interfaces decoded ahead of the builtins
//! - Opaque logs carried through the decoder
//! - Simulator transport failures

mod common;

use std::sync::Arc;

use alloy::primitives::{address, bytes, Address, U256};
use common::*;
use serde_json::json;
use sim_asset_diff::{
    decode_logs, simulate_asset_diffs, AssetType, DiffConfig, DiffError, EventInterface, LogDecoder,
    SimulationOutcome, SimulationRequest, SimulationResponse, Simulator, TokenCache,
};

const OWNER: Address = address!("c255fc198eedac7af8af0f6e0ca781794b094a61");
const WALLET: Address = address!("00000000000000000000000000000000000000ee");
const ENTRY_POINT: Address = address!("d878229c9c3575f224784de610911b5607a3ad15");
const DAI: Address = address!("6b175474e89094c44da98b954eedeac495271d0f");
const BAYC: Address = address!("bc4ca0eda7647a8ab7c2061c2e118a18a936f13d");
const VAULT: Address = address!("00000000000000000000000000000000000000aa");

fn request() -> SimulationRequest {
    SimulationRequest::exec(1, OWNER, ENTRY_POINT, bytes!("6080604052"), U256::from(7), U256::ZERO, 3_000_000)
}

fn reader() -> MockReader {
    MockReader::new().fungible(DAI, "DAI", 18).non_fungible(BAYC, "BAYC")
}

#[tokio::test]
async fn test_revert_is_surfaced_verbatim() {
    init_tracing();
    let simulator = MockSimulator::new(SimulationOutcome::reverted("execution reverted: Ownable: caller is not the owner"));
    let reader = reader();
    let err = simulate_asset_diffs(&simulator, &reader, &TokenCache::new(), &[], &request(), &DiffConfig::default())
        .await
        .unwrap_err();

    assert!(err.is_revert());
    assert_eq!(err.to_string(), "execution reverted: Ownable: caller is not the owner");
    assert_eq!(simulator.calls(), 1);
    assert_eq!(reader.calls(), 0);
}

#[tokio::test]
async fn test_revert_skips_aggregation_even_with_logs() {
    let outcome = SimulationOutcome {
        revert: Some("out of gas".to_string()),
        logs: vec![fungible_transfer(DAI, OWNER, WALLET, 1)],
        balance_diffs: vec![balance(OWNER, 10, 0)],
    };
    let reader = reader();
    let err = simulate_asset_diffs(&MockSimulator::new(outcome), &reader, &TokenCache::new(), &[], &request(), &DiffConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DiffError::Revert(ref message) if message == "out of gas"));
    assert_eq!(reader.calls(), 0);
}

#[tokio::test]
async fn test_provider_payload_end_to_end() {
    init_tracing();
    let logs = [
        fungible_transfer(DAI, OWNER, WALLET, 2_500),
        nft_transfer(BAYC, WALLET, OWNER, 8817),
        opaque(VAULT, bytes!("cafe")),
    ];
    let payload = json!({
        "transaction": {
            "error_message": null,
            "transaction_info": {
                "logs": logs.iter().map(|raw| json!({ "raw": raw })).collect::<Vec<_>>(),
                "balance_diff": [
                    {"address": OWNER, "original": "1000000000000000000", "dirty": "900000000000000000"},
                    {"address": WALLET, "original": "0", "dirty": "100000000000000000"}
                ]
            }
        }
    });
    let outcome = SimulationResponse::from_value(payload).unwrap().into_outcome().unwrap();
    assert_eq!(outcome.logs, logs);

    let reader = reader();
    let diffs = simulate_asset_diffs(&MockSimulator::new(outcome), &reader, &TokenCache::new(), &[], &request(), &DiffConfig::default())
        .await
        .unwrap();

    let rendered: Vec<String> = diffs.iter().map(|diff| diff.to_string()).collect();
    assert_eq!(
        rendered,
        vec![
            format!("{OWNER}: -0.1 ETH"),
            format!("{WALLET}: +0.1 ETH"),
            format!("{OWNER}: -0.0000000000000025 DAI"),
            format!("{WALLET}: +0.0000000000000025 DAI"),
            format!("{WALLET}: -#8817 BAYC"),
            format!("{OWNER}: +#8817 BAYC"),
        ]
    );
    // DAI, BAYC and the vault emitting the opaque log are each probed once
    assert_eq!(reader.calls(), 9);
}

#[tokio::test]
async fn test_caller_interface_takes_priority() {
    let abi = r#"[
        {"type": "event", "name": "Deposit", "anonymous": false, "inputs": [
            {"name": "account", "type": "address", "indexed": true},
            {"name": "amount", "type": "uint256", "indexed": false}
        ]},
        {"type": "function", "name": "deposit", "inputs": [], "outputs": [], "stateMutability": "payable"}
    ]"#;
    let vault = EventInterface::from_json("Vault", abi).unwrap();
    let raw_logs = [deposit(VAULT, OWNER, 5), fungible_transfer(DAI, OWNER, VAULT, 5)];

    let builtin_only = LogDecoder::builtin().decode_logs(&raw_logs);
    assert_eq!(builtin_only.len(), 1);

    let decoded = LogDecoder::with_builtins([vault.clone()]).decode_logs(&raw_logs);
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[0].name.as_deref(), Some("Deposit"));
    assert_eq!(decoded[0].signature.as_deref(), Some("Deposit(address,uint256)"));
    assert_eq!(decoded[0].transfer, None);

    let outcome = SimulationOutcome::succeeded(raw_logs.to_vec(), vec![]);
    let diffs = simulate_asset_diffs(&MockSimulator::new(outcome), &reader(), &TokenCache::new(), &[vault], &request(), &DiffConfig::default())
        .await
        .unwrap();
    assert_eq!(diffs.len(), 2);
    assert!(diffs.iter().all(|diff| diff.asset_type == AssetType::Fungible && diff.token == Some(DAI)));
}

#[test]
fn test_opaque_log_ignores_interfaces() {
    let data = bytes!("0102030405");
    let decoded = decode_logs(&[opaque(VAULT, data.clone())], LogDecoder::builtin().interfaces());

    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].name, None);
    assert_eq!(decoded[0].args, vec![alloy::dyn_abi::DynSolValue::Bytes(data.to_vec())]);

    let none = decode_logs(&[opaque(VAULT, bytes!(""))], &[]);
    assert_eq!(none.len(), 1);
    assert_eq!(none[0].name, None);
}

#[tokio::test]
async fn test_unreachable_simulator() {
    let simulator: Arc<dyn Simulator> = Arc::new(MockSimulator::unreachable());
    let err = simulate_asset_diffs(&simulator, &reader(), &TokenCache::new(), &[], &request(), &DiffConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DiffError::Transport(_)));
}

#[tokio::test]
async fn test_shared_cache_across_simulations() {
    let cache = TokenCache::new();
    let reader = reader();
    let outcome = SimulationOutcome::succeeded(vec![fungible_transfer(DAI, OWNER, WALLET, 1)], vec![]);
    let simulator = MockSimulator::new(outcome);

    for _ in 0..3 {
        let diffs = simulate_asset_diffs(&simulator, &reader, &cache, &[], &request(), &DiffConfig::default())
            .await
            .unwrap();
        assert_eq!(diffs.len(), 2);
    }
    assert_eq!(simulator.calls(), 3);
    assert_eq!(reader.calls(), 3);
}
