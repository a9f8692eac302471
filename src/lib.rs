//! # Simulated Transaction Asset Diffs
//!
//! A library for reconstructing who gained and lost what in a simulated EVM
//! transaction, from the raw event logs and native balance deltas a simulation
//! provider reports.
//!
//! ## Core Features
//!
//! - **Log Decoding**
//!   - Caller-supplied ABIs tried before builtin ERC20/ERC721 interfaces
//!   - First matching interface wins, unmatched logs are dropped
//!   - Topicless logs carried through with their raw data
//!
//! - **Token Classification**
//!   - On-chain probing of `isApprovedForAll`, `symbol` and `decimals`
//!   - Concurrent probes with a shared, caller-owned cache
//!
//! - **Asset Accounting**
//!   - Native balance deltas
//!   - Netted fungible transfers per token and holder
//!   - Collapsed non-fungible ownership changes per token id
//!
//! ## Features
//!
//! - `rustls-tls`: Uses rustls as the TLS implementation instead of native-tls (OpenSSL).
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sim_asset_diff::{
//!     simulate_asset_diffs, DiffConfig, DiffError, RpcContractReader, SimulationOutcome,
//!     SimulationRequest, SimulationResponse, Simulator, TokenCache,
//! };
//! use alloy::primitives::{address, bytes, U256};
//! use async_trait::async_trait;
//!
//! struct Replay(String);
//!
//! #[async_trait]
//! impl Simulator for Replay {
//!     async fn simulate(&self, _: &SimulationRequest) -> Result<SimulationOutcome, DiffError> {
//!         SimulationResponse::from_json(&self.0)?.into_outcome()
//!     }
//! }
//!
//! # async fn example(response: String) -> anyhow::Result<()> {
//! let reader = RpcContractReader::connect("https://eth.llamarpc.com").await?;
//! let cache = TokenCache::new();
//! let request = SimulationRequest::exec(
//!     1,
//!     address!("C255fC198eEdAC7AF8aF0f6e0ca781794B094A61"),
//!     address!("d878229c9c3575F224784DE610911B5607a3ad15"),
//!     bytes!("6080604052"),
//!     U256::ZERO,
//!     U256::ZERO,
//!     1_000_000,
//! );
//!
//! match simulate_asset_diffs(&Replay(response), &reader, &cache, &[], &request, &DiffConfig::for_chain(1)).await {
//!     Ok(diffs) => {
//!         for diff in diffs {
//!             println!("{diff}");
//!         }
//!     }
//!     Err(err) if err.is_revert() => println!("Transaction reverted: {err}"),
//!     Err(err) => return Err(err.into()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - `types`: Core data structures and configuration
//! - `errors`: Error types and handling
//! - `traits`: Simulator and contract-reader seams
//! - `decoder`: Event log decoding
//! - `metadata`: Token classification and caching
//! - `aggregator`: Asset-diff accounting
//! - `simulation`: Simulation requests, provider responses and the end-to-end flow
//! - `provider`: JSON-RPC contract reader
//! - `utils`: Token contract bindings

pub mod types;
pub mod errors;
pub mod traits;
pub mod decoder;
pub mod metadata;
pub mod aggregator;
pub mod simulation;
pub mod provider;
pub mod utils;

// Re-export only the essential types and functions
pub use aggregator::{create_asset_diffs, diffs_from_metadata, FungibleLedger, NftOwnership};
pub use decoder::{decode_logs, EventInterface, LogDecoder};
pub use errors::{CallError, DiffError, TransportError};
pub use metadata::{classify_tokens, TokenCache};
pub use provider::RpcContractReader;
pub use simulation::{simulate_asset_diffs, SimulationOutcome, SimulationRequest, SimulationResponse};
pub use traits::{ContractReader, Simulator};
pub use types::{AssetDiff, AssetType, BalanceDiff, DecodedLog, DiffConfig, RawLog, TokenMetadata, TokenType};
