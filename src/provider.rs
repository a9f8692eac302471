//! JSON-RPC backed contract reader
//!
//! Implements [`ContractReader`] with `eth_call` against an alloy provider.

use alloy::{
    eips::BlockId,
    network::TransactionBuilder,
    primitives::{Address, Bytes},
    providers::{DynProvider, Provider, ProviderBuilder, WsConnect},
    rpc::types::TransactionRequest,
    sol_types::decode_revert_reason,
    transports::{RpcError, TransportErrorKind},
};
use async_trait::async_trait;

use crate::{
    errors::{CallError, TransportError},
    traits::ContractReader,
};

/// [`ContractReader`] issuing `eth_call` requests
///
/// Calls execute against `block`, the latest block unless pinned with
/// [`RpcContractReader::at_block`].
#[derive(Debug, Clone)]
pub struct RpcContractReader<P> {
    provider: P,
    block: BlockId,
}

impl<P: Provider> RpcContractReader<P> {
    pub fn new(provider: P) -> Self {
        Self { provider, block: BlockId::latest() }
    }

    /// Pins every call to `block`
    pub fn at_block(mut self, block: BlockId) -> Self {
        self.block = block;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl RpcContractReader<DynProvider> {
    /// Connects to `rpc_url` over HTTP(S), or WebSocket for any other scheme
    pub async fn connect(rpc_url: &str) -> Result<Self, TransportError> {
        let provider = if rpc_url.starts_with("http") {
            let url = rpc_url.parse().map_err(|e| TransportError::new(rpc_url, format!("invalid RPC URL: {e}")))?;
            ProviderBuilder::new().connect_http(url).erased()
        } else {
            ProviderBuilder::new()
                .connect_ws(WsConnect::new(rpc_url))
                .await
                .map_err(|e| TransportError::new(rpc_url, format!("failed to connect: {e}")))?
                .erased()
        };
        Ok(Self::new(provider))
    }
}

#[async_trait]
impl<P: Provider> ContractReader for RpcContractReader<P> {
    async fn call(&self, contract: Address, input: Bytes) -> Result<Bytes, CallError> {
        let tx = TransactionRequest::default().with_to(contract).with_input(input);
        self.provider
            .call(tx)
            .block(self.block)
            .await
            .map_err(|err| call_error(contract, err))
    }
}

/// JSON-RPC error code nodes use for failed call execution
const EXECUTION_ERROR: i64 = 3;

/// Splits RPC failures into calls the node executed and rejected, and
/// failures to get an answer at all
///
/// Error responses count as rejections only when they carry revert data, use
/// the execution error code, or say the call reverted. Rate limits, missing
/// state and internal node errors stay transport failures.
fn call_error(contract: Address, err: RpcError<TransportErrorKind>) -> CallError {
    match err {
        RpcError::ErrorResp(payload) => {
            let revert_data = payload.as_revert_data();
            let executed = revert_data.is_some()
                || payload.code == EXECUTION_ERROR
                || payload.message.to_lowercase().contains("revert");
            if !executed {
                return TransportError::new(contract, format!("{} (code {})", payload.message, payload.code)).into();
            }
            let reason = revert_data
                .and_then(|data| decode_revert_reason(&data))
                .unwrap_or_else(|| payload.message.to_string());
            CallError::Reverted { reason: Some(reason) }
        }
        other => TransportError::new(contract, other).into(),
    }
}
