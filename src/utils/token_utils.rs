//! Token contract bindings and builtin event interfaces
//!
//! Provides the read-only probe calls used to classify tokens and the ERC20/ERC721
//! event definitions every decoder falls back to after caller-supplied ABIs.

use alloy::{
    json_abi::{Event, EventParam},
    primitives::Address,
    sol,
    sol_types::SolCall,
};
use once_cell::sync::Lazy;

use crate::{decoder::EventInterface, errors::CallError, traits::ContractReader};

// Probe interface
//
// Generates Rust bindings for:
// - isApprovedForAll(address,address): ERC721/ERC1155 operator check, used as the type probe
// - symbol(): Returns token symbol
// - decimals(): Returns token decimal places
sol! {
    function isApprovedForAll(address owner, address operator) public view returns (bool);
    function symbol() public view returns (string);
    function decimals() public view returns (uint8);
}

/// Builtin interfaces in priority order: ERC20, then ERC721
///
/// Both declare `Transfer(address,address,uint256)`; they differ in whether the
/// third parameter is indexed, so a log decodes against exactly one of them.
pub static BUILTIN_INTERFACES: Lazy<Vec<EventInterface>> = Lazy::new(|| {
    vec![
        EventInterface::new(
            "ERC20",
            vec![
                event("Transfer", &[("address", "from", true), ("address", "to", true), ("uint256", "value", false)]),
                event("Approval", &[("address", "owner", true), ("address", "spender", true), ("uint256", "value", false)]),
            ],
        ),
        EventInterface::new(
            "ERC721",
            vec![
                event("Transfer", &[("address", "from", true), ("address", "to", true), ("uint256", "tokenId", true)]),
                event("Approval", &[("address", "owner", true), ("address", "approved", true), ("uint256", "tokenId", true)]),
                event("ApprovalForAll", &[("address", "owner", true), ("address", "operator", true), ("bool", "approved", false)]),
            ],
        ),
    ]
});

fn event(name: &str, params: &[(&str, &str, bool)]) -> Event {
    Event {
        name: name.to_string(),
        inputs: params
            .iter()
            .map(|(ty, name, indexed)| EventParam {
                ty: ty.to_string(),
                name: name.to_string(),
                indexed: *indexed,
                components: Vec::new(),
                internal_type: None,
            })
            .collect(),
        anonymous: false,
    }
}

/// Executes a typed read-only call and decodes its return value
///
/// # Returns
/// - `Ok(C::Return)`: Decoded return value
/// - `Err(CallError::Decode)`: The contract answered with data of the wrong shape
/// - `Err(CallError::Reverted | CallError::Transport)`: As reported by the reader
pub async fn call_contract<R, C>(reader: &R, contract: Address, call: C) -> Result<C::Return, CallError>
where
    R: ContractReader + ?Sized,
    C: SolCall,
{
    let input = call.abi_encode().into();
    let output = reader.call(contract, input).await?;
    C::abi_decode_returns(&output).map_err(|e| CallError::Decode(e.to_string()))
}
