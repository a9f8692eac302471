//! Collaborator traits for simulation and contract queries
//!
//! This module provides the seams to the outside world:
//! - `ContractReader`: read-only contract calls used to probe tokens
//! - `Simulator`: the provider that dry-runs a transaction
//!
//! Both are object safe, so callers can hand in `&dyn ContractReader` or
//! `Arc<dyn Simulator>` as well as concrete types.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;

use crate::{
    errors::{CallError, DiffError},
    simulation::{SimulationOutcome, SimulationRequest},
};

/// Read-only contract call capability
///
/// Implementors must distinguish a call the contract rejected
/// ([`CallError::Reverted`]) from a contract that could not be reached
/// ([`CallError::Transport`]): the former is recovered by the token
/// classifier, the latter aborts the aggregation.
#[async_trait]
pub trait ContractReader: Send + Sync {
    /// Executes `input` against `contract` without committing state
    async fn call(&self, contract: Address, input: Bytes) -> Result<Bytes, CallError>;
}

#[async_trait]
impl<T> ContractReader for Arc<T>
where
    T: ContractReader + ?Sized,
{
    async fn call(&self, contract: Address, input: Bytes) -> Result<Bytes, CallError> {
        (**self).call(contract, input).await
    }
}

/// Transaction simulation provider
///
/// A reverted simulation is a successful call returning an outcome whose
/// `revert` is set; `Err` is reserved for failures to obtain an outcome.
#[async_trait]
pub trait Simulator: Send + Sync {
    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationOutcome, DiffError>;
}

#[async_trait]
impl<T> Simulator for Arc<T>
where
    T: Simulator + ?Sized,
{
    async fn simulate(&self, request: &SimulationRequest) -> Result<SimulationOutcome, DiffError> {
        (**self).simulate(request).await
    }
}
