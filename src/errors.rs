//! Error types for simulation asset-diff reconstruction
//!
//! This module defines the error taxonomy of the pipeline:
//! - Simulation reverts, surfaced verbatim and short-circuiting aggregation
//! - Transport failures reaching the simulator or a contract
//! - Per-call failures of read-only probes, recovered by the classifier
//! - Log decode misses, reported only inside the decoder
//!
//! Decode misses never reach the caller: unmatched logs are dropped.

use thiserror::Error;

/// Top-level error type returned to callers of the aggregation
#[derive(Debug, Error)]
pub enum DiffError {
    /// The simulated transaction reverted; carries the provider's message unchanged
    #[error("{0}")]
    Revert(String),

    /// The simulator or a contract could not be reached
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The simulation provider returned a payload that could not be interpreted
    #[error("Malformed simulation response: {0}")]
    Response(String),
}

impl DiffError {
    /// Check if this error is a simulation revert
    pub fn is_revert(&self) -> bool {
        matches!(self, DiffError::Revert(_))
    }
}

/// Inability to reach a remote collaborator
///
/// # Fields
/// * `target` - Provider URL or contract address that failed
/// * `reason` - Detailed error message
#[derive(Debug, Clone, Error)]
#[error("{target}: {reason}")]
pub struct TransportError {
    pub target: String,
    pub reason: String,
}

impl TransportError {
    pub fn new(target: impl ToString, reason: impl ToString) -> Self {
        Self { target: target.to_string(), reason: reason.to_string() }
    }
}

/// Failure of a single read-only contract call
#[derive(Debug, Clone, Error)]
pub enum CallError {
    /// The contract was reached but the call did not succeed
    #[error("Call reverted{}", .reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    Reverted {
        reason: Option<String>,
    },

    /// The call returned data that does not match the expected return type
    #[error("Failed to decode return data: {0}")]
    Decode(String),

    /// The contract could not be reached at all
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CallError {
    /// Returns the transport failure, if this error is one
    pub fn into_transport(self) -> Option<TransportError> {
        match self {
            CallError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

/// Reason a log did not decode against an event definition
///
/// Never surfaced to callers of the aggregation: a log that matches no
/// interface is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// No event of the interface carries the log's selector
    #[error("No event matches selector {0}")]
    UnknownSelector(String),

    /// Topic count does not match the event's indexed parameters
    #[error("Expected {expected} topics, found {actual}")]
    TopicCount {
        expected: usize,
        actual: usize,
    },

    /// A parameter type could not be resolved or its value failed to decode
    #[error("ABI decoding failed: {0}")]
    Abi(String),
}
