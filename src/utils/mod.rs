//! Utility functions for token contract interaction
//!
//! # Modules
//!
//! - [`token_utils`]: Token contract bindings
//!   - Probe calls (`isApprovedForAll`, `symbol`, `decimals`)
//!   - Builtin ERC20/ERC721 event interfaces
//!   - Typed read-only call helper

/// Token contract bindings and builtin interfaces
pub mod token_utils;
