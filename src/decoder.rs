//! Event log decoding against an ordered list of interfaces
//!
//! Each raw log is matched against the interfaces in priority order; the first
//! interface that decodes it without error wins. Logs without topics are kept as
//! opaque payloads, and logs that no interface understands are dropped.
//!
//! # Example
//!
//! ```no_run
//! use sim_asset_diff::decoder::{EventInterface, LogDecoder};
//!
//! # fn example(abi_json: &str, raw_logs: &[sim_asset_diff::types::RawLog]) -> Result<(), serde_json::Error> {
//! // Caller interfaces are tried before the builtin ERC20/ERC721 ones
//! let vault = EventInterface::from_json("Vault", abi_json)?;
//! let decoder = LogDecoder::with_builtins([vault]);
//! for log in decoder.decode_logs(raw_logs) {
//!     println!("{:?} emitted {:?}", log.address, log.name);
//! }
//! # Ok(())
//! # }
//! ```

use alloy::{
    dyn_abi::{DynSolValue, EventExt},
    json_abi::{Event, JsonAbi},
    primitives::B256,
};
use tracing::trace;

use crate::{
    errors::DecodeError,
    types::{DecodedLog, RawLog, TransferEvent},
    utils::token_utils::BUILTIN_INTERFACES,
};

/// Named, ordered set of event definitions
#[derive(Debug, Clone, PartialEq)]
pub struct EventInterface {
    name: String,
    events: Vec<Event>,
}

/// Event values decoded by an [`EventInterface`]
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedEvent {
    pub name: String,
    pub signature: String,
    pub args: Vec<DynSolValue>,
}

impl EventInterface {
    pub fn new(name: impl Into<String>, events: Vec<Event>) -> Self {
        Self { name: name.into(), events }
    }

    /// Collects the events of a JSON ABI; functions and errors are ignored
    pub fn from_abi(name: impl Into<String>, abi: &JsonAbi) -> Self {
        Self::new(name, abi.events().cloned().collect())
    }

    /// Parses a JSON ABI document and collects its events
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, serde_json::Error> {
        let abi: JsonAbi = serde_json::from_str(json)?;
        Ok(Self::from_abi(name, &abi))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Decodes a log against the first declared event that accepts it
    ///
    /// Non-anonymous events are only attempted when their selector equals
    /// `topics[0]`; anonymous events are attempted against every log.
    pub fn decode(&self, topics: &[B256], data: &[u8]) -> Result<MatchedEvent, DecodeError> {
        let selector = topics.first();
        let mut last_error = None;
        for event in &self.events {
            if !event.anonymous && selector != Some(&event.selector()) {
                continue;
            }
            match decode_event(event, topics, data) {
                Ok(args) => {
                    return Ok(MatchedEvent {
                        name: event.name.clone(),
                        signature: event.signature(),
                        args,
                    })
                }
                Err(err) => last_error = Some(err),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            DecodeError::UnknownSelector(selector.map(|s| s.to_string()).unwrap_or_default())
        }))
    }
}

/// Decodes the topics and data of a log against a single event definition
///
/// Values are returned in declaration order. Indexed parameters of reference
/// type (strings, bytes, arrays, tuples) are only available as their topic hash.
pub fn decode_event(event: &Event, topics: &[B256], data: &[u8]) -> Result<Vec<DynSolValue>, DecodeError> {
    let expected = event.num_topics();
    if topics.len() != expected {
        return Err(DecodeError::TopicCount { expected, actual: topics.len() });
    }

    let decoded = event
        .decode_log_parts(topics.iter().copied(), data)
        .map_err(|e| DecodeError::Abi(e.to_string()))?;

    let mut indexed = decoded.indexed.into_iter();
    let mut body = decoded.body.into_iter();
    event
        .inputs
        .iter()
        .map(|param| if param.indexed { indexed.next() } else { body.next() })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| DecodeError::Abi(format!("parameter count mismatch for {}", event.name)))
}

/// Decoder over an ordered list of interfaces
#[derive(Debug, Clone, Default)]
pub struct LogDecoder {
    interfaces: Vec<EventInterface>,
}

impl LogDecoder {
    /// Creates a decoder that tries `interfaces` in the given order
    pub fn new(interfaces: Vec<EventInterface>) -> Self {
        Self { interfaces }
    }

    /// Creates a decoder over the builtin ERC20 and ERC721 interfaces only
    pub fn builtin() -> Self {
        Self { interfaces: BUILTIN_INTERFACES.clone() }
    }

    /// Creates a decoder that tries `interfaces` first, then the builtin
    /// ERC20 and ERC721 interfaces
    pub fn with_builtins(interfaces: impl IntoIterator<Item = EventInterface>) -> Self {
        let interfaces = interfaces
            .into_iter()
            .chain(BUILTIN_INTERFACES.iter().cloned())
            .collect();
        Self { interfaces }
    }

    pub fn interfaces(&self) -> &[EventInterface] {
        &self.interfaces
    }

    /// Decodes a single log; `None` when no interface matches
    pub fn decode_log(&self, raw: &RawLog) -> Option<DecodedLog> {
        let Some(topics) = &raw.topics else {
            return Some(DecodedLog::opaque(raw.address, raw.data.clone()));
        };

        for interface in &self.interfaces {
            match interface.decode(topics, &raw.data) {
                Ok(matched) => {
                    let transfer = (matched.name == "Transfer")
                        .then(|| TransferEvent::from_args(&matched.args))
                        .flatten();
                    return Some(DecodedLog {
                        address: raw.address,
                        name: Some(matched.name),
                        signature: Some(matched.signature),
                        args: matched.args,
                        transfer,
                    });
                }
                Err(err) => {
                    trace!(address = %raw.address, interface = interface.name(), %err, "interface did not match log");
                }
            }
        }
        trace!(address = %raw.address, "dropping log that matched no interface");
        None
    }

    /// Decodes all logs, preserving order and dropping unmatched ones
    pub fn decode_logs(&self, raw_logs: &[RawLog]) -> Vec<DecodedLog> {
        raw_logs.iter().filter_map(|raw| self.decode_log(raw)).collect()
    }
}

/// Decodes `raw_logs` against `interfaces` in priority order
pub fn decode_logs(raw_logs: &[RawLog], interfaces: &[EventInterface]) -> Vec<DecodedLog> {
    LogDecoder::new(interfaces.to_vec()).decode_logs(raw_logs)
}
