//! Runtime ABI-driven log decoding (module C2).
//!
//! Unlike the teacher's compile-time `alloy::sol!` bindings, a [`Source`]
//! here is bound to an [`Abi`] row loaded from the control-plane database at
//! runtime, so decoding has to work against `alloy::json_abi`/`alloy::
//! dyn_abi` rather than generated Rust types.

use std::collections::HashMap;

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::json_abi::{Event, EventParam, JsonAbi};
use alloy::primitives::B256;
use alloy::rpc::types::Log;
use thiserror::Error;
use tracing::{instrument, warn};

use crate::types::entities::LogMetadata;

/// An ABI's events, indexed by topic0 for fast lookup during decoding.
///
/// Built once per `Abi` row (cached by the control plane per
/// `cache.abi_*` settings) and shared across every log a bound Source
/// fetches.
#[derive(Debug, Clone)]
pub struct AbiIndex {
    contract_name: String,
    events_by_topic0: HashMap<B256, Event>,
}

impl AbiIndex {
    /// Build an index from a parsed ABI.
    ///
    /// Anonymous events are skipped: they have no topic0, so a log can
    /// never be routed to them by signature lookup alone.
    #[must_use]
    pub fn build(abi: &JsonAbi, contract_name: impl Into<String>) -> Self {
        let mut events_by_topic0 = HashMap::new();
        for event in abi.events() {
            if event.anonymous {
                continue;
            }
            events_by_topic0.insert(event.selector(), event.clone());
        }
        Self { contract_name: contract_name.into(), events_by_topic0 }
    }

    /// The contract name this index was built for, for log fields.
    #[must_use]
    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    /// Number of non-anonymous events indexed.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events_by_topic0.len()
    }

    /// Decode a log's metadata against this index.
    ///
    /// # Errors
    /// Returns [`DecodeError::NoTopics`] if the log has no topics at all,
    /// [`DecodeError::UnknownEvent`] if topic0 doesn't match any event in
    /// this ABI, or [`DecodeError::Malformed`] if the log's data doesn't
    /// match the matched event's declared argument types.
    #[instrument(skip(self, log), fields(contract = %self.contract_name))]
    pub fn decode(&self, log: &Log) -> Result<LogMetadata, DecodeError> {
        let topics = log.topics();
        let topic0 = *topics.first().ok_or(DecodeError::NoTopics)?;
        let event = self
            .events_by_topic0
            .get(&topic0)
            .ok_or(DecodeError::UnknownEvent(topic0))?;

        let indexed_params: Vec<&EventParam> = event.inputs.iter().filter(|p| p.indexed).collect();
        let data_params: Vec<&EventParam> = event.inputs.iter().filter(|p| !p.indexed).collect();

        let mut fields = HashMap::with_capacity(event.inputs.len());

        for (param, topic) in indexed_params.iter().zip(topics.iter().skip(1)) {
            let ty = parse_param_type(param, &event.name)?;
            let encoded = if ty.is_dynamic() {
                // Dynamic types (string, bytes, arrays) are hashed into the
                // topic slot per the ABI spec; the original value is not
                // recoverable, so we record the hash itself.
                format!("0x{}", hex::encode(topic.as_slice()))
            } else {
                let value = ty.abi_decode(topic.as_slice()).map_err(|e| DecodeError::Malformed {
                    event: event.name.clone(),
                    cause: e.to_string(),
                })?;
                canonical_encode(&value)
            };
            fields.insert(param.name.clone(), encoded);
        }

        if !data_params.is_empty() {
            let types = data_params
                .iter()
                .map(|p| parse_param_type(p, &event.name))
                .collect::<Result<Vec<_>, _>>()?;
            let tuple_ty = DynSolType::Tuple(types);
            let decoded = tuple_ty.abi_decode(log.data().data.as_ref()).map_err(|e| DecodeError::Malformed {
                event: event.name.clone(),
                cause: e.to_string(),
            })?;
            let DynSolValue::Tuple(values) = decoded else {
                return Err(DecodeError::Malformed {
                    event: event.name.clone(),
                    cause: "expected tuple decode result".into(),
                });
            };
            for (param, value) in data_params.iter().zip(values.iter()) {
                fields.insert(param.name.clone(), canonical_encode(value));
            }
        }

        Ok(LogMetadata { contract: self.contract_name.clone(), event_name: Some(event.name.clone()), fields })
    }

    /// Decode a log leniently: on any failure, log a warning and return
    /// `event_name: "Unknown"` with empty fields instead of propagating an
    /// error.
    ///
    /// This is the default policy (`DecodeFailurePolicy::Lenient`):
    /// indexing must never stall the cursor over one malformed or
    /// unrecognized log.
    #[must_use]
    pub fn decode_lenient(&self, log: &Log) -> LogMetadata {
        match self.decode(log) {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!(error = %err, "log failed to decode, persisting as Unknown");
                LogMetadata {
                    contract: self.contract_name.clone(),
                    event_name: Some("Unknown".to_string()),
                    fields: HashMap::new(),
                }
            }
        }
    }
}

fn parse_param_type(param: &EventParam, event_name: &str) -> Result<DynSolType, DecodeError> {
    param.ty.parse().map_err(|e: alloy::dyn_abi::Error| DecodeError::Malformed {
        event: event_name.to_string(),
        cause: format!("unparseable type '{}' for argument '{}': {e}", param.ty, param.name),
    })
}

/// Canonically encode a decoded value to a string, per the wire encoding
/// table: strings verbatim, integers base-10 (no sign for unsigned), bools
/// as `true`/`false`, addresses as lowercase 0x-hex, bytes as lowercase hex
/// without a 0x prefix, tuples/arrays recursively as JSON.
fn canonical_encode(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::Address(a) => format!("{a:#x}"),
        DynSolValue::FixedBytes(b, size) => hex::encode(&b.0[..*size]),
        DynSolValue::Bytes(b) => hex::encode(b),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) => {
            let json: Vec<String> = values.iter().map(canonical_encode).collect();
            serde_json::to_string(&json).unwrap_or_default()
        }
        DynSolValue::Tuple(values) => {
            let json: Vec<String> = values.iter().map(canonical_encode).collect();
            serde_json::to_string(&json).unwrap_or_default()
        }
        other => format!("{other:?}"),
    }
}

/// Errors from decoding a log against a bound ABI.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The log has no topics, so it cannot carry an event signature.
    #[error("log has no topics")]
    NoTopics,
    /// The log's topic0 doesn't match any event in the bound ABI.
    #[error("no event in ABI matches topic0 {0}")]
    UnknownEvent(B256),
    /// The matched event's declared types don't fit the log's actual data.
    #[error("log data doesn't match declared types for event {event}: {cause}")]
    Malformed {
        /// Name of the event that was matched by topic0.
        event: String,
        /// Underlying decode failure.
        cause: String,
    },
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
