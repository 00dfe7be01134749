//! Request and response types for the batch JSON-RPC transport.
//!
//! This module defines the data structures passed to and returned from
//! [`BatchClient::send_batch`](crate::BatchClient::send_batch):
//!
//! - [`Call`] - a single JSON-RPC method call to include in a batch
//! - [`CallOutcome`] - the per-call result, isolating a single call's RPC
//!   error from the rest of the batch
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`] - the wire format

use serde::{Deserialize, Serialize};

use crate::error::CallError;

// ═══════════════════════════════════════════════════════════════════════════════
// CALLS
// ═══════════════════════════════════════════════════════════════════════════════

/// A single JSON-RPC method call to submit as part of a batch.
///
/// # Example
///
/// ```
/// use json_rpc_batch::Call;
/// use serde_json::json;
///
/// let call = Call::new("eth_getBlockByNumber", json!(["0x100", false]));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Call {
    /// The JSON-RPC method name, e.g. `"eth_getLogs"`.
    pub method: String,

    /// The method's positional parameters, encoded as a JSON array.
    pub params: serde_json::Value,
}

impl Call {
    /// Create a new call.
    #[must_use]
    pub fn new(method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

/// The outcome of a single call within a batch.
///
/// A transport-level failure (connection refused, timeout, malformed batch
/// response) fails the whole [`send_batch`](crate::BatchClient::send_batch)
/// call with [`BatchError`](crate::BatchError). Once the transport succeeds,
/// each call's own JSON-RPC result or error is reported independently here —
/// one call failing with a [`CallError`] never affects its siblings.
pub type CallOutcome = Result<serde_json::Value, CallError>;

// ═══════════════════════════════════════════════════════════════════════════════
// WIRE FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

/// JSON-RPC request structure.
#[derive(Debug, Serialize)]
pub(crate) struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: serde_json::Value,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(method: String, params: serde_json::Value, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
            id,
        }
    }
}

/// JSON-RPC response wrapper for extracting a result or error by `id`.
#[derive(Debug, Deserialize)]
pub(crate) struct JsonRpcResponse {
    pub id: u64,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<CallError>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_construction() {
        let call = Call::new("eth_blockNumber", serde_json::json!([]));
        assert_eq!(call.method, "eth_blockNumber");
        assert_eq!(call.params, serde_json::json!([]));
    }

    #[test]
    fn request_serialization() {
        let request = JsonRpcRequest::new("eth_chainId".into(), serde_json::json!([]), 7);
        let json = serde_json::to_string(&request).expect("serialization failed");

        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"eth_chainId\""));
        assert!(json.contains("\"id\":7"));
    }

    #[test]
    fn response_deserialization_result() {
        let json = r#"{"jsonrpc":"2.0","id":1,"result":"0x10"}"#;
        let response: JsonRpcResponse = serde_json::from_str(json).expect("deserialization failed");

        assert_eq!(response.id, 1);
        assert_eq!(response.result, Some(serde_json::json!("0x10")));
        assert!(response.error.is_none());
    }

    #[test]
    fn response_deserialization_error() {
        let json = r#"{"jsonrpc":"2.0","id":2,"error":{"code":-32601,"message":"Method not found"}}"#;
        let response: JsonRpcResponse = serde_json::from_str(json).expect("deserialization failed");

        assert_eq!(response.id, 2);
        assert!(response.result.is_none());
        let error = response.error.expect("expected error");
        assert_eq!(error.code, -32601);
    }
}
