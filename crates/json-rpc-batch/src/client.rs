//! Batch-coalescing JSON-RPC client.
//!
//! This module provides [`BatchClient`], a raw-HTTP JSON-RPC transport that
//! coalesces many calls into a single `[{jsonrpc,id,method,params}, …]` array
//! request, bounded by a configurable maximum batch size, and matches each
//! response back to its originating call by `id`.
//!
//! # Example
//!
//! ```ignore
//! use json_rpc_batch::{BatchClient, Call};
//! use serde_json::json;
//!
//! let client = BatchClient::new("https://rpc.example.com")?;
//!
//! let calls = vec![
//!     Call::new("eth_getBlockByNumber", json!(["0x100", false])),
//!     Call::new("eth_getBlockByNumber", json!(["0x101", false])),
//! ];
//!
//! let results = client.send_batch(calls).await?;
//! for result in results {
//!     match result {
//!         Ok(value) => println!("{value}"),
//!         Err(call_error) => println!("call failed: {call_error}"),
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{BatchError, Result};
use crate::types::{Call, CallOutcome, JsonRpcRequest, JsonRpcResponse};

// ═══════════════════════════════════════════════════════════════════════════════
// BATCH CLIENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Batch-coalescing raw JSON-RPC client.
///
/// # Batching
///
/// [`send_batch`](Self::send_batch) accepts any number of calls. Calls are
/// grouped into chunks no larger than [`ClientConfig::max_batch_size`] and
/// sent as sequential HTTP requests; the returned `Vec<CallOutcome>` preserves
/// the caller's original ordering regardless of how many chunks were needed
/// or what order the server returned results in within each chunk.
///
/// # Failure isolation
///
/// A transport-level failure (connection refused, timeout, malformed JSON)
/// fails the whole call with [`BatchError`]. Once a chunk's HTTP round-trip
/// succeeds, each call's own JSON-RPC result or error is reported
/// independently as a [`CallOutcome`] — one call erroring never poisons its
/// siblings.
///
/// # Thread Safety
///
/// This client is `Send + Sync` and can be shared across tasks.
#[derive(Debug)]
pub struct BatchClient {
    /// HTTP client for JSON-RPC requests.
    client: reqwest::Client,

    /// RPC endpoint URL.
    rpc_url: String,

    /// Request ID counter for JSON-RPC correlation.
    request_id: AtomicU64,

    /// Client configuration.
    config: ClientConfig,
}

impl BatchClient {
    /// Create a new batch client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(rpc_url: impl Into<String>) -> Result<Self> {
        Self::with_config(rpc_url, ClientConfig::default())
    }

    /// Create a new client with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created or if the
    /// configuration is invalid.
    pub fn with_config(rpc_url: impl Into<String>, config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BatchError::Connection(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            request_id: AtomicU64::new(1),
            config,
        })
    }

    /// Get the RPC URL this client is connected to.
    #[must_use]
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Get the current configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn next_request_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Send a single JSON-RPC call.
    ///
    /// Convenience wrapper around [`send_batch`](Self::send_batch) for the
    /// common case of one call at a time.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] on transport failure. A JSON-RPC error returned
    /// by the server for this specific call is surfaced as `Ok(Err(..))`, not
    /// a transport error.
    pub async fn call(&self, method: impl Into<String>, params: serde_json::Value) -> Result<CallOutcome> {
        let mut results = self.send_batch(vec![Call::new(method, params)]).await?;
        Ok(results.remove(0))
    }

    /// Send a batch of JSON-RPC calls, coalescing them into as few HTTP
    /// requests as [`ClientConfig::max_batch_size`] allows.
    ///
    /// Returns one [`CallOutcome`] per input call, in the same order the
    /// calls were given.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] if any chunk's HTTP round-trip fails, times
    /// out, or returns a response that cannot be parsed as a JSON-RPC batch.
    #[instrument(skip(self, calls), fields(call_count = calls.len()))]
    pub async fn send_batch(&self, calls: Vec<Call>) -> Result<Vec<CallOutcome>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let mut results = Vec::with_capacity(calls.len());
        for chunk in calls.chunks(self.config.max_batch_size) {
            debug!(chunk_size = chunk.len(), "sending RPC batch chunk");
            let chunk_results = self.send_chunk(chunk).await?;
            results.extend(chunk_results);
        }

        Ok(results)
    }

    /// Send a single chunk (already bounded by `max_batch_size`) as one HTTP
    /// request and match its responses back to requests by `id`.
    async fn send_chunk(&self, calls: &[Call]) -> Result<Vec<CallOutcome>> {
        let requests: Vec<JsonRpcRequest> = calls
            .iter()
            .map(|call| JsonRpcRequest::new(call.method.clone(), call.params.clone(), self.next_request_id()))
            .collect();

        let body = self.client.post(&self.rpc_url).json(&requests).send().await?;
        let raw: serde_json::Value = body.json().await?;

        let responses: Vec<JsonRpcResponse> = match raw {
            serde_json::Value::Array(_) => serde_json::from_value(raw)?,
            // Some endpoints collapse a single-element batch to a bare object.
            serde_json::Value::Object(_) if requests.len() == 1 => vec![serde_json::from_value(raw)?],
            other => {
                return Err(BatchError::InvalidResponse(format!(
                    "expected a JSON-RPC batch array, got {other}"
                )));
            }
        };

        if responses.len() != requests.len() {
            warn!(
                sent = requests.len(),
                received = responses.len(),
                "RPC endpoint returned a mismatched batch size"
            );
            return Err(BatchError::BatchSizeMismatch {
                sent: requests.len(),
                received: responses.len(),
            });
        }

        let mut by_id: HashMap<u64, JsonRpcResponse> =
            responses.into_iter().map(|r| (r.id, r)).collect();

        let mut results = Vec::with_capacity(requests.len());
        for request in &requests {
            let response = by_id.remove(&request.id).ok_or_else(|| {
                BatchError::InvalidResponse(format!("missing result for request id {}", request.id))
            })?;

            let outcome: CallOutcome = match response.error {
                Some(error) => Err(error),
                None => Ok(response.result.unwrap_or(serde_json::Value::Null)),
            };
            results.push(outcome);
        }

        Ok(results)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn client_creation() {
        let client = BatchClient::new("https://example.com/rpc").expect("client creation failed");
        assert_eq!(client.rpc_url(), "https://example.com/rpc");
    }

    #[tokio::test]
    async fn client_with_custom_config() {
        let config = ClientConfig::default()
            .with_timeout(Duration::from_secs(60))
            .with_max_batch_size(5);

        let client =
            BatchClient::with_config("https://example.com/rpc", config).expect("client creation failed");

        assert_eq!(client.config().timeout, Duration::from_secs(60));
        assert_eq!(client.config().max_batch_size, 5);
    }

    #[tokio::test]
    async fn send_batch_empty_is_noop() {
        let client = BatchClient::new("https://example.com/rpc").expect("client creation failed");
        let results = client.send_batch(Vec::new()).await.expect("send_batch failed");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn single_batch_preserves_order() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"jsonrpc": "2.0", "id": 2, "result": "0x2"},
                {"jsonrpc": "2.0", "id": 1, "result": "0x1"},
            ])))
            .mount(&mock_server)
            .await;

        let client = BatchClient::new(mock_server.uri()).expect("client creation failed");
        let calls = vec![
            Call::new("eth_getBlockByNumber", serde_json::json!(["0x1", false])),
            Call::new("eth_getBlockByNumber", serde_json::json!(["0x2", false])),
        ];

        let results = client.send_batch(calls).await.expect("send_batch failed");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), &serde_json::json!("0x1"));
        assert_eq!(results[1].as_ref().unwrap(), &serde_json::json!("0x2"));
    }

    #[tokio::test]
    async fn per_call_error_is_isolated() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"jsonrpc": "2.0", "id": 1, "result": "0x1"},
                {"jsonrpc": "2.0", "id": 2, "error": {"code": -32000, "message": "execution reverted"}},
            ])))
            .mount(&mock_server)
            .await;

        let client = BatchClient::new(mock_server.uri()).expect("client creation failed");
        let calls = vec![
            Call::new("eth_getBlockByNumber", serde_json::json!(["0x1", false])),
            Call::new("eth_getBlockByNumber", serde_json::json!(["0x2", false])),
        ];

        let results = client.send_batch(calls).await.expect("send_batch failed");
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert_eq!(results[1].as_ref().unwrap_err().code, -32000);
    }

    #[tokio::test]
    async fn chunking_respects_max_batch_size() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"jsonrpc": "2.0", "id": 1, "result": "0x1"},
            ])))
            .expect(3)
            .mount(&mock_server)
            .await;

        let config = ClientConfig::default().with_max_batch_size(1);
        let client = BatchClient::with_config(mock_server.uri(), config).expect("client creation failed");

        let calls = (0..3)
            .map(|i| Call::new("eth_getBlockByNumber", serde_json::json!([format!("0x{i:x}"), false])))
            .collect();

        let results = client.send_batch(calls).await.expect("send_batch failed");
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn batch_size_mismatch_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"jsonrpc": "2.0", "id": 1, "result": "0x1"},
            ])))
            .mount(&mock_server)
            .await;

        let client = BatchClient::new(mock_server.uri()).expect("client creation failed");
        let calls = vec![
            Call::new("eth_getBlockByNumber", serde_json::json!(["0x1", false])),
            Call::new("eth_getBlockByNumber", serde_json::json!(["0x2", false])),
        ];

        let result = client.send_batch(calls).await;
        assert!(matches!(result, Err(BatchError::BatchSizeMismatch { sent: 2, received: 1 })));
    }

    #[tokio::test]
    async fn single_call_convenience() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0", "id": 1, "result": "0x2a"
            })))
            .mount(&mock_server)
            .await;

        let client = BatchClient::new(mock_server.uri()).expect("client creation failed");
        let outcome = client
            .call("eth_chainId", serde_json::json!([]))
            .await
            .expect("call failed");

        assert_eq!(outcome.expect("expected ok result"), serde_json::json!("0x2a"));
    }
}
