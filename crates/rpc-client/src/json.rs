//! JSON-RPC-backed [`RpcClient`] implementation, built on [`json_rpc_batch::BatchClient`].
//!
//! # Example
//!
//! ```ignore
//! use rpc_client::{JsonRpcClient, RpcClient};
//!
//! let client = JsonRpcClient::new("https://rpc.example.com").await?;
//! let head = client.head_block().await?;
//! ```

use alloy::primitives::B256;
use alloy::rpc::types::Log;
use async_trait::async_trait;
use json_rpc_batch::{BatchClient, Call, ClientConfig};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::error::{Result, RpcError};
use crate::traits::RpcClient;
use crate::types::{BlockHeader, LogFilter, RpcTransaction};

/// A production [`RpcClient`] that talks raw JSON-RPC over HTTP, batching
/// calls through [`json_rpc_batch::BatchClient`].
#[derive(Debug)]
pub struct JsonRpcClient {
    batch: BatchClient,
    chain_id: u64,
}

impl JsonRpcClient {
    /// Connect to the given RPC endpoint, querying its chain ID immediately.
    pub async fn new(rpc_url: impl Into<String>) -> Result<Self> {
        Self::with_config(rpc_url, ClientConfig::default()).await
    }

    /// Connect with a custom [`ClientConfig`] (timeout, max batch size).
    pub async fn with_config(rpc_url: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let batch = BatchClient::with_config(rpc_url, config).map_err(RpcError::from)?;
        let chain_id = fetch_chain_id(&batch).await?;
        debug!(chain_id, "connected to EVM endpoint");
        Ok(Self { batch, chain_id })
    }

    /// Create a client against a known chain ID without querying it,
    /// verifying the reported chain ID matches on first use instead.
    pub fn new_unchecked(rpc_url: impl Into<String>, chain_id: u64) -> Result<Self> {
        let batch = BatchClient::new(rpc_url).map_err(RpcError::from)?;
        Ok(Self { batch, chain_id })
    }
}

async fn fetch_chain_id(batch: &BatchClient) -> Result<u64> {
    let outcome = batch.call("eth_chainId", json!([])).await.map_err(RpcError::from)?;
    let hex = outcome?;
    parse_hex_u64(&hex)
}

fn parse_hex_u64(value: &Value) -> Result<u64> {
    let s = value
        .as_str()
        .ok_or_else(|| RpcError::Fatal(format!("expected hex string, got {value}")))?;
    u64::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|e| RpcError::Fatal(format!("invalid hex integer {s}: {e}")))
}

fn block_header_params(number: u64) -> Value {
    json!([format!("0x{number:x}"), false])
}

fn parse_block_header(value: &Value) -> Result<BlockHeader> {
    if value.is_null() {
        return Err(RpcError::Fatal("block not found".into()));
    }
    let number = value
        .get("number")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::Fatal("block response missing number".into()))?;
    let number = u64::from_str_radix(number.trim_start_matches("0x"), 16)
        .map_err(|e| RpcError::Fatal(format!("invalid block number: {e}")))?;

    let hash = value
        .get("hash")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::Fatal("block response missing hash".into()))?
        .parse::<B256>()
        .map_err(|e| RpcError::Fatal(format!("invalid block hash: {e}")))?;

    let parent_hash = value
        .get("parentHash")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::Fatal("block response missing parentHash".into()))?
        .parse::<B256>()
        .map_err(|e| RpcError::Fatal(format!("invalid parent hash: {e}")))?;

    let timestamp = value
        .get("timestamp")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::Fatal("block response missing timestamp".into()))?;
    let timestamp = u64::from_str_radix(timestamp.trim_start_matches("0x"), 16)
        .map_err(|e| RpcError::Fatal(format!("invalid timestamp: {e}")))?;

    Ok(BlockHeader { number, hash, parent_hash, timestamp })
}

fn parse_transaction(value: &Value) -> Result<RpcTransaction> {
    if value.is_null() {
        return Err(RpcError::Fatal("transaction not found".into()));
    }
    serde_json::from_value::<RawTransaction>(value.clone())
        .map_err(|e| RpcError::Fatal(format!("malformed transaction response: {e}")))
        .and_then(RawTransaction::try_into)
}

/// Raw wire shape of `eth_getTransactionByHash`, using hex-string fields the
/// way geth-compatible nodes emit them.
#[derive(Debug, serde::Deserialize)]
struct RawTransaction {
    hash: B256,
    #[serde(rename = "blockNumber")]
    block_number: String,
    #[serde(rename = "blockHash")]
    block_hash: B256,
    #[serde(rename = "transactionIndex")]
    tx_index: String,
    from: alloy::primitives::Address,
    to: Option<alloy::primitives::Address>,
    input: alloy::primitives::Bytes,
    value: alloy::primitives::U256,
    nonce: String,
}

impl TryFrom<RawTransaction> for RpcTransaction {
    type Error = RpcError;

    fn try_from(raw: RawTransaction) -> Result<Self> {
        let block_number = u64::from_str_radix(raw.block_number.trim_start_matches("0x"), 16)
            .map_err(|e| RpcError::Fatal(format!("invalid blockNumber: {e}")))?;
        let tx_index = u64::from_str_radix(raw.tx_index.trim_start_matches("0x"), 16)
            .map_err(|e| RpcError::Fatal(format!("invalid transactionIndex: {e}")))?;
        let nonce = u64::from_str_radix(raw.nonce.trim_start_matches("0x"), 16)
            .map_err(|e| RpcError::Fatal(format!("invalid nonce: {e}")))?;

        Ok(Self {
            hash: raw.hash,
            block_number,
            block_hash: raw.block_hash,
            tx_index,
            from: raw.from,
            to: raw.to,
            input: raw.input,
            value: raw.value,
            nonce,
        })
    }
}

fn log_filter_params(filter: &LogFilter) -> Value {
    let mut params = serde_json::Map::new();
    params.insert("fromBlock".into(), json!(format!("0x{:x}", filter.from_block)));
    params.insert("toBlock".into(), json!(format!("0x{:x}", filter.to_block)));
    if !filter.addresses.is_empty() {
        params.insert("address".into(), json!(filter.addresses));
    }
    if !filter.topics.is_empty() {
        let topics: Vec<Value> = filter
            .topics
            .iter()
            .map(|position| match position.len() {
                0 => Value::Null,
                1 => json!(position[0]),
                _ => json!(position),
            })
            .collect();
        params.insert("topics".into(), json!(topics));
    }
    json!([Value::Object(params)])
}

#[async_trait]
impl RpcClient for JsonRpcClient {
    #[instrument(skip(self), fields(chain_id = self.chain_id))]
    async fn head_block(&self) -> Result<BlockHeader> {
        let outcome = self
            .batch
            .call("eth_getBlockByNumber", json!(["latest", false]))
            .await
            .map_err(RpcError::from)?;
        parse_block_header(&outcome?)
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.chain_id)
    }

    #[instrument(skip(self, filter), fields(chain_id = self.chain_id, from = filter.from_block, to = filter.to_block))]
    async fn get_logs(&self, filter: LogFilter) -> Result<Vec<Log>> {
        let outcome = self
            .batch
            .call("eth_getLogs", log_filter_params(&filter))
            .await
            .map_err(RpcError::from)?;
        let value = outcome?;
        serde_json::from_value(value).map_err(|e| RpcError::Fatal(format!("malformed logs response: {e}")))
    }

    #[instrument(skip(self, hashes), fields(chain_id = self.chain_id, count = hashes.len()))]
    async fn batch_txs(&self, hashes: &[B256]) -> Result<Vec<RpcTransaction>> {
        let calls = hashes
            .iter()
            .map(|hash| Call::new("eth_getTransactionByHash", json!([hash])))
            .collect();
        let outcomes = self.batch.send_batch(calls).await.map_err(RpcError::from)?;
        outcomes
            .into_iter()
            .map(|outcome| outcome.map_err(RpcError::from).and_then(|v| parse_transaction(&v)))
            .collect()
    }

    #[instrument(skip(self, numbers), fields(chain_id = self.chain_id, count = numbers.len()))]
    async fn batch_headers(&self, numbers: &[u64]) -> Result<Vec<BlockHeader>> {
        let calls = numbers
            .iter()
            .map(|number| Call::new("eth_getBlockByNumber", block_header_params(*number)))
            .collect();
        let outcomes = self.batch.send_batch(calls).await.map_err(RpcError::from)?;
        outcomes
            .into_iter()
            .map(|outcome| outcome.map_err(RpcError::from).and_then(|v| parse_block_header(&v)))
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
