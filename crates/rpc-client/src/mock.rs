//! In-memory [`RpcClient`] implementation for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use alloy::primitives::B256;
use alloy::rpc::types::Log;
use async_trait::async_trait;

use crate::error::{Result, RpcError};
use crate::traits::RpcClient;
use crate::types::{BlockHeader, LogFilter, RpcTransaction};

/// A mock [`RpcClient`] backed by in-memory state, configurable via setters.
///
/// Unregistered lookups return [`RpcError::Fatal`], mirroring how a real
/// endpoint responds to a hash or block number it has no data for.
#[derive(Debug)]
pub struct MockRpcClient {
    chain_id: u64,
    head: RwLock<BlockHeader>,
    headers_by_number: RwLock<HashMap<u64, BlockHeader>>,
    txs_by_hash: RwLock<HashMap<B256, RpcTransaction>>,
    logs: RwLock<Vec<Log>>,
    call_count: AtomicU64,
}

impl MockRpcClient {
    /// Create a new mock for the given chain ID, with a zero-value genesis
    /// head block.
    #[must_use]
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            head: RwLock::new(BlockHeader {
                number: 0,
                hash: B256::ZERO,
                parent_hash: B256::ZERO,
                timestamp: 0,
            }),
            headers_by_number: RwLock::new(HashMap::new()),
            txs_by_hash: RwLock::new(HashMap::new()),
            logs: RwLock::new(Vec::new()),
            call_count: AtomicU64::new(0),
        }
    }

    /// Set the current chain head and register it as a fetchable header.
    pub fn set_head(&self, number: u64, hash: B256) {
        let header = BlockHeader {
            number,
            hash,
            parent_hash: B256::ZERO,
            timestamp: 0,
        };
        *self.head.write().expect("lock poisoned") = header.clone();
        self.headers_by_number
            .write()
            .expect("lock poisoned")
            .insert(number, header);
    }

    /// Register a header fetchable by `batch_headers`.
    pub fn register_header(&self, header: BlockHeader) {
        self.headers_by_number
            .write()
            .expect("lock poisoned")
            .insert(header.number, header);
    }

    /// Register a transaction fetchable by `batch_txs`.
    pub fn register_tx(&self, tx: RpcTransaction) {
        self.txs_by_hash
            .write()
            .expect("lock poisoned")
            .insert(tx.hash, tx);
    }

    /// Register logs returned unconditionally by `get_logs`, regardless of
    /// the filter passed.
    pub fn set_logs(&self, logs: Vec<Log>) {
        *self.logs.write().expect("lock poisoned") = logs;
    }

    /// Number of trait methods invoked on this mock so far.
    #[must_use]
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl Default for MockRpcClient {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl RpcClient for MockRpcClient {
    async fn head_block(&self) -> Result<BlockHeader> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.head.read().expect("lock poisoned").clone())
    }

    async fn chain_id(&self) -> Result<u64> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain_id)
    }

    async fn get_logs(&self, _filter: LogFilter) -> Result<Vec<Log>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.logs.read().expect("lock poisoned").clone())
    }

    async fn batch_txs(&self, hashes: &[B256]) -> Result<Vec<RpcTransaction>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let registered = self.txs_by_hash.read().expect("lock poisoned");
        hashes
            .iter()
            .map(|hash| {
                registered
                    .get(hash)
                    .cloned()
                    .ok_or_else(|| RpcError::Fatal(format!("no mock transaction registered for {hash}")))
            })
            .collect()
    }

    async fn batch_headers(&self, numbers: &[u64]) -> Result<Vec<BlockHeader>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let registered = self.headers_by_number.read().expect("lock poisoned");
        numbers
            .iter()
            .map(|number| {
                registered
                    .get(number)
                    .cloned()
                    .ok_or_else(|| RpcError::Fatal(format!("no mock header registered for block {number}")))
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chain_id_matches_construction() {
        let mock = MockRpcClient::new(42);
        assert_eq!(mock.chain_id().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn head_block_defaults_to_zero() {
        let mock = MockRpcClient::new(1);
        let head = mock.head_block().await.unwrap();
        assert_eq!(head.number, 0);
    }

    #[tokio::test]
    async fn set_head_updates_head_and_header_lookup() {
        let mock = MockRpcClient::new(1);
        mock.set_head(500, B256::repeat_byte(0xaa));

        let head = mock.head_block().await.unwrap();
        assert_eq!(head.number, 500);

        let headers = mock.batch_headers(&[500]).await.unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].number, 500);
    }

    #[tokio::test]
    async fn batch_txs_returns_in_input_order() {
        let mock = MockRpcClient::new(1);
        let first = B256::repeat_byte(0x01);
        let second = B256::repeat_byte(0x02);
        mock.register_tx(tx_fixture(second, 2));
        mock.register_tx(tx_fixture(first, 1));

        let results = mock.batch_txs(&[first, second]).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].hash, first);
        assert_eq!(results[1].hash, second);
    }

    #[tokio::test]
    async fn batch_txs_fails_whole_call_on_missing_entry() {
        let mock = MockRpcClient::new(1);
        let known_hash = B256::repeat_byte(0x01);
        mock.register_tx(tx_fixture(known_hash, 1));

        let unknown_hash = B256::repeat_byte(0x02);
        let result = mock.batch_txs(&[known_hash, unknown_hash]).await;

        assert!(result.is_err());
    }

    fn tx_fixture(hash: B256, block_number: u64) -> RpcTransaction {
        RpcTransaction {
            hash,
            block_number,
            block_hash: B256::ZERO,
            tx_index: 0,
            from: Default::default(),
            to: None,
            input: Default::default(),
            value: Default::default(),
            nonce: 0,
        }
    }

    #[tokio::test]
    async fn call_count_increments_per_invocation() {
        let mock = MockRpcClient::new(1);
        mock.chain_id().await.unwrap();
        mock.head_block().await.unwrap();
        assert_eq!(mock.call_count(), 2);
    }
}
