//! Core trait for chain-agnostic, read-only RPC access.

use alloy::primitives::B256;
use async_trait::async_trait;

use crate::error::Result;
use crate::types::{BlockHeader, LogFilter, RpcTransaction};

/// Read-only access to an EVM-compatible chain's RPC endpoint.
///
/// Implementors own the transport (batching, retries, connection pooling);
/// callers only deal in chain-agnostic request/response types. The batch
/// methods (`batch_txs`, `batch_headers`) exist because indexing a block
/// range one call at a time is dominated by round-trip latency — a single
/// [`RpcClient`] call may internally fan out into many batched JSON-RPC
/// requests via `json-rpc-batch`.
///
/// # Example
///
/// ```ignore
/// use rpc_client::{RpcClient, JsonRpcClient, LogFilter};
///
/// let client = JsonRpcClient::new("https://rpc.example.com")?;
/// let head = client.head_block().await?;
/// let logs = client.get_logs(LogFilter::new(head.number - 100, head.number)).await?;
/// ```
#[async_trait]
pub trait RpcClient: Send + Sync + 'static {
    /// Fetch the current chain head's header.
    async fn head_block(&self) -> Result<BlockHeader>;

    /// The chain ID this client is configured against.
    async fn chain_id(&self) -> Result<u64>;

    /// Fetch logs matching a filter. A single oversized range is the
    /// caller's responsibility to split — this call does not paginate.
    async fn get_logs(&self, filter: LogFilter) -> Result<Vec<alloy::rpc::types::Log>>;

    /// Fetch multiple transactions by hash in one batched round trip.
    ///
    /// Results are returned in input order. If any hash cannot be found or
    /// fails to decode, the whole call fails — callers that need partial
    /// results should split the batch themselves.
    async fn batch_txs(&self, hashes: &[B256]) -> Result<Vec<RpcTransaction>>;

    /// Fetch multiple block headers by number in one batched round trip.
    ///
    /// Results are returned in input order. If any header cannot be found
    /// or fails to decode, the whole call fails.
    async fn batch_headers(&self, numbers: &[u64]) -> Result<Vec<BlockHeader>>;
}

#[async_trait]
impl<T: RpcClient + ?Sized> RpcClient for std::sync::Arc<T> {
    async fn head_block(&self) -> Result<BlockHeader> {
        (**self).head_block().await
    }

    async fn chain_id(&self) -> Result<u64> {
        (**self).chain_id().await
    }

    async fn get_logs(&self, filter: LogFilter) -> Result<Vec<alloy::rpc::types::Log>> {
        (**self).get_logs(filter).await
    }

    async fn batch_txs(&self, hashes: &[B256]) -> Result<Vec<RpcTransaction>> {
        (**self).batch_txs(hashes).await
    }

    async fn batch_headers(&self, numbers: &[u64]) -> Result<Vec<BlockHeader>> {
        (**self).batch_headers(numbers).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRpcClient;
    use std::sync::Arc;

    #[tokio::test]
    async fn arc_client_delegates() {
        let mock = Arc::new(MockRpcClient::new(1));
        assert_eq!(mock.chain_id().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn mock_head_block_tracks_configured_value() {
        let mock = MockRpcClient::new(10);
        mock.set_head(100, Default::default());
        let head = mock.head_block().await.unwrap();
        assert_eq!(head.number, 100);
    }
}
