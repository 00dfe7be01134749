//! Chain-agnostic request/response types.
//!
//! These types describe what an [`RpcClient`](crate::RpcClient) reads from a
//! chain: block headers, transactions, and filtered logs. They are
//! intentionally shaped close to the raw RPC wire format rather than the
//! indexer's domain entities — decoding into domain types (with ABI-aware
//! topic/data interpretation) happens one layer up.

use alloy::primitives::{Address, Bytes, B256, U256};

// ═══════════════════════════════════════════════════════════════════════════════
// LOG FILTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Filter parameters for `eth_getLogs`.
///
/// # Example
///
/// ```
/// use rpc_client::LogFilter;
/// use alloy::primitives::{address, b256};
///
/// let filter = LogFilter::new(18_000_000, 18_000_100)
///     .with_address(address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"))
///     .with_topic(0, b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3e"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    /// Inclusive start of the block range.
    pub from_block: u64,
    /// Inclusive end of the block range.
    pub to_block: u64,
    /// Contract addresses to filter by. Empty means "any address".
    pub addresses: Vec<Address>,
    /// Topic filters, one `Vec` per topic position (0..=3). An empty inner
    /// `Vec` at a position means "any value"; multiple entries mean "any of
    /// these values" (an OR at that position).
    pub topics: Vec<Vec<B256>>,
}

impl LogFilter {
    /// Create a new filter over an inclusive block range.
    #[must_use]
    pub fn new(from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
            addresses: Vec::new(),
            topics: Vec::new(),
        }
    }

    /// Add a single address to filter by.
    #[must_use]
    pub fn with_address(mut self, address: Address) -> Self {
        self.addresses.push(address);
        self
    }

    /// Set the full set of addresses to filter by.
    #[must_use]
    pub fn with_addresses(mut self, addresses: Vec<Address>) -> Self {
        self.addresses = addresses;
        self
    }

    /// Add a topic value at the given position (0-indexed).
    #[must_use]
    pub fn with_topic(mut self, position: usize, value: B256) -> Self {
        while self.topics.len() <= position {
            self.topics.push(Vec::new());
        }
        self.topics[position].push(value);
        self
    }

    /// Filter on an event signature hash at topic position 0.
    #[must_use]
    pub fn with_event_signature(self, signature_hash: B256) -> Self {
        self.with_topic(0, signature_hash)
    }

    /// Number of blocks covered by this filter, inclusive on both ends.
    #[must_use]
    pub fn block_span(&self) -> u64 {
        self.to_block.saturating_sub(self.from_block).saturating_add(1)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HEADERS
// ═══════════════════════════════════════════════════════════════════════════════

/// A minimal block header, sufficient to drive cursor advancement and
/// reorg detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block number.
    pub number: u64,
    /// Block hash.
    pub hash: B256,
    /// Parent block hash, used to detect a reorg against the last persisted
    /// header.
    pub parent_hash: B256,
    /// Block timestamp, Unix seconds.
    pub timestamp: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSACTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// A transaction as read from the chain, in the shape `eth_getTransactionByHash`
/// and `eth_getBlockByNumber` (with full transactions) return it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcTransaction {
    /// Transaction hash.
    pub hash: B256,
    /// Block number the transaction was included in.
    pub block_number: u64,
    /// Hash of the block the transaction was included in.
    pub block_hash: B256,
    /// Index of the transaction within its block.
    pub tx_index: u64,
    /// Sender address.
    pub from: Address,
    /// Recipient address. `None` for contract-creation transactions.
    pub to: Option<Address>,
    /// Calldata.
    pub input: Bytes,
    /// Value transferred, in wei.
    pub value: U256,
    /// Sender account nonce at the time of this transaction.
    pub nonce: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256};

    #[test]
    fn log_filter_builder() {
        let filter = LogFilter::new(100, 200)
            .with_address(address!("0000000000000000000000000000000000000001"))
            .with_topic(0, b256!("0000000000000000000000000000000000000000000000000000000000000001"));

        assert_eq!(filter.from_block, 100);
        assert_eq!(filter.to_block, 200);
        assert_eq!(filter.addresses.len(), 1);
        assert_eq!(filter.topics.len(), 1);
        assert_eq!(filter.topics[0].len(), 1);
    }

    #[test]
    fn log_filter_block_span() {
        let filter = LogFilter::new(100, 100);
        assert_eq!(filter.block_span(), 1);

        let filter = LogFilter::new(100, 199);
        assert_eq!(filter.block_span(), 100);
    }

    #[test]
    fn log_filter_event_signature_sets_topic_zero() {
        let sig = b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");
        let filter = LogFilter::new(0, 0).with_event_signature(sig);
        assert_eq!(filter.topics[0], vec![sig]);
    }
}
