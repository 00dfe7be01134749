//! Per-source scrape loop (module C5: Source Indexer).
//!
//! One [`SourceIndexer`] task owns exactly one [`Source`][crate::types::Source]:
//! it alternates between waiting for the chain to advance (Polling) and
//! pulling, decoding, and persisting a bounded window of blocks (Fetching /
//! Decoding / Persisting), advancing the source's `sync_block` cursor
//! monotonically as it goes. The Supervisor (module C6) owns the task's
//! lifetime; this module owns everything that happens inside one run.
//!
//! # State machine
//!
//! ```text
//! Initializing -> Polling <-> Fetching -> Decoding -> Persisting -> Polling
//!                    |                                      |
//!                    +--------------- Stopping -------------+
//!                                      |
//!                                 Stopped / Failed
//! ```
//!
//! Transient RPC or store errors retry the same window in place with
//! exponential backoff (capped at 60s); fatal errors (ABI load failure,
//! chain ID mismatch, a Strict-policy decode failure) end the task with
//! `status = Failed` and propagate the error to the Supervisor, which
//! decides whether and when to restart.
//!
//! A disable or shutdown signal is only honored between windows — a window
//! already in Fetching/Decoding/Persisting always runs to completion before
//! the task re-checks for a stop request, so `sync_block` never advances
//! past a window it didn't fully persist.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::B256;
use chrono::Utc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::abi::AbiIndex;
use crate::bus::{BusEvent, EventBus, NewSourceDescriptor};
use crate::error::{AppError, DomainError, InfraError, Result};
use crate::metrics;
use crate::ports::{Cache, ControlPlaneStore, IndexStore, LogPublisher, SourceStore};
use crate::types::entities::{Blockchain, EvmLog, EvmTransaction, Source, SourceParams};
use crate::types::enums::DecodeFailurePolicy;
use crate::types::primitives::{BlockNumber, EthAddress, WeiAmount};
use crate::types::SourceStatus;

/// A maximum backoff delay for in-task retries of transient errors.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// One inclusive block range a single scrape cycle fetches, decodes, and
/// persists as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    from: BlockNumber,
    to: BlockNumber,
}

/// Drives one [`Source`] through its scrape loop until disabled or shut
/// down, or a fatal error ends the task.
pub struct SourceIndexer {
    source: Source,
    blockchain: Blockchain,
    rpc: Arc<dyn rpc_client::RpcClient>,
    control_store: Arc<dyn ControlPlaneStore>,
    source_store: Arc<dyn SourceStore>,
    index_store: Arc<dyn IndexStore>,
    abi_cache: Arc<dyn Cache>,
    publisher: Arc<dyn LogPublisher>,
    bus: EventBus,
    events: broadcast::Receiver<BusEvent>,
    shutdown: CancellationToken,
    stop_requested: bool,
}

impl SourceIndexer {
    /// Build a new indexer for `source`, subscribing to `bus` immediately
    /// so a disable signal sent before the first poll isn't missed.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Source,
        blockchain: Blockchain,
        rpc: Arc<dyn rpc_client::RpcClient>,
        control_store: Arc<dyn ControlPlaneStore>,
        source_store: Arc<dyn SourceStore>,
        index_store: Arc<dyn IndexStore>,
        abi_cache: Arc<dyn Cache>,
        publisher: Arc<dyn LogPublisher>,
        bus: EventBus,
        shutdown: CancellationToken,
    ) -> Self {
        let events = bus.subscribe();
        Self {
            source,
            blockchain,
            rpc,
            control_store,
            source_store,
            index_store,
            abi_cache,
            publisher,
            bus,
            events,
            shutdown,
            stop_requested: false,
        }
    }

    /// The id of the source this task drives.
    #[must_use]
    pub fn source_id(&self) -> Uuid {
        self.source.id
    }

    /// Run the scrape loop until the source is disabled, the process
    /// shuts down, or a fatal error occurs.
    ///
    /// # Errors
    /// Returns the fatal error that ended the task. The source's status is
    /// set to `Failed` before returning in that case; the Supervisor
    /// decides how to respond.
    #[instrument(skip_all, fields(source_id = %self.source.id, chain_id = self.source.chain_id))]
    pub async fn run(mut self) -> Result<()> {
        let abi_index = match self.initialize().await {
            Ok(index) => index,
            Err(e) => {
                let _ = self.source_store.set_source_status(self.source.id, SourceStatus::Failed).await;
                return Err(e);
            }
        };

        loop {
            if self.check_stop_requested() {
                return self.transition_to_stopped().await;
            }

            self.source_store.set_source_status(self.source.id, SourceStatus::Polling).await?;
            metrics::set_sync_block(self.source.id, self.source.sync_block.get());

            let pull_interval = Duration::from_secs(self.blockchain.pull_interval_secs.max(1));
            tokio::select! {
                () = self.shutdown.cancelled() => return self.transition_to_stopped().await,
                () = tokio::time::sleep(pull_interval) => {}
            }

            if self.check_stop_requested() {
                return self.transition_to_stopped().await;
            }

            let head = match self.fetch_head_with_retry().await {
                Ok(head) => head,
                Err(AppError::ShutdownRequested) => return self.transition_to_stopped().await,
                Err(e) => {
                    let _ = self.source_store.set_source_status(self.source.id, SourceStatus::Failed).await;
                    return Err(e);
                }
            };
            metrics::set_head_block(self.source.id, head.get());

            let Some(window) = compute_window(&self.source, &self.blockchain, head) else {
                debug!(head = head.get(), sync_block = self.source.sync_block.get(), "below block_slice, staying in Polling");
                continue;
            };

            match self.run_window(window, &abi_index).await {
                Ok(()) => {}
                Err(AppError::ShutdownRequested) => return self.transition_to_stopped().await,
                Err(e) => {
                    let _ = self.source_store.set_source_status(self.source.id, SourceStatus::Failed).await;
                    return Err(e);
                }
            }
        }
    }

    /// Load and cache this source's ABI, and verify the endpoint's chain ID
    /// matches the blockchain's configured one. Both failures are fatal.
    async fn initialize(&mut self) -> Result<Arc<AbiIndex>> {
        self.source_store.set_source_status(self.source.id, SourceStatus::Initializing).await?;

        let remote_chain_id = self.rpc.chain_id().await.map_err(rpc_err)?;
        metrics::incr_rpc_calls(self.source.id, 1);
        if remote_chain_id != self.blockchain.chain_id {
            return Err(AppError::Infra(InfraError::Rpc(rpc_client::RpcError::ChainIdMismatch {
                expected: self.blockchain.chain_id,
                actual: remote_chain_id,
            })));
        }

        if let Some(index) = self.abi_cache.get(self.source.abi_id) {
            return Ok(index);
        }

        let abi_row = self
            .control_store
            .get_abi(self.source.abi_id)
            .await?
            .ok_or(DomainError::AbiNotFound(self.source.abi_id))?;
        let parsed = abi_row.parse().map_err(|e| DomainError::AbiInvalid {
            contract_name: abi_row.contract_name.clone(),
            cause: e.to_string(),
        })?;
        let index = Arc::new(AbiIndex::build(&parsed, abi_row.contract_name));
        self.abi_cache.set(self.source.abi_id, Arc::clone(&index));
        Ok(index)
    }

    /// Drain pending bus events, latching `stop_requested` on a matching
    /// disable or a process-wide shutdown event.
    fn check_stop_requested(&mut self) -> bool {
        if self.shutdown.is_cancelled() {
            return true;
        }
        loop {
            match self.events.try_recv() {
                Ok(BusEvent::SourceDisable(id)) if id == self.source.id => self.stop_requested = true,
                Ok(BusEvent::Shutdown) => self.stop_requested = true,
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => break,
            }
        }
        self.stop_requested
    }

    async fn transition_to_stopped(&self) -> Result<()> {
        self.source_store.set_source_status(self.source.id, SourceStatus::Stopped).await?;
        info!(source_id = %self.source.id, "source indexer stopped");
        Ok(())
    }

    /// Fetch the current chain head, retrying transient RPC errors with
    /// backoff. Only a shutdown (not a per-source disable) interrupts the
    /// retry loop early.
    async fn fetch_head_with_retry(&self) -> Result<BlockNumber> {
        let mut delay = Duration::from_secs(self.blockchain.pull_interval_secs.max(1));
        loop {
            metrics::incr_rpc_calls(self.source.id, 1);
            match self.rpc.head_block().await {
                Ok(header) => return Ok(BlockNumber::new(header.number)),
                Err(e) if e.is_transient() => {
                    warn!(error = %e, "transient error fetching chain head, retrying");
                    tokio::select! {
                        () = self.shutdown.cancelled() => return Err(AppError::ShutdownRequested),
                        () = tokio::time::sleep(delay) => {}
                    }
                    delay = (delay * 2).min(MAX_BACKOFF);
                }
                Err(e) => return Err(rpc_err(e)),
            }
        }
    }

    /// Run one window to completion, retrying the whole fetch/decode/
    /// persist sequence on a transient failure so a partial attempt never
    /// advances `sync_block`.
    async fn run_window(&mut self, window: Window, abi_index: &Arc<AbiIndex>) -> Result<()> {
        let mut delay = Duration::from_secs(self.blockchain.pull_interval_secs.max(1));
        loop {
            match self.try_window(window, abi_index).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_transient() => {
                    warn!(
                        error = %e,
                        from = window.from.get(),
                        to = window.to.get(),
                        "transient error in window, retrying same window"
                    );
                    tokio::select! {
                        () = self.shutdown.cancelled() => return Err(AppError::ShutdownRequested),
                        () = tokio::time::sleep(delay) => {}
                    }
                    delay = (delay * 2).min(MAX_BACKOFF);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_window(&mut self, window: Window, abi_index: &Arc<AbiIndex>) -> Result<()> {
        self.source_store.set_source_status(self.source.id, SourceStatus::Fetching).await?;
        let filter = build_log_filter(&self.source, window);
        metrics::incr_rpc_calls(self.source.id, 1);
        let raw_logs = self.rpc.get_logs(filter).await.map_err(rpc_err)?;
        metrics::incr_logs_scraped(self.source.id, raw_logs.len() as u64);

        let mut tx_hashes: Vec<B256> = raw_logs.iter().filter_map(|log| log.transaction_hash).collect();
        tx_hashes.sort_unstable();
        tx_hashes.dedup();

        let mut tx_by_hash: HashMap<B256, rpc_client::RpcTransaction> = HashMap::with_capacity(tx_hashes.len());
        let batch_size = self.blockchain.rpc_max_batch_size.max(1);
        for chunk in tx_hashes.chunks(batch_size) {
            metrics::incr_rpc_calls(self.source.id, 1);
            let fetched = self.rpc.batch_txs(chunk).await.map_err(rpc_err)?;
            for tx in fetched {
                tx_by_hash.insert(tx.hash, tx);
            }
        }

        self.source_store.set_source_status(self.source.id, SourceStatus::Decoding).await?;
        let (logs, transactions) = self.decode_window(&raw_logs, &tx_by_hash, abi_index)?;

        self.source_store.set_source_status(self.source.id, SourceStatus::Persisting).await?;
        self.index_store.persist_window(self.source.id, &logs, &transactions, window.to).await?;

        self.source.sync_block = window.to;
        metrics::set_sync_block(self.source.id, window.to.get());
        metrics::incr_logs_stored(self.source.id, logs.len() as u64);

        self.emit_factory_sources(&logs);
        if !logs.is_empty() {
            self.bus.publish(BusEvent::LogNew(Arc::from(logs.clone())));
        }

        if let Err(e) = self.publisher.publish_batch(&logs).await {
            warn!(error = %e, "best-effort external log publish failed, continuing");
        }

        Ok(())
    }

    /// Turn raw RPC logs into domain `EvmLog`/`EvmTransaction` rows,
    /// decoding each log against `abi_index` per this source's
    /// `decode_failure_policy`.
    fn decode_window(
        &self,
        raw_logs: &[alloy::rpc::types::Log],
        tx_by_hash: &HashMap<B256, rpc_client::RpcTransaction>,
        abi_index: &Arc<AbiIndex>,
    ) -> Result<(Vec<EvmLog>, Vec<EvmTransaction>)> {
        let mut logs = Vec::with_capacity(raw_logs.len());
        let mut transactions = Vec::new();
        let mut seen_tx_hashes = HashSet::new();

        for raw in raw_logs {
            let block_number = BlockNumber::new(raw.block_number.ok_or_else(|| malformed_log("missing block_number"))?);
            let block_hash = raw.block_hash.ok_or_else(|| malformed_log("missing block_hash"))?;
            let tx_hash = raw.transaction_hash.ok_or_else(|| malformed_log("missing transaction_hash"))?;
            let tx_index = raw.transaction_index.ok_or_else(|| malformed_log("missing transaction_index"))?;
            let log_index = raw.log_index.ok_or_else(|| malformed_log("missing log_index"))?;

            let tx = tx_by_hash.get(&tx_hash).ok_or_else(|| malformed_log("referenced transaction not found in batch"))?;

            if seen_tx_hashes.insert(tx_hash) {
                transactions.push(EvmTransaction {
                    id: EvmTransaction::build_id(self.source.chain_id, tx_hash),
                    source_id: self.source.id,
                    block_number,
                    tx_index,
                    chain_id: self.source.chain_id,
                    from: tx.from.into(),
                    to: tx.to.map_or(EthAddress::ZERO, Into::into),
                    data: tx.input.clone(),
                    value: WeiAmount::from(tx.value),
                    nonce: tx.nonce,
                    hash: tx_hash,
                    minted_at: Utc::now(),
                    metadata: HashMap::new(),
                });
            }

            let metadata = match self.source.decode_failure_policy {
                DecodeFailurePolicy::Lenient => abi_index.decode_lenient(raw),
                DecodeFailurePolicy::Strict => abi_index.decode(raw).map_err(|e| {
                    let event = match &e {
                        crate::abi::DecodeError::Malformed { event, .. } => event.clone(),
                        crate::abi::DecodeError::UnknownEvent(topic0) => format!("unknown:{topic0:#x}"),
                        crate::abi::DecodeError::NoTopics => "none".to_string(),
                    };
                    DomainError::DecodeFailed { event, cause: e.to_string() }
                })?,
            };

            logs.push(EvmLog {
                id: EvmLog::build_id(self.source.chain_id, block_number, log_index),
                source_id: self.source.id,
                address: raw.inner.address.into(),
                topics: raw.topics().to_vec(),
                data: raw.data().data.clone(),
                block_number,
                block_hash,
                tx_hash,
                tx_index,
                tx_from: tx.from.into(),
                log_index,
                removed: raw.removed,
                minted_at: Utc::now(),
                metadata,
            });
        }

        Ok((logs, transactions))
    }

    /// For a `Factory` source, scan this window's decoded logs for the
    /// configured creation event and emit `BusEvent::FactoryNewContract`
    /// for each new child address found.
    fn emit_factory_sources(&self, logs: &[EvmLog]) {
        let SourceParams::Factory { child_abi_id, creation_event_name, creation_address_arg, .. } = &self.source.type_params else {
            return;
        };

        for log in logs {
            if log.metadata.event_name.as_deref() != Some(creation_event_name.as_str()) {
                continue;
            }
            let Some(raw_address) = log.metadata.fields.get(creation_address_arg) else {
                tracing::error!(
                    source_id = %self.source.id,
                    event = %creation_event_name,
                    arg = %creation_address_arg,
                    "factory creation event missing address argument, skipping new-contract emission"
                );
                continue;
            };
            match EthAddress::from_hex(raw_address) {
                Ok(new_address) => self.bus.publish(BusEvent::FactoryNewContract(NewSourceDescriptor {
                    new_address,
                    child_abi_id: *child_abi_id,
                    pipeline_id: self.source.pipeline_id,
                    start_block: log.block_number,
                })),
                Err(e) => tracing::error!(error = %e, raw_address, "factory creation address argument is not a valid address"),
            }
        }
    }
}

/// Gate on `block_slice`, then bound the window to `block_range` and the
/// observed chain head — whichever is smaller. Returns `None` if the
/// margin between `head` and the source's cursor hasn't reached
/// `block_slice` yet (the source stays in Polling and retries next cycle).
fn compute_window(source: &Source, blockchain: &Blockchain, head: BlockNumber) -> Option<Window> {
    let cursor = source.sync_block;
    if head.get().saturating_sub(cursor.get()) < blockchain.block_slice {
        return None;
    }
    let to = BlockNumber::new((cursor.get() + blockchain.block_range).min(head.get()));
    Some(Window { from: cursor.next(), to })
}

/// Build an `eth_getLogs` filter for one window, shaped per source type:
///
/// | `SourceType` | addresses | topics |
/// |---|---|---|
/// | `Full` | none | none |
/// | `Contract` | the bound address | none |
/// | `Topic` | none | `topic0` plus any configured `topic_filters` |
/// | `Factory` | the factory address | none |
fn build_log_filter(source: &Source, window: Window) -> rpc_client::LogFilter {
    let filter = rpc_client::LogFilter::new(window.from.get(), window.to.get());
    match &source.type_params {
        SourceParams::Full => filter,
        SourceParams::Contract { address } | SourceParams::Factory { address, .. } => filter.with_address((*address).into()),
        SourceParams::Topic { topic0, topic_filters } => {
            let mut filter = filter.with_event_signature(*topic0);
            for (offset, values) in topic_filters.iter().enumerate() {
                let position = offset + 1;
                for value in values {
                    filter = filter.with_topic(position, *value);
                }
            }
            filter
        }
    }
}

fn rpc_err(e: rpc_client::RpcError) -> AppError {
    AppError::Infra(InfraError::Rpc(e))
}

fn malformed_log(reason: &str) -> AppError {
    AppError::Infra(InfraError::Rpc(rpc_client::RpcError::Fatal(format!("malformed log from RPC endpoint: {reason}"))))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256, Bytes, LogData};

    use crate::ports::cache_mocks::MockCache;
    use crate::ports::store_mocks::{MockControlPlaneStore, MockIndexStore, MockSourceStore};
    use crate::ports::streaming_mocks::MockLogPublisher;
    use crate::types::entities::Abi;
    use rpc_client::mock::MockRpcClient;

    fn sample_blockchain(block_range: u64, block_slice: u64) -> Blockchain {
        Blockchain {
            id: Uuid::new_v4(),
            chain_id: 1,
            rpc_url: "https://rpc.example.com".into(),
            block_range,
            block_slice,
            pull_interval_secs: 5,
            rpc_max_batch_size: 50,
        }
    }

    fn sample_source(sync_block: u64, type_params: SourceParams) -> Source {
        Source {
            id: Uuid::new_v4(),
            pipeline_id: Uuid::new_v4(),
            abi_id: Uuid::new_v4(),
            chain_id: 1,
            source_type: type_params.source_type(),
            type_params,
            start_block: BlockNumber::new(0),
            sync_block: BlockNumber::new(sync_block),
            enabled: true,
            status: SourceStatus::Stopped,
            decode_failure_policy: DecodeFailurePolicy::Lenient,
        }
    }

    // ─── compute_window ───────────────────────────────────────────────

    #[test]
    fn compute_window_skips_below_block_slice() {
        let blockchain = sample_blockchain(2_000, 12);
        let source = sample_source(1_000, SourceParams::Full);
        // head - cursor == 11 < block_slice (12): must stay in Polling.
        assert!(compute_window(&source, &blockchain, BlockNumber::new(1_011)).is_none());
    }

    #[test]
    fn compute_window_proceeds_at_exact_block_slice_margin() {
        let blockchain = sample_blockchain(2_000, 12);
        let source = sample_source(1_000, SourceParams::Full);
        let window = compute_window(&source, &blockchain, BlockNumber::new(1_012)).unwrap();
        assert_eq!(window.from.get(), 1_001);
        assert_eq!(window.to.get(), 1_012);
    }

    #[test]
    fn compute_window_caps_at_block_range_not_head() {
        let blockchain = sample_blockchain(500, 12);
        let source = sample_source(1_000, SourceParams::Full);
        // head is far ahead; window is capped at cursor + block_range.
        let window = compute_window(&source, &blockchain, BlockNumber::new(50_000)).unwrap();
        assert_eq!(window.from.get(), 1_001);
        assert_eq!(window.to.get(), 1_500);
    }

    #[test]
    fn compute_window_caps_at_head_when_closer_than_block_range() {
        let blockchain = sample_blockchain(2_000, 12);
        let source = sample_source(1_000, SourceParams::Full);
        let window = compute_window(&source, &blockchain, BlockNumber::new(1_300)).unwrap();
        assert_eq!(window.from.get(), 1_001);
        assert_eq!(window.to.get(), 1_300);
    }

    // ─── build_log_filter ─────────────────────────────────────────────

    fn window(from: u64, to: u64) -> Window {
        Window { from: BlockNumber::new(from), to: BlockNumber::new(to) }
    }

    #[test]
    fn build_log_filter_full_has_no_address_or_topics() {
        let source = sample_source(0, SourceParams::Full);
        let filter = build_log_filter(&source, window(1, 100));
        assert!(filter.addresses.is_empty());
        assert!(filter.topics.is_empty());
    }

    #[test]
    fn build_log_filter_contract_sets_address_only() {
        let target = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
        let source = sample_source(0, SourceParams::Contract { address: target.into() });
        let filter = build_log_filter(&source, window(1, 100));
        assert_eq!(filter.addresses, vec![target]);
        assert!(filter.topics.is_empty());
    }

    #[test]
    fn build_log_filter_factory_sets_address_like_contract() {
        let target = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
        let source = sample_source(
            0,
            SourceParams::Factory {
                address: target.into(),
                child_abi_id: Uuid::new_v4(),
                creation_event_name: "PoolCreated".into(),
                creation_address_arg: "pool".into(),
            },
        );
        let filter = build_log_filter(&source, window(1, 100));
        assert_eq!(filter.addresses, vec![target]);
        assert!(filter.topics.is_empty());
    }

    #[test]
    fn build_log_filter_topic_matches_expected_shape() {
        let topic0 = b256!("deaddeaddeaddeaddeaddeaddeaddeaddeaddeaddeaddeaddeaddeaddeaddead");
        let filter1 = b256!("cafecafecafecafecafecafecafecafecafecafecafecafecafecafecafeca");
        let source = sample_source(
            0,
            SourceParams::Topic { topic0, topic_filters: vec![Vec::new(), vec![filter1]] },
        );
        let filter = build_log_filter(&source, window(1, 100));
        assert!(filter.addresses.is_empty());
        assert_eq!(filter.topics.len(), 3);
        assert_eq!(filter.topics[0], vec![topic0]);
        assert!(filter.topics[1].is_empty());
        assert_eq!(filter.topics[2], vec![filter1]);
    }

    // ─── full-cycle integration ───────────────────────────────────────

    fn erc20_transfer_abi_json() -> serde_json::Value {
        serde_json::json!([{
            "type": "event",
            "name": "Transfer",
            "anonymous": false,
            "inputs": [
                {"name": "from", "type": "address", "indexed": true},
                {"name": "to", "type": "address", "indexed": true},
                {"name": "value", "type": "uint256", "indexed": false}
            ]
        }])
    }

    fn transfer_log(block_number: u64, log_index: u64, tx_hash: B256, from: alloy::primitives::Address, to: alloy::primitives::Address) -> alloy::rpc::types::Log {
        let topic0 = b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3e");
        let topics = vec![topic0, B256::left_padding_from(from.as_slice()), B256::left_padding_from(to.as_slice())];
        let data = Bytes::from(alloy::primitives::U256::from(1_000u64).to_be_bytes_vec());
        let log_data = LogData::new_unchecked(topics, data);
        alloy::rpc::types::Log {
            inner: alloy::primitives::Log { address: from, data: log_data },
            block_hash: Some(B256::repeat_byte(0xab)),
            block_number: Some(block_number),
            transaction_hash: Some(tx_hash),
            transaction_index: Some(0),
            log_index: Some(log_index),
            removed: false,
            ..Default::default()
        }
    }

    #[allow(clippy::too_many_lines)]
    fn build_indexer(
        source: Source,
        blockchain: Blockchain,
        rpc: Arc<MockRpcClient>,
        control_store: Arc<MockControlPlaneStore>,
        source_store: Arc<MockSourceStore>,
        index_store: Arc<MockIndexStore>,
    ) -> SourceIndexer {
        SourceIndexer::new(
            source,
            blockchain,
            rpc,
            control_store,
            source_store,
            index_store,
            Arc::new(MockCache::new()),
            Arc::new(MockLogPublisher::new()),
            EventBus::new(),
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn try_window_persists_logs_and_advances_cursor() {
        let blockchain = sample_blockchain(2_000, 0);
        let abi_id = Uuid::new_v4();
        let source = {
            let mut s = sample_source(100, SourceParams::Full);
            s.abi_id = abi_id;
            s.chain_id = blockchain.chain_id;
            s
        };

        let control_store = Arc::new(MockControlPlaneStore::new());
        control_store.insert_abi(Abi { id: abi_id, contract_name: "Token".into(), json: erc20_transfer_abi_json() });

        let rpc = Arc::new(MockRpcClient::new(blockchain.chain_id));
        let from = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
        let to = address!("1111111111111111111111111111111111111111");
        let tx_hash = B256::repeat_byte(0x01);
        rpc.set_logs(vec![transfer_log(150, 0, tx_hash, from, to)]);
        rpc.register_tx(rpc_client::RpcTransaction {
            hash: tx_hash,
            block_number: 150,
            block_hash: B256::repeat_byte(0xab),
            tx_index: 0,
            from,
            to: Some(to),
            input: Bytes::new(),
            value: alloy::primitives::U256::from(0u64),
            nonce: 0,
        });

        let index_store = Arc::new(MockIndexStore::new());
        let source_store = Arc::new(MockSourceStore::new());
        source_store.insert(source.clone());

        let mut indexer = build_indexer(source.clone(), blockchain.clone(), Arc::clone(&rpc), control_store, source_store, Arc::clone(&index_store));

        let abi_index = indexer.initialize().await.unwrap();
        let win = window(101, 2_100);
        indexer.try_window(win, &abi_index).await.unwrap();

        assert_eq!(index_store.sync_block(source.id).get(), 2_100);
        assert_eq!(index_store.log_count(), 1);
    }

    #[tokio::test]
    async fn try_window_advances_cursor_even_with_no_logs() {
        let blockchain = sample_blockchain(2_000, 0);
        let abi_id = Uuid::new_v4();
        let source = {
            let mut s = sample_source(100, SourceParams::Full);
            s.abi_id = abi_id;
            s.chain_id = blockchain.chain_id;
            s
        };
        let control_store = Arc::new(MockControlPlaneStore::new());
        control_store.insert_abi(Abi { id: abi_id, contract_name: "Token".into(), json: erc20_transfer_abi_json() });

        let rpc = Arc::new(MockRpcClient::new(blockchain.chain_id));
        let index_store = Arc::new(MockIndexStore::new());
        let source_store = Arc::new(MockSourceStore::new());
        source_store.insert(source.clone());

        let mut indexer = build_indexer(source.clone(), blockchain, Arc::clone(&rpc), control_store, source_store, Arc::clone(&index_store));
        let abi_index = indexer.initialize().await.unwrap();
        let win = window(101, 2_100);
        indexer.try_window(win, &abi_index).await.unwrap();

        assert_eq!(index_store.sync_block(source.id).get(), 2_100);
        assert_eq!(index_store.log_count(), 0);
    }

    #[tokio::test]
    async fn initialize_fails_on_chain_id_mismatch() {
        let blockchain = sample_blockchain(2_000, 0);
        let source = sample_source(0, SourceParams::Full);
        let rpc = Arc::new(MockRpcClient::new(blockchain.chain_id + 1));
        let control_store = Arc::new(MockControlPlaneStore::new());
        let index_store = Arc::new(MockIndexStore::new());
        let source_store = Arc::new(MockSourceStore::new());
        source_store.insert(source.clone());

        let mut indexer = build_indexer(source, blockchain, rpc, control_store, source_store, index_store);
        let err = indexer.initialize().await.unwrap_err();
        assert!(matches!(err, AppError::Infra(InfraError::Rpc(rpc_client::RpcError::ChainIdMismatch { .. }))));
    }

    #[tokio::test]
    async fn factory_emission_skips_log_missing_address_argument() {
        let blockchain = sample_blockchain(2_000, 0);
        let abi_id = Uuid::new_v4();
        let factory_json = serde_json::json!([{
            "type": "event",
            "name": "PoolCreated",
            "anonymous": false,
            "inputs": [{"name": "token", "type": "address", "indexed": true}]
        }]);

        let source_params = SourceParams::Factory {
            address: address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").into(),
            child_abi_id: Uuid::new_v4(),
            creation_event_name: "PoolCreated".into(),
            creation_address_arg: "pool".into(), // not an actual input name on this ABI
        };
        let source = {
            let mut s = sample_source(100, source_params);
            s.abi_id = abi_id;
            s.chain_id = blockchain.chain_id;
            s
        };

        let control_store = Arc::new(MockControlPlaneStore::new());
        control_store.insert_abi(Abi { id: abi_id, contract_name: "Factory".into(), json: factory_json });

        let rpc = Arc::new(MockRpcClient::new(blockchain.chain_id));
        let from = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
        let topic0 = alloy::primitives::keccak256("PoolCreated(address)");
        let topics = vec![topic0, B256::left_padding_from(address!("2222222222222222222222222222222222222222").as_slice())];
        let log_data = LogData::new_unchecked(topics, Bytes::new());
        let tx_hash = B256::repeat_byte(0x02);
        let raw_log = alloy::rpc::types::Log {
            inner: alloy::primitives::Log { address: from, data: log_data },
            block_hash: Some(B256::repeat_byte(0xcd)),
            block_number: Some(150),
            transaction_hash: Some(tx_hash),
            transaction_index: Some(0),
            log_index: Some(0),
            removed: false,
            ..Default::default()
        };
        rpc.set_logs(vec![raw_log]);
        rpc.register_tx(rpc_client::RpcTransaction {
            hash: tx_hash,
            block_number: 150,
            block_hash: B256::repeat_byte(0xcd),
            tx_index: 0,
            from,
            to: None,
            input: Bytes::new(),
            value: alloy::primitives::U256::ZERO,
            nonce: 0,
        });

        let index_store = Arc::new(MockIndexStore::new());
        let source_store = Arc::new(MockSourceStore::new());
        source_store.insert(source.clone());

        let mut indexer = build_indexer(source.clone(), blockchain, rpc, control_store, source_store, index_store);
        let abi_index = indexer.initialize().await.unwrap();

        // Must not panic, and must simply skip emission for the malformed event.
        indexer.try_window(window(101, 2_100), &abi_index).await.unwrap();
    }
}
