//! Storage port traits for data persistence (module C3: Store Interface).
//!
//! These traits define the contract for persisting and retrieving the
//! control-plane entities (`Blockchain`, `LogStore`, `Pipeline`, `Abi`,
//! `Source`) and the indexed data (`EvmLog`, `EvmTransaction`).
//! Infrastructure adapters implement these traits against a concrete
//! backend (PostgreSQL in production).

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::entities::{Abi, Blockchain, EvmLog, EvmTransaction, LogStore, Pipeline, Source};
use crate::types::primitives::BlockNumber;

// ═══════════════════════════════════════════════════════════════════════════════
// CONTROL PLANE STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Port for control-plane CRUD: blockchains, log stores, pipelines, ABIs,
/// and sources.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Enforce referential integrity (a `Source` cannot reference a
///   nonexistent `Pipeline`/`Abi`)
/// - Treat `create_*` as insert-only; `update_*` for mutation
#[async_trait]
pub trait ControlPlaneStore: Send + Sync {
    /// Create a blockchain.
    ///
    /// # Errors
    /// Returns an error if a blockchain with the same `chain_id` already
    /// exists, or the database operation fails.
    async fn create_blockchain(&self, blockchain: &Blockchain) -> Result<()>;

    /// Fetch a blockchain by id.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn get_blockchain(&self, id: Uuid) -> Result<Option<Blockchain>>;

    /// List all registered blockchains.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn list_blockchains(&self) -> Result<Vec<Blockchain>>;

    /// Update a blockchain's mutable fields (rpc url, polling knobs).
    ///
    /// # Errors
    /// Returns an error if the blockchain doesn't exist or the database
    /// operation fails.
    async fn update_blockchain(&self, blockchain: &Blockchain) -> Result<()>;

    /// Create a log store.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    async fn create_log_store(&self, log_store: &LogStore) -> Result<()>;

    /// Fetch a log store by id.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn get_log_store(&self, id: Uuid) -> Result<Option<LogStore>>;

    /// List all log stores.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn list_log_stores(&self) -> Result<Vec<LogStore>>;

    /// Create a pipeline.
    ///
    /// # Errors
    /// Returns an error if the referenced blockchain/log store doesn't
    /// exist or the database operation fails.
    async fn create_pipeline(&self, pipeline: &Pipeline) -> Result<()>;

    /// Fetch a pipeline by id.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn get_pipeline(&self, id: Uuid) -> Result<Option<Pipeline>>;

    /// List all pipelines, optionally filtered to one blockchain.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn list_pipelines(&self, blockchain_id: Option<Uuid>) -> Result<Vec<Pipeline>>;

    /// Enable or disable a pipeline.
    ///
    /// # Errors
    /// Returns an error if the pipeline doesn't exist or the database
    /// operation fails.
    async fn set_pipeline_enabled(&self, id: Uuid, enabled: bool) -> Result<()>;

    /// Store a new ABI.
    ///
    /// # Errors
    /// Returns an error if the database operation fails.
    async fn create_abi(&self, abi: &Abi) -> Result<()>;

    /// Fetch an ABI by id.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn get_abi(&self, id: Uuid) -> Result<Option<Abi>>;

    /// List all ABIs.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn list_abis(&self) -> Result<Vec<Abi>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Port for `Source` persistence and the supervisor/indexer control loop.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Use the database as the single source of truth for `sync_block` and
///   `status`; in-memory indexer state is a cache of these columns
/// - Advance `sync_block` in the same transaction as the log/transaction
///   rows it covers (see [`IndexStore::persist_window`])
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Create a source.
    ///
    /// # Errors
    /// Returns an error if the referenced pipeline/ABI doesn't exist or
    /// the database operation fails.
    async fn create_source(&self, source: &Source) -> Result<()>;

    /// Fetch a source by id.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn get_source(&self, id: Uuid) -> Result<Option<Source>>;

    /// List all sources, optionally filtered to one pipeline.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn list_sources(&self, pipeline_id: Option<Uuid>) -> Result<Vec<Source>>;

    /// List all sources with `enabled = true`, across every pipeline.
    ///
    /// Used by the Supervisor on startup to determine which Source
    /// Indexers to spawn.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn list_enabled_sources(&self) -> Result<Vec<Source>>;

    /// Enable or disable a source.
    ///
    /// Enabling a stopped source does not itself start an indexer; the
    /// control plane publishes `source.enable`/`source.disable` and the
    /// Supervisor reacts.
    ///
    /// # Errors
    /// Returns an error if the source doesn't exist or the database
    /// operation fails.
    async fn set_source_enabled(&self, id: Uuid, enabled: bool) -> Result<()>;

    /// Transition a source's `status` column.
    ///
    /// Implementations are not required to validate the transition
    /// against [`crate::types::SourceStatus`]'s state machine; callers
    /// (the Source Indexer) are expected to only request valid
    /// transitions.
    ///
    /// # Errors
    /// Returns an error if the source doesn't exist or the database
    /// operation fails.
    async fn set_source_status(&self, id: Uuid, status: crate::types::SourceStatus) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// INDEX STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Port for persisting decoded logs and transactions, and advancing a
/// source's sync cursor.
///
/// # Cursor Semantics
///
/// A source's `sync_block` marks the highest block number it has fully
/// persisted. [`Self::persist_window`] must advance `sync_block` in the
/// same transaction as the rows it writes, so a crash between the two
/// can never leave the cursor ahead of what was actually persisted (the
/// Source Indexer would otherwise skip un-persisted blocks on restart).
///
/// # Idempotence
///
/// Row ids are deterministic (see [`EvmLog::build_id`] /
/// [`EvmTransaction::build_id`]), so re-persisting the same window after
/// a restart is expected to be a no-op via upsert-on-conflict, not an
/// error.
///
/// [`EvmLog::build_id`]: crate::types::EvmLog::build_id
/// [`EvmTransaction::build_id`]: crate::types::EvmTransaction::build_id
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Persist a window's logs and transactions, then advance the
    /// source's `sync_block` to `new_sync_block`, all within one
    /// transaction.
    ///
    /// # Errors
    /// Returns an error if the transaction fails to commit.
    async fn persist_window(
        &self,
        source_id: Uuid,
        logs: &[EvmLog],
        transactions: &[EvmTransaction],
        new_sync_block: BlockNumber,
    ) -> Result<()>;

    /// Fetch logs for a source within `[from_block, to_block]` inclusive,
    /// ordered by `(block_number, log_index)`.
    ///
    /// `after_log_index`, when set, is a keyset cursor: only logs that
    /// sort strictly after `(from_block, after_log_index)` are returned,
    /// i.e. later logs in `from_block` itself plus everything in
    /// `(from_block, to_block]`. This lets a caller page through a single
    /// block containing more logs than `limit` without skipping any —
    /// re-querying with `from_block` unchanged and the last row's
    /// `log_index` as the cursor, rather than advancing `from_block` past
    /// a block that wasn't fully drained.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn get_logs(
        &self,
        source_id: Uuid,
        from_block: BlockNumber,
        to_block: BlockNumber,
        after_log_index: Option<u64>,
        limit: u32,
    ) -> Result<Vec<EvmLog>>;

    /// Fetch transactions for a source within `[from_block, to_block]`
    /// inclusive, ordered by `(block_number, tx_index)`.
    ///
    /// # Errors
    /// Returns an error if the database query fails.
    async fn get_transactions(
        &self,
        source_id: Uuid,
        from_block: BlockNumber,
        to_block: BlockNumber,
        limit: u32,
    ) -> Result<Vec<EvmTransaction>>;

    /// Delete all logs and transactions for a source with
    /// `block_number > fork_point`, for chain-reorg recovery.
    ///
    /// Does not touch `sync_block`; callers are expected to reset it to
    /// `fork_point` afterward within the same logical operation.
    ///
    /// # Errors
    /// Returns an error if the rollback fails.
    async fn rollback_after(&self, source_id: Uuid, fork_point: BlockNumber) -> Result<()>;
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks {
    //! Mock store implementations for testing.

    use std::collections::HashMap;
    use std::sync::RwLock;

    use super::{
        async_trait, Abi, Blockchain, BlockNumber, ControlPlaneStore, EvmLog, EvmTransaction,
        IndexStore, LogStore, Pipeline, Result, Source, SourceStore, Uuid,
    };
    use crate::types::SourceStatus;

    /// In-memory `IndexStore` for testing Source Indexer logic without a
    /// database.
    #[derive(Debug, Default)]
    pub struct MockIndexStore {
        logs: RwLock<Vec<EvmLog>>,
        transactions: RwLock<Vec<EvmTransaction>>,
        sync_blocks: RwLock<HashMap<Uuid, BlockNumber>>,
    }

    impl MockIndexStore {
        /// Create a new empty mock store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Current sync cursor for a source, or `BlockNumber(0)` if unset.
        #[must_use]
        pub fn sync_block(&self, source_id: Uuid) -> BlockNumber {
            self.sync_blocks.read().expect("lock poisoned").get(&source_id).copied().unwrap_or_default()
        }

        /// Total logs persisted across all sources.
        #[must_use]
        pub fn log_count(&self) -> usize {
            self.logs.read().expect("lock poisoned").len()
        }
    }

    #[async_trait]
    impl IndexStore for MockIndexStore {
        async fn persist_window(
            &self,
            source_id: Uuid,
            logs: &[EvmLog],
            transactions: &[EvmTransaction],
            new_sync_block: BlockNumber,
        ) -> Result<()> {
            {
                let mut stored = self.logs.write().expect("lock poisoned");
                for log in logs {
                    if !stored.iter().any(|l| l.id == log.id) {
                        stored.push(log.clone());
                    }
                }
            }
            {
                let mut stored = self.transactions.write().expect("lock poisoned");
                for tx in transactions {
                    if !stored.iter().any(|t| t.id == tx.id) {
                        stored.push(tx.clone());
                    }
                }
            }
            self.sync_blocks.write().expect("lock poisoned").insert(source_id, new_sync_block);
            Ok(())
        }

        async fn get_logs(
            &self,
            source_id: Uuid,
            from_block: BlockNumber,
            to_block: BlockNumber,
            after_log_index: Option<u64>,
            limit: u32,
        ) -> Result<Vec<EvmLog>> {
            let stored = self.logs.read().expect("lock poisoned");
            let mut matched: Vec<EvmLog> = stored
                .iter()
                .filter(|l| {
                    l.source_id == source_id
                        && l.block_number >= from_block
                        && l.block_number <= to_block
                        && match after_log_index {
                            Some(cursor) => l.block_number > from_block || l.log_index > cursor,
                            None => true,
                        }
                })
                .cloned()
                .collect();
            matched.sort_by_key(|l| (l.block_number, l.log_index));
            matched.truncate(limit as usize);
            Ok(matched)
        }

        async fn get_transactions(
            &self,
            source_id: Uuid,
            from_block: BlockNumber,
            to_block: BlockNumber,
            limit: u32,
        ) -> Result<Vec<EvmTransaction>> {
            let stored = self.transactions.read().expect("lock poisoned");
            let mut matched: Vec<EvmTransaction> = stored
                .iter()
                .filter(|t| {
                    t.source_id == source_id
                        && t.block_number >= from_block
                        && t.block_number <= to_block
                })
                .cloned()
                .collect();
            matched.sort_by_key(|t| (t.block_number, t.tx_index));
            matched.truncate(limit as usize);
            Ok(matched)
        }

        async fn rollback_after(&self, source_id: Uuid, fork_point: BlockNumber) -> Result<()> {
            self.logs.write().expect("lock poisoned").retain(|l| {
                l.source_id != source_id || l.block_number <= fork_point
            });
            self.transactions.write().expect("lock poisoned").retain(|t| {
                t.source_id != source_id || t.block_number <= fork_point
            });
            Ok(())
        }
    }

    /// In-memory `ControlPlaneStore` for testing without a database.
    #[derive(Debug, Default)]
    pub struct MockControlPlaneStore {
        blockchains: RwLock<HashMap<Uuid, Blockchain>>,
        log_stores: RwLock<HashMap<Uuid, LogStore>>,
        pipelines: RwLock<HashMap<Uuid, Pipeline>>,
        abis: RwLock<HashMap<Uuid, Abi>>,
    }

    impl MockControlPlaneStore {
        /// Create a new empty mock store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed the store with an ABI, as if `create_abi` had been called.
        pub fn insert_abi(&self, abi: Abi) {
            self.abis.write().expect("lock poisoned").insert(abi.id, abi);
        }

        /// Seed the store with a blockchain.
        pub fn insert_blockchain(&self, blockchain: Blockchain) {
            self.blockchains.write().expect("lock poisoned").insert(blockchain.id, blockchain);
        }

        /// Seed the store with a pipeline.
        pub fn insert_pipeline(&self, pipeline: Pipeline) {
            self.pipelines.write().expect("lock poisoned").insert(pipeline.id, pipeline);
        }
    }

    #[async_trait]
    impl ControlPlaneStore for MockControlPlaneStore {
        async fn create_blockchain(&self, blockchain: &Blockchain) -> Result<()> {
            self.blockchains.write().expect("lock poisoned").insert(blockchain.id, blockchain.clone());
            Ok(())
        }

        async fn get_blockchain(&self, id: Uuid) -> Result<Option<Blockchain>> {
            Ok(self.blockchains.read().expect("lock poisoned").get(&id).cloned())
        }

        async fn list_blockchains(&self) -> Result<Vec<Blockchain>> {
            Ok(self.blockchains.read().expect("lock poisoned").values().cloned().collect())
        }

        async fn update_blockchain(&self, blockchain: &Blockchain) -> Result<()> {
            self.blockchains.write().expect("lock poisoned").insert(blockchain.id, blockchain.clone());
            Ok(())
        }

        async fn create_log_store(&self, log_store: &LogStore) -> Result<()> {
            self.log_stores.write().expect("lock poisoned").insert(log_store.id, log_store.clone());
            Ok(())
        }

        async fn get_log_store(&self, id: Uuid) -> Result<Option<LogStore>> {
            Ok(self.log_stores.read().expect("lock poisoned").get(&id).cloned())
        }

        async fn list_log_stores(&self) -> Result<Vec<LogStore>> {
            Ok(self.log_stores.read().expect("lock poisoned").values().cloned().collect())
        }

        async fn create_pipeline(&self, pipeline: &Pipeline) -> Result<()> {
            self.pipelines.write().expect("lock poisoned").insert(pipeline.id, pipeline.clone());
            Ok(())
        }

        async fn get_pipeline(&self, id: Uuid) -> Result<Option<Pipeline>> {
            Ok(self.pipelines.read().expect("lock poisoned").get(&id).cloned())
        }

        async fn list_pipelines(&self, blockchain_id: Option<Uuid>) -> Result<Vec<Pipeline>> {
            let pipelines = self.pipelines.read().expect("lock poisoned");
            Ok(pipelines
                .values()
                .filter(|p| blockchain_id.map_or(true, |b| p.blockchain_id == b))
                .cloned()
                .collect())
        }

        async fn set_pipeline_enabled(&self, id: Uuid, enabled: bool) -> Result<()> {
            let mut pipelines = self.pipelines.write().expect("lock poisoned");
            if let Some(pipeline) = pipelines.get_mut(&id) {
                pipeline.enabled = enabled;
            }
            Ok(())
        }

        async fn create_abi(&self, abi: &Abi) -> Result<()> {
            self.abis.write().expect("lock poisoned").insert(abi.id, abi.clone());
            Ok(())
        }

        async fn get_abi(&self, id: Uuid) -> Result<Option<Abi>> {
            Ok(self.abis.read().expect("lock poisoned").get(&id).cloned())
        }

        async fn list_abis(&self) -> Result<Vec<Abi>> {
            Ok(self.abis.read().expect("lock poisoned").values().cloned().collect())
        }
    }

    /// In-memory `SourceStore` for testing the Supervisor without a database.
    #[derive(Debug, Default)]
    pub struct MockSourceStore {
        sources: RwLock<HashMap<Uuid, Source>>,
    }

    impl MockSourceStore {
        /// Create a new empty mock store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed the store with a source.
        pub fn insert(&self, source: Source) {
            self.sources.write().expect("lock poisoned").insert(source.id, source);
        }
    }

    #[async_trait]
    impl SourceStore for MockSourceStore {
        async fn create_source(&self, source: &Source) -> Result<()> {
            self.sources.write().expect("lock poisoned").insert(source.id, source.clone());
            Ok(())
        }

        async fn get_source(&self, id: Uuid) -> Result<Option<Source>> {
            Ok(self.sources.read().expect("lock poisoned").get(&id).cloned())
        }

        async fn list_sources(&self, pipeline_id: Option<Uuid>) -> Result<Vec<Source>> {
            let sources = self.sources.read().expect("lock poisoned");
            Ok(sources
                .values()
                .filter(|s| pipeline_id.map_or(true, |p| s.pipeline_id == p))
                .cloned()
                .collect())
        }

        async fn list_enabled_sources(&self) -> Result<Vec<Source>> {
            let sources = self.sources.read().expect("lock poisoned");
            Ok(sources.values().filter(|s| s.enabled).cloned().collect())
        }

        async fn set_source_enabled(&self, id: Uuid, enabled: bool) -> Result<()> {
            let mut sources = self.sources.write().expect("lock poisoned");
            if let Some(source) = sources.get_mut(&id) {
                source.enabled = enabled;
            }
            Ok(())
        }

        async fn set_source_status(&self, id: Uuid, status: SourceStatus) -> Result<()> {
            let mut sources = self.sources.write().expect("lock poisoned");
            if let Some(source) = sources.get_mut(&id) {
                source.status = status;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::{MockIndexStore, MockSourceStore};
    use super::*;
    use crate::types::{BlockNumber as Bn, SourceStatus, SourceType};

    fn sample_source(id: Uuid) -> Source {
        Source {
            id,
            pipeline_id: Uuid::new_v4(),
            abi_id: Uuid::new_v4(),
            chain_id: 1,
            source_type: SourceType::Full,
            type_params: crate::types::entities::SourceParams::Full,
            start_block: Bn::new(0),
            sync_block: Bn::new(0),
            enabled: true,
            status: SourceStatus::Stopped,
            decode_failure_policy: crate::types::DecodeFailurePolicy::Lenient,
        }
    }

    fn sample_log(source_id: Uuid, block: u64, log_index: u64) -> EvmLog {
        EvmLog {
            id: format!("1:{block}:{log_index}"),
            source_id,
            address: crate::types::EthAddress::ZERO,
            topics: vec![],
            data: Default::default(),
            block_number: Bn::new(block),
            block_hash: Default::default(),
            tx_hash: Default::default(),
            tx_index: 0,
            tx_from: crate::types::EthAddress::ZERO,
            log_index,
            removed: false,
            minted_at: chrono::Utc::now(),
            metadata: Default::default(),
        }
    }

    #[tokio::test]
    async fn persist_window_advances_cursor_and_dedups() {
        let store = MockIndexStore::new();
        let source_id = Uuid::new_v4();
        let log = sample_log(source_id, 100, 0);

        store.persist_window(source_id, &[log.clone()], &[], Bn::new(100)).await.unwrap();
        assert_eq!(store.sync_block(source_id), Bn::new(100));
        assert_eq!(store.log_count(), 1);

        // Re-persisting the same window is idempotent.
        store.persist_window(source_id, &[log], &[], Bn::new(100)).await.unwrap();
        assert_eq!(store.log_count(), 1);
    }

    #[tokio::test]
    async fn get_logs_filters_by_range_and_source() {
        let store = MockIndexStore::new();
        let source_id = Uuid::new_v4();
        let other_source = Uuid::new_v4();
        store
            .persist_window(
                source_id,
                &[sample_log(source_id, 10, 0), sample_log(source_id, 20, 0), sample_log(other_source, 15, 0)],
                &[],
                Bn::new(20),
            )
            .await
            .unwrap();

        let logs = store.get_logs(source_id, Bn::new(0), Bn::new(15), None, 100).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].block_number, Bn::new(10));
    }

    #[tokio::test]
    async fn get_logs_cursor_pages_within_one_block() {
        let store = MockIndexStore::new();
        let source_id = Uuid::new_v4();
        store
            .persist_window(
                source_id,
                &[
                    sample_log(source_id, 10, 0),
                    sample_log(source_id, 10, 1),
                    sample_log(source_id, 10, 2),
                    sample_log(source_id, 11, 0),
                ],
                &[],
                Bn::new(11),
            )
            .await
            .unwrap();

        let first_page = store.get_logs(source_id, Bn::new(10), Bn::new(11), None, 2).await.unwrap();
        assert_eq!(first_page.len(), 2);
        assert_eq!(first_page[1].log_index, 1);

        let cursor = first_page.last().unwrap().log_index;
        let second_page = store.get_logs(source_id, Bn::new(10), Bn::new(11), Some(cursor), 2).await.unwrap();
        assert_eq!(second_page.len(), 2);
        assert_eq!(second_page[0].block_number, Bn::new(10));
        assert_eq!(second_page[0].log_index, 2);
        assert_eq!(second_page[1].block_number, Bn::new(11));
    }

    #[tokio::test]
    async fn rollback_after_removes_blocks_beyond_fork_point() {
        let store = MockIndexStore::new();
        let source_id = Uuid::new_v4();
        store
            .persist_window(
                source_id,
                &[sample_log(source_id, 10, 0), sample_log(source_id, 20, 0)],
                &[],
                Bn::new(20),
            )
            .await
            .unwrap();

        store.rollback_after(source_id, Bn::new(10)).await.unwrap();
        assert_eq!(store.log_count(), 1);
    }

    #[tokio::test]
    async fn source_store_lists_only_enabled() {
        let store = MockSourceStore::new();
        let mut enabled = sample_source(Uuid::new_v4());
        enabled.enabled = true;
        let mut disabled = sample_source(Uuid::new_v4());
        disabled.enabled = false;
        store.insert(enabled.clone());
        store.insert(disabled);

        let sources = store.list_enabled_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, enabled.id);
    }
}
