//! PostgreSQL implementation of the store ports using SQLx.
//!
//! # Type Conversions
//!
//! PostgreSQL has no native types for several domain primitives, so this
//! module bridges them explicitly:
//! - `EthAddress`/`B256`/`Bytes` are stored as `BYTEA` and round-tripped
//!   through byte slices.
//! - `WeiAmount` (256-bit) is stored as `NUMERIC(78, 0)` via
//!   `WeiAmount::to_bigdecimal`/`from_bigdecimal`.
//! - `BlockNumber` and other chain-scale counters are stored as `BIGINT`
//!   and cast to/from `u64`; block numbers won't exceed `i64::MAX`.
//! - `SourceType`/`SourceStatus`/`DecodeFailurePolicy` derive `sqlx::Type`
//!   over their `i16` representation and bind/read directly as `SMALLINT`.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless,
    clippy::use_self
)]

use std::collections::HashMap;

use alloy::primitives::{Bytes, B256};
use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{InfraError, Result};
use crate::ports::{ControlPlaneStore, IndexStore, SourceStore};
use crate::types::entities::{
    Abi, Blockchain, EvmLog, EvmTransaction, LogMetadata, LogStore, Pipeline, Source, SourceParams,
};
use crate::types::enums::{DecodeFailurePolicy, SourceStatus, SourceType};
use crate::types::primitives::{BlockNumber, EthAddress, WeiAmount};

/// Wrap a row-conversion failure (malformed bytes, truncated JSON) as a
/// fatal store error, mirroring how `sqlx::Error::Decode` represents a
/// driver-level decode failure.
fn decode_err(err: impl std::error::Error + Send + Sync + 'static) -> InfraError {
    InfraError::StoreFatal(sqlx::Error::Decode(Box::new(err)))
}

fn address_from_bytes(bytes: Vec<u8>) -> std::result::Result<EthAddress, InfraError> {
    EthAddress::from_slice(&bytes).map_err(decode_err)
}

fn b256_from_bytes(bytes: &[u8]) -> std::result::Result<B256, InfraError> {
    B256::try_from(bytes).map_err(decode_err)
}

// ═══════════════════════════════════════════════════════════════════════════════
// POSTGRES STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// PostgreSQL-based store implementation.
///
/// Implements [`ControlPlaneStore`], [`SourceStore`], and [`IndexStore`]
/// using SQLx for database access.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations.
    ///
    /// # Errors
    /// Returns an error if migrations fail.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| InfraError::StoreFatal(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONTROL PLANE STORE: BLOCKCHAIN
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, FromRow)]
struct BlockchainRow {
    id: Uuid,
    chain_id: i64,
    rpc_url: String,
    block_range: i64,
    block_slice: i64,
    pull_interval_secs: i64,
    rpc_max_batch_size: i64,
}

impl From<BlockchainRow> for Blockchain {
    fn from(row: BlockchainRow) -> Self {
        Self {
            id: row.id,
            chain_id: row.chain_id as u64,
            rpc_url: row.rpc_url,
            block_range: row.block_range as u64,
            block_slice: row.block_slice as u64,
            pull_interval_secs: row.pull_interval_secs as u64,
            rpc_max_batch_size: row.rpc_max_batch_size as usize,
        }
    }
}

#[derive(Debug, FromRow)]
struct LogStoreRow {
    id: Uuid,
    name: String,
    config: serde_json::Value,
}

impl From<LogStoreRow> for LogStore {
    fn from(row: LogStoreRow) -> Self {
        Self { id: row.id, name: row.name, config: row.config }
    }
}

#[derive(Debug, FromRow)]
struct PipelineRow {
    id: Uuid,
    name: String,
    blockchain_id: Uuid,
    log_store_id: Uuid,
    enabled: bool,
}

impl From<PipelineRow> for Pipeline {
    fn from(row: PipelineRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            blockchain_id: row.blockchain_id,
            log_store_id: row.log_store_id,
            enabled: row.enabled,
        }
    }
}

#[derive(Debug, FromRow)]
struct AbiRow {
    id: Uuid,
    contract_name: String,
    json: serde_json::Value,
}

impl From<AbiRow> for Abi {
    fn from(row: AbiRow) -> Self {
        Self { id: row.id, contract_name: row.contract_name, json: row.json }
    }
}

#[async_trait]
impl ControlPlaneStore for PostgresStore {
    #[instrument(skip(self, blockchain), fields(id = %blockchain.id, chain_id = blockchain.chain_id))]
    async fn create_blockchain(&self, blockchain: &Blockchain) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blockchains (id, chain_id, rpc_url, block_range, block_slice, pull_interval_secs, rpc_max_batch_size)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(blockchain.id)
        .bind(blockchain.chain_id as i64)
        .bind(&blockchain.rpc_url)
        .bind(blockchain.block_range as i64)
        .bind(blockchain.block_slice as i64)
        .bind(blockchain.pull_interval_secs as i64)
        .bind(blockchain.rpc_max_batch_size as i64)
        .execute(&self.pool)
        .await
        .map_err(InfraError::from_sqlx)?;

        debug!("blockchain created");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_blockchain(&self, id: Uuid) -> Result<Option<Blockchain>> {
        let row = sqlx::query_as::<_, BlockchainRow>(
            r#"
            SELECT id, chain_id, rpc_url, block_range, block_slice, pull_interval_secs, rpc_max_batch_size
            FROM blockchains WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(InfraError::from_sqlx)?;

        Ok(row.map(Blockchain::from))
    }

    #[instrument(skip(self))]
    async fn list_blockchains(&self) -> Result<Vec<Blockchain>> {
        let rows = sqlx::query_as::<_, BlockchainRow>(
            r#"
            SELECT id, chain_id, rpc_url, block_range, block_slice, pull_interval_secs, rpc_max_batch_size
            FROM blockchains ORDER BY chain_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(InfraError::from_sqlx)?;

        Ok(rows.into_iter().map(Blockchain::from).collect())
    }

    #[instrument(skip(self, blockchain), fields(id = %blockchain.id))]
    async fn update_blockchain(&self, blockchain: &Blockchain) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE blockchains
            SET rpc_url = $2, block_range = $3, block_slice = $4, pull_interval_secs = $5, rpc_max_batch_size = $6
            WHERE id = $1
            "#,
        )
        .bind(blockchain.id)
        .bind(&blockchain.rpc_url)
        .bind(blockchain.block_range as i64)
        .bind(blockchain.block_slice as i64)
        .bind(blockchain.pull_interval_secs as i64)
        .bind(blockchain.rpc_max_batch_size as i64)
        .execute(&self.pool)
        .await
        .map_err(InfraError::from_sqlx)?;

        Ok(())
    }

    #[instrument(skip(self, log_store), fields(id = %log_store.id))]
    async fn create_log_store(&self, log_store: &LogStore) -> Result<()> {
        sqlx::query("INSERT INTO log_stores (id, name, config) VALUES ($1, $2, $3)")
            .bind(log_store.id)
            .bind(&log_store.name)
            .bind(&log_store.config)
            .execute(&self.pool)
            .await
            .map_err(InfraError::from_sqlx)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_log_store(&self, id: Uuid) -> Result<Option<LogStore>> {
        let row = sqlx::query_as::<_, LogStoreRow>("SELECT id, name, config FROM log_stores WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(InfraError::from_sqlx)?;

        Ok(row.map(LogStore::from))
    }

    #[instrument(skip(self))]
    async fn list_log_stores(&self) -> Result<Vec<LogStore>> {
        let rows = sqlx::query_as::<_, LogStoreRow>("SELECT id, name, config FROM log_stores ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(InfraError::from_sqlx)?;

        Ok(rows.into_iter().map(LogStore::from).collect())
    }

    #[instrument(skip(self, pipeline), fields(id = %pipeline.id))]
    async fn create_pipeline(&self, pipeline: &Pipeline) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pipelines (id, name, blockchain_id, log_store_id, enabled)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(pipeline.id)
        .bind(&pipeline.name)
        .bind(pipeline.blockchain_id)
        .bind(pipeline.log_store_id)
        .bind(pipeline.enabled)
        .execute(&self.pool)
        .await
        .map_err(InfraError::from_sqlx)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_pipeline(&self, id: Uuid) -> Result<Option<Pipeline>> {
        let row = sqlx::query_as::<_, PipelineRow>(
            "SELECT id, name, blockchain_id, log_store_id, enabled FROM pipelines WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(InfraError::from_sqlx)?;

        Ok(row.map(Pipeline::from))
    }

    #[instrument(skip(self))]
    async fn list_pipelines(&self, blockchain_id: Option<Uuid>) -> Result<Vec<Pipeline>> {
        let rows = sqlx::query_as::<_, PipelineRow>(
            r#"
            SELECT id, name, blockchain_id, log_store_id, enabled FROM pipelines
            WHERE $1::uuid IS NULL OR blockchain_id = $1
            ORDER BY name
            "#,
        )
        .bind(blockchain_id)
        .fetch_all(&self.pool)
        .await
        .map_err(InfraError::from_sqlx)?;

        Ok(rows.into_iter().map(Pipeline::from).collect())
    }

    #[instrument(skip(self))]
    async fn set_pipeline_enabled(&self, id: Uuid, enabled: bool) -> Result<()> {
        sqlx::query("UPDATE pipelines SET enabled = $2 WHERE id = $1")
            .bind(id)
            .bind(enabled)
            .execute(&self.pool)
            .await
            .map_err(InfraError::from_sqlx)?;

        Ok(())
    }

    #[instrument(skip(self, abi), fields(id = %abi.id, contract = %abi.contract_name))]
    async fn create_abi(&self, abi: &Abi) -> Result<()> {
        sqlx::query("INSERT INTO abis (id, contract_name, json) VALUES ($1, $2, $3)")
            .bind(abi.id)
            .bind(&abi.contract_name)
            .bind(&abi.json)
            .execute(&self.pool)
            .await
            .map_err(InfraError::from_sqlx)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_abi(&self, id: Uuid) -> Result<Option<Abi>> {
        let row = sqlx::query_as::<_, AbiRow>("SELECT id, contract_name, json FROM abis WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(InfraError::from_sqlx)?;

        Ok(row.map(Abi::from))
    }

    #[instrument(skip(self))]
    async fn list_abis(&self) -> Result<Vec<Abi>> {
        let rows = sqlx::query_as::<_, AbiRow>("SELECT id, contract_name, json FROM abis ORDER BY contract_name")
            .fetch_all(&self.pool)
            .await
            .map_err(InfraError::from_sqlx)?;

        Ok(rows.into_iter().map(Abi::from).collect())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE STORE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, FromRow)]
struct SourceRow {
    id: Uuid,
    pipeline_id: Uuid,
    abi_id: Uuid,
    chain_id: i64,
    source_type: SourceType,
    type_params: serde_json::Value,
    start_block: i64,
    sync_block: i64,
    enabled: bool,
    status: SourceStatus,
    decode_failure_policy: DecodeFailurePolicy,
}

impl TryFrom<SourceRow> for Source {
    type Error = InfraError;

    fn try_from(row: SourceRow) -> std::result::Result<Self, Self::Error> {
        let type_params: SourceParams =
            serde_json::from_value(row.type_params).map_err(InfraError::Serialization)?;

        Ok(Self {
            id: row.id,
            pipeline_id: row.pipeline_id,
            abi_id: row.abi_id,
            chain_id: row.chain_id as u64,
            source_type: row.source_type,
            type_params,
            start_block: BlockNumber::new(row.start_block as u64),
            sync_block: BlockNumber::new(row.sync_block as u64),
            enabled: row.enabled,
            status: row.status,
            decode_failure_policy: row.decode_failure_policy,
        })
    }
}

const SOURCE_COLUMNS: &str = r#"
    id, pipeline_id, abi_id, chain_id, source_type, type_params,
    start_block, sync_block, enabled, status, decode_failure_policy
"#;

#[async_trait]
impl SourceStore for PostgresStore {
    #[instrument(skip(self, source), fields(id = %source.id, pipeline_id = %source.pipeline_id))]
    async fn create_source(&self, source: &Source) -> Result<()> {
        let type_params = serde_json::to_value(&source.type_params).map_err(InfraError::Serialization)?;

        sqlx::query(
            r#"
            INSERT INTO sources (
                id, pipeline_id, abi_id, chain_id, source_type, type_params,
                start_block, sync_block, enabled, status, decode_failure_policy
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(source.id)
        .bind(source.pipeline_id)
        .bind(source.abi_id)
        .bind(source.chain_id as i64)
        .bind(source.source_type)
        .bind(type_params)
        .bind(i64::from(source.start_block))
        .bind(i64::from(source.sync_block))
        .bind(source.enabled)
        .bind(source.status)
        .bind(source.decode_failure_policy)
        .execute(&self.pool)
        .await
        .map_err(InfraError::from_sqlx)?;

        debug!("source created");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_source(&self, id: Uuid) -> Result<Option<Source>> {
        let row = sqlx::query_as::<_, SourceRow>(&format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(InfraError::from_sqlx)?;

        row.map(Source::try_from).transpose().map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self, pipeline_id: Option<Uuid>) -> Result<Vec<Source>> {
        let rows = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {SOURCE_COLUMNS} FROM sources WHERE $1::uuid IS NULL OR pipeline_id = $1"
        ))
        .bind(pipeline_id)
        .fetch_all(&self.pool)
        .await
        .map_err(InfraError::from_sqlx)?;

        rows.into_iter().map(Source::try_from).collect::<std::result::Result<_, _>>().map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn list_enabled_sources(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {SOURCE_COLUMNS} FROM sources WHERE enabled = true"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(InfraError::from_sqlx)?;

        rows.into_iter().map(Source::try_from).collect::<std::result::Result<_, _>>().map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn set_source_enabled(&self, id: Uuid, enabled: bool) -> Result<()> {
        sqlx::query("UPDATE sources SET enabled = $2 WHERE id = $1")
            .bind(id)
            .bind(enabled)
            .execute(&self.pool)
            .await
            .map_err(InfraError::from_sqlx)?;

        Ok(())
    }

    #[instrument(skip(self), fields(status = status.name()))]
    async fn set_source_status(&self, id: Uuid, status: SourceStatus) -> Result<()> {
        sqlx::query("UPDATE sources SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(InfraError::from_sqlx)?;

        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INDEX STORE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, FromRow)]
struct LogRow {
    id: String,
    source_id: Uuid,
    address: Vec<u8>,
    topics: Vec<Vec<u8>>,
    data: Vec<u8>,
    block_number: i64,
    block_hash: Vec<u8>,
    tx_hash: Vec<u8>,
    tx_index: i64,
    tx_from: Vec<u8>,
    log_index: i64,
    removed: bool,
    minted_at: chrono::DateTime<chrono::Utc>,
    contract: String,
    event_name: Option<String>,
    fields: serde_json::Value,
}

impl TryFrom<LogRow> for EvmLog {
    type Error = InfraError;

    fn try_from(row: LogRow) -> std::result::Result<Self, Self::Error> {
        let topics = row.topics.iter().map(|t| b256_from_bytes(t)).collect::<std::result::Result<_, _>>()?;
        let fields: HashMap<String, String> = serde_json::from_value(row.fields).map_err(InfraError::Serialization)?;

        Ok(Self {
            id: row.id,
            source_id: row.source_id,
            address: address_from_bytes(row.address)?,
            topics,
            data: Bytes::from(row.data),
            block_number: BlockNumber::new(row.block_number as u64),
            block_hash: b256_from_bytes(&row.block_hash)?,
            tx_hash: b256_from_bytes(&row.tx_hash)?,
            tx_index: row.tx_index as u64,
            tx_from: address_from_bytes(row.tx_from)?,
            log_index: row.log_index as u64,
            removed: row.removed,
            minted_at: row.minted_at,
            metadata: LogMetadata { contract: row.contract, event_name: row.event_name, fields },
        })
    }
}

#[derive(Debug, FromRow)]
struct TransactionRow {
    id: String,
    source_id: Uuid,
    block_number: i64,
    tx_index: i64,
    chain_id: i64,
    from: Vec<u8>,
    to: Vec<u8>,
    data: Vec<u8>,
    value: sqlx::types::BigDecimal,
    nonce: i64,
    hash: Vec<u8>,
    minted_at: chrono::DateTime<chrono::Utc>,
    metadata: serde_json::Value,
}

impl TryFrom<TransactionRow> for EvmTransaction {
    type Error = InfraError;

    fn try_from(row: TransactionRow) -> std::result::Result<Self, Self::Error> {
        let to = address_from_bytes(row.to)?;
        let metadata: HashMap<String, String> =
            serde_json::from_value(row.metadata).map_err(InfraError::Serialization)?;

        Ok(Self {
            id: row.id,
            source_id: row.source_id,
            block_number: BlockNumber::new(row.block_number as u64),
            tx_index: row.tx_index as u64,
            chain_id: row.chain_id as u64,
            from: address_from_bytes(row.from)?,
            to,
            data: Bytes::from(row.data),
            value: WeiAmount::from_bigdecimal(&row.value),
            nonce: row.nonce as u64,
            hash: b256_from_bytes(&row.hash)?,
            minted_at: row.minted_at,
            metadata,
        })
    }
}

#[async_trait]
impl IndexStore for PostgresStore {
    #[instrument(skip(self, logs, transactions), fields(source_id = %source_id, logs = logs.len(), txs = transactions.len(), sync_block = %new_sync_block))]
    async fn persist_window(
        &self,
        source_id: Uuid,
        logs: &[EvmLog],
        transactions: &[EvmTransaction],
        new_sync_block: BlockNumber,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(InfraError::from_sqlx)?;

        for txn in transactions {
            sqlx::query(
                r#"
                INSERT INTO transactions (
                    id, source_id, block_number, tx_index, chain_id, "from", "to",
                    data, value, nonce, hash, minted_at, metadata
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(&txn.id)
            .bind(txn.source_id)
            .bind(i64::from(txn.block_number))
            .bind(txn.tx_index as i64)
            .bind(txn.chain_id as i64)
            .bind(txn.from.as_slice())
            .bind(txn.to.as_slice())
            .bind(txn.data.as_ref())
            .bind(txn.value.to_bigdecimal())
            .bind(txn.nonce as i64)
            .bind(txn.hash.as_slice())
            .bind(txn.minted_at)
            .bind(serde_json::to_value(&txn.metadata).map_err(InfraError::Serialization)?)
            .execute(&mut *tx)
            .await
            .map_err(InfraError::from_sqlx)?;
        }

        for log in logs {
            let topics: Vec<Vec<u8>> = log.topics.iter().map(|t| t.as_slice().to_vec()).collect();

            sqlx::query(
                r#"
                INSERT INTO logs (
                    id, source_id, address, topics, data, block_number, block_hash,
                    tx_hash, tx_index, tx_from, log_index, removed, minted_at,
                    contract, event_name, fields
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(&log.id)
            .bind(log.source_id)
            .bind(log.address.as_slice())
            .bind(&topics)
            .bind(log.data.as_ref())
            .bind(i64::from(log.block_number))
            .bind(log.block_hash.as_slice())
            .bind(log.tx_hash.as_slice())
            .bind(log.tx_index as i64)
            .bind(log.tx_from.as_slice())
            .bind(log.log_index as i64)
            .bind(log.removed)
            .bind(log.minted_at)
            .bind(&log.metadata.contract)
            .bind(&log.metadata.event_name)
            .bind(serde_json::to_value(&log.metadata.fields).map_err(InfraError::Serialization)?)
            .execute(&mut *tx)
            .await
            .map_err(InfraError::from_sqlx)?;
        }

        sqlx::query("UPDATE sources SET sync_block = $2 WHERE id = $1")
            .bind(source_id)
            .bind(i64::from(new_sync_block))
            .execute(&mut *tx)
            .await
            .map_err(InfraError::from_sqlx)?;

        tx.commit().await.map_err(InfraError::from_sqlx)?;

        debug!("window persisted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_logs(
        &self,
        source_id: Uuid,
        from_block: BlockNumber,
        to_block: BlockNumber,
        after_log_index: Option<u64>,
        limit: u32,
    ) -> Result<Vec<EvmLog>> {
        let rows = sqlx::query_as::<_, LogRow>(
            r#"
            SELECT id, source_id, address, topics, data, block_number, block_hash,
                   tx_hash, tx_index, tx_from, log_index, removed, minted_at,
                   contract, event_name, fields
            FROM logs
            WHERE source_id = $1
              AND block_number BETWEEN $2 AND $3
              AND ($5::BIGINT IS NULL OR block_number > $2 OR log_index > $5)
            ORDER BY block_number, log_index
            LIMIT $4
            "#,
        )
        .bind(source_id)
        .bind(i64::from(from_block))
        .bind(i64::from(to_block))
        .bind(i64::from(limit))
        .bind(after_log_index.map(|i| i as i64))
        .fetch_all(&self.pool)
        .await
        .map_err(InfraError::from_sqlx)?;

        rows.into_iter().map(EvmLog::try_from).collect::<std::result::Result<_, _>>().map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn get_transactions(
        &self,
        source_id: Uuid,
        from_block: BlockNumber,
        to_block: BlockNumber,
        limit: u32,
    ) -> Result<Vec<EvmTransaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, source_id, block_number, tx_index, chain_id, "from", "to",
                   data, value, nonce, hash, minted_at, metadata
            FROM transactions
            WHERE source_id = $1 AND block_number BETWEEN $2 AND $3
            ORDER BY block_number, tx_index
            LIMIT $4
            "#,
        )
        .bind(source_id)
        .bind(i64::from(from_block))
        .bind(i64::from(to_block))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(InfraError::from_sqlx)?;

        rows.into_iter().map(EvmTransaction::try_from).collect::<std::result::Result<_, _>>().map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn rollback_after(&self, source_id: Uuid, fork_point: BlockNumber) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(InfraError::from_sqlx)?;

        sqlx::query("DELETE FROM logs WHERE source_id = $1 AND block_number > $2")
            .bind(source_id)
            .bind(i64::from(fork_point))
            .execute(&mut *tx)
            .await
            .map_err(InfraError::from_sqlx)?;

        sqlx::query("DELETE FROM transactions WHERE source_id = $1 AND block_number > $2")
            .bind(source_id)
            .bind(i64::from(fork_point))
            .execute(&mut *tx)
            .await
            .map_err(InfraError::from_sqlx)?;

        tx.commit().await.map_err(InfraError::from_sqlx)?;

        debug!(fork_point = %fork_point, "rolled back past fork point");
        Ok(())
    }
}
