//! Control-plane CRUD handlers and the Source enable/disable dispatch.
//!
//! Per `spec.md` §6, enabling/disabling a source is not a direct store
//! write from the API's perspective: the handler flips the `enabled`
//! column, publishes `source.enable`/`source.disable` on the bus, and
//! polls `status` for up to 10s as acknowledgement that the Supervisor
//! reacted — it never spawns or aborts a Source Indexer task itself.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::Json;
use tokio::time::Instant;
use uuid::Uuid;

use super::dto::{
    CreateAbiRequest, CreateBlockchainRequest, CreateLogStoreRequest, CreatePipelineRequest,
    CreateSourceRequest,
};
use super::AppState;
use crate::bus::BusEvent;
use crate::error::{ApiError, AppError, DomainError};
use crate::types::entities::{Abi, Blockchain, LogStore, Pipeline, Source};
use crate::types::enums::SourceStatus;

/// How long an enable/disable handler waits for the Supervisor to
/// acknowledge the request before returning the source's current
/// (possibly still-pending) status.
const ACK_TIMEOUT: Duration = Duration::from_secs(10);
const ACK_POLL_INTERVAL: Duration = Duration::from_millis(250);

// ═══════════════════════════════════════════════════════════════════════════════
// BLOCKCHAIN
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn create_blockchain(
    State(state): State<AppState>,
    Json(req): Json<CreateBlockchainRequest>,
) -> Result<Json<Blockchain>, ApiError> {
    let blockchain = Blockchain {
        id: Uuid::new_v4(),
        chain_id: req.chain_id,
        rpc_url: req.rpc_url,
        block_range: req.block_range,
        block_slice: req.block_slice,
        pull_interval_secs: req.pull_interval_secs,
        rpc_max_batch_size: req.rpc_max_batch_size,
    };
    state.control_store.create_blockchain(&blockchain).await?;
    Ok(Json(blockchain))
}

pub async fn get_blockchain(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Blockchain>, ApiError> {
    let blockchain = state
        .control_store
        .get_blockchain(id)
        .await?
        .ok_or(DomainError::BlockchainNotFound(id))?;
    Ok(Json(blockchain))
}

pub async fn list_blockchains(State(state): State<AppState>) -> Result<Json<Vec<Blockchain>>, ApiError> {
    Ok(Json(state.control_store.list_blockchains().await?))
}

pub async fn update_blockchain(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut blockchain): Json<Blockchain>,
) -> Result<Json<Blockchain>, ApiError> {
    blockchain.id = id;
    state.control_store.update_blockchain(&blockchain).await?;
    Ok(Json(blockchain))
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOG STORE
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn create_log_store(
    State(state): State<AppState>,
    Json(req): Json<CreateLogStoreRequest>,
) -> Result<Json<LogStore>, ApiError> {
    let log_store = LogStore { id: Uuid::new_v4(), name: req.name, config: req.config };
    state.control_store.create_log_store(&log_store).await?;
    Ok(Json(log_store))
}

pub async fn get_log_store(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LogStore>, ApiError> {
    let log_store = state
        .control_store
        .get_log_store(id)
        .await?
        .ok_or(DomainError::LogStoreNotFound(id))?;
    Ok(Json(log_store))
}

pub async fn list_log_stores(State(state): State<AppState>) -> Result<Json<Vec<LogStore>>, ApiError> {
    Ok(Json(state.control_store.list_log_stores().await?))
}

// ═══════════════════════════════════════════════════════════════════════════════
// PIPELINE
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn create_pipeline(
    State(state): State<AppState>,
    Json(req): Json<CreatePipelineRequest>,
) -> Result<Json<Pipeline>, ApiError> {
    let pipeline = Pipeline {
        id: Uuid::new_v4(),
        name: req.name,
        blockchain_id: req.blockchain_id,
        log_store_id: req.log_store_id,
        enabled: req.enabled,
    };
    state.control_store.create_pipeline(&pipeline).await?;
    Ok(Json(pipeline))
}

pub async fn get_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Pipeline>, ApiError> {
    let pipeline = state
        .control_store
        .get_pipeline(id)
        .await?
        .ok_or(DomainError::PipelineNotFound(id))?;
    Ok(Json(pipeline))
}

pub async fn list_pipelines(State(state): State<AppState>) -> Result<Json<Vec<Pipeline>>, ApiError> {
    Ok(Json(state.control_store.list_pipelines(None).await?))
}

pub async fn enable_pipeline(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<(), ApiError> {
    state.control_store.set_pipeline_enabled(id, true).await?;
    Ok(())
}

pub async fn disable_pipeline(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<(), ApiError> {
    state.control_store.set_pipeline_enabled(id, false).await?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// ABI
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn create_abi(
    State(state): State<AppState>,
    Json(req): Json<CreateAbiRequest>,
) -> Result<Json<Abi>, ApiError> {
    let abi = Abi { id: Uuid::new_v4(), contract_name: req.contract_name, json: req.json };
    abi.parse().map_err(|e| DomainError::AbiInvalid { contract_name: abi.contract_name.clone(), cause: e.to_string() })?;
    state.control_store.create_abi(&abi).await?;
    Ok(Json(abi))
}

pub async fn get_abi(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Abi>, ApiError> {
    let abi = state.control_store.get_abi(id).await?.ok_or(DomainError::AbiNotFound(id))?;
    Ok(Json(abi))
}

pub async fn list_abis(State(state): State<AppState>) -> Result<Json<Vec<Abi>>, ApiError> {
    Ok(Json(state.control_store.list_abis().await?))
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn create_source(
    State(state): State<AppState>,
    Json(req): Json<CreateSourceRequest>,
) -> Result<Json<Source>, ApiError> {
    let source = Source {
        id: Uuid::new_v4(),
        pipeline_id: req.pipeline_id,
        abi_id: req.abi_id,
        chain_id: req.chain_id,
        source_type: req.type_params.source_type(),
        type_params: req.type_params,
        start_block: req.start_block,
        sync_block: req.start_block.prev(),
        enabled: true,
        status: SourceStatus::Stopped,
        decode_failure_policy: req.decode_failure_policy,
    };
    state.source_store.create_source(&source).await?;
    Ok(Json(source))
}

pub async fn get_source(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Source>, ApiError> {
    let source = state.source_store.get_source(id).await?.ok_or(DomainError::SourceNotFound(id))?;
    Ok(Json(source))
}

pub async fn list_sources(State(state): State<AppState>) -> Result<Json<Vec<Source>>, ApiError> {
    Ok(Json(state.source_store.list_sources(None).await?))
}

pub async fn enable_source(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Source>, ApiError> {
    state.source_store.get_source(id).await?.ok_or(DomainError::SourceNotFound(id))?;
    state.source_store.set_source_enabled(id, true).await?;
    state.bus.publish(BusEvent::SourceEnable(id));
    let source = poll_until_acknowledged(&state, id, |s| s.status.is_running()).await?;
    Ok(Json(source))
}

pub async fn disable_source(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Source>, ApiError> {
    state.source_store.get_source(id).await?.ok_or(DomainError::SourceNotFound(id))?;
    state.source_store.set_source_enabled(id, false).await?;
    state.bus.publish(BusEvent::SourceDisable(id));
    let source = poll_until_acknowledged(&state, id, |s| s.status == SourceStatus::Stopped).await?;
    Ok(Json(source))
}

/// Poll `get_source` until `acknowledged` matches or `ACK_TIMEOUT` elapses,
/// returning whatever status was last observed either way — a timeout is
/// not itself an error, since the Supervisor may just be mid-grace-period.
async fn poll_until_acknowledged(
    state: &AppState,
    id: Uuid,
    acknowledged: impl Fn(&Source) -> bool,
) -> Result<Source, AppError> {
    let deadline = Instant::now() + ACK_TIMEOUT;
    loop {
        let source = state
            .source_store
            .get_source(id)
            .await?
            .ok_or(DomainError::SourceNotFound(id))?;
        if acknowledged(&source) || Instant::now() >= deadline {
            return Ok(source);
        }
        tokio::time::sleep(ACK_POLL_INTERVAL).await;
    }
}
