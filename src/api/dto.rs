//! Request bodies for the control-plane CRUD routes.
//!
//! Response bodies are the domain entities themselves ([`crate::types`]
//! already derives `Serialize`/`Deserialize` on every one of them) — these
//! types exist only where the wire shape differs from the stored shape,
//! i.e. create requests that omit a server-generated `id`.

use serde::Deserialize;
use uuid::Uuid;

use crate::types::entities::SourceParams;
use crate::types::enums::DecodeFailurePolicy;
use crate::types::primitives::BlockNumber;

/// Body for `POST /v1/blockchains`.
#[derive(Debug, Deserialize)]
pub struct CreateBlockchainRequest {
    pub chain_id: u64,
    pub rpc_url: String,
    pub block_range: u64,
    pub block_slice: u64,
    pub pull_interval_secs: u64,
    pub rpc_max_batch_size: usize,
}

/// Body for `POST /v1/log-stores`.
#[derive(Debug, Deserialize)]
pub struct CreateLogStoreRequest {
    pub name: String,
    pub config: serde_json::Value,
}

/// Body for `POST /v1/pipelines`.
#[derive(Debug, Deserialize)]
pub struct CreatePipelineRequest {
    pub name: String,
    pub blockchain_id: Uuid,
    pub log_store_id: Uuid,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Body for `POST /v1/abis`.
#[derive(Debug, Deserialize)]
pub struct CreateAbiRequest {
    pub contract_name: String,
    pub json: serde_json::Value,
}

/// Body for `POST /v1/sources`.
#[derive(Debug, Deserialize)]
pub struct CreateSourceRequest {
    pub pipeline_id: Uuid,
    pub abi_id: Uuid,
    pub chain_id: u64,
    pub type_params: SourceParams,
    pub start_block: BlockNumber,
    #[serde(default)]
    pub decode_failure_policy: DecodeFailurePolicy,
}

const fn default_true() -> bool {
    true
}
