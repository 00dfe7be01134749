//! Control-plane REST API and Stream Bridge read path (module C7: read
//! side).
//!
//! Exposes the CRUD surface for `Blockchain`/`LogStore`/`Pipeline`/`Abi`/
//! `Source`, Source enable/disable (dispatched via [`crate::bus`] and
//! acknowledged by polling `status`), and log/transaction listing including
//! the `stream_logs` live-tail endpoint.
//!
//! The teacher's `internal/grpc/*-handlers.go` names the full RPC surface
//! (Create/Get/List/Update/Delete per entity, a server-streaming
//! `StreamLogs`); most of its handlers there are themselves stubs
//! (`panic("unimplemented")`), so this module mirrors the same route shapes
//! over plain JSON/SSE rather than gRPC, fully implementing Source
//! enable/disable and log listing/streaming and giving every other entity a
//! straightforward create/get/list.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                         axum::Router                              │
//! │  /v1/blockchains  /v1/log-stores  /v1/pipelines  /v1/abis          │
//! │  /v1/sources (+ enable/disable)                                   │
//! │  /v1/stores/:id/logs  /v1/stores/:id/logs/stream (SSE)             │
//! │  /v1/stores/:id/transactions                                      │
//! └───────────────────────────────┬───────────────────────────────────┘
//!                                  │ AppState
//!                                  ▼
//! ┌───────────────┐  ┌───────────────┐  ┌───────────────┐  ┌─────────┐
//! │ ControlPlane   │  │ SourceStore   │  │ IndexStore    │  │ EventBus│
//! │ Store          │  │               │  │               │  │         │
//! └───────────────┘  └───────────────┘  └───────────────┘  └─────────┘
//! ```

mod control_plane;
mod dto;
mod logs;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;

use crate::bus::EventBus;
use crate::ports::{ControlPlaneStore, IndexStore, SourceStore};

/// Shared state handed to every route handler.
///
/// Cheap to clone: every field is an `Arc` or an already-`Clone` handle.
#[derive(Clone)]
pub struct AppState {
    /// Control-plane CRUD (blockchains, log stores, pipelines, ABIs).
    pub control_store: Arc<dyn ControlPlaneStore>,
    /// Source CRUD and the enable/disable control loop.
    pub source_store: Arc<dyn SourceStore>,
    /// Indexed log/transaction reads, for the Stream Bridge read path.
    pub index_store: Arc<dyn IndexStore>,
    /// Publishes `source.enable`/`source.disable` for the Supervisor to act on.
    pub bus: EventBus,
}

/// Build the full control-plane + Stream Bridge router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { (StatusCode::OK, "ok") }))
        .route(
            "/v1/blockchains",
            get(control_plane::list_blockchains).post(control_plane::create_blockchain),
        )
        .route(
            "/v1/blockchains/:id",
            get(control_plane::get_blockchain).put(control_plane::update_blockchain),
        )
        .route(
            "/v1/log-stores",
            get(control_plane::list_log_stores).post(control_plane::create_log_store),
        )
        .route("/v1/log-stores/:id", get(control_plane::get_log_store))
        .route(
            "/v1/pipelines",
            get(control_plane::list_pipelines).post(control_plane::create_pipeline),
        )
        .route("/v1/pipelines/:id", get(control_plane::get_pipeline))
        .route(
            "/v1/pipelines/:id/enable",
            post(control_plane::enable_pipeline),
        )
        .route(
            "/v1/pipelines/:id/disable",
            post(control_plane::disable_pipeline),
        )
        .route(
            "/v1/abis",
            get(control_plane::list_abis).post(control_plane::create_abi),
        )
        .route("/v1/abis/:id", get(control_plane::get_abi))
        .route(
            "/v1/sources",
            get(control_plane::list_sources).post(control_plane::create_source),
        )
        .route("/v1/sources/:id", get(control_plane::get_source))
        .route("/v1/sources/:id/enable", post(control_plane::enable_source))
        .route("/v1/sources/:id/disable", post(control_plane::disable_source))
        .route("/v1/stores/:store_id/logs", get(logs::list_logs))
        .route("/v1/stores/:store_id/logs/stream", get(logs::stream_logs))
        .route("/v1/stores/:store_id/transactions", get(logs::list_transactions))
        .with_state(state)
}
