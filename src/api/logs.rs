//! Log/transaction listing and the `stream_logs` live-tail endpoint (module
//! C7: Stream Bridge read path).
//!
//! # `stream_logs` protocol
//!
//! 1. Resolve `global_latest` = the minimum `sync_block` across every
//!    source feeding this store (the conservative watermark: nothing past
//!    it is guaranteed durable for every source yet).
//! 2. An explicit `to_block` beyond `global_latest` is rejected as
//!    [`DomainError::OutOfRange`].
//! 3. Back-fill `[from_block, min(to_block, global_latest)]` per source,
//!    paginated by `batch_size`, until a source's page comes back short of
//!    a full page.
//! 4. If `to_latest` is false, the stream closes there.
//! 5. Otherwise, re-read each source's current `sync_block` and back-fill
//!    the gap opened since step 1 in one pass.
//! 6. Finally, subscribe to [`crate::bus::BusEvent::LogNew`] and forward
//!    logs belonging to one of this store's sources until the client
//!    disconnects (detected as a closed channel) or the process shuts down.
//!
//! Delivery is at-least-once across the step 5 / step 6 handoff — a log
//! published in that window may be forwarded twice. Clients dedupe by
//! [`EvmLog::id`]. Ordering is monotonic per source; cross-source ordering
//! is not guaranteed, since each source is backfilled independently.

use std::collections::HashSet;
use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::Stream;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use uuid::Uuid;

use super::AppState;
use crate::bus::BusEvent;
use crate::error::{ApiError, DomainError};
use crate::types::entities::{EvmLog, EvmTransaction, Source};
use crate::types::primitives::BlockNumber;

/// Channel capacity between the background backfill/tail task and the SSE
/// response body; small on purpose, since a slow client should apply
/// backpressure to its own tail rather than let the server buffer forever.
const SSE_CHANNEL_CAPACITY: usize = 64;

fn default_limit() -> u32 {
    500
}

#[derive(Debug, Deserialize)]
pub struct ListLogsQuery {
    pub from_block: u64,
    pub to_block: u64,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct StreamLogsQuery {
    pub from_block: u64,
    pub to_block: Option<u64>,
    #[serde(default)]
    pub to_latest: bool,
    #[serde(default = "default_limit")]
    pub batch_size: u32,
}

/// Every [`Source`] whose pipeline streams to `store_id`.
async fn sources_for_store(state: &AppState, store_id: Uuid) -> Result<Vec<Source>, ApiError> {
    let pipelines = state.control_store.list_pipelines(None).await?;
    let mut sources = Vec::new();
    for pipeline in pipelines.into_iter().filter(|p| p.log_store_id == store_id) {
        sources.extend(state.source_store.list_sources(Some(pipeline.id)).await?);
    }
    Ok(sources)
}

// ═══════════════════════════════════════════════════════════════════════════════
// NON-STREAMING LISTING
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn list_logs(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
    Query(query): Query<ListLogsQuery>,
) -> Result<Json<Vec<EvmLog>>, ApiError> {
    state
        .control_store
        .get_log_store(store_id)
        .await?
        .ok_or(DomainError::LogStoreNotFound(store_id))?;

    let sources = sources_for_store(&state, store_id).await?;
    let from = BlockNumber::new(query.from_block);
    let to = BlockNumber::new(query.to_block);

    let mut logs = Vec::new();
    for source in &sources {
        logs.extend(state.index_store.get_logs(source.id, from, to, None, query.limit).await?);
    }
    logs.sort_by_key(|l| (l.block_number, l.log_index));
    Ok(Json(logs))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
    Query(query): Query<ListLogsQuery>,
) -> Result<Json<Vec<EvmTransaction>>, ApiError> {
    state
        .control_store
        .get_log_store(store_id)
        .await?
        .ok_or(DomainError::LogStoreNotFound(store_id))?;

    let sources = sources_for_store(&state, store_id).await?;
    let from = BlockNumber::new(query.from_block);
    let to = BlockNumber::new(query.to_block);

    let mut txs = Vec::new();
    for source in &sources {
        txs.extend(state.index_store.get_transactions(source.id, from, to, query.limit).await?);
    }
    txs.sort_by_key(|t| (t.block_number, t.tx_index));
    Ok(Json(txs))
}

// ═══════════════════════════════════════════════════════════════════════════════
// STREAM LOGS
// ═══════════════════════════════════════════════════════════════════════════════

pub async fn stream_logs(
    State(state): State<AppState>,
    Path(store_id): Path<Uuid>,
    Query(query): Query<StreamLogsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    state
        .control_store
        .get_log_store(store_id)
        .await?
        .ok_or(DomainError::LogStoreNotFound(store_id))?;

    let sources = sources_for_store(&state, store_id).await?;
    let global_latest = sources.iter().map(|s| s.sync_block).min().unwrap_or_else(|| BlockNumber::new(0));

    let from_block = BlockNumber::new(query.from_block);
    let to_block = query.to_block.map(BlockNumber::new);
    if let Some(requested) = to_block {
        if requested > global_latest {
            return Err(DomainError::OutOfRange { requested: requested.get(), synced: global_latest.get() }.into());
        }
    }
    let backfill_to = to_block.unwrap_or(global_latest);
    let batch_size = query.batch_size.max(1);
    let source_ids: HashSet<Uuid> = sources.iter().map(|s| s.id).collect();

    let (tx, rx) = mpsc::channel(SSE_CHANNEL_CAPACITY);
    tokio::spawn(run_stream(state, source_ids, from_block, backfill_to, global_latest, query.to_latest, batch_size, tx));

    Ok(Sse::new(ReceiverStream::new(rx)).keep_alive(KeepAlive::default()))
}

#[allow(clippy::too_many_arguments)]
async fn run_stream(
    state: AppState,
    source_ids: HashSet<Uuid>,
    from_block: BlockNumber,
    backfill_to: BlockNumber,
    global_latest: BlockNumber,
    to_latest: bool,
    batch_size: u32,
    tx: mpsc::Sender<Result<Event, Infallible>>,
) {
    for &source_id in &source_ids {
        if !backfill_source(&state, source_id, from_block, backfill_to, batch_size, &tx).await {
            return;
        }
    }

    if !to_latest {
        return;
    }

    for &source_id in &source_ids {
        let Ok(Some(source)) = state.source_store.get_source(source_id).await else { continue };
        if source.sync_block > global_latest
            && !backfill_source(&state, source_id, global_latest.next(), source.sync_block, u32::MAX, &tx).await
        {
            return;
        }
    }

    let mut rx = state.bus.subscribe();
    loop {
        match rx.recv().await {
            Ok(BusEvent::LogNew(batch)) => {
                let relevant: Vec<EvmLog> =
                    batch.iter().filter(|log| source_ids.contains(&log.source_id)).cloned().collect();
                if !relevant.is_empty() && send_logs(&tx, relevant).await.is_err() {
                    return;
                }
            }
            Ok(BusEvent::Shutdown) => return,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "stream_logs tail lagged behind the event bus");
            }
            Err(RecvError::Closed) => return,
        }
    }
}

/// Fetch and forward one source's `[from, to]` window, page by page, until
/// a short page signals the window is exhausted. Returns `false` if the
/// client disconnected mid-backfill.
///
/// Paginates with a `(block, log_index)` keyset cursor rather than
/// advancing `from` past the last page's block number, so a single block
/// holding more logs than `batch_size` is drained fully instead of having
/// its tail silently skipped.
async fn backfill_source(
    state: &AppState,
    source_id: Uuid,
    from: BlockNumber,
    to: BlockNumber,
    batch_size: u32,
    tx: &mpsc::Sender<Result<Event, Infallible>>,
) -> bool {
    if from > to {
        return true;
    }
    let mut cursor_block = from;
    let mut cursor_log_index = None;
    loop {
        let page =
            match state.index_store.get_logs(source_id, cursor_block, to, cursor_log_index, batch_size).await {
                Ok(page) => page,
                Err(err) => {
                    error!(%source_id, error = %err, "stream_logs backfill failed");
                    return true;
                }
            };
        let Some(&EvmLog { block_number: last_block, log_index: last_log_index, .. }) = page.last() else {
            return true;
        };
        let full_page = page.len() as u64 >= u64::from(batch_size);
        if send_logs(tx, page).await.is_err() {
            return false;
        }
        if !full_page || last_block >= to {
            return true;
        }
        cursor_block = last_block;
        cursor_log_index = Some(last_log_index);
    }
}

async fn send_logs(tx: &mpsc::Sender<Result<Event, Infallible>>, logs: Vec<EvmLog>) -> Result<(), ()> {
    let event = Event::default().event("logs").json_data(&logs).unwrap_or_else(|_| Event::default().event("logs"));
    tx.send(Ok(event)).await.map_err(|_| ())
}
