//! Process-wide metrics façade (module C8: Metrics Sink).
//!
//! A thin layer over the [`metrics`] crate's global recorder: named
//! constants for the gauges/counters this indexer reports, plus
//! [`install`] to wire a Prometheus exporter at startup. Call sites never
//! touch a recorder handle directly — `metrics::gauge!`/`counter!` resolve
//! against whatever recorder `install` registered, or silently no-op if
//! none was installed (useful in tests).
//!
//! # Global mutable state
//!
//! Per `spec.md` §9: the metrics sink is a process-wide façade, initialized
//! once at startup with no teardown. [`install`] must be called at most
//! once per process; calling it twice returns an error from
//! `metrics_exporter_prometheus` rather than silently replacing the
//! recorder.
//!
//! # Usage
//!
//! ```ignore
//! use evm_indexer::config::MetricsSettings;
//! use evm_indexer::metrics;
//!
//! metrics::install(&settings.metrics)?;
//! metrics::set_sync_block(source_id, 12_345);
//! ```

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use uuid::Uuid;

use crate::config::MetricsSettings;

/// Current highest block number a source has durably persisted.
pub const SYNC_BLOCK: &str = "indexer_sync_block";
/// Current chain head as last observed by a source's Polling state.
pub const HEAD_BLOCK: &str = "indexer_head_block";
/// Total RPC calls issued, by client method.
pub const RPC_CALLS_TOTAL: &str = "indexer_rpc_calls_total";
/// Total logs fetched from `get_logs`, before decoding.
pub const LOGS_SCRAPED_TOTAL: &str = "indexer_logs_scraped_total";
/// Total logs durably persisted.
pub const LOGS_STORED_TOTAL: &str = "indexer_logs_stored_total";
/// Store size in bytes, as last reported by the store adapter.
pub const STORE_SIZE_BYTES: &str = "indexer_store_size_bytes";

/// Label key every per-source metric is tagged with.
const SOURCE_ID_LABEL: &str = "source_id";

/// Install the Prometheus exporter and bind it to `settings.port`.
///
/// Call once at process startup, before any Source Indexer or Supervisor
/// task is spawned. A no-op (returns `Ok`) if `settings.enabled` is false —
/// the `metrics` crate macros become no-ops without an installed recorder.
///
/// # Errors
/// Returns an error if the exporter cannot bind its listener socket or a
/// recorder has already been installed.
pub fn install(settings: &MetricsSettings) -> Result<(), BuildError> {
    if !settings.enabled {
        return Ok(());
    }

    let addr: std::net::SocketAddr = format!("0.0.0.0:{}", settings.port)
        .parse()
        .unwrap_or_else(|_| ([0, 0, 0, 0], settings.port).into());

    PrometheusBuilder::new().with_http_listener(addr).install()?;
    Ok(())
}

/// Record a source's current sync cursor.
pub fn set_sync_block(source_id: Uuid, value: u64) {
    metrics::gauge!(SYNC_BLOCK, SOURCE_ID_LABEL => source_id.to_string()).set(value as f64);
}

/// Record a source's last-observed chain head.
pub fn set_head_block(source_id: Uuid, value: u64) {
    metrics::gauge!(HEAD_BLOCK, SOURCE_ID_LABEL => source_id.to_string()).set(value as f64);
}

/// Increment the RPC call counter for one source.
pub fn incr_rpc_calls(source_id: Uuid, count: u64) {
    metrics::counter!(RPC_CALLS_TOTAL, SOURCE_ID_LABEL => source_id.to_string()).increment(count);
}

/// Increment the scraped-logs counter (fetched, pre-decode) for one source.
pub fn incr_logs_scraped(source_id: Uuid, count: u64) {
    metrics::counter!(LOGS_SCRAPED_TOTAL, SOURCE_ID_LABEL => source_id.to_string()).increment(count);
}

/// Increment the stored-logs counter (durably persisted) for one source.
pub fn incr_logs_stored(source_id: Uuid, count: u64) {
    metrics::counter!(LOGS_STORED_TOTAL, SOURCE_ID_LABEL => source_id.to_string()).increment(count);
}

/// Record the store's reported size in bytes.
pub fn set_store_size_bytes(value: u64) {
    metrics::gauge!(STORE_SIZE_BYTES).set(value as f64);
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
