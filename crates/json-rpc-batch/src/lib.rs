//! Generic batch-coalescing JSON-RPC transport.
//!
//! This crate provides [`BatchClient`], a low-level raw-HTTP JSON-RPC client
//! that coalesces many calls into `[{jsonrpc,id,method,params}, …]` array
//! requests bounded by a configurable maximum batch size, and isolates
//! per-call RPC errors from whole-batch transport failures.
//!
//! # Crate Relationships
//!
//! This is the lowest-level crate in the indexer stack:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Application Layer (evm-indexer)                         │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │  Abstraction Layer (rpc-client)                           │
//! │  └─ chain-agnostic RpcClient trait, uses this crate for   │
//! │     batch_txs / batch_headers                             │
//! └────────────────────────────┬─────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │  Transport Layer (json-rpc-batch) ◄── YOU ARE HERE        │
//! │  └─ raw HTTP JSON-RPC batching, no chain-specific types    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! **Use this crate directly when:**
//! - Building a custom RPC client needing low-level batch control
//! - Implementing a new chain adapter in `rpc-client`
//!
//! **Use `rpc-client` instead when:**
//! - Building indexer logic that should work against any EVM-compatible
//!   chain's RPC endpoint
//!
//! # Quick Start
//!
//! ```ignore
//! use json_rpc_batch::{BatchClient, Call};
//! use serde_json::json;
//!
//! let client = BatchClient::new("https://rpc.example.com")?;
//!
//! let calls = vec![
//!     Call::new("eth_getBlockByNumber", json!(["0x100", false])),
//!     Call::new("eth_getTransactionByHash", json!(["0xabc..."])),
//! ];
//!
//! let results = client.send_batch(calls).await?;
//! ```
//!
//! # Why Batching?
//!
//! Backfilling a block range one RPC call at a time is dominated by
//! round-trip latency, not server-side work. Coalescing calls into a single
//! HTTP request amortizes that latency across the whole window, at the cost
//! of bounding batch size so a single request can't overwhelm the endpoint
//! or the caller's memory.
//!
//! # Modules
//!
//! - [`client`] - The main [`BatchClient`] implementation
//! - [`config`] - Configuration options via [`ClientConfig`]
//! - [`types`] - Request/response types for batch calls
//! - [`error`] - Error types with detailed context
//!
//! # Error Handling
//!
//! Transport-level failures return [`BatchError`]. Per-call JSON-RPC errors
//! are surfaced inside each call's [`CallOutcome`] and never fail the whole
//! batch:
//!
//! ```ignore
//! match client.send_batch(calls).await {
//!     Ok(outcomes) => {
//!         for outcome in outcomes {
//!             match outcome {
//!                 Ok(value) => { /* this call succeeded */ }
//!                 Err(call_error) if call_error.is_retryable() => { /* retry this one call */ }
//!                 Err(call_error) => { /* this call failed permanently */ }
//!             }
//!         }
//!     }
//!     Err(e) if e.is_retryable() => { /* retry the whole batch */ }
//!     Err(e) => { /* transport failed permanently */ }
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/json-rpc-batch")]

// ═══════════════════════════════════════════════════════════════════════════════
// MODULES
// ═══════════════════════════════════════════════════════════════════════════════

pub mod client;
pub mod config;
pub mod error;
pub mod types;

// ═══════════════════════════════════════════════════════════════════════════════
// RE-EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

pub use client::BatchClient;
pub use config::ClientConfig;
pub use error::{BatchError, CallError, Result};
pub use types::{Call, CallOutcome};

// ═══════════════════════════════════════════════════════════════════════════════
// CRATE INFO
// ═══════════════════════════════════════════════════════════════════════════════

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version string.
#[must_use]
pub const fn version() -> &'static str {
    VERSION
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
        assert!(version().starts_with("0."));
    }

    #[test]
    fn exports_are_available() {
        let _: fn() -> Result<BatchClient> = || BatchClient::new("http://localhost");
        let _: ClientConfig = ClientConfig::default();
        let _: Call = Call::new("eth_chainId", serde_json::json!([]));
    }
}
