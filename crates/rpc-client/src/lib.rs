//! Chain-agnostic, read-only RPC client abstraction for EVM-compatible blockchains.
//!
//! This crate provides a single interface for reading chain state — head
//! block, logs, transactions, headers — that works the same whether the
//! caller is talking to Ethereum mainnet, an L2, or a private devnet. It
//! deliberately excludes transaction sending, nonce management, and gas
//! estimation: those belong to a writer, not an indexer.
//!
//! # Quick Start
//!
//! ```ignore
//! use rpc_client::{RpcClient, JsonRpcClient, LogFilter};
//!
//! async fn recent_logs(client: &JsonRpcClient) -> rpc_client::Result<()> {
//!     let head = client.head_block().await?;
//!     let logs = client.get_logs(LogFilter::new(head.number - 100, head.number)).await?;
//!     println!("found {} logs", logs.len());
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - The [`RpcClient`] trait
//! - [`types`] - [`LogFilter`], [`BlockHeader`], [`RpcTransaction`]
//! - [`json`] - [`JsonRpcClient`], a production implementation over `json-rpc-batch`
//! - [`mock`] - [`MockRpcClient`], an in-memory implementation for tests
//! - [`error`] - [`RpcError`] and its transient/fatal/call-error split
//!
//! # Architecture
//!
//! This crate follows the ports-and-adapters (hexagonal) architecture:
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              Your Application                    │
//! └─────────────────────────────────────────────────┘
//!                        │
//!                        │ uses
//!                        ▼
//! ┌─────────────────────────────────────────────────┐
//! │             RpcClient trait (Port)               │
//! │  - head_block()                                  │
//! │  - chain_id()                                     │
//! │  - get_logs()                                     │
//! │  - batch_txs() / batch_headers()                  │
//! └─────────────────────────────────────────────────┘
//!                        │
//!          ┌─────────────┴─────────────┐
//!          │                           │
//!          ▼                           ▼
//! ┌─────────────────┐       ┌─────────────────────┐
//! │ JsonRpcClient    │       │ MockRpcClient       │
//! │ (Adapter)        │       │ (Adapter, tests)    │
//! │                  │       │                     │
//! │ uses: json-rpc-  │       │ uses: in-memory      │
//! │ batch, alloy     │       │ HashMap state        │
//! └─────────────────┘       └─────────────────────┘
//! ```

#![doc(html_root_url = "https://docs.rs/rpc-client")]

// ═══════════════════════════════════════════════════════════════════════════════
// MODULES
// ═══════════════════════════════════════════════════════════════════════════════

pub mod error;
pub mod json;
pub mod mock;
pub mod traits;
pub mod types;

// ═══════════════════════════════════════════════════════════════════════════════
// RE-EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

pub use error::{Result, RpcError};
pub use json::JsonRpcClient;
pub use mock::MockRpcClient;
pub use traits::RpcClient;
pub use types::{BlockHeader, LogFilter, RpcTransaction};

// ═══════════════════════════════════════════════════════════════════════════════
// PRELUDE
// ═══════════════════════════════════════════════════════════════════════════════

/// Convenience re-exports for common use.
///
/// # Usage
///
/// ```ignore
/// use rpc_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{Result, RpcError};
    pub use crate::json::JsonRpcClient;
    pub use crate::mock::MockRpcClient;
    pub use crate::traits::RpcClient;
    pub use crate::types::{BlockHeader, LogFilter, RpcTransaction};
}

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
        let _: fn(u64, u64) -> LogFilter = LogFilter::new;
        let _: fn(u64) -> MockRpcClient = MockRpcClient::new;
    }

    #[test]
    fn prelude_works() {
        use crate::prelude::*;

        let filter = LogFilter::new(0, 100);
        assert_eq!(filter.from_block, 0);

        let client = MockRpcClient::new(1);
        assert_eq!(client.call_count(), 0);
    }
}
