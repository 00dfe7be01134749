//! EVM chain indexer.
//!
//! A configurable backend service that indexes decoded EVM contract events
//! from one or more chains, persists them to `PostgreSQL`, streams them to
//! an external Apache Iggy sink, and exposes a control-plane REST API plus
//! a log-streaming read API.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                          Supervisor (C6)                          │
//! │   spawns/restarts one Source Indexer task per enabled Source      │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                 │
//!                                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                      Source Indexer (C5)                          │
//! │  Polling -> Fetching (rpc-client) -> Decoding (abi) -> Persisting  │
//! └───────┬──────────────────────┬───────────────────────┬────────────┘
//!         │ log.new              │ persist_window         │ publish_batch
//!         ▼                      ▼                         ▼
//! ┌──────────────┐      ┌────────────────┐        ┌──────────────────┐
//! │ Event Bus(C4)│      │ Store (C3)     │        │ Streaming (C7 out)│
//! └──────┬───────┘      └────────────────┘        └──────────────────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │ Control-plane│
//! │ & Stream     │
//! │ Bridge API   │
//! └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`] - Domain types (enums, entities, primitives)
//! - [`error`] - Layered error types
//! - [`config`] - Configuration loading and validation
//! - [`abi`] - Runtime ABI-driven log decoding
//! - [`ports`] - Hexagonal port traits (store, cache, clock, streaming)
//! - [`store`] - `PostgreSQL` adapter and ABI cache
//! - [`bus`] - In-process event bus
//! - [`streaming`] - External log publisher (Apache Iggy)
//! - [`metrics`] - Process-wide Prometheus metrics façade
//! - [`indexer`] - Source Indexer and Supervisor
//!
//! # Getting Started
//!
//! ```bash
//! # Set up environment
//! cp .env.example .env
//! # Edit .env with your configuration
//!
//! # Run migrations
//! evm-indexer migrate
//!
//! # Start the indexer
//! evm-indexer run
//! ```

#![doc(html_root_url = "https://docs.rs/evm-indexer")]

pub mod abi;
pub mod api;
pub mod bus;
pub mod config;
pub mod error;
pub mod indexer;
pub mod metrics;
pub mod ports;
pub mod store;
pub mod streaming;
pub mod types;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the library version string
#[must_use]
pub const fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
        assert!(version().starts_with("0."));
    }
}
