//! Data persistence layer (adapters for store ports).
//!
//! This module provides concrete implementations of the store ports
//! defined in [`crate::ports::store`] (module C3: Store Interface). The
//! primary implementation uses PostgreSQL.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Store Adapters                            │
//! │                                                                 │
//! │   ┌──────────────────────────────────────────────────────────┐  │
//! │   │                   PostgresStore                           │  │
//! │   │   ┌──────────────────┐  ┌─────────────┐  ┌─────────────┐  │  │
//! │   │   │ ControlPlaneStore│  │ SourceStore │  │ IndexStore  │  │  │
//! │   │   │ (blockchains,    │  │ (sources,   │  │ (logs,      │  │  │
//! │   │   │  log_stores,     │  │  cursor,    │  │  txs, sync  │  │  │
//! │   │   │  pipelines, abis)│  │  status)    │  │  cursor)    │  │  │
//! │   │   └──────────────────┘  └─────────────┘  └─────────────┘  │  │
//! │   └──────────────────────────────────────────────────────────┘  │
//! │                               │                                  │
//! │                               ▼                                  │
//! │   ┌──────────────────────────────────────────────────────────┐  │
//! │   │              SQLx Connection Pool (PostgreSQL)             │  │
//! │   └──────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use evm_indexer::store::PostgresStore;
//! use sqlx::postgres::PgPoolOptions;
//!
//! let pool = PgPoolOptions::new()
//!     .max_connections(10)
//!     .connect("postgres://localhost/evm_indexer")
//!     .await?;
//!
//! let store = PostgresStore::new(pool);
//! store.run_migrations().await?;
//!
//! // Use via trait methods
//! let sources = store.list_enabled_sources().await?;
//! ```
//!
//! # Migrations
//!
//! Migrations are located in `migrations/` and run via
//! [`PostgresStore::run_migrations`] (or `sqlx migrate run`). See
//! `migrations/0001_init.sql` for the full schema.

mod abi_cache;
mod postgres;

pub use abi_cache::MemoryAbiCache;
pub use postgres::PostgresStore;

// Re-export commonly used types for convenience
pub use sqlx::postgres::PgPool;
