//! Port definitions for dependency injection and testability.
//!
//! Ports are trait definitions that describe what the domain layer needs.
//! Following hexagonal architecture, adapters (in the infrastructure layer)
//! implement these traits to provide concrete functionality.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Domain Layer                            │
//! │                                                                 │
//! │  Uses ports (traits) to define what it needs                   │
//! │                                                                 │
//! │  ┌────────────────┐  ┌────────────┐  ┌──────────────┐          │
//! │  │ControlPlaneStore│  │ SourceStore│  │  IndexStore  │          │
//! │  └────────┬───────┘  └─────┬──────┘  └──────┬───────┘          │
//! │           │                │                │                   │
//! └───────────┼────────────────┼────────────────┼───────────────────┘
//!             │                │                │
//!             ▼                ▼                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Infrastructure Layer                        │
//! │                                                                 │
//! │  Provides adapters (implementations) for ports                 │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐             │
//! │  │PostgresStore│  │PostgresStore│  │PostgresStore│             │
//! │  │(implements  │  │(implements  │  │(implements  │             │
//! │  │ControlPlane)│  │ SourceStore)│  │ IndexStore) │             │
//! │  └─────────────┘  └─────────────┘  └─────────────┘             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Port Categories
//!
//! | Category | Ports | Purpose |
//! |----------|-------|---------|
//! | Storage | [`ControlPlaneStore`], [`SourceStore`], [`IndexStore`] | Control-plane CRUD and indexed data persistence |
//! | Streaming | [`LogPublisher`] | Publishing decoded logs downstream (C7) |
//! | Caching | [`Cache`] | Parsed-ABI reuse |
//! | Time | [`Clock`] | Testable time operations |
//!
//! # Usage
//!
//! ```ignore
//! use evm_indexer::ports::{SourceStore, Clock, SystemClock};
//!
//! // Application code depends on traits, not implementations
//! async fn advance<S: SourceStore, C: Clock>(store: &S, clock: &C, id: uuid::Uuid) -> Result<()> {
//!     let source = store.get_source(id).await?;
//!     let now = clock.now();
//!     // ...
//!     Ok(())
//! }
//!
//! // In production, use real implementations
//! let store = PostgresStore::new(pool);
//! let clock = SystemClock;
//!
//! // In tests, use mocks
//! let store = ports::store::mocks::MockSourceStore::new();
//! let clock = FakeClock::new(fixed_time);
//! ```

mod cache;
mod clock;
mod store;
mod streaming;

// Re-export all port traits
pub use cache::Cache;
pub use clock::{Clock, SystemClock};
pub use store::{ControlPlaneStore, IndexStore, SourceStore};
pub use streaming::LogPublisher;

// Re-export test utilities for tests and downstream crates using test-utils feature
#[cfg(any(test, feature = "test-utils"))]
pub use cache::mocks as cache_mocks;
#[cfg(any(test, feature = "test-utils"))]
pub use clock::FakeClock;
#[cfg(any(test, feature = "test-utils"))]
pub use store::mocks as store_mocks;
#[cfg(any(test, feature = "test-utils"))]
pub use streaming::mocks as streaming_mocks;
