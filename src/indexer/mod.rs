//! Indexing runtime: one task per configured [`Source`][crate::types::Source],
//! supervised as a group.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Supervisor (C6)                         │
//! │   spawns/restarts/stops one Source Indexer task per Source      │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                  │
//!               ┌──────────────────┼──────────────────┐
//!               ▼                  ▼                  ▼
//!       ┌───────────────┐  ┌───────────────┐  ┌───────────────┐
//!       │ Source Indexer│  │ Source Indexer│  │ Source Indexer│
//!       │   (task A)    │  │   (task B)    │  │   (task N)    │
//!       └───────────────┘  └───────────────┘  └───────────────┘
//! ```
//!
//! Each Source Indexer ([`SourceIndexer`]) drives one source's poll / fetch /
//! decode / persist loop end to end; the Supervisor ([`Supervisor`]) only
//! decides when a task should exist, not what it does inside one window.

mod source_indexer;
mod supervisor;

pub use source_indexer::SourceIndexer;
pub use supervisor::Supervisor;
