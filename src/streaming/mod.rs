//! Stream Bridge (C7) external sink: decoded logs out via Apache Iggy.
//!
//! This module is the downstream half of module C7: once the Source
//! Indexer persists a window and bumps its cursor, it hands the batch to a
//! [`LogPublisher`](crate::ports::LogPublisher) so external consumers can
//! receive it as a live tail, in addition to reading it back through the
//! store-backed backfill the Stream Bridge API serves.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                              Log Flow                                       │
//! │                                                                             │
//! │  ┌──────────────┐     ┌──────────────────┐     ┌──────────────────────────┐ │
//! │  │ Source       │────▶│  IggyPublisher   │────▶│     Apache Iggy          │ │
//! │  │ Indexer      │     │  (serialize &    │     │  (stream + `logs` topic) │ │
//! │  │ (persisted   │     │   send)          │     └──────────────────────────┘ │
//! │  │  EvmLog[])   │     └──────────────────┘                                  │
//! │  └──────────────┘                                                          │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This is a separate concern from [`crate::bus`] (module C4), the
//! in-process `log.new`/`source.enable`/etc. pub/sub the Supervisor and
//! Stream Bridge's live tail use. `IggyPublisher` is the *external* sink a
//! deployment can also point at; a Supervisor never needs to touch it.
//!
//! # Usage
//!
//! ```ignore
//! use evm_indexer::streaming::IggyPublisher;
//! use evm_indexer::config::IggySettings;
//!
//! let publisher = IggyPublisher::new(&settings.iggy)?;
//! publisher.connect().await?;
//!
//! publisher.publish_batch(&logs).await?;
//! ```

mod iggy_publisher;
mod topics;

pub use iggy_publisher::{IggyPublisher, NoOpPublisher};
pub use topics::{TopicConfig, LOGS_TOPIC};
