//! In-process event bus (module C4: Event Bus).
//!
//! A thin typed wrapper around [`tokio::sync::broadcast`], used for the
//! handful of topics the Source Indexer, Supervisor, and Stream Bridge
//! communicate over within one process. Unlike the store/cache/streaming
//! ports, this isn't an external dependency worth hiding behind a trait — a
//! broadcast channel is already a deterministic, fake-free primitive in
//! tests, so `EventBus` is used directly everywhere.
//!
//! # Topics
//!
//! | Event | Published by | Payload |
//! |-------|---------------|---------|
//! | `log.new` | Source Indexer, after a successful persist + cursor bump | batch of [`EvmLog`] |
//! | `source.enable` | Control-plane API | source id |
//! | `source.disable` | Control-plane API | source id |
//! | `factory.new-contract` | Source Indexer (Factory sources) | [`NewSourceDescriptor`] |
//! | `signal.shutdown` | main/signal handler | (none) |
//!
//! `log.new` only fires after the record is durable, so Stream Bridge
//! subscribers never observe a log that a crash could make disappear.
//!
//! # Usage
//!
//! ```
//! use evm_indexer::bus::{BusEvent, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//! bus.publish(BusEvent::Shutdown);
//! ```

use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::types::entities::EvmLog;
use crate::types::primitives::{BlockNumber, EthAddress};

/// Default broadcast channel capacity. Lagging subscribers drop the oldest
/// unread events past this bound rather than apply backpressure to
/// publishers.
const DEFAULT_CAPACITY: usize = 1024;

// ═══════════════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Descriptor for a child contract a Factory source discovered.
///
/// Published as the payload of `factory.new-contract` when a decoded log's
/// event name matches the source's `creation_event_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSourceDescriptor {
    /// Address extracted from `fields[creation_address_arg]`.
    pub new_address: EthAddress,
    /// ABI the new child source should decode with.
    pub child_abi_id: Uuid,
    /// Pipeline the new source belongs to.
    pub pipeline_id: Uuid,
    /// First block the new source should scan, the block the creation log
    /// was emitted in.
    pub start_block: BlockNumber,
}

/// An event published on the [`EventBus`].
#[derive(Debug, Clone)]
pub enum BusEvent {
    /// `log.new`.
    LogNew(Arc<[EvmLog]>),
    /// `source.enable`.
    SourceEnable(Uuid),
    /// `source.disable`.
    SourceDisable(Uuid),
    /// `factory.new-contract`.
    FactoryNewContract(NewSourceDescriptor),
    /// `signal.shutdown`.
    Shutdown,
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT BUS
// ═══════════════════════════════════════════════════════════════════════════════

/// Typed, cloneable handle to an in-process pub/sub channel.
///
/// Cloning an `EventBus` yields another handle to the same underlying
/// channel (the inner `broadcast::Sender` is reference-counted), so it can
/// be freely shared across the Supervisor, every Source Indexer task, and
/// the Stream Bridge without wrapping it in an `Arc` at call sites.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusEvent>,
}

impl EventBus {
    /// Create a bus with the default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus with an explicit channel capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// A send with zero subscribers is not an error: the Supervisor may not
    /// have spawned a Source Indexer yet, or the last subscriber may have
    /// just disconnected.
    pub fn publish(&self, event: BusEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to future events. Events published before this call are
    /// never delivered to this receiver.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }

    /// Number of currently active subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("receiver_count", &self.sender.receiver_count())
            .finish_non_exhaustive()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
