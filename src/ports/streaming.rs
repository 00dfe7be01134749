//! Streaming port for decoded-log publishing (module C7: Stream Bridge).
//!
//! Defines the contract a [`crate::types::LogStore`] adapter implements to
//! receive indexed logs. The production adapter speaks to Apache Iggy; test
//! code uses the in-memory mock below.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::entities::EvmLog;

// ═══════════════════════════════════════════════════════════════════════════════
// LOG PUBLISHER
// ═══════════════════════════════════════════════════════════════════════════════

/// Port for publishing decoded logs to a downstream [`crate::types::LogStore`].
///
/// # Delivery Semantics
///
/// At-least-once: a log may be published more than once (e.g. after a
/// Source Indexer restart re-fetches an un-advanced window), so
/// subscribers are expected to dedup by [`EvmLog::id`].
///
/// # Implementation Notes
///
/// Implementations should:
/// - Use persistent message IDs for exactly-once *consumer-side* semantics
/// - Implement backpressure handling
/// - Buffer messages during network issues
#[async_trait]
pub trait LogPublisher: Send + Sync {
    /// Publish a single decoded log.
    ///
    /// # Errors
    /// Returns an error if publishing fails after retries.
    async fn publish(&self, log: &EvmLog) -> Result<()>;

    /// Publish a batch of decoded logs.
    ///
    /// More efficient than individual `publish()` calls; the whole batch
    /// either succeeds or fails together.
    ///
    /// # Errors
    /// Returns an error if the batch fails to publish.
    async fn publish_batch(&self, logs: &[EvmLog]) -> Result<()>;

    /// Flush pending messages.
    ///
    /// Ensures all buffered messages are sent before returning.
    ///
    /// # Errors
    /// Returns an error if flush fails.
    async fn flush(&self) -> Result<()>;

    /// Check if the publisher is connected.
    fn is_connected(&self) -> bool;
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks {
    //! Mock implementations for testing.

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::{async_trait, EvmLog, LogPublisher, Result};

    /// Mock publisher that counts calls and optionally fails.
    #[derive(Debug, Clone)]
    pub struct MockLogPublisher {
        /// Number of logs published.
        pub publish_count: Arc<AtomicUsize>,
        /// Whether to simulate connection.
        pub connected: Arc<AtomicBool>,
        /// Whether to fail on publish.
        pub should_fail: Arc<AtomicBool>,
    }

    impl Default for MockLogPublisher {
        fn default() -> Self {
            Self {
                publish_count: Arc::new(AtomicUsize::new(0)),
                connected: Arc::new(AtomicBool::new(true)),
                should_fail: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl MockLogPublisher {
        /// Create a new mock publisher.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Get the number of logs published.
        #[must_use]
        pub fn count(&self) -> usize {
            self.publish_count.load(Ordering::SeqCst)
        }

        /// Set whether to simulate connection failure.
        pub fn set_connected(&self, connected: bool) {
            self.connected.store(connected, Ordering::SeqCst);
        }

        /// Set whether to fail on publish.
        pub fn set_should_fail(&self, should_fail: bool) {
            self.should_fail.store(should_fail, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl LogPublisher for MockLogPublisher {
        async fn publish(&self, _log: &EvmLog) -> Result<()> {
            if self.should_fail.load(Ordering::SeqCst) {
                return Err(crate::error::AppError::Infra(crate::error::InfraError::Streaming(
                    "mock publish failure".into(),
                )));
            }
            self.publish_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn publish_batch(&self, logs: &[EvmLog]) -> Result<()> {
            if self.should_fail.load(Ordering::SeqCst) {
                return Err(crate::error::AppError::Infra(crate::error::InfraError::Streaming(
                    "mock publish failure".into(),
                )));
            }
            self.publish_count.fetch_add(logs.len(), Ordering::SeqCst);
            Ok(())
        }

        async fn flush(&self) -> Result<()> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::MockLogPublisher;
    use super::*;

    #[tokio::test]
    async fn mock_publisher_counts_logs() {
        let publisher = MockLogPublisher::new();
        assert_eq!(publisher.count(), 0);
        assert!(publisher.is_connected());

        publisher.set_connected(false);
        assert!(!publisher.is_connected());
    }

    #[tokio::test]
    async fn mock_publisher_fails_when_configured() {
        let publisher = MockLogPublisher::new();
        publisher.set_should_fail(true);

        let log = sample_log();
        assert!(publisher.publish(&log).await.is_err());
    }

    fn sample_log() -> EvmLog {
        EvmLog {
            id: "1:1:0".into(),
            source_id: uuid::Uuid::new_v4(),
            address: crate::types::EthAddress::ZERO,
            topics: vec![],
            data: Default::default(),
            block_number: crate::types::BlockNumber::new(1),
            block_hash: Default::default(),
            tx_hash: Default::default(),
            tx_index: 0,
            tx_from: crate::types::EthAddress::ZERO,
            log_index: 0,
            removed: false,
            minted_at: chrono::Utc::now(),
            metadata: Default::default(),
        }
    }
}
