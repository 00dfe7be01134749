//! Apache Iggy log publisher implementation.
//!
//! Implements the [`LogPublisher`] port (module C7: Stream Bridge sink)
//! using Apache Iggy as the streaming backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use iggy::client::{Client, MessageClient, StreamClient, TopicClient};
use iggy::clients::client::IggyClient;
use iggy::compression::compression_algorithm::CompressionAlgorithm;
use iggy::identifier::Identifier;
use iggy::messages::send_messages::{Message, Partitioning};
use iggy::utils::expiry::IggyExpiry;
use iggy::utils::topic_size::MaxTopicSize;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::config::IggySettings;
use crate::error::{InfraError, Result};
use crate::ports::LogPublisher;
use crate::types::entities::EvmLog;

use super::topics::{TopicConfig, LOGS_TOPIC};

/// Apache Iggy-based log publisher.
///
/// Connects to an Iggy server and publishes decoded logs to the single
/// `logs` topic of the configured stream. Handles stream/topic creation
/// lazily and is safe to share across tasks.
///
/// # Thread Safety
///
/// This type is `Send + Sync` and can be shared across tasks.
pub struct IggyPublisher {
    /// The Iggy client.
    client: Arc<IggyClient>,
    /// Stream name decoded logs are published under.
    stream_name: String,
    /// Number of partitions for the `logs` topic.
    partition_count: u32,
    /// Whether we're connected to the Iggy server.
    connected: AtomicBool,
    /// Whether we've initialized the stream and topic.
    initialized: AtomicBool,
    /// Lock for initialization to prevent races.
    init_lock: RwLock<()>,
}

impl std::fmt::Debug for IggyPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IggyPublisher")
            .field("stream_name", &self.stream_name)
            .field("partition_count", &self.partition_count)
            .field("connected", &self.connected.load(Ordering::SeqCst))
            .field("initialized", &self.initialized.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl IggyPublisher {
    /// Create a new Iggy publisher from settings.
    ///
    /// This creates the client but does NOT connect. Call [`Self::connect`]
    /// to establish the connection, or let it connect lazily on first
    /// publish.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(settings: &IggySettings) -> Result<Self> {
        let client = IggyClient::builder()
            .with_tcp()
            .with_server_address(settings.url.clone())
            .build()
            .map_err(|e| InfraError::Streaming(Box::new(e)))?;

        Ok(Self {
            client: Arc::new(client),
            stream_name: settings.stream_name.clone(),
            partition_count: settings.partition_count,
            connected: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
            init_lock: RwLock::new(()),
        })
    }

    /// Connect to the Iggy server.
    ///
    /// # Errors
    ///
    /// Returns an error if connection fails.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> Result<()> {
        self.client
            .connect()
            .await
            .map_err(|e| InfraError::Streaming(Box::new(e)))?;

        self.connected.store(true, Ordering::SeqCst);
        info!(stream = %self.stream_name, "Connected to Iggy server");
        Ok(())
    }

    /// Disconnect from the Iggy server.
    ///
    /// # Errors
    ///
    /// Returns an error if disconnection fails.
    pub async fn disconnect(&self) -> Result<()> {
        self.client
            .disconnect()
            .await
            .map_err(|e| InfraError::Streaming(Box::new(e)))?;

        self.connected.store(false, Ordering::SeqCst);
        self.initialized.store(false, Ordering::SeqCst);
        info!("Disconnected from Iggy server");
        Ok(())
    }

    /// Ensure the stream and the `logs` topic exist.
    ///
    /// Called lazily on first publish; idempotent and auto-connects if
    /// necessary.
    #[instrument(skip(self))]
    async fn ensure_initialized(&self) -> Result<()> {
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(());
        }

        let _guard = self.init_lock.write().await;
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(());
        }

        if !self.connected.load(Ordering::SeqCst) {
            self.connect().await?;
        }

        self.ensure_stream_exists().await?;
        self.ensure_topic_exists().await?;

        self.initialized.store(true, Ordering::SeqCst);
        info!(stream = %self.stream_name, topic = LOGS_TOPIC, "Initialized Iggy stream and topic");
        Ok(())
    }

    /// Ensure the stream exists.
    async fn ensure_stream_exists(&self) -> Result<()> {
        let stream_id = Identifier::from_str_value(&self.stream_name)
            .map_err(|e| InfraError::Streaming(Box::new(e)))?;

        match self.client.get_stream(&stream_id).await {
            Ok(Some(_)) => {
                debug!(stream = %self.stream_name, "Stream already exists");
                return Ok(());
            }
            Ok(None) => {}
            Err(e) => {
                let err_str = e.to_string();
                if !err_str.contains("not found") && !err_str.contains("NotFound") {
                    return Err(InfraError::Streaming(Box::new(e)).into());
                }
            }
        }

        match self.client.create_stream(&self.stream_name, Some(1)).await {
            Ok(_stream_details) => {
                info!(stream = %self.stream_name, "Created Iggy stream");
                Ok(())
            }
            Err(e) => {
                let err_str = e.to_string();
                if err_str.contains("already exists") || err_str.contains("AlreadyExists") {
                    debug!(stream = %self.stream_name, "Stream already exists (race)");
                    Ok(())
                } else {
                    Err(InfraError::Streaming(Box::new(e)).into())
                }
            }
        }
    }

    /// Ensure the `logs` topic exists within the stream.
    async fn ensure_topic_exists(&self) -> Result<()> {
        let stream_id = Identifier::from_str_value(&self.stream_name)
            .map_err(|e| InfraError::Streaming(Box::new(e)))?;
        let topic_id = Identifier::from_str_value(LOGS_TOPIC)
            .map_err(|e| InfraError::Streaming(Box::new(e)))?;

        match self.client.get_topic(&stream_id, &topic_id).await {
            Ok(Some(_)) => {
                debug!(topic = LOGS_TOPIC, "Topic already exists");
                return Ok(());
            }
            Ok(None) => {}
            Err(e) => {
                let err_str = e.to_string();
                if !err_str.contains("not found") && !err_str.contains("NotFound") {
                    return Err(InfraError::Streaming(Box::new(e)).into());
                }
            }
        }

        let config = TopicConfig::new(LOGS_TOPIC).with_partitions(self.partition_count);

        match self
            .client
            .create_topic(
                &stream_id,
                config.name,
                config.partitions,
                CompressionAlgorithm::None,
                None,
                None,
                IggyExpiry::ServerDefault,
                MaxTopicSize::ServerDefault,
            )
            .await
        {
            Ok(_topic_details) => {
                info!(topic = LOGS_TOPIC, partitions = config.partitions, "Created Iggy topic");
                Ok(())
            }
            Err(e) => {
                let err_str = e.to_string();
                if err_str.contains("already exists") || err_str.contains("AlreadyExists") {
                    debug!(topic = LOGS_TOPIC, "Topic already exists (race)");
                    Ok(())
                } else {
                    Err(InfraError::Streaming(Box::new(e)).into())
                }
            }
        }
    }

    /// Serialize a log to JSON bytes.
    fn serialize_log(log: &EvmLog) -> Result<Bytes> {
        serde_json::to_vec(log)
            .map(Bytes::from)
            .map_err(|e| InfraError::Serialization(e).into())
    }

    /// Create an Iggy message from a log.
    fn create_message(log: &EvmLog) -> Result<Message> {
        let payload = Self::serialize_log(log)?;
        // Message payload length is capped at u32::MAX by the Iggy protocol.
        // A single decoded log is always far smaller than that.
        #[allow(clippy::cast_possible_truncation)]
        let length = payload.len() as u32;
        Ok(Message { id: 0, length, payload, headers: None })
    }

    /// Send messages to the `logs` topic, partitioned by source so logs
    /// from the same source keep their relative order.
    #[instrument(skip(self, messages), fields(count = messages.len()))]
    async fn send(&self, messages: &mut [Message]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }

        let stream_id = Identifier::from_str_value(&self.stream_name)
            .map_err(|e| InfraError::Streaming(Box::new(e)))?;
        let topic_id = Identifier::from_str_value(LOGS_TOPIC)
            .map_err(|e| InfraError::Streaming(Box::new(e)))?;

        self.client
            .send_messages(&stream_id, &topic_id, &Partitioning::balanced(), messages)
            .await
            .map_err(|e| InfraError::Streaming(Box::new(e)))?;

        debug!(topic = LOGS_TOPIC, count = messages.len(), "Published logs to Iggy");
        Ok(())
    }
}

#[async_trait]
impl LogPublisher for IggyPublisher {
    #[instrument(skip(self, log), fields(log_id = %log.id))]
    async fn publish(&self, log: &EvmLog) -> Result<()> {
        self.ensure_initialized().await?;
        let mut message = Self::create_message(log)?;
        self.send(std::slice::from_mut(&mut message)).await
    }

    #[instrument(skip(self, logs), fields(count = logs.len()))]
    async fn publish_batch(&self, logs: &[EvmLog]) -> Result<()> {
        if logs.is_empty() {
            return Ok(());
        }

        self.ensure_initialized().await?;

        let mut messages =
            logs.iter().map(Self::create_message).collect::<Result<Vec<_>>>()?;
        self.send(&mut messages).await
    }

    async fn flush(&self) -> Result<()> {
        // Iggy sends are acknowledged synchronously; there is no client-side
        // buffer to flush.
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// A no-op publisher for testing or when streaming is disabled.
///
/// Use this when you want to satisfy the [`LogPublisher`] trait without
/// actually sending logs anywhere.
#[derive(Debug, Default, Clone)]
pub struct NoOpPublisher;

#[async_trait]
impl LogPublisher for NoOpPublisher {
    async fn publish(&self, _log: &EvmLog) -> Result<()> {
        Ok(())
    }

    async fn publish_batch(&self, _logs: &[EvmLog]) -> Result<()> {
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IggySettings;

    fn test_settings() -> IggySettings {
        IggySettings {
            url: "tcp://localhost:8090".to_string(),
            stream_name: "evm-indexer-test".to_string(),
            partition_count: 1,
            replication_factor: 1,
            username: "iggy".to_string(),
            password: "iggy".to_string(),
        }
    }

    #[test]
    fn publisher_debug_format() {
        // We can't fully test without a running Iggy server, but we can
        // test that the publisher can be created.
        let result = IggyPublisher::new(&test_settings());
        assert!(result.is_ok());

        let publisher = result.unwrap();
        let debug_str = format!("{publisher:?}");
        assert!(debug_str.contains("IggyPublisher"));
        assert!(debug_str.contains("evm-indexer-test"));
    }

    #[test]
    fn noop_publisher_is_always_connected() {
        let publisher = NoOpPublisher;
        assert!(publisher.is_connected());
    }

    #[tokio::test]
    async fn noop_publisher_accepts_all_operations() {
        let publisher = NoOpPublisher;

        assert!(publisher.publish_batch(&[]).await.is_ok());
        assert!(publisher.flush().await.is_ok());
    }
}
