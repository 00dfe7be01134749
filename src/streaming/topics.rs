//! Iggy stream/topic naming for the Stream Bridge (C7) sink.
//!
//! Decoded logs published downstream all go through a single `logs` topic
//! within the configured stream. There's no per-event-type fan-out here the
//! way the in-process [`crate::bus`] has one: every persisted log is a
//! Stream Bridge client's concern, and client-side filtering (by store,
//! by source) happens at subscription time, not at the transport layer.

/// Name of the single topic decoded logs are published to.
pub const LOGS_TOPIC: &str = "logs";

/// Configuration for the `logs` topic.
#[derive(Debug, Clone)]
pub struct TopicConfig {
    /// Topic name.
    pub name: &'static str,
    /// Number of partitions.
    pub partitions: u32,
    /// Message retention in seconds (0 = unlimited).
    pub retention_secs: u64,
}

impl TopicConfig {
    /// Create a new topic config with defaults (3 partitions, 7-day retention).
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name, partitions: 3, retention_secs: 86400 * 7 }
    }

    /// Set the number of partitions.
    #[must_use]
    pub const fn with_partitions(mut self, partitions: u32) -> Self {
        self.partitions = partitions;
        self
    }

    /// Set the retention period in seconds.
    #[must_use]
    pub const fn with_retention_secs(mut self, secs: u64) -> Self {
        self.retention_secs = secs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_topic_name_is_stable() {
        assert_eq!(LOGS_TOPIC, "logs");
    }

    #[test]
    fn topic_config_defaults() {
        let config = TopicConfig::new(LOGS_TOPIC);
        assert_eq!(config.name, "logs");
        assert_eq!(config.partitions, 3);
        assert_eq!(config.retention_secs, 86400 * 7);
    }

    #[test]
    fn topic_config_builder() {
        let config = TopicConfig::new(LOGS_TOPIC)
            .with_partitions(5)
            .with_retention_secs(3600);
        assert_eq!(config.partitions, 5);
        assert_eq!(config.retention_secs, 3600);
    }
}
