//! Settings structs and loading logic.
//!
//! All settings have sensible defaults and can be overridden via
//! environment variables or configuration files.

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Default value for `EVMI_INSTANCE_ID` when unset.
pub const DEFAULT_INSTANCE_ID: &str = "EVMI_INSTANCE_1";

/// Default value for `CONFIG_FILE_PATH` when unset.
pub const DEFAULT_CONFIG_FILE_PATH: &str = "/tmp/evm-indexer/config.json";

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// This instance's identifier, from `EVMI_INSTANCE_ID`. Distinguishes
    /// multiple indexer instances sharing one control-plane database.
    #[serde(default = "default_instance_id")]
    pub instance_id: String,
    /// Control-plane database configuration.
    pub database: DatabaseSettings,
    /// Control-plane RPC server configuration (HTTP/2 cleartext).
    pub api: ApiSettings,
    /// Stream Bridge (Apache Iggy) configuration.
    pub iggy: IggySettings,
    /// In-memory cache configuration (ABI parse cache, source lookup cache).
    pub cache: CacheSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
    /// Metrics configuration.
    pub metrics: MetricsSettings,
}

fn default_instance_id() -> String {
    DEFAULT_INSTANCE_ID.to_string()
}

impl Settings {
    /// Load settings from the file at `CONFIG_FILE_PATH` (default
    /// `/tmp/evm-indexer/config.json`) and environment variables.
    ///
    /// Environment variables use the `EVMI_` prefix and `__` as a nesting
    /// separator (e.g. `EVMI_DATABASE__URL`). `EVMI_INSTANCE_ID` is read
    /// directly (no prefix doubling) per `spec.md` §6.
    ///
    /// # Errors
    /// Returns `ConfigError` if configuration is invalid or cannot be loaded.
    pub fn load() -> Result<Self, ConfigError> {
        let config_file_path =
            std::env::var("CONFIG_FILE_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_FILE_PATH.to_string());
        let instance_id =
            std::env::var("EVMI_INSTANCE_ID").unwrap_or_else(|_| DEFAULT_INSTANCE_ID.to_string());

        let builder = Config::builder()
            .set_default("instance_id", instance_id)?
            .set_default("database.url", "postgres://localhost/evm_indexer")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout_ms", 5000)?
            .set_default("database.idle_timeout_ms", 600_000)?
            .set_default("api.host", "0.0.0.0")?
            .set_default("api.port", 8080)?
            .set_default("api.request_timeout_ms", 30000)?
            .set_default("iggy.url", "tcp://localhost:8090")?
            .set_default("iggy.stream_name", "evm-indexer")?
            .set_default("iggy.partition_count", 3)?
            .set_default("iggy.replication_factor", 1)?
            .set_default("iggy.username", "iggy")?
            .set_default("iggy.password", "iggy")?
            .set_default("cache.abi_ttl_ms", 300_000)?
            .set_default("cache.abi_max_capacity", 1000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("logging.file_path", Option::<String>::None)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.path", "/metrics")?
            .set_default("metrics.port", 9090)?
            .add_source(File::with_name(&config_file_path).required(false))
            .add_source(
                Environment::with_prefix("EVMI")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Load settings from a specific file path, ignoring `CONFIG_FILE_PATH`.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    /// Validate settings and return any validation errors.
    ///
    /// # Errors
    /// Returns a list of validation error messages.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.database.url.is_empty() {
            errors.push("database.url cannot be empty".into());
        }
        if self.database.max_connections == 0 {
            errors.push("database.max_connections must be non-zero".into());
        }
        if self.database.min_connections > self.database.max_connections {
            errors.push("database.min_connections cannot exceed max_connections".into());
        }

        if self.api.port == 0 {
            errors.push("api.port must be non-zero".into());
        }

        if self.cache.abi_max_capacity == 0 {
            errors.push("cache.abi_max_capacity must be non-zero".into());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Control-plane database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// `PostgreSQL`/`TimescaleDB` connection URL.
    pub url: String,
    /// Maximum connections in the pool.
    pub max_connections: u32,
    /// Minimum connections to maintain.
    pub min_connections: u32,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Idle connection timeout in milliseconds.
    pub idle_timeout_ms: u64,
}

impl DatabaseSettings {
    /// Get the connection timeout as a `Duration`.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Get the idle timeout as a `Duration`.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// Control-plane RPC server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on (default 8080, HTTP/2 cleartext).
    pub port: u16,
    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl ApiSettings {
    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Get the socket address string.
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Apache Iggy streaming configuration, for the Stream Bridge (C7).
#[derive(Debug, Clone, Deserialize)]
pub struct IggySettings {
    /// Iggy server URL.
    pub url: String,
    /// Stream name decoded logs are published under.
    pub stream_name: String,
    /// Number of partitions for the stream.
    pub partition_count: u32,
    /// Replication factor.
    pub replication_factor: u32,
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
}

/// In-memory cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// TTL for parsed-ABI cache entries in milliseconds.
    pub abi_ttl_ms: u64,
    /// Maximum capacity for the parsed-ABI cache.
    pub abi_max_capacity: u64,
}

impl CacheSettings {
    /// Get the ABI cache TTL as a `Duration`.
    #[must_use]
    pub const fn abi_ttl(&self) -> Duration {
        Duration::from_millis(self.abi_ttl_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format (json, pretty).
    pub format: String,
    /// Optional file path for log output.
    pub file_path: Option<String>,
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// Whether metrics are enabled.
    pub enabled: bool,
    /// HTTP path the Prometheus exporter serves on.
    pub path: String,
    /// Port for the metrics server.
    pub port: u16,
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn database_durations() {
        let db = DatabaseSettings {
            url: "postgres://localhost/test".into(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_ms: 5000,
            idle_timeout_ms: 600_000,
        };

        assert_eq!(db.connect_timeout(), Duration::from_millis(5000));
        assert_eq!(db.idle_timeout(), Duration::from_millis(600_000));
    }

    #[test]
    fn api_socket_addr() {
        let api = ApiSettings {
            host: "127.0.0.1".into(),
            port: 8080,
            request_timeout_ms: 30000,
        };

        assert_eq!(api.socket_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn validation_catches_zero_connections() {
        let mut settings = create_valid_settings();
        settings.database.max_connections = 0;

        let result = settings.validate();
        assert!(result.is_err());
        let errors = result.unwrap_err();
        assert!(errors.iter().any(|e| e.contains("max_connections")));
    }

    #[test]
    fn validation_catches_min_exceeds_max() {
        let mut settings = create_valid_settings();
        settings.database.min_connections = 20;
        settings.database.max_connections = 10;

        let result = settings.validate();
        assert!(result.is_err());
        let errors = result.unwrap_err();
        assert!(errors.iter().any(|e| e.contains("min_connections")));
    }

    fn create_valid_settings() -> Settings {
        Settings {
            instance_id: DEFAULT_INSTANCE_ID.into(),
            database: DatabaseSettings {
                url: "postgres://localhost/test".into(),
                max_connections: 10,
                min_connections: 1,
                connect_timeout_ms: 5000,
                idle_timeout_ms: 600_000,
            },
            api: ApiSettings {
                host: "0.0.0.0".into(),
                port: 8080,
                request_timeout_ms: 30000,
            },
            iggy: IggySettings {
                url: "tcp://localhost:8090".into(),
                stream_name: "evm-indexer".into(),
                partition_count: 3,
                replication_factor: 1,
                username: "iggy".into(),
                password: "iggy".into(),
            },
            cache: CacheSettings {
                abi_ttl_ms: 300_000,
                abi_max_capacity: 1000,
            },
            logging: LoggingSettings {
                level: "info".into(),
                format: "json".into(),
                file_path: None,
            },
            metrics: MetricsSettings {
                enabled: true,
                path: "/metrics".into(),
                port: 9090,
            },
        }
    }
}
