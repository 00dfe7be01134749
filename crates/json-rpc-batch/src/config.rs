//! Configuration for the batch JSON-RPC client.
//!
//! This module provides [`ClientConfig`] for customizing client behavior:
//!
//! - Request timeouts
//! - Maximum calls per batch (`rpc_max_batch_size`)
//!
//! # Example
//!
//! ```
//! use json_rpc_batch::ClientConfig;
//! use std::time::Duration;
//!
//! let config = ClientConfig::default()
//!     .with_timeout(Duration::from_secs(60))
//!     .with_max_batch_size(200);
//! ```

use std::time::Duration;

use crate::error::{BatchError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Default timeout for HTTP requests to the RPC endpoint.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default maximum number of calls coalesced into a single batch request.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Minimum allowed timeout.
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Maximum allowed timeout.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(300);

/// Minimum allowed batch size.
pub const MIN_BATCH_SIZE: usize = 1;

/// Maximum allowed batch size.
pub const MAX_BATCH_SIZE: usize = 10_000;

// ═══════════════════════════════════════════════════════════════════════════════
// CLIENT CONFIG
// ═══════════════════════════════════════════════════════════════════════════════

/// Configuration options for [`BatchClient`](crate::BatchClient).
///
/// Use the builder pattern to customize settings:
///
/// ```
/// use json_rpc_batch::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(60))
///     .with_max_batch_size(50);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout for HTTP calls.
    ///
    /// Default: 30 seconds. Range: 1-300 seconds.
    pub timeout: Duration,

    /// Maximum number of calls coalesced into a single HTTP request.
    ///
    /// Corresponds to the indexer's `rpc_max_batch_size` setting. When more
    /// calls than this are submitted to [`send_batch`](crate::BatchClient::send_batch),
    /// they are split across multiple sequential requests; results are still
    /// returned in the caller's original order.
    ///
    /// Default: 100 calls. Range: 1-10,000.
    pub max_batch_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_REQUEST_TIMEOUT,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum batch size.
    #[must_use]
    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = max;
        self
    }

    /// Validate the configuration.
    ///
    /// Called automatically when creating a client.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidConfig`] if:
    /// - Timeout is less than 1 second or greater than 300 seconds
    /// - Max batch size is 0 or greater than 10,000
    pub fn validate(&self) -> Result<()> {
        if self.timeout < MIN_TIMEOUT {
            return Err(BatchError::InvalidConfig(format!(
                "timeout must be at least {MIN_TIMEOUT:?}"
            )));
        }

        if self.timeout > MAX_TIMEOUT {
            return Err(BatchError::InvalidConfig(format!(
                "timeout must be at most {MAX_TIMEOUT:?}"
            )));
        }

        if self.max_batch_size < MIN_BATCH_SIZE {
            return Err(BatchError::InvalidConfig(format!(
                "max_batch_size must be at least {MIN_BATCH_SIZE}"
            )));
        }

        if self.max_batch_size > MAX_BATCH_SIZE {
            return Err(BatchError::InvalidConfig(format!(
                "max_batch_size must be at most {MAX_BATCH_SIZE}"
            )));
        }

        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.max_batch_size, DEFAULT_MAX_BATCH_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_max_batch_size(50);

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.max_batch_size, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_timeout_too_low() {
        let config = ClientConfig::new().with_timeout(Duration::from_millis(500));
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_timeout_too_high() {
        let config = ClientConfig::new().with_timeout(Duration::from_secs(600));
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_batch_size_zero() {
        let config = ClientConfig::new().with_max_batch_size(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_batch_size_too_high() {
        let config = ClientConfig::new().with_max_batch_size(100_000);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_edge_cases() {
        let min_config = ClientConfig::new()
            .with_timeout(MIN_TIMEOUT)
            .with_max_batch_size(MIN_BATCH_SIZE);
        assert!(min_config.validate().is_ok());

        let max_config = ClientConfig::new()
            .with_timeout(MAX_TIMEOUT)
            .with_max_batch_size(MAX_BATCH_SIZE);
        assert!(max_config.validate().is_ok());
    }
}
