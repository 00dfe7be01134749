//! Error types for the batch JSON-RPC transport.
//!
//! This module provides the error hierarchy for [`BatchClient`](crate::BatchClient)
//! operations:
//!
//! - [`BatchError`] - The primary error type for all transport operations
//! - [`CallError`] - A single call's failure, isolated from the batch as a whole
//!
//! # Error Philosophy
//!
//! A batch request can fail at two independent levels: the HTTP round-trip can
//! fail outright (connection refused, timeout, non-2xx status), or it can
//! succeed while one or more individual calls inside the batch return a
//! JSON-RPC error object. Callers need to tell these apart — a transport
//! failure means the whole batch should be retried, a per-call error means
//! only that call failed and the rest of the batch's results are still good.

use thiserror::Error;

/// Result type alias using [`BatchError`].
pub type Result<T> = std::result::Result<T, BatchError>;

/// Errors that can occur when using the batch JSON-RPC transport.
///
/// # Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | Network | `Connection`, `Timeout`, `Http` | Network issues, server down |
/// | Protocol | `InvalidResponse`, `BatchSizeMismatch` | Server violated JSON-RPC batch contract |
/// | Data | `Serialization` | Malformed request or response payload |
/// | Usage | `InvalidConfig` | Programmer error |
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BatchError {
    /// Failed to establish connection to the RPC endpoint.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Request timed out waiting for response.
    #[error("request timed out")]
    Timeout,

    /// HTTP-level error (non-2xx status code, TLS issues, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Failed to serialize request or deserialize response.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Response was valid JSON but had unexpected structure.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The server returned a different number of results than calls sent.
    ///
    /// Since results are matched back to requests by `id`, a batch response
    /// missing an entry means that call cannot be resolved at all and the
    /// whole batch must be treated as failed.
    #[error("batch size mismatch: sent {sent} calls, received {received} results")]
    BatchSizeMismatch {
        /// Number of calls sent in the batch.
        sent: usize,
        /// Number of results found in the response.
        received: usize,
    },

    /// Invalid configuration provided to the client.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BatchError {
    /// Check if this error is likely transient and retryable.
    ///
    /// Returns `true` for network issues, timeouts, and server-side errors
    /// that might succeed on retry. A [`BatchError`] only ever describes a
    /// transport-level failure, so every variant here concerns the whole
    /// batch, never a single call — see [`CallError::is_retryable`] for that.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout => true,
            Self::Http(msg) => {
                msg.contains("500") || msg.contains("502") || msg.contains("503") || msg.contains("504")
            }
            Self::Serialization(_) | Self::InvalidResponse(_) | Self::BatchSizeMismatch { .. } | Self::InvalidConfig(_) => false,
        }
    }
}

impl From<reqwest::Error> for BatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_request() || err.is_body() || err.is_decode() {
            Self::Http(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PER-CALL ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// A single call's JSON-RPC error, isolated from the rest of its batch.
///
/// One failing call inside a batch never poisons the others — each call's
/// result is `Result<serde_json::Value, CallError>` independent of its
/// siblings.
#[derive(Debug, Clone, Error, serde::Deserialize)]
#[error("RPC error ({code}): {message}")]
pub struct CallError {
    /// JSON-RPC error code (e.g. -32601 for method not found).
    pub code: i64,
    /// Human-readable error message from the server.
    pub message: String,
    /// Optional additional data from the error response.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl CallError {
    /// Check if this call is likely to succeed on retry.
    ///
    /// Unlike [`BatchError::is_retryable`], this only ever concerns a single
    /// call's JSON-RPC error code, not the transport.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        // -32005 = limit exceeded, -32000 = generic server error.
        self.code == -32005 || self.code == -32000
    }

    /// Check if the error indicates the method is not supported by the endpoint.
    #[must_use]
    pub const fn is_method_not_supported(&self) -> bool {
        // -32601 = method not found, -32600 = invalid request.
        self.code == -32601 || self.code == -32600
    }
}
