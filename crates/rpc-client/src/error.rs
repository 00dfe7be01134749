//! Error types for RPC client operations.
//!
//! This module provides the error hierarchy for [`RpcClient`](crate::RpcClient)
//! operations, following the three-way split the indexer's failure semantics
//! are built around:
//!
//! - [`RpcError::Transient`] — the call may succeed if retried in the same
//!   window (connection refused, timeout, 5xx, rate limiting)
//! - [`RpcError::Fatal`] — the call cannot succeed without operator
//!   intervention (chain ID mismatch, malformed endpoint, bad configuration)
//! - [`RpcError::Call`] — a single call inside a batch returned its own
//!   JSON-RPC error, isolated from the rest of the batch

use thiserror::Error;

/// Result type alias using [`RpcError`].
pub type Result<T> = std::result::Result<T, RpcError>;

/// Errors that can occur when using an [`RpcClient`](crate::RpcClient).
///
/// # Categories
///
/// | Variant | Meaning | Caller response |
/// |---------|---------|------------------|
/// | `Transient` | Network or server hiccup | retry the same window |
/// | `Fatal` | Endpoint or configuration is broken | stop the source, surface to the operator |
/// | `Call` | One call in a batch had its own RPC error | isolated — other results in the batch are still valid |
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RpcError {
    /// Likely to succeed if retried: connection refused, timeout, 5xx, or a
    /// rate-limit response from the endpoint.
    #[error("transient RPC failure: {0}")]
    Transient(String),

    /// Will not succeed on retry without operator intervention: malformed
    /// endpoint URL, a chain ID that doesn't match what the source expects,
    /// or an otherwise broken response shape.
    #[error("fatal RPC failure: {0}")]
    Fatal(String),

    /// A single call's JSON-RPC error, isolated from its batch.
    #[error(transparent)]
    Call(#[from] json_rpc_batch::CallError),

    /// The chain ID reported by the endpoint doesn't match what the caller
    /// expected for this source.
    #[error("chain ID mismatch: expected {expected}, endpoint reports {actual}")]
    ChainIdMismatch {
        /// Chain ID configured for this source.
        expected: u64,
        /// Chain ID actually reported by the endpoint.
        actual: u64,
    },
}

impl RpcError {
    /// Check if this error is transient and the same request should be
    /// retried in the current window.
    ///
    /// Corresponds to `spec.md`'s `RpcTransient` category.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(_) => true,
            Self::Call(call) => call.is_retryable(),
            Self::Fatal(_) | Self::ChainIdMismatch { .. } => false,
        }
    }

    /// Check if this error is fatal and the source should transition to
    /// `Failed` rather than retrying.
    ///
    /// Corresponds to `spec.md`'s `RpcFatal` category.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !self.is_transient()
    }
}

impl From<json_rpc_batch::BatchError> for RpcError {
    fn from(err: json_rpc_batch::BatchError) -> Self {
        if err.is_retryable() {
            Self::Transient(err.to_string())
        } else {
            Self::Fatal(err.to_string())
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use json_rpc_batch::{BatchError, CallError};

    #[test]
    fn batch_timeout_becomes_transient() {
        let err: RpcError = BatchError::Timeout.into();
        assert!(err.is_transient());
        assert!(!err.is_fatal());
    }

    #[test]
    fn batch_invalid_response_becomes_fatal() {
        let err: RpcError = BatchError::InvalidResponse("bad shape".into()).into();
        assert!(err.is_fatal());
        assert!(!err.is_transient());
    }

    #[test]
    fn retryable_call_error_is_transient() {
        let call_error = CallError {
            code: -32000,
            message: "server error".into(),
            data: None,
        };
        let err: RpcError = call_error.into();
        assert!(err.is_transient());
    }

    #[test]
    fn non_retryable_call_error_is_fatal() {
        let call_error = CallError {
            code: -32602,
            message: "invalid params".into(),
            data: None,
        };
        let err: RpcError = call_error.into();
        assert!(err.is_fatal());
    }

    #[test]
    fn chain_id_mismatch_is_fatal() {
        let err = RpcError::ChainIdMismatch { expected: 1, actual: 10 };
        assert!(err.is_fatal());
        assert!(!err.is_transient());
    }
}
