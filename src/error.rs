//! Layered error types for the EVM chain indexer.
//!
//! This module provides a hierarchical error system:
//!
//! - [`DomainError`] - Business logic errors (invalid state, not found, etc.)
//! - [`InfraError`] - Infrastructure errors (database, RPC, streaming)
//! - [`AppError`] - Application-level errors combining domain and infra
//! - [`ApiError`] - HTTP API errors with status codes
//!
//! # Error Philosophy
//!
//! - Domain errors are recoverable and user-facing
//! - Infrastructure errors are logged but details hidden from users
//! - The `Result` type alias uses `AppError` for application code

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// DOMAIN ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Domain-level errors representing business logic violations.
///
/// These errors are recoverable and should be shown to users.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DomainError {
    /// Invalid source type value.
    #[error("invalid source type value: {0}")]
    InvalidSourceType(u8),

    /// Invalid source status value.
    #[error("invalid source status value: {0}")]
    InvalidSourceStatus(u8),

    /// Blockchain not found.
    #[error("blockchain not found: {0}")]
    BlockchainNotFound(uuid::Uuid),

    /// Pipeline not found.
    #[error("pipeline not found: {0}")]
    PipelineNotFound(uuid::Uuid),

    /// Source not found.
    #[error("source not found: {0}")]
    SourceNotFound(uuid::Uuid),

    /// ABI not found.
    #[error("ABI not found: {0}")]
    AbiNotFound(uuid::Uuid),

    /// Log store not found.
    #[error("log store not found: {0}")]
    LogStoreNotFound(uuid::Uuid),

    /// The requested block range is outside what a source can serve (before
    /// `start_block` or beyond `sync_block`).
    #[error("block range out of source's synced window: requested {requested}, synced up to {synced}")]
    OutOfRange {
        /// The block number requested.
        requested: u64,
        /// The highest block number actually synced.
        synced: u64,
    },

    /// A contract ABI failed to parse as valid JSON-ABI.
    #[error("invalid ABI for {contract_name}: {cause}")]
    AbiInvalid {
        /// Name of the contract the ABI was bound to.
        contract_name: String,
        /// Underlying parse failure.
        cause: String,
    },

    /// A fetched log failed to decode against its source's bound ABI, under
    /// a [`crate::types::DecodeFailurePolicy::Strict`] policy.
    #[error("failed to decode log for event {event}: {cause}")]
    DecodeFailed {
        /// Name of the event the log's topic0 matched, if any.
        event: String,
        /// Underlying decode failure.
        cause: String,
    },

    /// Invalid state transition.
    #[error("invalid state transition: {from} -> {to}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Attempted new state.
        to: String,
    },

    /// Invalid address format.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid wei amount (malformed decimal string, or overflows 256 bits).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// INFRASTRUCTURE ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Infrastructure-level errors from external systems.
///
/// These errors are typically logged but their details are hidden from users.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InfraError {
    /// Database error that is worth retrying (connection drop, pool
    /// exhaustion, deadlock) — mirrors [`crate::rpc::RpcError::Transient`]'s
    /// role one layer down.
    #[error("transient store error: {0}")]
    StoreTransient(#[source] sqlx::Error),

    /// Database error that will not succeed on retry (constraint
    /// violation, schema mismatch, malformed query).
    #[error("fatal store error: {0}")]
    StoreFatal(#[source] sqlx::Error),

    /// RPC error (Ethereum node communication), from `rpc-client`.
    #[error("RPC error: {0}")]
    Rpc(#[from] rpc_client::RpcError),

    /// Streaming error (Apache Iggy / internal event bus).
    #[error("streaming error: {0}")]
    Streaming(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Resource not found in storage.
    #[error("resource not found")]
    NotFound,

    /// Connection pool exhausted.
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Timeout waiting for operation.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Configuration file error.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl InfraError {
    /// Classify a `sqlx::Error` as transient or fatal and wrap it
    /// accordingly, mirroring `rpc_client::RpcError`'s transient/fatal
    /// split.
    #[must_use]
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::StoreTransient(err)
            }
            _ => Self::StoreFatal(err),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// APPLICATION ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Application-level errors combining domain and infrastructure errors.
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    /// Domain logic error.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Infrastructure error.
    #[error(transparent)]
    Infra(#[from] InfraError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Initialization error.
    #[error("initialization error: {0}")]
    Initialization(String),

    /// Graceful shutdown requested.
    #[error("shutdown requested")]
    ShutdownRequested,
}

impl AppError {
    /// Whether retrying the operation that produced this error is worth
    /// attempting (vs. requiring a source to move to
    /// [`crate::types::SourceStatus::Failed`]).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Infra(InfraError::StoreTransient(_) | InfraError::Timeout(_) | InfraError::PoolExhausted)
        ) || matches!(self, Self::Infra(InfraError::Rpc(e)) if e.is_transient())
    }
}

/// Type alias for application Results.
pub type Result<T> = std::result::Result<T, AppError>;

// ═══════════════════════════════════════════════════════════════════════════════
// API ERRORS (HTTP-specific)
// ═══════════════════════════════════════════════════════════════════════════════

/// API-level errors with HTTP status codes.
///
/// These errors are converted to HTTP responses via [`IntoResponse`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// Wrapped application error.
    #[error(transparent)]
    App(#[from] AppError),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// Authentication required or failed.
    #[error("unauthorized")]
    Unauthorized,

    /// Internal server error (with source for logging).
    #[error("internal error")]
    Internal(#[source] eyre::Report),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Domain errors map to client errors (4xx)
            Self::App(AppError::Domain(
                DomainError::BlockchainNotFound(_)
                | DomainError::PipelineNotFound(_)
                | DomainError::SourceNotFound(_)
                | DomainError::AbiNotFound(_)
                | DomainError::LogStoreNotFound(_),
            )) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),

            Self::App(AppError::Domain(
                DomainError::InvalidSourceType(_)
                | DomainError::InvalidSourceStatus(_)
                | DomainError::InvalidStateTransition { .. }
                | DomainError::InvalidAddress(_)
                | DomainError::InvalidAmount(_)
                | DomainError::AbiInvalid { .. }
                | DomainError::OutOfRange { .. },
            ))
            | Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", self.to_string()),

            Self::App(AppError::Domain(DomainError::DecodeFailed { .. })) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "DECODE_FAILED", self.to_string())
            }

            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", self.to_string()),

            // Infrastructure and internal errors: log but don't expose details
            Self::App(AppError::Infra(_) | AppError::Config(_) | AppError::Initialization(_) | AppError::ShutdownRequested)
            | Self::Internal(_) => {
                tracing::error!(error = ?self, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal error".into(),
                )
            }
        };

        (
            status,
            Json(json!({
                "error": {
                    "code": code,
                    "message": message
                }
            })),
        )
            .into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::App(AppError::Domain(err))
    }
}

impl From<InfraError> for ApiError {
    fn from(err: InfraError) -> Self {
        Self::App(AppError::Infra(err))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONVENIENCE CONVERSIONS
// ═══════════════════════════════════════════════════════════════════════════════

impl From<crate::types::enums::InvalidSourceType> for DomainError {
    fn from(err: crate::types::enums::InvalidSourceType) -> Self {
        Self::InvalidSourceType(err.0)
    }
}

impl From<crate::types::enums::InvalidSourceStatus> for DomainError {
    fn from(err: crate::types::enums::InvalidSourceStatus) -> Self {
        Self::InvalidSourceStatus(err.0)
    }
}

impl From<crate::types::primitives::InvalidAddress> for DomainError {
    fn from(err: crate::types::primitives::InvalidAddress) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}

impl From<crate::types::primitives::InvalidWeiAmount> for DomainError {
    fn from(err: crate::types::primitives::InvalidWeiAmount) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}

// Allow converting domain errors into application errors
impl From<crate::types::enums::InvalidSourceType> for AppError {
    fn from(err: crate::types::enums::InvalidSourceType) -> Self {
        Self::Domain(err.into())
    }
}

impl From<crate::types::enums::InvalidSourceStatus> for AppError {
    fn from(err: crate::types::enums::InvalidSourceStatus) -> Self {
        Self::Domain(err.into())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_display() {
        let id = uuid::Uuid::new_v4();
        let err = DomainError::SourceNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn app_error_from_domain() {
        let domain = DomainError::InvalidSourceType(99);
        let app: AppError = domain.into();
        assert!(matches!(
            app,
            AppError::Domain(DomainError::InvalidSourceType(99))
        ));
    }

    #[test]
    fn app_error_from_infra() {
        let infra = InfraError::NotFound;
        let app: AppError = infra.into();
        assert!(matches!(app, AppError::Infra(InfraError::NotFound)));
    }

    #[test]
    fn store_transient_is_retryable() {
        let app = AppError::Infra(InfraError::Timeout("write".into()));
        assert!(app.is_transient());
    }

    #[test]
    fn domain_errors_are_not_transient() {
        let app = AppError::Domain(DomainError::InvalidSourceType(1));
        assert!(!app.is_transient());
    }
}
