//! Indexer-domain enumerations.
//!
//! These enums provide:
//! - Safe conversion from/to numeric values
//! - Database serialization via `sqlx::Type`
//! - JSON serialization via `serde`
//! - Domain-specific helper methods

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE TYPE - What subset of chain activity a Source indexes
// ═══════════════════════════════════════════════════════════════════════════════

/// The kind of log selection a [`crate::types::Source`] performs.
///
/// Each variant pairs with a `type_params` payload carrying the data that
/// kind needs (see [`crate::types::SourceParams`]); this enum is the
/// discriminant persisted alongside it so the store can filter and dispatch
/// on it without deserializing the whole payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[repr(i16)]
#[sqlx(type_name = "smallint")]
#[non_exhaustive]
pub enum SourceType {
    /// Every log on the chain, unfiltered.
    Full = 0,
    /// Logs emitted by one fixed contract address.
    Contract = 1,
    /// Logs matching a topic0 signature, across all addresses (optionally
    /// narrowed by further topic filters).
    Topic = 2,
    /// Logs from a dynamically growing address set, seeded by a factory's
    /// child-creation event.
    Factory = 3,
}

impl SourceType {
    /// Human-readable name for display and log fields.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Contract => "contract",
            Self::Topic => "topic",
            Self::Factory => "factory",
        }
    }

    /// Returns all source types.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Full, Self::Contract, Self::Topic, Self::Factory]
    }
}

/// Error returned when an invalid source type value is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid source type value: {0}")]
pub struct InvalidSourceType(pub u8);

impl TryFrom<u8> for SourceType {
    type Error = InvalidSourceType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Full),
            1 => Ok(Self::Contract),
            2 => Ok(Self::Topic),
            3 => Ok(Self::Factory),
            _ => Err(InvalidSourceType(value)),
        }
    }
}

impl From<SourceType> for u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from(value: SourceType) -> Self {
        value as i16 as Self
    }
}

impl From<SourceType> for i16 {
    fn from(value: SourceType) -> Self {
        value as Self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE STATUS - Source Indexer state machine states
// ═══════════════════════════════════════════════════════════════════════════════

/// The current state of a Source Indexer's run loop.
///
/// Mirrors the state machine: `Initializing -> Polling -> Fetching ->
/// Decoding -> Persisting -> Polling` (looped), with `Stopping` reachable
/// from any running state on a `source.disable` event, and `Failed`
/// reachable from any state on a fatal error. `LoopBackoff` is a Supervisor-
/// level state, recorded here too since it's persisted on the same `Source`
/// row between restart attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[repr(i16)]
#[sqlx(type_name = "smallint")]
#[non_exhaustive]
pub enum SourceStatus {
    /// Not yet started; no indexer task is running.
    Stopped = 0,
    /// Loading ABI, validating `start_block`, resolving the initial cursor.
    Initializing = 1,
    /// Idle, waiting for the chain head to advance past `sync_block`.
    Polling = 2,
    /// Fetching a block window's logs (and referenced transactions/headers)
    /// from the RPC client.
    Fetching = 3,
    /// Decoding fetched logs against the bound ABI.
    Decoding = 4,
    /// Writing decoded logs/transactions to the store and advancing
    /// `sync_block`.
    Persisting = 5,
    /// Finishing the in-flight window before exiting in response to
    /// `source.disable` or shutdown.
    Stopping = 6,
    /// Exited after a fatal (non-retryable) error; requires operator
    /// intervention or a `source.enable` to retry.
    Failed = 7,
    /// Exited after a transient error; the Supervisor will restart it after
    /// an exponential backoff delay.
    LoopBackoff = 8,
}

impl SourceStatus {
    /// Human-readable name for display and log fields.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Initializing => "initializing",
            Self::Polling => "polling",
            Self::Fetching => "fetching",
            Self::Decoding => "decoding",
            Self::Persisting => "persisting",
            Self::Stopping => "stopping",
            Self::Failed => "failed",
            Self::LoopBackoff => "loop_backoff",
        }
    }

    /// Whether this status represents an actively running indexer task
    /// (as opposed to stopped, failed, or backing off).
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(
            self,
            Self::Initializing | Self::Polling | Self::Fetching | Self::Decoding | Self::Persisting
        )
    }

    /// Whether the Supervisor should attempt to (re)spawn an indexer task
    /// for a Source in this status.
    #[must_use]
    pub const fn is_schedulable(&self) -> bool {
        matches!(self, Self::Stopped | Self::LoopBackoff)
    }
}

/// Error returned when an invalid source status value is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid source status value: {0}")]
pub struct InvalidSourceStatus(pub u8);

impl TryFrom<u8> for SourceStatus {
    type Error = InvalidSourceStatus;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Stopped),
            1 => Ok(Self::Initializing),
            2 => Ok(Self::Polling),
            3 => Ok(Self::Fetching),
            4 => Ok(Self::Decoding),
            5 => Ok(Self::Persisting),
            6 => Ok(Self::Stopping),
            7 => Ok(Self::Failed),
            8 => Ok(Self::LoopBackoff),
            _ => Err(InvalidSourceStatus(value)),
        }
    }
}

impl From<SourceStatus> for u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from(value: SourceStatus) -> Self {
        value as i16 as Self
    }
}

impl From<SourceStatus> for i16 {
    fn from(value: SourceStatus) -> Self {
        value as Self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECODE FAILURE POLICY - Open Question #1 resolution
// ═══════════════════════════════════════════════════════════════════════════════

/// Controls what a Source Indexer does when a fetched log fails to decode
/// against its bound ABI (unrecognized topic0, argument count/type
/// mismatch).
///
/// Default is [`Self::Lenient`]: the log is persisted with empty
/// `metadata.fields` and indexing continues. Operators indexing a contract
/// where a malformed log indicates a serious problem (e.g. an ABI version
/// mismatch) can opt into [`Self::Strict`] to fail the source instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[repr(i16)]
#[sqlx(type_name = "smallint")]
pub enum DecodeFailurePolicy {
    /// Persist the log with empty decoded fields and continue. Never stalls
    /// the cursor.
    Lenient = 0,
    /// Treat a decode failure as fatal for the whole window, surfacing it to
    /// the Supervisor as a retryable error.
    Strict = 1,
}

impl Default for DecodeFailurePolicy {
    fn default() -> Self {
        Self::Lenient
    }
}

/// Error returned when an invalid decode failure policy value is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid decode failure policy value: {0}")]
pub struct InvalidDecodeFailurePolicy(pub u8);

impl TryFrom<u8> for DecodeFailurePolicy {
    type Error = InvalidDecodeFailurePolicy;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Lenient),
            1 => Ok(Self::Strict),
            _ => Err(InvalidDecodeFailurePolicy(value)),
        }
    }
}

impl From<DecodeFailurePolicy> for u8 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from(value: DecodeFailurePolicy) -> Self {
        value as i16 as Self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    mod source_type_tests {
        use super::*;

        #[test]
        fn try_from_roundtrips() {
            for kind in SourceType::all() {
                let raw: u8 = kind.into();
                assert_eq!(SourceType::try_from(raw).unwrap(), kind);
            }
        }

        #[test]
        fn invalid_value_is_rejected() {
            assert!(SourceType::try_from(99).is_err());
        }

        #[test]
        fn names_are_lowercase() {
            assert_eq!(SourceType::Contract.name(), "contract");
        }
    }

    mod source_status_tests {
        use super::*;

        #[test]
        fn try_from_roundtrips() {
            let all = [
                SourceStatus::Stopped,
                SourceStatus::Initializing,
                SourceStatus::Polling,
                SourceStatus::Fetching,
                SourceStatus::Decoding,
                SourceStatus::Persisting,
                SourceStatus::Stopping,
                SourceStatus::Failed,
                SourceStatus::LoopBackoff,
            ];
            for status in all {
                let raw: u8 = status.into();
                assert_eq!(SourceStatus::try_from(raw).unwrap(), status);
            }
        }

        #[test]
        fn running_states_are_identified() {
            assert!(SourceStatus::Fetching.is_running());
            assert!(!SourceStatus::Stopped.is_running());
            assert!(!SourceStatus::Failed.is_running());
        }

        #[test]
        fn schedulable_states_are_identified() {
            assert!(SourceStatus::Stopped.is_schedulable());
            assert!(SourceStatus::LoopBackoff.is_schedulable());
            assert!(!SourceStatus::Polling.is_schedulable());
            assert!(!SourceStatus::Failed.is_schedulable());
        }
    }

    mod decode_failure_policy_tests {
        use super::*;

        #[test]
        fn default_is_lenient() {
            assert_eq!(DecodeFailurePolicy::default(), DecodeFailurePolicy::Lenient);
        }

        #[test]
        fn try_from_roundtrips() {
            for policy in [DecodeFailurePolicy::Lenient, DecodeFailurePolicy::Strict] {
                let raw: u8 = policy.into();
                assert_eq!(DecodeFailurePolicy::try_from(raw).unwrap(), policy);
            }
        }
    }
}
