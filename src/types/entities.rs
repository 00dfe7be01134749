//! Domain entities for database persistence.
//!
//! These structs represent the application's core domain objects that are
//! persisted to the control-plane database. They differ from the wire-level
//! types in `rpc-client` in that they represent indexed, decoded state
//! rather than raw JSON-RPC shapes.

use std::collections::HashMap;

use alloy::json_abi::JsonAbi;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{DecodeFailurePolicy, SourceStatus, SourceType};
use super::primitives::{BlockNumber, EthAddress, WeiAmount};

// ═══════════════════════════════════════════════════════════════════════════════
// BLOCKCHAIN
// ═══════════════════════════════════════════════════════════════════════════════

/// A chain endpoint configuration a Pipeline indexes against.
///
/// `block_range` and `block_slice` are fixed at creation time per the
/// resolved Open Question on sizing (see `DESIGN.md`): no runtime
/// auto-tuning of fetch window size or finality lag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blockchain {
    /// Unique identifier.
    pub id: Uuid,
    /// Chain ID reported by `eth_chainId`, used to validate the configured
    /// `rpc_url` actually points at the expected network.
    pub chain_id: u64,
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Maximum number of blocks fetched per `get_logs` window.
    pub block_range: u64,
    /// Finality lag: how many blocks behind the chain head a Source Indexer
    /// stays, to avoid indexing blocks likely to be reorganized.
    pub block_slice: u64,
    /// How often (seconds) a Polling-state indexer checks for new blocks.
    pub pull_interval_secs: u64,
    /// Maximum batch size passed to the underlying `rpc-client` for
    /// `batch_txs`/`batch_headers` calls against this chain.
    pub rpc_max_batch_size: usize,
}

impl Blockchain {
    /// The highest block number considered safe to index up to, given a
    /// current chain head.
    #[must_use]
    pub fn finalized_head(&self, chain_head: BlockNumber) -> BlockNumber {
        BlockNumber::new(chain_head.get().saturating_sub(self.block_slice))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOG STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// A downstream sink a Pipeline streams decoded logs to.
///
/// `config` is intentionally opaque (a JSON blob) at this layer — its shape
/// is interpreted only by the Stream Bridge adapter that implements this
/// store's wire protocol (e.g. connection details for an Iggy stream).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStore {
    /// Unique identifier.
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Adapter-specific configuration, opaque to the control plane.
    pub config: serde_json::Value,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PIPELINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Binds one [`Blockchain`], one [`LogStore`], and N [`Source`]s into a
/// single indexing unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Unique identifier.
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// The chain this pipeline indexes.
    pub blockchain_id: Uuid,
    /// The store decoded logs are streamed to.
    pub log_store_id: Uuid,
    /// Whether new Sources under this pipeline are eligible to run.
    pub enabled: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ABI
// ═══════════════════════════════════════════════════════════════════════════════

/// A contract ABI, loaded at runtime and bound to one or more Sources.
///
/// Unlike the teacher's compile-time, per-contract bindings (`abi/*.rs`),
/// every contract this indexer decodes is described by a row here — Sources
/// reference an `abi_id`, not a Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abi {
    /// Unique identifier.
    pub id: Uuid,
    /// Human-readable contract name, for display and log fields.
    pub contract_name: String,
    /// The raw ABI JSON, as produced by a Solidity compiler.
    pub json: serde_json::Value,
}

impl Abi {
    /// Parse this ABI's JSON into an `alloy` [`JsonAbi`] for event decoding.
    ///
    /// # Errors
    /// Returns an error if `json` is not a valid contract ABI.
    pub fn parse(&self) -> Result<JsonAbi, serde_json::Error> {
        serde_json::from_value(self.json.clone())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Type-specific parameters for a [`Source`], tagged by [`SourceType`].
///
/// One variant per `SourceType` discriminant; the discriminant is persisted
/// separately on `Source::source_type` so the store can filter on it
/// without deserializing this payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceParams {
    /// Indexes every log on the chain, unfiltered.
    Full,
    /// Indexes logs emitted by one fixed contract address.
    Contract {
        /// The contract's address.
        address: EthAddress,
    },
    /// Indexes logs matching a topic0 event signature across all addresses.
    Topic {
        /// The event signature hash (topic0) to match.
        topic0: alloy::primitives::B256,
        /// Additional topic-position filters (topic1..topic3), each an
        /// OR-set of accepted values; empty means "any value".
        #[serde(default)]
        topic_filters: Vec<Vec<alloy::primitives::B256>>,
    },
    /// Indexes logs from a dynamically discovered set of child contracts,
    /// seeded by a factory's creation event.
    Factory {
        /// The factory contract's address.
        address: EthAddress,
        /// The ABI bound to each discovered child contract (may differ from
        /// the factory's own ABI).
        child_abi_id: Uuid,
        /// Name of the event on the factory ABI that announces a new child.
        creation_event_name: String,
        /// Name of the indexed/non-indexed argument on that event carrying
        /// the new child's address.
        creation_address_arg: String,
    },
}

impl SourceParams {
    /// The [`SourceType`] discriminant matching this payload's variant.
    #[must_use]
    pub const fn source_type(&self) -> SourceType {
        match self {
            Self::Full => SourceType::Full,
            Self::Contract { .. } => SourceType::Contract,
            Self::Topic { .. } => SourceType::Topic,
            Self::Factory { .. } => SourceType::Factory,
        }
    }
}

/// A single indexing task: a slice of chain activity (per [`SourceParams`]),
/// decoded against one [`Abi`], tracked by an independently advancing
/// cursor.
///
/// # Invariants
/// - `sync_block` only ever increases (monotonic cursor).
/// - `start_block <= sync_block`.
/// - `status` transitions only along the Source Indexer state machine (see
///   [`SourceStatus`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Unique identifier.
    pub id: Uuid,
    /// The pipeline this source belongs to.
    pub pipeline_id: Uuid,
    /// The ABI used to decode this source's logs (except for `Factory`
    /// children, which use `SourceParams::Factory::child_abi_id` instead).
    pub abi_id: Uuid,
    /// Denormalized from the pipeline's blockchain, for convenient filtering
    /// without a join.
    pub chain_id: u64,
    /// The kind of selection this source performs.
    pub source_type: SourceType,
    /// Type-specific filter parameters.
    pub type_params: SourceParams,
    /// The first block this source is responsible for.
    pub start_block: BlockNumber,
    /// The cursor: highest block number fully indexed so far. Monotonic.
    pub sync_block: BlockNumber,
    /// Whether the Supervisor should keep this source running.
    pub enabled: bool,
    /// Current Source Indexer state machine status.
    pub status: SourceStatus,
    /// Policy for handling logs that fail to decode against `abi_id`.
    pub decode_failure_policy: DecodeFailurePolicy,
}

impl Source {
    /// Whether `block_number` falls within this source's responsibility
    /// (has been started, has not yet been synced past).
    #[must_use]
    pub fn covers(&self, block_number: BlockNumber) -> bool {
        block_number >= self.start_block && block_number <= self.sync_block
    }

    /// Whether the Supervisor is eligible to (re)spawn this source's
    /// indexer task right now.
    #[must_use]
    pub fn is_schedulable(&self) -> bool {
        self.enabled && self.status.is_schedulable()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVM LOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Decoded event metadata attached to an [`EvmLog`].
///
/// `fields` keys are the event's input argument names (from the bound ABI);
/// values follow the canonical string encoding (integers as base-10,
/// addresses as lowercase 0x-hex, bytes as lowercase hex without 0x, etc.).
/// `event_name` is `"Unknown"` and `fields` is empty when the log's topic0
/// didn't match any event in the bound ABI, or decoding otherwise failed
/// and `decode_failure_policy` is [`DecodeFailurePolicy::Lenient`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMetadata {
    /// The name of the contract the bound ABI was loaded for.
    #[serde(default)]
    pub contract: String,
    /// The decoded event's name, or `"Unknown"` if decoding failed.
    pub event_name: Option<String>,
    /// Decoded argument name -> canonically encoded value string.
    #[serde(default)]
    pub fields: HashMap<String, String>,
}

/// A single indexed, decoded EVM log.
///
/// # Identity
/// `id` is `"{chain_id}:{block_number}:{log_index}"`. Combined with the
/// uniqueness invariant on `(source_id, block_number, log_index)`, this
/// makes repeated inserts of the same log idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmLog {
    /// `"{chain_id}:{block_number}:{log_index}"`.
    pub id: String,
    /// The source that produced this log.
    pub source_id: Uuid,
    /// Emitting contract address.
    pub address: EthAddress,
    /// Raw topics, in order (topic0 is the event signature for non-anonymous
    /// events).
    pub topics: Vec<alloy::primitives::B256>,
    /// Raw (un-decoded) log data.
    pub data: alloy::primitives::Bytes,
    /// Block the log was emitted in.
    pub block_number: BlockNumber,
    /// Hash of the emitting block.
    pub block_hash: alloy::primitives::B256,
    /// Hash of the emitting transaction.
    pub tx_hash: alloy::primitives::B256,
    /// Index of the emitting transaction within its block.
    pub tx_index: u64,
    /// Sender of the emitting transaction.
    pub tx_from: EthAddress,
    /// Index of this log within its block.
    pub log_index: u64,
    /// Whether this log was removed by a chain reorganization.
    pub removed: bool,
    /// When this log was written to the store.
    pub minted_at: DateTime<Utc>,
    /// Decoded event metadata.
    pub metadata: LogMetadata,
}

impl EvmLog {
    /// Build this log's composite identity string from its chain ID, block
    /// number, and log index.
    #[must_use]
    pub fn build_id(chain_id: u64, block_number: BlockNumber, log_index: u64) -> String {
        format!("{chain_id}:{}:{log_index}", block_number.get())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVM TRANSACTION
// ═══════════════════════════════════════════════════════════════════════════════

/// A single indexed EVM transaction, persisted alongside any logs it
/// emitted that a source indexes.
///
/// # Identity
/// `id` is `"{chain_id}:{hash}"`.
///
/// # Invariant
/// Every `EvmLog.tx_hash` must resolve to an `EvmTransaction` present in the
/// same write batch or an earlier one — a log is never persisted pointing
/// at a transaction the store doesn't know about yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmTransaction {
    /// `"{chain_id}:{hash}"`.
    pub id: String,
    /// The source that produced this transaction (the source whose logs
    /// referenced it).
    pub source_id: Uuid,
    /// Block the transaction was mined in.
    pub block_number: BlockNumber,
    /// Index of this transaction within its block.
    pub tx_index: u64,
    /// Chain this transaction was observed on.
    pub chain_id: u64,
    /// Sender address.
    pub from: EthAddress,
    /// Recipient address. [`EthAddress::ZERO`] for contract-creation
    /// transactions, per the RPC's `to: null`.
    pub to: EthAddress,
    /// Raw calldata.
    pub data: alloy::primitives::Bytes,
    /// Native currency value transferred, in wei. Up to 256 bits wide —
    /// never represented as a 64-bit integer.
    pub value: WeiAmount,
    /// Sender's transaction nonce at time of submission.
    pub nonce: u64,
    /// Transaction hash.
    pub hash: alloy::primitives::B256,
    /// When this transaction was written to the store.
    pub minted_at: DateTime<Utc>,
    /// Free-form metadata, reserved for adapter-specific annotations.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl EvmTransaction {
    /// Build this transaction's composite identity string from its chain ID
    /// and hash.
    #[must_use]
    pub fn build_id(chain_id: u64, hash: alloy::primitives::B256) -> String {
        format!("{chain_id}:{hash}")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_blockchain() -> Blockchain {
        Blockchain {
            id: Uuid::new_v4(),
            chain_id: 1,
            rpc_url: "https://rpc.example.com".into(),
            block_range: 2_000,
            block_slice: 12,
            pull_interval_secs: 5,
            rpc_max_batch_size: 50,
        }
    }

    mod blockchain_tests {
        use super::*;

        #[test]
        fn finalized_head_subtracts_block_slice() {
            let chain = sample_blockchain();
            let finalized = chain.finalized_head(BlockNumber::new(1_000));
            assert_eq!(finalized.get(), 988);
        }

        #[test]
        fn finalized_head_saturates_at_zero() {
            let chain = sample_blockchain();
            let finalized = chain.finalized_head(BlockNumber::new(5));
            assert_eq!(finalized.get(), 0);
        }
    }

    mod source_params_tests {
        use super::*;
        use alloy::primitives::{address, b256};

        #[test]
        fn full_maps_to_full_type() {
            assert_eq!(SourceParams::Full.source_type(), SourceType::Full);
        }

        #[test]
        fn contract_maps_to_contract_type() {
            let params = SourceParams::Contract {
                address: address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").into(),
            };
            assert_eq!(params.source_type(), SourceType::Contract);
        }

        #[test]
        fn topic_maps_to_topic_type() {
            let params = SourceParams::Topic {
                topic0: b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3e"),
                topic_filters: vec![],
            };
            assert_eq!(params.source_type(), SourceType::Topic);
        }

        #[test]
        fn factory_maps_to_factory_type() {
            let params = SourceParams::Factory {
                address: address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2").into(),
                child_abi_id: Uuid::new_v4(),
                creation_event_name: "PoolCreated".into(),
                creation_address_arg: "pool".into(),
            };
            assert_eq!(params.source_type(), SourceType::Factory);
        }

        #[test]
        fn serde_tag_round_trips() {
            let params = SourceParams::Topic {
                topic0: b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3e"),
                topic_filters: vec![],
            };
            let json = serde_json::to_string(&params).unwrap();
            let back: SourceParams = serde_json::from_str(&json).unwrap();
            assert_eq!(params, back);
        }
    }

    mod source_tests {
        use super::*;

        fn sample_source() -> Source {
            Source {
                id: Uuid::new_v4(),
                pipeline_id: Uuid::new_v4(),
                abi_id: Uuid::new_v4(),
                chain_id: 1,
                source_type: SourceType::Full,
                type_params: SourceParams::Full,
                start_block: BlockNumber::new(100),
                sync_block: BlockNumber::new(200),
                enabled: true,
                status: SourceStatus::Stopped,
                decode_failure_policy: DecodeFailurePolicy::default(),
            }
        }

        #[test]
        fn covers_block_within_range() {
            let source = sample_source();
            assert!(source.covers(BlockNumber::new(150)));
            assert!(!source.covers(BlockNumber::new(50)));
            assert!(!source.covers(BlockNumber::new(250)));
        }

        #[test]
        fn schedulable_requires_enabled_and_status() {
            let mut source = sample_source();
            assert!(source.is_schedulable());

            source.enabled = false;
            assert!(!source.is_schedulable());

            source.enabled = true;
            source.status = SourceStatus::Polling;
            assert!(!source.is_schedulable());
        }
    }

    mod evm_log_tests {
        use super::*;

        #[test]
        fn build_id_formats_as_chain_block_log_index() {
            let id = EvmLog::build_id(1, BlockNumber::new(12_345), 7);
            assert_eq!(id, "1:12345:7");
        }
    }

    mod evm_transaction_tests {
        use super::*;
        use alloy::primitives::b256;

        #[test]
        fn build_id_formats_as_chain_hash() {
            let hash = b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3e");
            let id = EvmTransaction::build_id(1, hash);
            assert!(id.starts_with("1:0x"));
        }
    }
}
