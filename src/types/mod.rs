//! Domain types for the EVM chain indexer.
//!
//! This module contains all the core types used throughout the indexer:
//!
//! - [`enums`] - Indexer enumerations (`SourceType`, `SourceStatus`, `DecodeFailurePolicy`)
//! - [`primitives`] - Validated newtypes (`EthAddress`, `WeiAmount`, `BlockNumber`)
//! - [`entities`] - Domain entities for database persistence

pub mod entities;
pub mod enums;
pub mod primitives;

// Re-export commonly used types at module level
pub use entities::{
    Abi, Blockchain, EvmLog, EvmTransaction, LogMetadata, LogStore, Pipeline, Source, SourceParams,
};
pub use enums::{DecodeFailurePolicy, SourceStatus, SourceType};
pub use primitives::{BlockNumber, EthAddress, WeiAmount};
