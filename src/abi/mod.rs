//! Runtime ABI decoding for the indexer (module C2).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    ABI Decoder (C2)                          │
//! │                                                                │
//! │  Abi (DB row, raw JSON)                                       │
//! │        │ parse()                                              │
//! │        ▼                                                      │
//! │  alloy::json_abi::JsonAbi                                     │
//! │        │ AbiIndex::build()                                    │
//! │        ▼                                                      │
//! │  AbiIndex { topic0 -> Event }  ───decode(log)───▶ LogMetadata │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unlike the teacher's compile-time, per-contract `alloy::sol!` bindings,
//! every contract this indexer decodes is described by an [`Abi`] row
//! loaded at runtime: a [`crate::types::Source`] references `abi_id`, not a
//! Rust type. See [`decoder::AbiIndex`].
//!
//! [`Abi`]: crate::types::Abi

pub mod decoder;

pub use decoder::{AbiIndex, DecodeError};
