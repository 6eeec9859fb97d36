// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Sealchain Ledger — Core Library
//!
//! An append-only ledger where every record is hash-linked to the one before
//! it, and the whole chain can be sealed exactly once. After sealing the
//! ledger is read-only forever. There is no unseal.
//!
//! ## Architecture
//!
//! - **crypto** — Hash primitives and the [`HashAlgorithm`] selector.
//! - **storage** — Records, the chain itself, the shared (locked) handle,
//!   and JSON snapshots for persistence.
//! - **config** — Ledger constants and [`ChainConfig`].
//! - **error** — The [`LedgerError`] enum every fallible call returns.
//!
//! ## Quick tour
//!
//! ```
//! use sealchain_ledger::{Chain, SealOutcome};
//! use serde_json::json;
//!
//! let mut chain = Chain::new();
//! chain.append(json!({"a": 1})).unwrap();
//! chain.append(json!({"b": 2})).unwrap();
//! assert!(chain.verify_integrity().valid);
//!
//! assert_eq!(chain.seal(), SealOutcome::Sealed);
//! assert!(chain.append(json!({"c": 3})).is_err());
//! assert_eq!(chain.len(), 3);
//! ```
//!
//! There is no process-wide chain. Construct one, own it, and hand it (or a
//! [`SharedChain`] clone) to whoever needs it.

pub mod config;
pub mod crypto;
pub mod error;
pub mod storage;

pub use config::ChainConfig;
pub use crypto::HashAlgorithm;
pub use error::{LedgerError, LedgerResult};
pub use storage::{
    Chain, ChainSnapshot, ChainState, FailureReason, IntegrityFailure, IntegrityReport, Record,
    SealOutcome, SharedChain,
};
