//! # Storage Module
//!
//! The data structures that make up a ledger, and the one way to persist it.
//!
//! ## Architecture
//!
//! ```text
//! record.rs    — Record structure, canonical preimage, hash/verify
//! chain.rs     — The append-only chain, seal state machine, integrity walk
//! shared.rs    — Lock-guarded handle for concurrent hosts
//! snapshot.rs  — JSON snapshot files (atomic replace on save)
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! payload → Record → Chain ──snapshot()──→ ChainSnapshot → file
//!                      ↑                         │
//!                      └──from_snapshot()────────┘
//! ```
//!
//! A chain moves through exactly two states:
//!
//! ```text
//! OPEN ──seal()──→ SEALED   (terminal)
//! ```

pub mod chain;
pub mod record;
pub mod shared;
pub mod snapshot;

pub use chain::{Chain, ChainState, FailureReason, IntegrityFailure, IntegrityReport, SealOutcome};
pub use record::Record;
pub use shared::SharedChain;
pub use snapshot::ChainSnapshot;
