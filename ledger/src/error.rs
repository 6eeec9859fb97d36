//! Error types for the ledger.
//!
//! Every mutating or loading operation that can fail returns a
//! [`LedgerError`]. Integrity checking is a query and reports through
//! [`IntegrityReport`](crate::storage::IntegrityReport) instead; the
//! [`LedgerError::IntegrityViolation`] variant only appears when a caller
//! asked for a *verified* load and the data failed.

use thiserror::Error;

use crate::storage::IntegrityFailure;

/// Errors produced by chain operations and snapshot I/O.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// An append was attempted after the chain was sealed. Retrying is
    /// pointless; a sealed chain never reopens.
    #[error("chain is sealed; append rejected (length {length})")]
    AlreadySealed {
        /// Chain length at the time of the rejected append.
        length: usize,
    },

    /// The canonical payload encoding exceeds the chain's configured limit.
    #[error("payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge {
        /// Size of the canonical encoding.
        size: usize,
        /// Configured limit.
        limit: usize,
    },

    /// A verified load found a record that does not check out.
    #[error("integrity violation: {0}")]
    IntegrityViolation(IntegrityFailure),

    /// A snapshot contained no records; every chain has at least a genesis.
    #[error("snapshot contains no records")]
    EmptySnapshot,

    /// The snapshot was written by an incompatible format version.
    #[error("unsupported snapshot format version: {0}")]
    UnsupportedSnapshotVersion(u32),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
