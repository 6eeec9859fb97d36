//! In-memory chain management: append, seal, and integrity verification.
//!
//! A [`Chain`] always holds at least its genesis record. Appends extend the
//! tail and never touch existing records. [`Chain::seal`] moves the chain
//! from [`ChainState::Open`] to [`ChainState::Sealed`]; that transition is
//! terminal.
//!
//! ## Error policy
//!
//! - Appending to a sealed chain returns [`LedgerError::AlreadySealed`],
//!   always. It is never silently dropped.
//! - Sealing twice is a no-op that reports [`SealOutcome::AlreadySealed`].
//!   It never errors, and the chain stays sealed.
//! - The `*_committed` variants hand the post-mutation snapshot to a commit
//!   callback first and only apply the mutation if it succeeds.
//! - Integrity problems are reported by [`Chain::verify_integrity`] as an
//!   [`IntegrityReport`], not as an error.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::record::{canonical_payload, Record};
use super::snapshot::ChainSnapshot;
use crate::config::{ChainConfig, SNAPSHOT_FORMAT_VERSION};
use crate::crypto::HashAlgorithm;
use crate::error::{LedgerError, LedgerResult};

// ---------------------------------------------------------------------------
// State Machine
// ---------------------------------------------------------------------------

/// Lifecycle state of a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainState {
    /// Accepting appends.
    Open,
    /// Read-only. Terminal.
    Sealed,
}

/// Result of a [`Chain::seal`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SealOutcome {
    /// This call performed the `Open -> Sealed` transition.
    Sealed,
    /// The chain was already sealed; nothing changed.
    AlreadySealed,
}

// ---------------------------------------------------------------------------
// Integrity Reporting
// ---------------------------------------------------------------------------

/// Why a record failed verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The record's `index` does not match its position.
    IndexMismatch { expected: u64, found: u64 },
    /// The genesis record's `previous_hash` is not the sentinel.
    BadGenesisLink { expected: String, found: String },
    /// `previous_hash` does not equal the predecessor's `hash`.
    BrokenLink { expected: String, found: String },
    /// The stored `hash` does not match a recomputation.
    HashMismatch { stored: String, computed: String },
    /// The genesis payload names a different chain than the one holding it.
    ChainIdMismatch { expected: String, found: Option<String> },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::IndexMismatch { expected, found } => {
                write!(f, "index mismatch: expected {}, found {}", expected, found)
            }
            FailureReason::BadGenesisLink { expected, found } => write!(
                f,
                "genesis previous_hash must be {}, found {}",
                expected, found
            ),
            FailureReason::BrokenLink { expected, found } => write!(
                f,
                "broken link: expected previous_hash={}, found {}",
                expected, found
            ),
            FailureReason::HashMismatch { stored, computed } => write!(
                f,
                "hash mismatch: stored={}, computed={}",
                stored, computed
            ),
            FailureReason::ChainIdMismatch { expected, found } => write!(
                f,
                "genesis chain id mismatch: expected {}, found {}",
                expected,
                found.as_deref().unwrap_or("<none>")
            ),
        }
    }
}

/// The first record that failed verification, and why.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityFailure {
    /// Position of the failing record (0 = genesis).
    pub index: u64,
    pub reason: FailureReason,
}

impl fmt::Display for IntegrityFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record {}: {}", self.index, self.reason)
    }
}

/// Outcome of a full integrity walk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// `true` when every record checked out.
    pub valid: bool,
    /// Number of records that passed before the walk stopped.
    pub checked: usize,
    /// The first failure, if any.
    pub failure: Option<IntegrityFailure>,
}

impl IntegrityReport {
    fn passed(checked: usize) -> Self {
        Self {
            valid: true,
            checked,
            failure: None,
        }
    }

    fn failed(checked: usize, failure: IntegrityFailure) -> Self {
        Self {
            valid: false,
            checked,
            failure: Some(failure),
        }
    }

    /// Index of the first failing record, if verification failed.
    pub fn first_invalid_index(&self) -> Option<u64> {
        self.failure.as_ref().map(|f| f.index)
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Append-only, sealable sequence of hash-linked records.
///
/// Not internally synchronized. Wrap it in a
/// [`SharedChain`](super::SharedChain) to share it across threads.
#[derive(Clone, Debug)]
pub struct Chain {
    id: Uuid,
    config: ChainConfig,
    /// Never empty: genesis is always at position 0.
    records: Vec<Record>,
    state: ChainState,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    /// Create an open chain with the default configuration (SHA-256).
    pub fn new() -> Self {
        Self::with_config(ChainConfig::default())
    }

    /// Create an open chain containing only its genesis record.
    pub fn with_config(config: ChainConfig) -> Self {
        let id = Uuid::new_v4();
        let genesis = Record::genesis(id, config.hash_algorithm, now_millis());
        info!(
            chain_id = %id,
            algorithm = %config.hash_algorithm,
            genesis = %genesis.hash,
            "chain created"
        );

        Chain {
            id,
            config,
            records: vec![genesis],
            state: ChainState::Open,
        }
    }

    /// Append a record carrying `payload` and return it.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::AlreadySealed`] if the chain is sealed.
    /// - [`LedgerError::PayloadTooLarge`] if the canonical payload exceeds
    ///   the configured limit.
    ///
    /// On error the chain is unchanged.
    pub fn append(&mut self, payload: Value) -> LedgerResult<&Record> {
        let record = self.next_record(payload)?;
        self.push(record);
        Ok(self.tip())
    }

    /// Append `payload` only once `commit` has accepted the snapshot the
    /// chain will have afterwards.
    ///
    /// `commit` typically writes that snapshot to durable storage. If it
    /// fails, its error is returned and the chain is unchanged, so a retry
    /// cannot produce a duplicate record.
    pub fn append_committed<F>(&mut self, payload: Value, commit: F) -> LedgerResult<&Record>
    where
        F: FnOnce(&ChainSnapshot) -> LedgerResult<()>,
    {
        let record = self.next_record(payload)?;

        let mut snapshot = self.snapshot();
        snapshot.records.push(record.clone());
        if let Err(e) = commit(&snapshot) {
            warn!(chain_id = %self.id, index = record.index, "append not committed: {}", e);
            return Err(e);
        }

        self.push(record);
        Ok(self.tip())
    }

    /// Validate `payload` and build the record that would follow the tip.
    fn next_record(&self, payload: Value) -> LedgerResult<Record> {
        if self.state == ChainState::Sealed {
            warn!(
                chain_id = %self.id,
                length = self.records.len(),
                "append rejected: chain is sealed"
            );
            return Err(LedgerError::AlreadySealed {
                length: self.records.len(),
            });
        }

        let size = canonical_payload(&payload).len();
        if size > self.config.max_payload_bytes {
            warn!(
                chain_id = %self.id,
                size,
                limit = self.config.max_payload_bytes,
                "append rejected: payload too large"
            );
            return Err(LedgerError::PayloadTooLarge {
                size,
                limit: self.config.max_payload_bytes,
            });
        }

        Ok(Record::next(
            self.tip(),
            payload,
            now_millis(),
            self.config.hash_algorithm,
        ))
    }

    fn push(&mut self, record: Record) {
        debug!(
            chain_id = %self.id,
            index = record.index,
            hash = %record.hash,
            "record appended"
        );
        self.records.push(record);
    }

    /// Seal the chain. Idempotent: a second call changes nothing and reports
    /// [`SealOutcome::AlreadySealed`].
    pub fn seal(&mut self) -> SealOutcome {
        if self.is_sealed() {
            debug!(chain_id = %self.id, "seal requested on already sealed chain");
            return SealOutcome::AlreadySealed;
        }
        self.mark_sealed();
        SealOutcome::Sealed
    }

    /// Seal the chain only once `commit` has accepted the sealed snapshot.
    ///
    /// If `commit` fails the chain stays open, so a retry commits again
    /// instead of reporting [`SealOutcome::AlreadySealed`] over a store that
    /// never saw the seal.
    pub fn seal_committed<F>(&mut self, commit: F) -> LedgerResult<SealOutcome>
    where
        F: FnOnce(&ChainSnapshot) -> LedgerResult<()>,
    {
        if self.is_sealed() {
            debug!(chain_id = %self.id, "seal requested on already sealed chain");
            return Ok(SealOutcome::AlreadySealed);
        }

        let mut snapshot = self.snapshot();
        snapshot.sealed = true;
        if let Err(e) = commit(&snapshot) {
            warn!(chain_id = %self.id, "seal not committed: {}", e);
            return Err(e);
        }

        self.mark_sealed();
        Ok(SealOutcome::Sealed)
    }

    fn mark_sealed(&mut self) {
        self.state = ChainState::Sealed;
        info!(
            chain_id = %self.id,
            length = self.records.len(),
            tip = %self.tip().hash,
            "chain sealed"
        );
    }

    /// Walk every record from genesis to tip and check that it is where it
    /// claims to be, links to its predecessor, and hashes to its stored hash.
    ///
    /// Pure and O(n); the walk stops at the first failure.
    pub fn verify_integrity(&self) -> IntegrityReport {
        let algorithm = self.config.hash_algorithm;

        for (position, record) in self.records.iter().enumerate() {
            let predecessor = position.checked_sub(1).map(|p| &self.records[p]);
            if let Some(reason) = self.check_record(position as u64, record, predecessor, algorithm)
            {
                let failure = IntegrityFailure {
                    index: position as u64,
                    reason,
                };
                warn!(chain_id = %self.id, %failure, "integrity check failed");
                return IntegrityReport::failed(position, failure);
            }
        }

        IntegrityReport::passed(self.records.len())
    }

    fn check_record(
        &self,
        position: u64,
        record: &Record,
        predecessor: Option<&Record>,
        algorithm: HashAlgorithm,
    ) -> Option<FailureReason> {
        if record.index != position {
            return Some(FailureReason::IndexMismatch {
                expected: position,
                found: record.index,
            });
        }

        match predecessor {
            None => {
                let sentinel = algorithm.genesis_sentinel();
                if record.previous_hash != sentinel {
                    return Some(FailureReason::BadGenesisLink {
                        expected: sentinel,
                        found: record.previous_hash.clone(),
                    });
                }
            }
            Some(parent) => {
                if record.previous_hash != parent.hash {
                    return Some(FailureReason::BrokenLink {
                        expected: parent.hash.clone(),
                        found: record.previous_hash.clone(),
                    });
                }
            }
        }

        let computed = record.compute_hash(algorithm);
        if computed != record.hash {
            return Some(FailureReason::HashMismatch {
                stored: record.hash.clone(),
                computed,
            });
        }

        if predecessor.is_none() && record.genesis_chain_id() != Some(self.id) {
            return Some(FailureReason::ChainIdMismatch {
                expected: self.id.to_string(),
                found: record
                    .payload
                    .get("chain_id")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }

        None
    }

    // -- Accessors ----------------------------------------------------------

    /// All records, genesis first.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Record at `index`, if present.
    pub fn get(&self, index: u64) -> Option<&Record> {
        usize::try_from(index).ok().and_then(|i| self.records.get(i))
    }

    /// The genesis record.
    pub fn genesis(&self) -> &Record {
        &self.records[0]
    }

    /// The most recently appended record (genesis on a fresh chain).
    pub fn tip(&self) -> &Record {
        &self.records[self.records.len() - 1]
    }

    /// Number of records, genesis included. Always at least 1.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    pub fn is_sealed(&self) -> bool {
        self.state == ChainState::Sealed
    }

    /// Identity bound into the genesis payload.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.config.hash_algorithm
    }

    // -- Snapshots ----------------------------------------------------------

    /// Capture the full chain, state included, for persistence.
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            chain_id: self.id,
            algorithm: self.config.hash_algorithm,
            sealed: self.is_sealed(),
            records: self.records.clone(),
        }
    }

    /// Rebuild a chain from a snapshot and verify it.
    ///
    /// # Errors
    ///
    /// Structural problems (see [`Chain::from_snapshot_unchecked`]) or
    /// [`LedgerError::IntegrityViolation`] if any record fails verification.
    pub fn from_snapshot(snapshot: ChainSnapshot) -> LedgerResult<Self> {
        let chain = Self::from_snapshot_unchecked(snapshot)?;
        let report = chain.verify_integrity();
        match report.failure {
            Some(failure) => Err(LedgerError::IntegrityViolation(failure)),
            None => Ok(chain),
        }
    }

    /// Rebuild a chain without verifying record hashes.
    ///
    /// For inspecting a ledger that may be corrupt; call
    /// [`Chain::verify_integrity`] to find out.
    ///
    /// # Errors
    ///
    /// [`LedgerError::UnsupportedSnapshotVersion`] or
    /// [`LedgerError::EmptySnapshot`].
    pub fn from_snapshot_unchecked(snapshot: ChainSnapshot) -> LedgerResult<Self> {
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(LedgerError::UnsupportedSnapshotVersion(
                snapshot.format_version,
            ));
        }
        if snapshot.records.is_empty() {
            return Err(LedgerError::EmptySnapshot);
        }

        let state = if snapshot.sealed {
            ChainState::Sealed
        } else {
            ChainState::Open
        };

        Ok(Chain {
            id: snapshot.chain_id,
            config: ChainConfig::default().with_hash_algorithm(snapshot.algorithm),
            records: snapshot.records,
            state,
        })
    }
}

/// Current wall-clock time in Unix milliseconds.
fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
