//! # Record Structure
//!
//! A record is one entry in the ledger. Each record carries the hash of its
//! predecessor, so rewriting any record breaks every link after it.
//!
//! ## Record Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Record                                     │
//! │  ├── index: u64          (genesis = 0)      │
//! │  ├── timestamp: u64      (Unix ms, fixed)   │
//! │  ├── payload: JSON value                    │
//! │  ├── previous_hash: hex  (zeros at genesis) │
//! │  └── hash: hex           (over the above)   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Hash Computation
//!
//! The preimage is
//!
//! ```text
//! index (u64 LE) || timestamp (u64 LE)
//!   || len(payload) (u64 LE) || canonical payload JSON
//!   || len(previous_hash) (u64 LE) || previous_hash (ASCII hex)
//! ```
//!
//! The payload is serialized with object keys sorted at every depth, so two
//! payloads that compare equal always hash equal. Variable-length fields are
//! length-prefixed so no two distinct records share a preimage.
//!
//! The timestamp is sampled once when the record is built and stored. It is
//! never resampled; verification always hashes the stored value.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::config::GENESIS_MESSAGE;
use crate::crypto::HashAlgorithm;

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One hash-linked ledger entry.
///
/// Records are immutable once they are inside a [`Chain`](super::Chain): the
/// chain only ever hands out shared references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Position in the chain. Genesis is 0.
    pub index: u64,
    /// Unix timestamp (milliseconds) captured when the record was built.
    pub timestamp: u64,
    /// Caller-supplied data.
    pub payload: Value,
    /// Hex hash of the previous record, or the all-zero sentinel at genesis.
    pub previous_hash: String,
    /// Hex hash over the four fields above.
    pub hash: String,
}

impl Record {
    /// Build the genesis record for a chain.
    ///
    /// The payload binds the chain id into the first hash, so two chains
    /// created at the same millisecond still have different genesis hashes.
    pub fn genesis(chain_id: Uuid, algorithm: HashAlgorithm, timestamp: u64) -> Self {
        let payload = json!({
            "chain_id": chain_id.to_string(),
            "message": GENESIS_MESSAGE,
        });
        let previous_hash = algorithm.genesis_sentinel();
        let hash = compute_record_hash(algorithm, 0, timestamp, &payload, &previous_hash);

        Record {
            index: 0,
            timestamp,
            payload,
            previous_hash,
            hash,
        }
    }

    /// Build the record that follows `parent`.
    pub fn next(parent: &Record, payload: Value, timestamp: u64, algorithm: HashAlgorithm) -> Self {
        let index = parent.index + 1;
        let previous_hash = parent.hash.clone();
        let hash = compute_record_hash(algorithm, index, timestamp, &payload, &previous_hash);

        Record {
            index,
            timestamp,
            payload,
            previous_hash,
            hash,
        }
    }

    /// Recompute the hash from the stored fields.
    pub fn compute_hash(&self, algorithm: HashAlgorithm) -> String {
        compute_record_hash(
            algorithm,
            self.index,
            self.timestamp,
            &self.payload,
            &self.previous_hash,
        )
    }

    /// Whether the stored hash matches a fresh recomputation.
    pub fn is_self_consistent(&self, algorithm: HashAlgorithm) -> bool {
        self.hash == self.compute_hash(algorithm)
    }

    /// Whether this record sits at the start of a chain.
    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    /// The chain id embedded in a genesis payload, if this is one.
    pub fn genesis_chain_id(&self) -> Option<Uuid> {
        if !self.is_genesis() {
            return None;
        }
        self.payload
            .get("chain_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }
}

// ---------------------------------------------------------------------------
// Hash Computation
// ---------------------------------------------------------------------------

/// Hash a record's fields into lowercase hex.
fn compute_record_hash(
    algorithm: HashAlgorithm,
    index: u64,
    timestamp: u64,
    payload: &Value,
    previous_hash: &str,
) -> String {
    let payload_bytes = canonical_payload(payload);
    let index_bytes = index.to_le_bytes();
    let timestamp_bytes = timestamp.to_le_bytes();
    let payload_len = (payload_bytes.len() as u64).to_le_bytes();
    let previous_len = (previous_hash.len() as u64).to_le_bytes();

    algorithm.digest_hex(&[
        index_bytes.as_slice(),
        timestamp_bytes.as_slice(),
        payload_len.as_slice(),
        payload_bytes.as_slice(),
        previous_len.as_slice(),
        previous_hash.as_bytes(),
    ])
}

/// Canonical JSON encoding of a payload: compact, object keys sorted at
/// every depth.
///
/// Independent of whether `serde_json` was built with `preserve_order`.
pub fn canonical_payload(payload: &Value) -> Vec<u8> {
    serde_json::to_vec(&canonicalize(payload)).unwrap_or_default()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::new();
            for (key, inner) in entries {
                sorted.insert(key.clone(), canonicalize(inner));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
