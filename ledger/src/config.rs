//! # Ledger Configuration & Constants
//!
//! Every magic number in the ledger lives here. The hashing layout and the
//! snapshot format version are part of the on-disk contract: change them and
//! every previously written ledger stops verifying.

use serde::{Deserialize, Serialize};

use crate::crypto::HashAlgorithm;

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Crate version, for status endpoints and `version` output.
pub const LEDGER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Snapshot file format version. Bump when [`ChainSnapshot`] changes shape.
///
/// [`ChainSnapshot`]: crate::storage::ChainSnapshot
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Genesis
// ---------------------------------------------------------------------------

/// Message embedded in every genesis payload next to the chain id.
pub const GENESIS_MESSAGE: &str = "sealchain genesis";

// ---------------------------------------------------------------------------
// Hashing & Limits
// ---------------------------------------------------------------------------

/// Hash used when the caller does not pick one.
pub const DEFAULT_HASH_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha256;

/// Largest canonical payload encoding accepted by `append`. 1 MiB.
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// Service Ports
// ---------------------------------------------------------------------------

/// Default HTTP API port for `sealchain-node serve`.
pub const DEFAULT_API_PORT: u16 = 9841;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 9842;

// ---------------------------------------------------------------------------
// ChainConfig
// ---------------------------------------------------------------------------

/// Per-chain settings fixed at creation time.
///
/// The hash algorithm is recorded in snapshots so a ledger always verifies
/// with the function it was written with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Hash function used for every record in the chain.
    pub hash_algorithm: HashAlgorithm,
    /// Upper bound on a single payload's canonical encoding, in bytes.
    pub max_payload_bytes: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: DEFAULT_HASH_ALGORITHM,
            max_payload_bytes: MAX_PAYLOAD_BYTES,
        }
    }
}

impl ChainConfig {
    /// Replace the hash algorithm.
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Replace the payload size limit.
    pub fn with_max_payload_bytes(mut self, limit: usize) -> Self {
        self.max_payload_bytes = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_sha256() {
        let config = ChainConfig::default();
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(config.max_payload_bytes, MAX_PAYLOAD_BYTES);
    }

    #[test]
    fn builder_setters_override_defaults() {
        let config = ChainConfig::default()
            .with_hash_algorithm(HashAlgorithm::Sha512)
            .with_max_payload_bytes(64);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha512);
        assert_eq!(config.max_payload_bytes, 64);
    }

    #[test]
    fn ports_are_distinct() {
        assert_ne!(DEFAULT_API_PORT, DEFAULT_METRICS_PORT);
    }

    #[test]
    fn config_serializes_algorithm_as_lowercase() {
        let json = serde_json::to_value(ChainConfig::default()).unwrap();
        assert_eq!(json["hash_algorithm"], "sha256");
    }
}
