//! # Hashing Utilities
//!
//! The ledger supports three hash functions, selected per chain through
//! [`HashAlgorithm`]:
//!
//! - **SHA-256** — the default. Every ledger written without an explicit
//!   choice uses it.
//! - **SHA-512** — wider digest for callers that want 256-bit collision
//!   resistance.
//! - **BLAKE3** — fastest of the three; fine for high-volume ledgers that do
//!   not need to interoperate with SHA-2 tooling.
//!
//! Whatever the choice, record hashes are stored and compared as lowercase
//! hex strings. The genesis sentinel is an all-zero hex string of the same
//! width as a real digest.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

/// Stream `parts` through a SHA-2 family hasher.
fn sha2_digest<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
    let mut hasher = D::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().to_vec()
}

/// Hash multiple byte slices together with BLAKE3 without concatenating
/// them first.
fn blake3_digest(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

// ---------------------------------------------------------------------------
// HashAlgorithm
// ---------------------------------------------------------------------------

/// Hash function a chain is built with.
///
/// Serialized as `"sha256"`, `"sha512"` or `"blake3"`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    /// Every supported algorithm, in display order.
    pub const ALL: [HashAlgorithm; 3] = [
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
        HashAlgorithm::Blake3,
    ];

    /// Digest the concatenation of `parts`.
    ///
    /// Parts are streamed into the hasher, so the result is identical to
    /// hashing the concatenated buffer.
    pub fn digest(&self, parts: &[&[u8]]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => sha2_digest::<Sha256>(parts),
            HashAlgorithm::Sha512 => sha2_digest::<Sha512>(parts),
            HashAlgorithm::Blake3 => blake3_digest(parts).to_vec(),
        }
    }

    /// Digest `parts` and hex-encode the result.
    ///
    /// ```
    /// use sealchain_ledger::HashAlgorithm;
    ///
    /// let hex = HashAlgorithm::Sha256.digest_hex(&[b"seal", b"chain"]);
    /// assert_eq!(hex.len(), 64);
    /// ```
    pub fn digest_hex(&self, parts: &[&[u8]]) -> String {
        hex::encode(self.digest(parts))
    }

    /// Digest width in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 | HashAlgorithm::Blake3 => 32,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// The `previous_hash` value of a genesis record: all zeros, hex, as wide
    /// as a real digest.
    pub fn genesis_sentinel(&self) -> String {
        "0".repeat(self.output_len() * 2)
    }

    /// Lowercase name, matching the serde representation.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    /// Accepts the canonical names plus the dashed spellings (`sha-256`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "blake3" => Ok(HashAlgorithm::Blake3),
            other => Err(format!(
                "unknown hash algorithm '{}' (expected sha256, sha512 or blake3)",
                other
            )),
        }
    }
}
