//! # Cryptographic Primitives
//!
//! Hashing only. The ledger never signs or encrypts anything; tamper
//! evidence comes entirely from the hash links between records.
//!
//! Everything here is a thin wrapper around audited implementations
//! (`sha2`, `blake3`). Do not hand-roll replacements.

pub mod hash;

pub use hash::HashAlgorithm;
