//! Deterministic hashing.
//!
//! SHA-256 is the single digest algorithm for blob addressing, run ids, and
//! axiom ids. Hashes are computed over canonical stable-JSON bytes only.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::determinism::stable_json::stable_json_bytes;
use crate::errors::EqlabResult;

/// Lowercase hex SHA-256 of raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Lowercase hex SHA-256 of the stable-JSON encoding of a value.
pub fn sha256_stable_json<T: Serialize>(value: &T) -> EqlabResult<String> {
    Ok(sha256_hex(&stable_json_bytes(value)?))
}
