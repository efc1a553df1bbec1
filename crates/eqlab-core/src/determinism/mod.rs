//! Determinism utilities.
//!
//! Everything EQLAB persists or hashes flows through this module:
//! - `stable_json` produces the canonical byte form (sorted object keys,
//!   compact separators) of any serializable value
//! - `hashing` turns canonical bytes into SHA-256 hex digests
//!
//! Run ids, axiom ids, and blob digests all depend on these encodings
//! staying stable across versions.

pub mod hashing;
pub mod stable_json;
