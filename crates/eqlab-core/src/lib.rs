//! eqlab-core
//!
//! Core primitives for EQLAB:
//! - Term and Equation models (variables, operator applications)
//! - Universe specifications (signature + budgets) with boundary validation
//! - Canonicalization of terms and equations
//! - Deterministic enumeration of terms and candidate axioms
//! - 1-edit perturbation neighbors in the canonical quotient
//! - Stable-JSON encoding and SHA-256 hashing for reproducible ids
//!
//! The core crate does not do filesystem or network I/O. Higher-level crates
//! perform I/O and pass bytes/structures into these primitives.

pub mod canonical;
pub mod determinism;
pub mod enumerate;
pub mod errors;
pub mod perturb;
pub mod spec;
pub mod term;

pub use crate::errors::{EqlabError, EqlabResult};

/// Universe specification format version accepted by this crate.
pub const SPEC_VERSION_V0: &str = "v0";

/// Convenience re-exports.
pub mod prelude {
    pub use crate::canonical::{canonicalize_equation, canonicalize_term, Equation};
    pub use crate::determinism::hashing::sha256_hex;
    pub use crate::determinism::stable_json::{stable_json_bytes, stable_json_string};
    pub use crate::enumerate::{enumerate_axioms, enumerate_terms};
    pub use crate::perturb::enumerate_neighbor_axioms;
    pub use crate::spec::{OperationSpec, UniverseSpec};
    pub use crate::term::Term;
    pub use crate::{EqlabError, EqlabResult};
}
