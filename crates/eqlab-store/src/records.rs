//! Row types of the relational index.
//!
//! Records are string-typed at this layer (statuses, fingerprints, proof
//! steps as JSON) so the store does not depend on the engine crates;
//! higher layers convert to and from their enums.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub run_id: String,
    pub spec: Value,
    pub battery_config: Value,
    pub manifest_digest: String,
    pub results_digest: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxiomRecord {
    pub run_id: String,
    pub axiom_id: String,
    pub left_term: String,
    pub right_term: String,
    pub symmetry_class: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRecord {
    pub run_id: String,
    pub axiom_id: String,
    pub size: i64,
    pub status: String,
    pub fingerprint: Option<String>,
    pub candidates: i64,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImplicationRecord {
    pub run_id: String,
    pub axiom_id: String,
    pub theory: String,
    pub status: String,
    pub checked_max_size: i64,
    pub counterexample_size: Option<i64>,
    pub counterexample_fingerprint: Option<String>,
    pub proof_status: Option<String>,
    pub proof_elapsed_seconds: Option<f64>,
    /// Proof trace as a JSON array of `{rule, left, right}` objects.
    pub proof_steps: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoteRecord {
    pub note_id: i64,
    pub run_id: String,
    pub axiom_id: String,
    pub body: String,
    pub created_at: String,
}
