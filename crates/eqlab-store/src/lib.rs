//! eqlab-store
//!
//! Deterministic local persistence for EQLAB:
//! - a content-addressed blob tree (`artifacts/<xx>/<digest>`), write-once
//!   per digest
//! - a SQLite index (`store.db`) of runs, axioms, models, implications,
//!   metrics, and notes
//!
//! Writes are idempotent by digest or primary key (`INSERT OR REPLACE` /
//! `INSERT OR IGNORE`), grouped per logical record in short transactions.
//! Each operation opens its own connection, so concurrent writers with
//! distinct run ids cannot corrupt the database; reads are always safe.

mod records;
mod schema;
mod store;

pub use crate::records::{
    AxiomRecord, ImplicationRecord, ModelRecord, NoteRecord, RunRecord,
};
pub use crate::store::{ArtifactStore, StoreError, StoreResult};
