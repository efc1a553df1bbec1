//! eqlab-pipeline
//!
//! The per-axiom analysis pipeline and its surroundings:
//! - `battery`: canonicalize, feature/degeneracy extraction, model spectrum,
//!   implication probes, perturbation sweep, metric aggregation
//! - `implications`: the known-theory library and the probe loop
//! - `metrics`: the numeric metrics map (pure functions of prior fields)
//! - `runner`: deterministic run/axiom ids, results persistence, replay
//! - `interpret`: dossier assembly with cited facts and narrative
//!
//! Batteries are pure in their inputs (spec, axiom, config, optional
//! archive lookup); the optional non-default `parallel` feature analyzes
//! axioms on a rayon pool, with results always collected in submission
//! order.

pub mod battery;
pub mod implications;
pub mod interpret;
pub mod metrics;
pub mod runner;

pub use crate::battery::{
    analyze_axiom, BatteryConfig, BatteryResult, DegeneracyReport, ModelSpectrumEntry,
    PerturbationNeighbor, SyntacticFeatures,
};
pub use crate::implications::{
    library_for_spec, run_implication_probes, ImplicationConfig, ImplicationProbe, KnownTheory,
    ProbeStatus,
};
pub use crate::interpret::{
    interpret_axiom, validate_dossier, InterpretationConfig, TheoryDossier,
};
pub use crate::metrics::{compute_metrics, MetricValue};
pub use crate::runner::{
    compute_axiom_id, compute_run_id, load_results_as_battery, load_run_directory,
    load_run_from_store, load_run_manifest, run_battery_and_persist, RunManifest,
};
