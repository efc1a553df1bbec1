//! The per-axiom metrics map.
//!
//! Every metric is a pure function of fields the battery already computed.
//! Values are `Null | Bool | Int | Float`; a ratio is `Null` exactly when
//! its denominator is zero — never NaN. Booleans are stored as booleans
//! here and widened to 0.0/1.0 by the artifact store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use eqlab_engines::model::ModelSearchStatus;
use eqlab_engines::prover::ProofStatus;

use crate::battery::{DegeneracyReport, ModelSpectrumEntry, PerturbationNeighbor, SyntacticFeatures};
use crate::implications::{ImplicationProbe, ProbeStatus};

/// One metric value. Untagged: serializes as plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl MetricValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view: booleans widen to 0.0/1.0, null has none.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Null => None,
            Self::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
        }
    }
}

impl From<Option<usize>> for MetricValue {
    fn from(value: Option<usize>) -> Self {
        match value {
            Some(value) => Self::Int(value as i64),
            None => Self::Null,
        }
    }
}

fn ratio(numerator: f64, denominator: usize) -> MetricValue {
    if denominator == 0 {
        MetricValue::Null
    } else {
        MetricValue::Float(numerator / denominator as f64)
    }
}

fn agreement_ratio(base: &[ModelSearchStatus], candidate: &[ModelSearchStatus]) -> Option<f64> {
    if base.is_empty() {
        return None;
    }
    let matches = base
        .iter()
        .zip(candidate)
        .filter(|(left, right)| left == right)
        .count();
    Some(matches as f64 / base.len() as f64)
}

/// `1.0` when the symmetry class has never been archived, else `0.0`.
pub fn compute_novelty_vs_archive(
    symmetry_class: &str,
    archive_lookup: &(dyn Fn(&str) -> bool + Sync),
) -> f64 {
    if archive_lookup(symmetry_class) {
        0.0
    } else {
        1.0
    }
}

pub fn compute_metrics(
    features: &SyntacticFeatures,
    degeneracy: &DegeneracyReport,
    model_spectrum: &[ModelSpectrumEntry],
    implications: &[ImplicationProbe],
    smallest_model_size: Option<usize>,
    novelty_vs_archive: Option<f64>,
    perturbation_neighbors: &[PerturbationNeighbor],
) -> BTreeMap<String, MetricValue> {
    let count_model = |status: ModelSearchStatus| {
        model_spectrum
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    };
    let model_found = count_model(ModelSearchStatus::Found);
    let model_not_found = count_model(ModelSearchStatus::NotFound);
    let model_timeout = count_model(ModelSearchStatus::Timeout);
    let model_cutoff = count_model(ModelSearchStatus::Cutoff);
    let model_total = model_spectrum.len();
    let model_decisive = model_found + model_not_found;

    let count_probe = |status: ProbeStatus| {
        implications
            .iter()
            .filter(|probe| probe.status == status)
            .count()
    };
    let confirmed = count_probe(ProbeStatus::Confirmed);
    let counterexample = count_probe(ProbeStatus::Counterexample);
    let inconclusive = count_probe(ProbeStatus::Inconclusive);
    let implication_total = implications.len();

    let proof_attempted = implications
        .iter()
        .filter(|probe| probe.proof_status.is_some())
        .count();
    let proof_proved = implications
        .iter()
        .filter(|probe| probe.proof_status == Some(ProofStatus::Proved))
        .count();
    let proof_step_counts: Vec<usize> = implications
        .iter()
        .filter(|probe| probe.proof_status == Some(ProofStatus::Proved))
        .filter_map(|probe| probe.proof_steps.as_ref().map(Vec::len))
        .collect();
    let proof_step_total: usize = proof_step_counts.iter().sum();

    let known_theory_distance = if implication_total > 0 {
        MetricValue::Float(
            (counterexample as f64 + 0.5 * inconclusive as f64) / implication_total as f64,
        )
    } else {
        MetricValue::Null
    };

    let mut neighbor_count = 0usize;
    let mut signature_agreement = MetricValue::Null;
    let mut exact_signature_match = MetricValue::Null;
    let mut smallest_size_match = MetricValue::Null;
    let mut robustness = ratio(model_decisive as f64, model_total);
    if !perturbation_neighbors.is_empty() {
        neighbor_count = perturbation_neighbors.len();
        let baseline: Vec<ModelSearchStatus> = model_spectrum
            .iter()
            .take(perturbation_neighbors[0].model_statuses.len())
            .map(|entry| entry.status)
            .collect();
        let mut agreement_ratios = Vec::new();
        let mut exact_matches = 0usize;
        let mut smallest_matches = 0usize;
        for neighbor in perturbation_neighbors {
            if let Some(ratio) = agreement_ratio(&baseline, &neighbor.model_statuses) {
                agreement_ratios.push(ratio);
            }
            if neighbor.model_statuses == baseline {
                exact_matches += 1;
            }
            if neighbor.smallest_model_size == smallest_model_size {
                smallest_matches += 1;
            }
        }
        signature_agreement = ratio(agreement_ratios.iter().sum(), agreement_ratios.len());
        exact_signature_match = ratio(exact_matches as f64, neighbor_count);
        smallest_size_match = ratio(smallest_matches as f64, neighbor_count);
        robustness = exact_signature_match.clone();
    }

    let mut metrics = BTreeMap::new();
    let mut put = |name: &str, value: MetricValue| {
        metrics.insert(name.to_string(), value);
    };

    put("left_size", MetricValue::Int(features.left_size as i64));
    put("right_size", MetricValue::Int(features.right_size as i64));
    put("total_size", MetricValue::Int(features.total_size as i64));
    put("left_depth", MetricValue::Int(features.left_depth as i64));
    put("right_depth", MetricValue::Int(features.right_depth as i64));
    put("max_depth", MetricValue::Int(features.max_depth as i64));
    put("var_count", MetricValue::Int(features.var_count as i64));
    put(
        "syntactic_complexity",
        MetricValue::Int((features.total_size + features.max_depth + features.var_count) as i64),
    );
    put("smallest_model_size", smallest_model_size.into());
    put("trivial_identity", MetricValue::Bool(degeneracy.trivial_identity));
    put(
        "projection_collapse",
        MetricValue::Bool(degeneracy.projection_collapse),
    );
    put(
        "constant_collapse",
        MetricValue::Bool(degeneracy.constant_collapse),
    );
    put(
        "nontrivial_model_spectrum",
        MetricValue::Bool(model_found > 0 && model_not_found > 0),
    );
    put("model_found_count", MetricValue::Int(model_found as i64));
    put(
        "model_not_found_count",
        MetricValue::Int(model_not_found as i64),
    );
    put("model_timeout_count", MetricValue::Int(model_timeout as i64));
    put("model_cutoff_count", MetricValue::Int(model_cutoff as i64));
    put("model_found_ratio", ratio(model_found as f64, model_total));
    put(
        "model_decisive_ratio",
        ratio(model_decisive as f64, model_total),
    );
    put("robustness_under_perturbation", robustness);
    put(
        "perturbation_neighbor_count",
        MetricValue::Int(neighbor_count as i64),
    );
    put("perturbation_signature_agreement_ratio", signature_agreement);
    put(
        "perturbation_exact_signature_match_ratio",
        exact_signature_match,
    );
    put(
        "perturbation_smallest_model_size_match_ratio",
        smallest_size_match,
    );
    put(
        "model_candidate_total",
        MetricValue::Int(model_spectrum.iter().map(|entry| entry.candidates as i64).sum()),
    );
    put(
        "model_elapsed_total",
        MetricValue::Float(model_spectrum.iter().map(|entry| entry.elapsed_seconds).sum()),
    );
    put(
        "implication_confirmed_count",
        MetricValue::Int(confirmed as i64),
    );
    put(
        "implication_counterexample_count",
        MetricValue::Int(counterexample as i64),
    );
    put(
        "implication_inconclusive_count",
        MetricValue::Int(inconclusive as i64),
    );
    put(
        "implication_confirmed_ratio",
        ratio(confirmed as f64, implication_total),
    );
    put(
        "implication_counterexample_ratio",
        ratio(counterexample as f64, implication_total),
    );
    put(
        "implication_inconclusive_ratio",
        ratio(inconclusive as f64, implication_total),
    );
    put(
        "implication_proof_attempted_count",
        MetricValue::Int(proof_attempted as i64),
    );
    put(
        "implication_proved_count",
        MetricValue::Int(proof_proved as i64),
    );
    put(
        "implication_proved_ratio",
        ratio(proof_proved as f64, proof_attempted),
    );
    put("proof_step_total", MetricValue::Int(proof_step_total as i64));
    put(
        "proof_step_mean",
        ratio(proof_step_total as f64, proof_step_counts.len()),
    );
    put(
        "proof_step_max",
        proof_step_counts.iter().max().copied().into(),
    );
    put("known_theory_distance", known_theory_distance);
    put(
        "novelty_vs_archive",
        match novelty_vs_archive {
            Some(value) => MetricValue::Float(value),
            None => MetricValue::Null,
        },
    );

    metrics
}
