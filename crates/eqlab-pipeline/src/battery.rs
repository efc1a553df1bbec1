//! The per-axiom battery.
//!
//! One battery call takes an axiom through the full analysis pipeline:
//! canonicalization, syntactic features, degeneracy checks, the model
//! spectrum sweep, implication probes, the perturbation neighbor sweep, and
//! metric aggregation. A battery is pure in its inputs (spec, axiom,
//! config, optional archive lookup), which is what makes inter-axiom
//! parallelism safe.

use serde::{Deserialize, Serialize};
use tracing::info;

use eqlab_core::canonical::{canonicalize_equation, Equation};
use eqlab_core::errors::EqlabResult;
use eqlab_core::perturb::enumerate_neighbor_axioms;
use eqlab_core::spec::UniverseSpec;
use eqlab_core::term::Term;
use eqlab_engines::model::{
    engine_for_name, ModelFinder, ModelSearchConfig, ModelSearchStatus,
};

use crate::implications::{run_implication_probes, ImplicationConfig, ImplicationProbe};
use crate::metrics::{compute_metrics, compute_novelty_vs_archive, MetricValue};

/// Battery-wide budgets. The implication and perturbation stages fall back
/// to the main model-search budget wherever their own override is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryConfig {
    pub max_model_size: usize,
    pub max_model_candidates: u64,
    pub max_model_seconds: f64,
    pub model_finder: String,
    pub implication_max_model_size: Option<usize>,
    pub implication_max_model_candidates: Option<u64>,
    pub implication_max_model_seconds: Option<f64>,
    pub perturbation_max_neighbors: usize,
    pub perturbation_max_model_size: Option<usize>,
    pub perturbation_max_model_candidates: Option<u64>,
    pub perturbation_max_model_seconds: Option<f64>,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            max_model_size: 3,
            max_model_candidates: 10_000,
            max_model_seconds: 1.0,
            model_finder: "prunable".to_string(),
            implication_max_model_size: None,
            implication_max_model_candidates: None,
            implication_max_model_seconds: None,
            perturbation_max_neighbors: 8,
            perturbation_max_model_size: None,
            perturbation_max_model_candidates: None,
            perturbation_max_model_seconds: None,
        }
    }
}

impl BatteryConfig {
    fn search_config(&self) -> ModelSearchConfig {
        ModelSearchConfig {
            max_candidates: self.max_model_candidates,
            max_seconds: self.max_model_seconds,
        }
    }

    fn implication_config(&self) -> ImplicationConfig {
        ImplicationConfig {
            max_model_size: self.implication_max_model_size.unwrap_or(self.max_model_size),
            max_model_candidates: self
                .implication_max_model_candidates
                .unwrap_or(self.max_model_candidates),
            max_model_seconds: self
                .implication_max_model_seconds
                .unwrap_or(self.max_model_seconds),
            ..ImplicationConfig::default()
        }
    }

    fn perturbation_search_config(&self) -> ModelSearchConfig {
        ModelSearchConfig {
            max_candidates: self
                .perturbation_max_model_candidates
                .unwrap_or(self.max_model_candidates),
            max_seconds: self
                .perturbation_max_model_seconds
                .unwrap_or(self.max_model_seconds),
        }
    }

    /// The neighbor sweep never searches beyond the battery's own max size,
    /// even when configured larger. The clamp is intentional.
    fn perturbation_max_size(&self) -> usize {
        self.perturbation_max_model_size
            .unwrap_or(self.max_model_size)
            .min(self.max_model_size)
    }
}

/// Syntactic shape of a canonicalized equation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntacticFeatures {
    pub left_size: usize,
    pub right_size: usize,
    pub total_size: usize,
    pub left_depth: usize,
    pub right_depth: usize,
    pub max_depth: usize,
    pub var_count: usize,
    pub symmetry_class: String,
}

/// Three independent degeneracy flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegeneracyReport {
    /// Both sides syntactically equal after canonicalization.
    pub trivial_identity: bool,
    /// One side is a direct subterm of the other.
    pub projection_collapse: bool,
    /// One side is a single variable absent from the other.
    pub constant_collapse: bool,
}

/// Model-search outcome at one domain size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpectrumEntry {
    pub size: usize,
    pub status: ModelSearchStatus,
    pub fingerprint: Option<String>,
    pub candidates: u64,
    pub elapsed_seconds: f64,
}

/// A nearby canonical axiom and its model-status vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerturbationNeighbor {
    pub left: Term,
    pub right: Term,
    pub model_statuses: Vec<ModelSearchStatus>,
    pub smallest_model_size: Option<usize>,
}

/// Everything one battery call produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryResult {
    pub features: SyntacticFeatures,
    pub degeneracy: DegeneracyReport,
    pub model_spectrum: Vec<ModelSpectrumEntry>,
    pub smallest_model_size: Option<usize>,
    pub implications: Vec<ImplicationProbe>,
    /// Older persisted results may predate these fields; default them on
    /// load and let replay backfill the metrics.
    #[serde(default)]
    pub perturbation_neighbors: Vec<PerturbationNeighbor>,
    #[serde(default)]
    pub metrics: std::collections::BTreeMap<String, MetricValue>,
}

fn projection_collapse(left: &Term, right: &Term) -> bool {
    let direct_subterm = |whole: &Term, part: &Term| match whole {
        Term::Op { args, .. } => args.contains(part),
        Term::Var(_) => false,
    };
    direct_subterm(left, right) || direct_subterm(right, left)
}

fn constant_collapse(left: &Term, right: &Term) -> bool {
    let lone_absent_var = |side: &Term, other: &Term| match side {
        Term::Var(name) => !other.variables().contains(&name.as_str()),
        Term::Op { .. } => false,
    };
    lone_absent_var(left, right) || lone_absent_var(right, left)
}

fn spectrum_sweep(
    spec: &UniverseSpec,
    axiom: &Equation,
    max_size: usize,
    search_config: &ModelSearchConfig,
    engine: &dyn ModelFinder,
) -> EqlabResult<(Vec<ModelSpectrumEntry>, Option<usize>)> {
    let mut spectrum = Vec::with_capacity(max_size);
    let mut smallest = None;
    for size in 1..=max_size {
        let outcome = engine.find_model(
            spec,
            std::slice::from_ref(axiom),
            size,
            search_config,
            None,
        )?;
        if smallest.is_none() && outcome.status == ModelSearchStatus::Found {
            smallest = Some(size);
        }
        spectrum.push(ModelSpectrumEntry {
            size,
            status: outcome.status,
            fingerprint: outcome.fingerprint,
            candidates: outcome.candidates,
            elapsed_seconds: outcome.elapsed_seconds,
        });
    }
    Ok((spectrum, smallest))
}

/// Run the full battery for one axiom.
pub fn analyze_axiom(
    spec: &UniverseSpec,
    axiom: &Equation,
    config: &BatteryConfig,
    archive_lookup: Option<&(dyn Fn(&str) -> bool + Sync)>,
) -> EqlabResult<BatteryResult> {
    let canonical = canonicalize_equation(axiom, spec)?;
    let engine = engine_for_name(&config.model_finder)?;

    let left_size = canonical.left.size();
    let right_size = canonical.right.size();
    let left_depth = canonical.left.depth();
    let right_depth = canonical.right.depth();
    let var_count = {
        let mut names: Vec<&str> = canonical.left.variables();
        names.extend(canonical.right.variables());
        names.sort_unstable();
        names.dedup();
        names.len()
    };
    let features = SyntacticFeatures {
        left_size,
        right_size,
        total_size: left_size + right_size,
        left_depth,
        right_depth,
        max_depth: left_depth.max(right_depth),
        var_count,
        symmetry_class: canonical.key(),
    };

    let degeneracy = DegeneracyReport {
        trivial_identity: canonical.left == canonical.right,
        projection_collapse: projection_collapse(&canonical.left, &canonical.right),
        constant_collapse: constant_collapse(&canonical.left, &canonical.right),
    };

    let (model_spectrum, smallest_model_size) = spectrum_sweep(
        spec,
        &canonical,
        config.max_model_size,
        &config.search_config(),
        engine,
    )?;

    let implications =
        run_implication_probes(spec, &canonical, &config.implication_config(), engine)?;

    let mut perturbation_neighbors = Vec::new();
    let neighbor_limit = config.perturbation_max_neighbors;
    let neighbor_max_size = config.perturbation_max_size();
    if neighbor_limit > 0 && neighbor_max_size > 0 {
        let neighbor_search = config.perturbation_search_config();
        for neighbor in enumerate_neighbor_axioms(spec, &canonical, Some(neighbor_limit))? {
            let (statuses, neighbor_smallest) =
                spectrum_sweep(spec, &neighbor, neighbor_max_size, &neighbor_search, engine)?;
            perturbation_neighbors.push(PerturbationNeighbor {
                left: neighbor.left,
                right: neighbor.right,
                model_statuses: statuses.into_iter().map(|entry| entry.status).collect(),
                smallest_model_size: neighbor_smallest,
            });
        }
    }

    let novelty_vs_archive = archive_lookup
        .map(|lookup| compute_novelty_vs_archive(&features.symmetry_class, lookup));

    let metrics = compute_metrics(
        &features,
        &degeneracy,
        &model_spectrum,
        &implications,
        smallest_model_size,
        novelty_vs_archive,
        &perturbation_neighbors,
    );

    info!(
        axiom = %canonical.key(),
        smallest_model_size,
        implications = implications.len(),
        neighbors = perturbation_neighbors.len(),
        "battery finished"
    );
    Ok(BatteryResult {
        features,
        degeneracy,
        model_spectrum,
        smallest_model_size,
        implications,
        perturbation_neighbors,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricValue;
    use eqlab_core::spec::OperationSpec;

    fn fast_config() -> BatteryConfig {
        BatteryConfig {
            max_model_size: 2,
            perturbation_max_neighbors: 2,
            ..BatteryConfig::default()
        }
    }

    #[test]
    fn degeneracy_flags_are_independent() {
        let left = Term::parse("f(x0,x1)").unwrap();
        let right = Term::parse("x0").unwrap();
        assert!(projection_collapse(&left, &right));
        assert!(!constant_collapse(&left, &right));

        let lone = Term::parse("x1").unwrap();
        let other = Term::parse("f(x0,x0)").unwrap();
        assert!(constant_collapse(&lone, &other));
        assert!(!projection_collapse(&lone, &other));
    }

    #[test]
    fn perturbation_size_clamped_by_battery_size() {
        let config = BatteryConfig {
            max_model_size: 2,
            perturbation_max_model_size: Some(5),
            ..BatteryConfig::default()
        };
        assert_eq!(config.perturbation_max_size(), 2);
    }

    #[test]
    fn battery_on_left_projection() {
        let spec = UniverseSpec::new(vec![OperationSpec::new("f", 2, false)], 2, 5).unwrap();
        let axiom = Equation::parse("f(x0,x1)=x0").unwrap();
        let result = analyze_axiom(&spec, &axiom, &fast_config(), None).unwrap();

        assert!(!result.degeneracy.trivial_identity);
        assert!(result.degeneracy.projection_collapse);
        assert_eq!(result.smallest_model_size, Some(1));
        assert_eq!(result.model_spectrum.len(), 2);
        assert_eq!(result.perturbation_neighbors.len(), 2);
        for neighbor in &result.perturbation_neighbors {
            assert_eq!(neighbor.model_statuses.len(), 2);
        }
        assert!(result.metrics["novelty_vs_archive"].is_null());
    }

    #[test]
    fn archive_lookup_drives_novelty() {
        let spec = UniverseSpec::new(vec![], 1, 1).unwrap();
        let axiom = Equation::parse("x0=x0").unwrap();
        let config = BatteryConfig {
            max_model_size: 1,
            ..BatteryConfig::default()
        };

        let known = |_: &str| true;
        let result = analyze_axiom(&spec, &axiom, &config, Some(&known)).unwrap();
        assert_eq!(result.metrics["novelty_vs_archive"], MetricValue::Float(0.0));

        let unknown = |_: &str| false;
        let result = analyze_axiom(&spec, &axiom, &config, Some(&unknown)).unwrap();
        assert_eq!(result.metrics["novelty_vs_archive"], MetricValue::Float(1.0));
    }
}
