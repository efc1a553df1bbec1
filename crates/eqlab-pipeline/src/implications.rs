//! Implication probes against the known-theory library.
//!
//! `axiom ⊨ theory` is decided by refutation: search for a model of the
//! axiom that violates the theory, at each domain size up to the bound. A
//! found model is a counterexample; a clean sweep of `not_found` confirms
//! the implication; any budget exhaustion without a counterexample leaves
//! the probe inconclusive. Confirmed probes optionally get a rewriting
//! proof attached — the model search stays the oracle either way.
//!
//! The library is derived from the spec: the standard identity catalog for
//! the first binary operator, idempotence/involutivity for the first unary
//! operator, empty if the signature has neither.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use eqlab_core::canonical::Equation;
use eqlab_core::errors::EqlabResult;
use eqlab_core::spec::UniverseSpec;
use eqlab_core::term::Term;
use eqlab_engines::model::{ModelFinder, ModelSearchConfig, ModelSearchStatus};
use eqlab_engines::prover::{prove, ProofSearchConfig, ProofStatus, ProofStep, RuleOrdering};

/// Budget for one axiom's probe sweep, plus prover settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImplicationConfig {
    pub max_model_size: usize,
    pub max_model_candidates: u64,
    pub max_model_seconds: f64,
    pub proof_enabled: bool,
    pub proof_max_seconds: f64,
    pub proof_max_steps: usize,
    pub proof_max_terms: usize,
    pub proof_rule_ordering: RuleOrdering,
}

impl Default for ImplicationConfig {
    fn default() -> Self {
        Self {
            max_model_size: 3,
            max_model_candidates: 10_000,
            max_model_seconds: 1.0,
            proof_enabled: true,
            proof_max_seconds: 1.0,
            proof_max_steps: 4,
            proof_max_terms: 500,
            proof_rule_ordering: RuleOrdering::Given,
        }
    }
}

impl ImplicationConfig {
    fn search_config(&self) -> ModelSearchConfig {
        ModelSearchConfig {
            max_candidates: self.max_model_candidates,
            max_seconds: self.max_model_seconds,
        }
    }

    fn proof_config(&self) -> ProofSearchConfig {
        ProofSearchConfig {
            max_seconds: self.proof_max_seconds,
            max_steps: self.proof_max_steps,
            max_terms: self.proof_max_terms,
            rule_ordering: self.proof_rule_ordering,
        }
    }
}

/// A named equational theory from the library.
#[derive(Debug, Clone)]
pub struct KnownTheory {
    pub name: String,
    pub equation: Equation,
}

impl KnownTheory {
    fn new(name: &str, left: Term, right: Term) -> Self {
        Self {
            name: name.to_string(),
            equation: Equation::new(left, right),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    Confirmed,
    Counterexample,
    Inconclusive,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Counterexample => "counterexample",
            Self::Inconclusive => "inconclusive",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one `axiom ⊨ theory` decision attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplicationProbe {
    pub theory: String,
    pub status: ProbeStatus,
    pub checked_max_size: usize,
    pub counterexample_size: Option<usize>,
    pub counterexample_fingerprint: Option<String>,
    pub proof_status: Option<ProofStatus>,
    pub proof_elapsed_seconds: Option<f64>,
    pub proof_steps: Option<Vec<ProofStep>>,
}

fn binary_theories(op_name: &str) -> Vec<KnownTheory> {
    let x0 = || Term::var("x0");
    let x1 = || Term::var("x1");
    let x2 = || Term::var("x2");
    let x3 = || Term::var("x3");
    let f = |args: Vec<Term>| Term::op(op_name, args);
    vec![
        KnownTheory::new(
            "associative",
            f(vec![f(vec![x0(), x1()]), x2()]),
            f(vec![x0(), f(vec![x1(), x2()])]),
        ),
        KnownTheory::new("commutative", f(vec![x0(), x1()]), f(vec![x1(), x0()])),
        KnownTheory::new("idempotent", f(vec![x0(), x0()]), x0()),
        KnownTheory::new(
            "left_alternative",
            f(vec![f(vec![x0(), x0()]), x1()]),
            f(vec![x0(), f(vec![x0(), x1()])]),
        ),
        KnownTheory::new(
            "right_alternative",
            f(vec![x0(), f(vec![x1(), x1()])]),
            f(vec![f(vec![x0(), x1()]), x1()]),
        ),
        KnownTheory::new(
            "flexible",
            f(vec![f(vec![x0(), x1()]), x0()]),
            f(vec![x0(), f(vec![x1(), x0()])]),
        ),
        KnownTheory::new(
            "left_self_distributive",
            f(vec![x0(), f(vec![x1(), x2()])]),
            f(vec![f(vec![x0(), x1()]), f(vec![x0(), x2()])]),
        ),
        KnownTheory::new(
            "right_self_distributive",
            f(vec![f(vec![x0(), x1()]), x2()]),
            f(vec![f(vec![x0(), x2()]), f(vec![x1(), x2()])]),
        ),
        KnownTheory::new(
            "medial",
            f(vec![f(vec![x0(), x1()]), f(vec![x2(), x3()])]),
            f(vec![f(vec![x0(), x2()]), f(vec![x1(), x3()])]),
        ),
        KnownTheory::new("left_projection", f(vec![x0(), x1()]), x0()),
        KnownTheory::new("right_projection", f(vec![x0(), x1()]), x1()),
    ]
}

fn unary_theories(op_name: &str) -> Vec<KnownTheory> {
    let x0 = || Term::var("x0");
    let g = |arg: Term| Term::op(op_name, vec![arg]);
    vec![
        KnownTheory::new("idempotent", g(g(x0())), g(x0())),
        KnownTheory::new("involutive", g(g(x0())), x0()),
    ]
}

/// The fixed catalog for a spec: first binary operator's identities, then
/// the first unary operator's. Empty when the signature has neither.
pub fn library_for_spec(spec: &UniverseSpec) -> Vec<KnownTheory> {
    let mut theories = Vec::new();
    if let Some(op) = spec.first_operation_with_arity(2) {
        theories.extend(binary_theories(&op.name));
    }
    if let Some(op) = spec.first_operation_with_arity(1) {
        theories.extend(unary_theories(&op.name));
    }
    theories
}

/// Probe every library theory against the (canonicalized) axiom.
pub fn run_implication_probes(
    spec: &UniverseSpec,
    axiom: &Equation,
    config: &ImplicationConfig,
    engine: &dyn ModelFinder,
) -> EqlabResult<Vec<ImplicationProbe>> {
    run_probes_for_theories(spec, axiom, config, engine, &library_for_spec(spec))
}

pub fn run_probes_for_theories(
    spec: &UniverseSpec,
    axiom: &Equation,
    config: &ImplicationConfig,
    engine: &dyn ModelFinder,
    theories: &[KnownTheory],
) -> EqlabResult<Vec<ImplicationProbe>> {
    let search_config = config.search_config();
    let proof_config = config.proof_config();
    let axioms = std::slice::from_ref(axiom);

    let mut probes = Vec::with_capacity(theories.len());
    for theory in theories {
        let mut counterexample_size = None;
        let mut counterexample_fingerprint = None;
        let mut exhausted = false;
        for size in 1..=config.max_model_size {
            let outcome = engine.find_model(
                spec,
                axioms,
                size,
                &search_config,
                Some(&theory.equation),
            )?;
            match outcome.status {
                ModelSearchStatus::Found => {
                    counterexample_size = Some(size);
                    counterexample_fingerprint = outcome.fingerprint;
                    break;
                }
                ModelSearchStatus::Timeout | ModelSearchStatus::Cutoff => exhausted = true,
                ModelSearchStatus::NotFound => {}
            }
        }
        let status = if counterexample_size.is_some() {
            ProbeStatus::Counterexample
        } else if exhausted {
            ProbeStatus::Inconclusive
        } else {
            ProbeStatus::Confirmed
        };

        let mut proof_status = None;
        let mut proof_elapsed_seconds = None;
        let mut proof_steps = None;
        if status == ProbeStatus::Confirmed && config.proof_enabled {
            let outcome = prove(axioms, &theory.equation, &proof_config);
            proof_status = Some(outcome.status);
            proof_elapsed_seconds = Some(outcome.elapsed_seconds);
            proof_steps = outcome.steps;
        }

        debug!(theory = %theory.name, %status, "implication probe finished");
        probes.push(ImplicationProbe {
            theory: theory.name.clone(),
            status,
            checked_max_size: config.max_model_size,
            counterexample_size,
            counterexample_fingerprint,
            proof_status,
            proof_elapsed_seconds,
            proof_steps,
        });
    }
    Ok(probes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqlab_core::canonical::canonicalize_equation;
    use eqlab_core::spec::OperationSpec;
    use eqlab_engines::model::engine_for_name;

    fn binary_spec() -> UniverseSpec {
        UniverseSpec::new(vec![OperationSpec::new("f", 2, false)], 3, 5).unwrap()
    }

    fn probe_map(probes: &[ImplicationProbe]) -> std::collections::BTreeMap<String, ProbeStatus> {
        probes
            .iter()
            .map(|probe| (probe.theory.clone(), probe.status))
            .collect()
    }

    #[test]
    fn library_composition() {
        assert_eq!(library_for_spec(&binary_spec()).len(), 11);

        let unary = UniverseSpec::new(vec![OperationSpec::new("g", 1, false)], 1, 3).unwrap();
        let names: Vec<String> = library_for_spec(&unary)
            .into_iter()
            .map(|theory| theory.name)
            .collect();
        assert_eq!(names, vec!["idempotent", "involutive"]);

        let empty = UniverseSpec::new(vec![], 1, 1).unwrap();
        assert!(library_for_spec(&empty).is_empty());
    }

    #[test]
    fn commutativity_probes() {
        let spec = binary_spec();
        let engine = engine_for_name("prunable").unwrap();
        let axiom = canonicalize_equation(
            &Equation::parse("f(x0,x1)=f(x1,x0)").unwrap(),
            &spec,
        )
        .unwrap();
        let config = ImplicationConfig {
            max_model_size: 2,
            ..ImplicationConfig::default()
        };
        let probes = run_implication_probes(&spec, &axiom, &config, engine).unwrap();
        let statuses = probe_map(&probes);

        assert_eq!(statuses["commutative"], ProbeStatus::Confirmed);
        assert_eq!(statuses["associative"], ProbeStatus::Counterexample);
        let associative = probes
            .iter()
            .find(|probe| probe.theory == "associative")
            .unwrap();
        assert!(associative.counterexample_size.unwrap() <= 2);
        assert!(associative.counterexample_fingerprint.is_some());
    }

    #[test]
    fn left_projection_confirms_idempotence() {
        let spec = binary_spec();
        let engine = engine_for_name("prunable").unwrap();
        let axiom = canonicalize_equation(&Equation::parse("f(x0,x1)=x0").unwrap(), &spec).unwrap();
        let config = ImplicationConfig {
            max_model_size: 2,
            ..ImplicationConfig::default()
        };
        let probes = run_implication_probes(&spec, &axiom, &config, engine).unwrap();
        let statuses = probe_map(&probes);
        assert_eq!(statuses["idempotent"], ProbeStatus::Confirmed);
        assert_eq!(statuses["left_projection"], ProbeStatus::Confirmed);
        assert_eq!(statuses["right_projection"], ProbeStatus::Counterexample);
    }

    #[test]
    fn confirmed_probes_attach_proofs_when_enabled() {
        let spec = binary_spec();
        let engine = engine_for_name("prunable").unwrap();
        let axiom =
            canonicalize_equation(&Equation::parse("f(x0,x1)=f(x1,x0)").unwrap(), &spec).unwrap();
        let config = ImplicationConfig {
            max_model_size: 2,
            ..ImplicationConfig::default()
        };
        let probes = run_implication_probes(&spec, &axiom, &config, engine).unwrap();
        let commutative = probes
            .iter()
            .find(|probe| probe.theory == "commutative")
            .unwrap();
        assert_eq!(commutative.proof_status, Some(ProofStatus::Proved));
        assert!(commutative.proof_steps.is_some());

        let disabled = ImplicationConfig {
            max_model_size: 2,
            proof_enabled: false,
            ..ImplicationConfig::default()
        };
        let probes = run_implication_probes(&spec, &axiom, &disabled, engine).unwrap();
        let commutative = probes
            .iter()
            .find(|probe| probe.theory == "commutative")
            .unwrap();
        assert!(commutative.proof_status.is_none());
    }
}
