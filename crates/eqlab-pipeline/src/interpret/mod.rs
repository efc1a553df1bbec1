//! Dossier interpretation.
//!
//! Turns a stored battery result into a cited report: property checks from
//! the implication probes, a rerun of the fixed benchmark identity suite,
//! pretty-printed models, a translation search against every confirmed
//! library theory, nearest neighbors among peer results, and a narrative in
//! which every line carries at least one `[citation]` token. Facts without a
//! source and narrative lines without a citation are contract breaches; the
//! validator in this module rejects such dossiers outright.

use serde::{Deserialize, Serialize};

use eqlab_core::canonical::{canonicalize_equation, Equation};
use eqlab_core::errors::EqlabResult;
use eqlab_core::spec::UniverseSpec;
use eqlab_core::term::Term;
use eqlab_engines::model::{
    engine_for_name, ModelFinder, ModelSearchConfig, ModelSearchStatus,
};
use eqlab_engines::prover::{ProofStatus, ProofStep};

use crate::battery::{BatteryConfig, BatteryResult, ModelSpectrumEntry};
use crate::implications::{library_for_spec, ImplicationProbe, ProbeStatus};

pub mod validation;

pub use validation::validate_dossier;

/// Budgets for the interpretation-time model searches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpretationConfig {
    pub max_model_size: usize,
    pub max_model_candidates: u64,
    pub max_model_seconds: f64,
    pub neighbor_count: usize,
    pub model_finder: String,
}

impl Default for InterpretationConfig {
    fn default() -> Self {
        Self {
            max_model_size: 3,
            max_model_candidates: 10_000,
            max_model_seconds: 1.0,
            neighbor_count: 3,
            model_finder: "prunable".to_string(),
        }
    }
}

impl InterpretationConfig {
    pub fn from_battery_config(config: &BatteryConfig) -> Self {
        Self {
            max_model_size: config.max_model_size,
            max_model_candidates: config.max_model_candidates,
            max_model_seconds: config.max_model_seconds,
            model_finder: config.model_finder.clone(),
            ..Self::default()
        }
    }

    fn search_config(&self) -> ModelSearchConfig {
        ModelSearchConfig {
            max_candidates: self.max_model_candidates,
            max_seconds: self.max_model_seconds,
        }
    }
}

/// One library property restated from an implication probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyCheck {
    pub name: String,
    pub status: ProbeStatus,
    pub counterexample_size: Option<usize>,
    pub counterexample_fingerprint: Option<String>,
    pub proof_status: Option<ProofStatus>,
    pub proof_steps: Option<Vec<ProofStep>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkIdentityResult {
    pub name: String,
    pub left: String,
    pub right: String,
    pub status: ProbeStatus,
    pub counterexample_size: Option<usize>,
    pub counterexample_fingerprint: Option<String>,
}

/// A found model rendered as per-operator tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrettyModel {
    pub size: usize,
    pub fingerprint: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationStatus {
    Equivalent,
    TheoryStronger,
    Inconclusive,
    NoMatch,
}

/// Two-way implication check between the axiom and one library theory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationCandidate {
    pub theory: String,
    pub axiom_implies: ProbeStatus,
    pub theory_implies: ProbeStatus,
    pub status: TranslationStatus,
    pub counterexample_size: Option<usize>,
    pub counterexample_fingerprint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestNeighbor {
    pub axiom_id: String,
    pub left: String,
    pub right: String,
    pub distance: f64,
    pub shared_confirmed: Vec<String>,
}

/// A single cited statement. `source` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub statement: String,
    pub source: String,
}

/// The complete per-axiom report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TheoryDossier {
    pub axiom: AxiomText,
    pub canonical_axiom: AxiomText,
    pub minimal_basis: Vec<AxiomText>,
    pub features: crate::battery::SyntacticFeatures,
    pub degeneracy: crate::battery::DegeneracyReport,
    pub model_spectrum: Vec<ModelSpectrumEntry>,
    pub smallest_model_size: Option<usize>,
    pub model_pretty: Vec<PrettyModel>,
    pub properties: Vec<PropertyCheck>,
    pub benchmark_identities: Vec<BenchmarkIdentityResult>,
    pub derived_laws: Vec<Fact>,
    pub translations: Vec<TranslationCandidate>,
    pub nearest_neighbors: Vec<NearestNeighbor>,
    pub facts: Vec<Fact>,
    pub narrative: Vec<String>,
    pub open_questions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxiomText {
    pub left: String,
    pub right: String,
}

impl AxiomText {
    fn from_equation(equation: &Equation) -> Self {
        Self {
            left: equation.left.serialize(),
            right: equation.right.serialize(),
        }
    }
}

/// A peer result for the nearest-neighbor search, borrowed for the duration
/// of one interpretation call.
pub type PeerResult<'a> = (&'a str, &'a Equation, &'a BatteryResult);

/// Assemble the dossier for one axiom.
pub fn interpret_axiom(
    spec: &UniverseSpec,
    axiom: &Equation,
    result: &BatteryResult,
    config: &InterpretationConfig,
    peer_results: &[PeerResult<'_>],
) -> EqlabResult<TheoryDossier> {
    let canonical = canonicalize_equation(axiom, spec)?;
    let engine = engine_for_name(&config.model_finder)?;
    let canonical_axiom = AxiomText::from_equation(&canonical);

    let properties = properties_from_implications(&result.implications);
    let benchmark_identities = run_benchmark_suite(spec, &canonical, config, engine)?;
    let model_pretty = pretty_models(spec, &result.model_spectrum);
    let translations = translation_search(spec, &canonical, &result.implications, config, engine)?;
    let nearest_neighbors = nearest_neighbors(result, peer_results, config.neighbor_count);
    let derived_laws = derived_laws(&properties, &benchmark_identities);
    let facts = build_facts(
        result,
        &properties,
        &benchmark_identities,
        &translations,
        &nearest_neighbors,
    );
    let narrative = compile_narrative(
        &canonical_axiom,
        result,
        &properties,
        &benchmark_identities,
        &facts,
    );
    let open_questions = open_questions(&properties, &benchmark_identities, &translations);

    Ok(TheoryDossier {
        axiom: AxiomText::from_equation(axiom),
        canonical_axiom: canonical_axiom.clone(),
        minimal_basis: vec![canonical_axiom],
        features: result.features.clone(),
        degeneracy: result.degeneracy,
        model_spectrum: result.model_spectrum.clone(),
        smallest_model_size: result.smallest_model_size,
        model_pretty,
        properties,
        benchmark_identities,
        derived_laws,
        translations,
        nearest_neighbors,
        facts,
        narrative,
        open_questions,
    })
}

fn properties_from_implications(implications: &[ImplicationProbe]) -> Vec<PropertyCheck> {
    implications
        .iter()
        .map(|probe| PropertyCheck {
            name: probe.theory.clone(),
            status: probe.status,
            counterexample_size: probe.counterexample_size,
            counterexample_fingerprint: probe.counterexample_fingerprint.clone(),
            proof_status: probe.proof_status,
            proof_steps: probe.proof_steps.clone(),
        })
        .collect()
}

/// The fixed benchmark identity suite, constructed like the library.
fn benchmark_identities(spec: &UniverseSpec) -> Vec<(String, Equation)> {
    let mut benchmarks = Vec::new();
    if let Some(op) = spec.first_operation_with_arity(2) {
        let x0 = || Term::var("x0");
        let x1 = || Term::var("x1");
        let x2 = || Term::var("x2");
        let x3 = || Term::var("x3");
        let f = |args: Vec<Term>| Term::op(op.name.clone(), args);
        benchmarks.push((
            "left_absorption".to_string(),
            Equation::new(f(vec![x0(), f(vec![x0(), x1()])]), x0()),
        ));
        benchmarks.push((
            "right_absorption".to_string(),
            Equation::new(f(vec![f(vec![x0(), x1()]), x1()]), x1()),
        ));
        benchmarks.push((
            "left_distributive".to_string(),
            Equation::new(
                f(vec![x0(), f(vec![x1(), x2()])]),
                f(vec![f(vec![x0(), x1()]), f(vec![x0(), x2()])]),
            ),
        ));
        benchmarks.push((
            "right_distributive".to_string(),
            Equation::new(
                f(vec![f(vec![x0(), x1()]), x2()]),
                f(vec![f(vec![x0(), x2()]), f(vec![x1(), x2()])]),
            ),
        ));
        benchmarks.push((
            "medial".to_string(),
            Equation::new(
                f(vec![f(vec![x0(), x1()]), f(vec![x2(), x3()])]),
                f(vec![f(vec![x0(), x2()]), f(vec![x1(), x3()])]),
            ),
        ));
    }
    if let Some(op) = spec.first_operation_with_arity(1) {
        let x0 = || Term::var("x0");
        let g = |arg: Term| Term::op(op.name.clone(), vec![arg]);
        benchmarks.push((
            "unary_idempotent".to_string(),
            Equation::new(g(g(x0())), g(x0())),
        ));
        benchmarks.push((
            "unary_involutive".to_string(),
            Equation::new(g(g(x0())), x0()),
        ));
    }
    benchmarks
}

/// Decide `axioms ⊨ identity` by counterexample search up to the size bound.
fn implication_status(
    spec: &UniverseSpec,
    axioms: &[Equation],
    identity: &Equation,
    max_model_size: usize,
    search_config: &ModelSearchConfig,
    engine: &dyn ModelFinder,
) -> EqlabResult<(ProbeStatus, Option<usize>, Option<String>)> {
    let mut exhausted = false;
    for size in 1..=max_model_size {
        let outcome = engine.find_model(spec, axioms, size, search_config, Some(identity))?;
        match outcome.status {
            ModelSearchStatus::Found => {
                return Ok((ProbeStatus::Counterexample, Some(size), outcome.fingerprint))
            }
            ModelSearchStatus::Timeout | ModelSearchStatus::Cutoff => exhausted = true,
            ModelSearchStatus::NotFound => {}
        }
    }
    if exhausted {
        Ok((ProbeStatus::Inconclusive, None, None))
    } else {
        Ok((ProbeStatus::Confirmed, None, None))
    }
}

fn run_benchmark_suite(
    spec: &UniverseSpec,
    axiom: &Equation,
    config: &InterpretationConfig,
    engine: &dyn ModelFinder,
) -> EqlabResult<Vec<BenchmarkIdentityResult>> {
    let search_config = config.search_config();
    let mut results = Vec::new();
    for (name, identity) in benchmark_identities(spec) {
        let (status, counterexample_size, counterexample_fingerprint) = implication_status(
            spec,
            std::slice::from_ref(axiom),
            &identity,
            config.max_model_size,
            &search_config,
            engine,
        )?;
        results.push(BenchmarkIdentityResult {
            name,
            left: identity.left.serialize(),
            right: identity.right.serialize(),
            status,
            counterexample_size,
            counterexample_fingerprint,
        });
    }
    Ok(results)
}

fn pretty_models(spec: &UniverseSpec, spectrum: &[ModelSpectrumEntry]) -> Vec<PrettyModel> {
    spectrum
        .iter()
        .filter(|entry| entry.status == ModelSearchStatus::Found)
        .filter_map(|entry| entry.fingerprint.as_deref())
        .map(|fingerprint| pretty_model_from_fingerprint(spec, fingerprint))
        .collect()
}

fn pretty_model_from_fingerprint(spec: &UniverseSpec, fingerprint: &str) -> PrettyModel {
    let mut size = 0usize;
    let mut tables: Vec<(String, Vec<usize>)> = Vec::new();
    for part in fingerprint.split(';') {
        let Some((name, payload)) = part.split_once('=') else {
            continue;
        };
        if name == "n" {
            size = payload.parse().unwrap_or(0);
            continue;
        }
        let values = if payload.is_empty() {
            Vec::new()
        } else {
            payload
                .split(',')
                .filter_map(|value| value.parse().ok())
                .collect()
        };
        tables.push((name.to_string(), values));
    }

    let mut lines = Vec::new();
    for op in &spec.operations {
        let table = tables
            .iter()
            .find(|(name, _)| *name == op.name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[]);
        lines.push(format!("{}:", op.name));
        if op.arity == 1 {
            let row: Vec<String> = table.iter().map(|value| value.to_string()).collect();
            lines.push(format!("  {}", row.join(" ")));
        } else {
            for row_idx in 0..size {
                let start = row_idx * size;
                let row: Vec<String> = table
                    .iter()
                    .skip(start)
                    .take(size)
                    .map(|value| value.to_string())
                    .collect();
                lines.push(format!("  {}", row.join(" ")));
            }
        }
    }
    PrettyModel {
        size,
        fingerprint: fingerprint.to_string(),
        lines,
    }
}

/// For every library theory the axiom confirms, test the reverse direction:
/// does the theory imply the axiom back?
fn translation_search(
    spec: &UniverseSpec,
    axiom: &Equation,
    implications: &[ImplicationProbe],
    config: &InterpretationConfig,
    engine: &dyn ModelFinder,
) -> EqlabResult<Vec<TranslationCandidate>> {
    let search_config = config.search_config();
    let mut candidates = Vec::new();
    for theory in library_for_spec(spec) {
        let Some(probe) = implications
            .iter()
            .find(|probe| probe.theory == theory.name)
        else {
            continue;
        };
        let axiom_implies = probe.status;
        let mut theory_implies = ProbeStatus::Inconclusive;
        let mut status = TranslationStatus::Inconclusive;
        let mut counterexample_size = None;
        let mut counterexample_fingerprint = None;
        match axiom_implies {
            ProbeStatus::Confirmed => {
                let (reverse, size, fingerprint) = implication_status(
                    spec,
                    std::slice::from_ref(&theory.equation),
                    axiom,
                    config.max_model_size,
                    &search_config,
                    engine,
                )?;
                theory_implies = reverse;
                counterexample_size = size;
                counterexample_fingerprint = fingerprint;
                status = match reverse {
                    ProbeStatus::Confirmed => TranslationStatus::Equivalent,
                    ProbeStatus::Counterexample => TranslationStatus::TheoryStronger,
                    ProbeStatus::Inconclusive => TranslationStatus::Inconclusive,
                };
            }
            ProbeStatus::Counterexample => status = TranslationStatus::NoMatch,
            ProbeStatus::Inconclusive => {}
        }
        candidates.push(TranslationCandidate {
            theory: theory.name,
            axiom_implies,
            theory_implies,
            status,
            counterexample_size,
            counterexample_fingerprint,
        });
    }
    Ok(candidates)
}

fn implication_signature(
    implications: &[ImplicationProbe],
) -> std::collections::BTreeMap<String, i32> {
    implications
        .iter()
        .map(|probe| {
            let value = match probe.status {
                ProbeStatus::Confirmed => 1,
                ProbeStatus::Counterexample => -1,
                ProbeStatus::Inconclusive => 0,
            };
            (probe.theory.clone(), value)
        })
        .collect()
}

fn signature_distance(
    target: &std::collections::BTreeMap<String, i32>,
    candidate: &std::collections::BTreeMap<String, i32>,
) -> (f64, Vec<String>) {
    let mut distance = 0.0;
    let mut shared_confirmed = Vec::new();
    let keys: std::collections::BTreeSet<&String> =
        target.keys().chain(candidate.keys()).collect();
    for key in keys {
        let left = target.get(key).copied().unwrap_or(0);
        let right = candidate.get(key).copied().unwrap_or(0);
        distance += (left - right).abs() as f64;
        if left == 1 && right == 1 {
            shared_confirmed.push(key.clone());
        }
    }
    (distance, shared_confirmed)
}

/// L¹ distance on the ternary implication signature, sorted by
/// `(distance, axiom_id)`, capped at `count`.
fn nearest_neighbors(
    result: &BatteryResult,
    peer_results: &[PeerResult<'_>],
    count: usize,
) -> Vec<NearestNeighbor> {
    if peer_results.is_empty() || count == 0 {
        return Vec::new();
    }
    let target = implication_signature(&result.implications);
    let mut neighbors: Vec<NearestNeighbor> = peer_results
        .iter()
        .map(|(axiom_id, equation, peer)| {
            let signature = implication_signature(&peer.implications);
            let (distance, shared_confirmed) = signature_distance(&target, &signature);
            NearestNeighbor {
                axiom_id: axiom_id.to_string(),
                left: equation.left.serialize(),
                right: equation.right.serialize(),
                distance,
                shared_confirmed,
            }
        })
        .collect();
    neighbors.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then_with(|| a.axiom_id.cmp(&b.axiom_id))
    });
    neighbors.truncate(count);
    neighbors
}

fn derived_laws(
    properties: &[PropertyCheck],
    benchmarks: &[BenchmarkIdentityResult],
) -> Vec<Fact> {
    let mut facts = Vec::new();
    for property in properties {
        if property.status == ProbeStatus::Confirmed {
            facts.push(Fact {
                statement: format!("{} confirmed", property.name),
                source: format!("implication.{}", property.name),
            });
        }
    }
    for benchmark in benchmarks {
        if benchmark.status == ProbeStatus::Confirmed {
            facts.push(Fact {
                statement: format!("{} identity holds", benchmark.name),
                source: format!("benchmark.{}", benchmark.name),
            });
        }
    }
    facts
}

fn build_facts(
    result: &BatteryResult,
    properties: &[PropertyCheck],
    benchmarks: &[BenchmarkIdentityResult],
    translations: &[TranslationCandidate],
    neighbors: &[NearestNeighbor],
) -> Vec<Fact> {
    let mut facts = Vec::new();
    if let Some(size) = result.smallest_model_size {
        facts.push(Fact {
            statement: format!("smallest model size {size}"),
            source: "models.spectrum".to_string(),
        });
    }
    for property in properties {
        match property.status {
            ProbeStatus::Confirmed => facts.push(Fact {
                statement: format!("{} property confirmed", property.name),
                source: format!("implication.{}", property.name),
            }),
            ProbeStatus::Counterexample => facts.push(Fact {
                statement: format!("{} property refuted", property.name),
                source: format!("implication.{}", property.name),
            }),
            ProbeStatus::Inconclusive => {}
        }
    }
    for benchmark in benchmarks {
        if benchmark.status == ProbeStatus::Confirmed {
            facts.push(Fact {
                statement: format!("{} benchmark confirmed", benchmark.name),
                source: format!("benchmark.{}", benchmark.name),
            });
        }
    }
    for candidate in translations {
        if candidate.status == TranslationStatus::Equivalent {
            facts.push(Fact {
                statement: format!("definitional equivalence with {}", candidate.theory),
                source: format!("translation.{}", candidate.theory),
            });
        }
    }
    for neighbor in neighbors {
        facts.push(Fact {
            statement: format!(
                "nearest neighbor {} at distance {}",
                neighbor.axiom_id, neighbor.distance
            ),
            source: "neighbors.implication".to_string(),
        });
    }
    facts
}

fn citation_list(prefix: &str, names: &[&str]) -> String {
    let unique: std::collections::BTreeSet<&str> = names.iter().copied().collect();
    unique
        .into_iter()
        .map(|name| format!("{prefix}.{name}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn compile_narrative(
    canonical_axiom: &AxiomText,
    result: &BatteryResult,
    properties: &[PropertyCheck],
    benchmarks: &[BenchmarkIdentityResult],
    facts: &[Fact],
) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!(
        "Canonical axiom: {} = {} [axiom]",
        canonical_axiom.left, canonical_axiom.right
    ));
    if let Some(size) = result.smallest_model_size {
        lines.push(format!(
            "Smallest model found at size {size} [models.spectrum]"
        ));
    }
    let confirmed: Vec<&str> = properties
        .iter()
        .filter(|property| property.status == ProbeStatus::Confirmed)
        .map(|property| property.name.as_str())
        .collect();
    if !confirmed.is_empty() {
        let mut names: Vec<&str> = confirmed.clone();
        names.sort_unstable();
        lines.push(format!(
            "Confirmed properties: {} [{}]",
            names.join(", "),
            citation_list("implication", &confirmed)
        ));
    }
    let refuted: Vec<&str> = properties
        .iter()
        .filter(|property| property.status == ProbeStatus::Counterexample)
        .map(|property| property.name.as_str())
        .collect();
    if !refuted.is_empty() {
        let mut names: Vec<&str> = refuted.clone();
        names.sort_unstable();
        lines.push(format!(
            "Refuted properties: {} [{}]",
            names.join(", "),
            citation_list("implication", &refuted)
        ));
    }
    let satisfied: Vec<&str> = benchmarks
        .iter()
        .filter(|benchmark| benchmark.status == ProbeStatus::Confirmed)
        .map(|benchmark| benchmark.name.as_str())
        .collect();
    if !satisfied.is_empty() {
        let mut names: Vec<&str> = satisfied.clone();
        names.sort_unstable();
        lines.push(format!(
            "Benchmark identities satisfied: {} [{}]",
            names.join(", "),
            citation_list("benchmark", &satisfied)
        ));
    }
    if !facts.is_empty() {
        let summary: Vec<String> = facts
            .iter()
            .take(4)
            .map(|fact| format!("{} [{}]", fact.statement, fact.source))
            .collect();
        lines.push(format!("Evidence summary: {}", summary.join("; ")));
    }
    lines
}

fn open_questions(
    properties: &[PropertyCheck],
    benchmarks: &[BenchmarkIdentityResult],
    translations: &[TranslationCandidate],
) -> Vec<String> {
    let mut questions = Vec::new();
    for property in properties {
        if property.status == ProbeStatus::Inconclusive {
            questions.push(format!(
                "Resolve property {} with larger model search.",
                property.name
            ));
        }
    }
    for benchmark in benchmarks {
        if benchmark.status == ProbeStatus::Inconclusive {
            questions.push(format!(
                "Resolve benchmark {} with larger model search.",
                benchmark.name
            ));
        }
    }
    for candidate in translations {
        if candidate.status == TranslationStatus::Inconclusive {
            questions.push(format!(
                "Check definitional equivalence with {}.",
                candidate.theory
            ));
        }
    }
    questions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::{analyze_axiom, BatteryConfig};
    use eqlab_core::spec::OperationSpec;

    fn binary_spec() -> UniverseSpec {
        UniverseSpec::new(vec![OperationSpec::new("f", 2, false)], 2, 5).unwrap()
    }

    fn fast_battery() -> BatteryConfig {
        BatteryConfig {
            max_model_size: 2,
            perturbation_max_neighbors: 2,
            ..BatteryConfig::default()
        }
    }

    fn fast_interpret() -> InterpretationConfig {
        InterpretationConfig {
            max_model_size: 2,
            ..InterpretationConfig::default()
        }
    }

    #[test]
    fn left_projection_dossier() {
        let spec = binary_spec();
        let axiom = Equation::parse("f(x0,x1)=x0").unwrap();
        let result = analyze_axiom(&spec, &axiom, &fast_battery(), None).unwrap();
        let dossier =
            interpret_axiom(&spec, &axiom, &result, &fast_interpret(), &[]).unwrap();

        let absorption = dossier
            .benchmark_identities
            .iter()
            .find(|benchmark| benchmark.name == "left_absorption")
            .unwrap();
        assert_eq!(absorption.status, ProbeStatus::Confirmed);

        assert!(!dossier.facts.is_empty());
        assert!(dossier.narrative[0].contains("[axiom]"));
        let value = serde_json::to_value(&dossier).unwrap();
        validate_dossier(&value).unwrap();
    }

    #[test]
    fn pretty_model_renders_rows() {
        let spec = binary_spec();
        let pretty = pretty_model_from_fingerprint(&spec, "n=2;f=0,1,1,0");
        assert_eq!(pretty.size, 2);
        assert_eq!(
            pretty.lines,
            vec!["f:".to_string(), "  0 1".to_string(), "  1 0".to_string()]
        );
    }

    #[test]
    fn neighbors_sorted_by_distance_then_id() {
        let spec = binary_spec();
        let base_axiom = Equation::parse("f(x0,x1)=x0").unwrap();
        let peer_axiom = Equation::parse("f(x0,x1)=x1").unwrap();
        let base = analyze_axiom(&spec, &base_axiom, &fast_battery(), None).unwrap();
        let twin = base.clone();
        let other = analyze_axiom(&spec, &peer_axiom, &fast_battery(), None).unwrap();

        let peers: Vec<PeerResult<'_>> = vec![
            ("bbb", &peer_axiom, &other),
            ("aaa", &base_axiom, &twin),
        ];
        let neighbors = nearest_neighbors(&base, &peers, 2);
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].axiom_id, "aaa");
        assert_eq!(neighbors[0].distance, 0.0);
        assert!(!neighbors[0].shared_confirmed.is_empty());
        assert!(neighbors[1].distance > 0.0);
    }

    #[test]
    fn translations_cover_confirmed_theories() {
        let spec = binary_spec();
        let axiom = Equation::parse("f(x0,x1)=f(x1,x0)").unwrap();
        let result = analyze_axiom(&spec, &axiom, &fast_battery(), None).unwrap();
        let dossier = interpret_axiom(&spec, &axiom, &result, &fast_interpret(), &[]).unwrap();

        let commutative = dossier
            .translations
            .iter()
            .find(|candidate| candidate.theory == "commutative")
            .unwrap();
        assert_eq!(commutative.axiom_implies, ProbeStatus::Confirmed);
        assert_eq!(commutative.status, TranslationStatus::Equivalent);

        let associative = dossier
            .translations
            .iter()
            .find(|candidate| candidate.theory == "associative")
            .unwrap();
        assert_eq!(associative.status, TranslationStatus::NoMatch);
    }
}
