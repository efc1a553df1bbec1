//! End-to-end battery scenarios over small signatures.

use eqlab_core::canonical::Equation;
use eqlab_core::spec::{OperationSpec, UniverseSpec};
use eqlab_engines::model::ModelSearchStatus;
use eqlab_pipeline::battery::{analyze_axiom, BatteryConfig};
use eqlab_pipeline::implications::{library_for_spec, ProbeStatus};
use eqlab_pipeline::metrics::MetricValue;

fn empty_spec(max_vars: usize) -> UniverseSpec {
    UniverseSpec::new(vec![], max_vars, 1).unwrap()
}

fn binary_spec(max_vars: usize) -> UniverseSpec {
    UniverseSpec::new(vec![OperationSpec::new("f", 2, false)], max_vars, 5).unwrap()
}

fn config(max_model_size: usize) -> BatteryConfig {
    BatteryConfig {
        max_model_size,
        perturbation_max_neighbors: 4,
        ..BatteryConfig::default()
    }
}

fn probe_status(
    result: &eqlab_pipeline::battery::BatteryResult,
    theory: &str,
) -> ProbeStatus {
    result
        .implications
        .iter()
        .find(|probe| probe.theory == theory)
        .unwrap_or_else(|| panic!("missing probe {theory}"))
        .status
}

#[test]
fn reflexive_axiom_in_empty_signature() {
    let spec = empty_spec(1);
    let axiom = Equation::parse("x0=x0").unwrap();
    let result = analyze_axiom(&spec, &axiom, &config(1), None).unwrap();

    assert!(result.degeneracy.trivial_identity);
    assert!(!result.degeneracy.projection_collapse);
    assert!(!result.degeneracy.constant_collapse);
    assert_eq!(result.model_spectrum[0].status, ModelSearchStatus::Found);
    assert_eq!(result.smallest_model_size, Some(1));
    assert!(result.implications.is_empty());
}

#[test]
fn variable_collapse_in_empty_signature() {
    let spec = empty_spec(2);
    let axiom = Equation::parse("x0=x1").unwrap();
    let result = analyze_axiom(&spec, &axiom, &config(2), None).unwrap();

    assert_eq!(result.model_spectrum[0].status, ModelSearchStatus::Found);
    assert_eq!(result.model_spectrum[1].status, ModelSearchStatus::NotFound);
    assert_eq!(result.smallest_model_size, Some(1));
    assert_eq!(
        result.metrics["nontrivial_model_spectrum"],
        MetricValue::Bool(true)
    );
    assert!(result.degeneracy.constant_collapse);
}

#[test]
fn commutativity_refutes_associativity() {
    let spec = binary_spec(3);
    let axiom = Equation::parse("f(x0,x1)=f(x1,x0)").unwrap();
    let result = analyze_axiom(&spec, &axiom, &config(2), None).unwrap();

    assert_eq!(probe_status(&result, "commutative"), ProbeStatus::Confirmed);
    assert_eq!(
        probe_status(&result, "associative"),
        ProbeStatus::Counterexample
    );
    let associative = result
        .implications
        .iter()
        .find(|probe| probe.theory == "associative")
        .unwrap();
    assert!(associative.counterexample_size.unwrap() <= 2);
}

#[test]
fn left_projection_confirms_idempotence_and_projection() {
    let spec = binary_spec(2);
    let axiom = Equation::parse("f(x0,x1)=x0").unwrap();
    let result = analyze_axiom(&spec, &axiom, &config(2), None).unwrap();

    assert_eq!(probe_status(&result, "idempotent"), ProbeStatus::Confirmed);
    assert_eq!(
        probe_status(&result, "left_projection"),
        ProbeStatus::Confirmed
    );
}

#[test]
fn library_self_confirmation() {
    let spec = binary_spec(4);
    let config = config(2);
    for theory in library_for_spec(&spec) {
        let result = analyze_axiom(&spec, &theory.equation, &config, None).unwrap();
        assert_eq!(
            probe_status(&result, &theory.name),
            ProbeStatus::Confirmed,
            "theory {} must confirm itself",
            theory.name
        );
    }
}
