use anyhow::{anyhow, Result};
use serde::Serialize;

use eqlab_core::canonical::Equation;
use eqlab_pipeline::battery::BatteryResult;
use eqlab_pipeline::runner::{load_run_directory, load_run_from_store, RunManifest};
use eqlab_store::ArtifactStore;

use crate::output;

#[derive(Debug, Serialize)]
struct AxiomSummary {
    axiom: String,
    symmetry_class: String,
    smallest_model_size: Option<usize>,
    confirmed: usize,
    counterexamples: usize,
    inconclusive: usize,
}

#[derive(Debug, Serialize)]
struct ReplayOut {
    run_id: String,
    axiom_count: usize,
    axioms: Vec<AxiomSummary>,
}

pub(crate) fn load_run(
    store_root: Option<&str>,
    run_dir: Option<&str>,
    run_id: Option<&str>,
) -> Result<(RunManifest, Vec<(Equation, BatteryResult)>)> {
    match (run_dir, run_id) {
        (Some(dir), None) => Ok(load_run_directory(dir)?),
        (None, Some(id)) => {
            let root = store_root
                .ok_or_else(|| anyhow!("--run-id requires --store-root"))?;
            let store = ArtifactStore::open(root)?;
            Ok(load_run_from_store(&store, id)?)
        }
        _ => Err(anyhow!("pass exactly one of --run-dir or --run-id")),
    }
}

pub fn run(store_root: Option<&str>, run_dir: Option<&str>, run_id: Option<&str>) -> Result<()> {
    let (manifest, results) = load_run(store_root, run_dir, run_id)?;

    let axioms = results
        .iter()
        .map(|(axiom, result)| {
            let count = |status: eqlab_pipeline::implications::ProbeStatus| {
                result
                    .implications
                    .iter()
                    .filter(|probe| probe.status == status)
                    .count()
            };
            AxiomSummary {
                axiom: axiom.key(),
                symmetry_class: result.features.symmetry_class.clone(),
                smallest_model_size: result.smallest_model_size,
                confirmed: count(eqlab_pipeline::implications::ProbeStatus::Confirmed),
                counterexamples: count(eqlab_pipeline::implications::ProbeStatus::Counterexample),
                inconclusive: count(eqlab_pipeline::implications::ProbeStatus::Inconclusive),
            }
        })
        .collect();

    output::heading(&format!("run {}", manifest.run_id))?;
    output::print(&ReplayOut {
        run_id: manifest.run_id,
        axiom_count: manifest.axiom_count,
        axioms,
    })
}
