use anyhow::{anyhow, Result};
use serde_json::Value;

use eqlab_core::spec::UniverseSpec;
use eqlab_pipeline::interpret::{interpret_axiom, validate_dossier, InterpretationConfig};
use eqlab_pipeline::runner::compute_axiom_id;

use crate::cmd::replay;
use crate::output;

pub fn run(
    store_root: Option<&str>,
    run_dir: Option<&str>,
    run_id: Option<&str>,
    index: usize,
    neighbors: usize,
) -> Result<()> {
    let (manifest, results) = replay::load_run(store_root, run_dir, run_id)?;
    let spec: UniverseSpec = serde_json::from_value(manifest.spec.clone())?;
    spec.validate()?;

    let (axiom, result) = results
        .get(index)
        .ok_or_else(|| anyhow!("axiom index {index} out of range (run has {})", results.len()))?;

    let mut peers = Vec::new();
    for (peer_index, (peer_axiom, peer_result)) in results.iter().enumerate() {
        if peer_index == index {
            continue;
        }
        peers.push((compute_axiom_id(peer_axiom)?, peer_axiom, peer_result));
    }
    let peer_refs: Vec<(&str, &eqlab_core::canonical::Equation, _)> = peers
        .iter()
        .map(|(id, axiom, result)| (id.as_str(), *axiom, *result))
        .collect();

    let config = InterpretationConfig {
        neighbor_count: neighbors,
        ..InterpretationConfig::from_battery_config(&serde_json::from_value(
            manifest.battery_config.clone(),
        )?)
    };
    let dossier = interpret_axiom(&spec, axiom, result, &config, &peer_refs)?;

    let value: Value = serde_json::to_value(&dossier)?;
    validate_dossier(&value)?;

    output::heading(&format!(
        "dossier for {} = {}",
        dossier.canonical_axiom.left, dossier.canonical_axiom.right
    ))?;
    output::print(&value)
}
