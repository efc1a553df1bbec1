//! Run execution, persistence, and replay.
//!
//! A run is identified by the first 16 hex characters of the SHA-256 of the
//! stable-JSON `{spec, battery_config, axioms}` payload; each axiom by the
//! full SHA-256 of its serialized `{left, right}` pair, exactly as
//! submitted. Both ids are pure functions of their inputs, which is the
//! whole reproducibility story: same spec, axioms, and config ⇒ same ids
//! and byte-identical `results.jsonl`.
//!
//! Outputs: one stable-JSON line per axiom in `results.jsonl` plus a
//! `run.json` manifest. With a store attached, the manifest and results are
//! also written as blobs and the relational rows recorded. Replay loads
//! either from a directory or from the store and rehydrates battery
//! results, recomputing only metrics that are missing (stored values are
//! never overwritten).

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use eqlab_core::canonical::Equation;
use eqlab_core::determinism::hashing::sha256_stable_json;
use eqlab_core::determinism::stable_json::stable_json_string;
use eqlab_core::errors::{EqlabError, EqlabResult};
use eqlab_core::spec::UniverseSpec;
use eqlab_store::{ArtifactStore, AxiomRecord, ImplicationRecord, ModelRecord, RunRecord};

use crate::battery::{analyze_axiom, BatteryConfig, BatteryResult};
use crate::metrics::compute_metrics;

/// The `run.json` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub spec: Value,
    pub battery_config: Value,
    pub axiom_count: usize,
    pub results_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AxiomPair {
    left: eqlab_core::term::Term,
    right: eqlab_core::term::Term,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResultRecord {
    axiom: AxiomPair,
    #[serde(flatten)]
    result: BatteryResult,
}

/// First 16 hex chars of the SHA-256 over `{spec, battery_config, axioms}`.
pub fn compute_run_id(
    spec: &UniverseSpec,
    axioms: &[Equation],
    config: &BatteryConfig,
) -> EqlabResult<String> {
    let payload = serde_json::json!({
        "spec": serde_json::to_value(spec)?,
        "battery_config": serde_json::to_value(config)?,
        "axioms": axioms
            .iter()
            .map(|axiom| {
                serde_json::json!({
                    "left": axiom.left.serialize(),
                    "right": axiom.right.serialize(),
                })
            })
            .collect::<Vec<_>>(),
    });
    Ok(sha256_stable_json(&payload)?[..16].to_string())
}

/// Full SHA-256 over the serialized `{left, right}` pair.
pub fn compute_axiom_id(axiom: &Equation) -> EqlabResult<String> {
    let payload = serde_json::json!({
        "left": axiom.left.serialize(),
        "right": axiom.right.serialize(),
    });
    sha256_stable_json(&payload)
}

fn result_line(axiom: &Equation, result: &BatteryResult) -> EqlabResult<String> {
    let record = serde_json::json!({
        "axiom": {
            "left": axiom.left.serialize(),
            "right": axiom.right.serialize(),
        },
        "features": serde_json::to_value(&result.features)?,
        "degeneracy": serde_json::to_value(&result.degeneracy)?,
        "model_spectrum": serde_json::to_value(&result.model_spectrum)?,
        "smallest_model_size": serde_json::to_value(result.smallest_model_size)?,
        "implications": serde_json::to_value(&result.implications)?,
        "perturbation_neighbors": serde_json::to_value(&result.perturbation_neighbors)?,
        "metrics": serde_json::to_value(&result.metrics)?,
    });
    stable_json_string(&record)
}

fn analyze_all(
    spec: &UniverseSpec,
    axioms: &[Equation],
    config: &BatteryConfig,
    archive_lookup: Option<&(dyn Fn(&str) -> bool + Sync)>,
) -> EqlabResult<Vec<BatteryResult>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        // collect() keeps submission order regardless of completion order.
        axioms
            .par_iter()
            .map(|axiom| analyze_axiom(spec, axiom, config, archive_lookup))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        axioms
            .iter()
            .map(|axiom| analyze_axiom(spec, axiom, config, archive_lookup))
            .collect()
    }
}

fn persist_to_store(
    store: &ArtifactStore,
    run_id: &str,
    axiom: &Equation,
    result: &BatteryResult,
) -> EqlabResult<()> {
    let axiom_id = compute_axiom_id(axiom)?;
    let fail = |err: eqlab_store::StoreError| EqlabError::store(err.to_string());

    store
        .record_axiom(&AxiomRecord {
            run_id: run_id.to_string(),
            axiom_id: axiom_id.clone(),
            left_term: axiom.left.serialize(),
            right_term: axiom.right.serialize(),
            symmetry_class: result.features.symmetry_class.clone(),
        })
        .map_err(fail)?;

    let models: Vec<ModelRecord> = result
        .model_spectrum
        .iter()
        .map(|entry| ModelRecord {
            run_id: run_id.to_string(),
            axiom_id: axiom_id.clone(),
            size: entry.size as i64,
            status: entry.status.as_str().to_string(),
            fingerprint: entry.fingerprint.clone(),
            candidates: entry.candidates as i64,
            elapsed_seconds: entry.elapsed_seconds,
        })
        .collect();
    store.record_models(&models).map_err(fail)?;

    let implications = result
        .implications
        .iter()
        .map(|probe| {
            Ok(ImplicationRecord {
                run_id: run_id.to_string(),
                axiom_id: axiom_id.clone(),
                theory: probe.theory.clone(),
                status: probe.status.as_str().to_string(),
                checked_max_size: probe.checked_max_size as i64,
                counterexample_size: probe.counterexample_size.map(|size| size as i64),
                counterexample_fingerprint: probe.counterexample_fingerprint.clone(),
                proof_status: probe.proof_status.map(|status| status.as_str().to_string()),
                proof_elapsed_seconds: probe.proof_elapsed_seconds,
                proof_steps: probe
                    .proof_steps
                    .as_ref()
                    .map(serde_json::to_value)
                    .transpose()?,
            })
        })
        .collect::<EqlabResult<Vec<_>>>()?;
    store.record_implications(&implications).map_err(fail)?;

    let metrics: BTreeMap<String, Value> = result
        .metrics
        .iter()
        .map(|(name, value)| Ok((name.clone(), serde_json::to_value(value)?)))
        .collect::<EqlabResult<_>>()?;
    store
        .record_metrics(run_id, &axiom_id, &metrics)
        .map_err(fail)?;
    Ok(())
}

/// Run the battery over every axiom and persist the outputs.
pub fn run_battery_and_persist(
    spec: &UniverseSpec,
    axioms: &[Equation],
    output_dir: impl AsRef<Path>,
    config: &BatteryConfig,
    store: Option<&ArtifactStore>,
) -> EqlabResult<RunManifest> {
    spec.validate()?;
    let run_id = compute_run_id(spec, axioms, config)?;
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;
    let results_path = output_dir.join("results.jsonl");

    let archive_lookup = store.map(|store| {
        move |symmetry_class: &str| match store.axiom_symmetry_exists(symmetry_class) {
            Ok(exists) => exists,
            Err(err) => {
                warn!(%err, "archive lookup failed; treating symmetry class as new");
                false
            }
        }
    });
    let archive_lookup: Option<&(dyn Fn(&str) -> bool + Sync)> = archive_lookup
        .as_ref()
        .map(|lookup| lookup as &(dyn Fn(&str) -> bool + Sync));

    let results = analyze_all(spec, axioms, config, archive_lookup)?;

    let mut out = fs::File::create(&results_path)?;
    for (axiom, result) in axioms.iter().zip(&results) {
        out.write_all(result_line(axiom, result)?.as_bytes())?;
        out.write_all(b"\n")?;
        if let Some(store) = store {
            persist_to_store(store, &run_id, axiom, result)?;
        }
    }
    out.flush()?;

    let manifest = RunManifest {
        run_id: run_id.clone(),
        spec: serde_json::to_value(spec)?,
        battery_config: serde_json::to_value(config)?,
        axiom_count: axioms.len(),
        results_path: results_path.to_string_lossy().into_owned(),
    };
    let manifest_text = stable_json_string(&manifest)?;
    fs::write(output_dir.join("run.json"), format!("{manifest_text}\n"))?;

    if let Some(store) = store {
        let fail = |err: eqlab_store::StoreError| EqlabError::store(err.to_string());
        let manifest_digest = store
            .write_bytes("run_manifest", manifest_text.as_bytes())
            .map_err(fail)?;
        let results_digest = store
            .write_bytes("run_results", &fs::read(&results_path)?)
            .map_err(fail)?;
        store
            .record_run(&RunRecord {
                run_id: run_id.clone(),
                spec: manifest.spec.clone(),
                battery_config: manifest.battery_config.clone(),
                manifest_digest,
                results_digest,
            })
            .map_err(fail)?;
    }

    info!(%run_id, axioms = axioms.len(), "run persisted");
    Ok(manifest)
}

/// Read a `run.json` manifest.
pub fn load_run_manifest(path: impl AsRef<Path>) -> EqlabResult<RunManifest> {
    let text = fs::read_to_string(path.as_ref())?;
    Ok(serde_json::from_str(&text)?)
}

/// Resolve a manifest's `results_path`: absolute paths win; relative paths
/// resolve against the manifest's directory first, then the current
/// directory, so runs stay portable.
pub fn resolve_results_path(results_path: &str, run_dir: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(results_path);
    if path.is_absolute() {
        return path;
    }
    let Some(run_dir) = run_dir else {
        return path;
    };
    let candidate = run_dir.join(&path);
    if candidate.exists() {
        return candidate;
    }
    if path.exists() {
        return path;
    }
    candidate
}

fn parse_results_jsonl(text: &str) -> EqlabResult<Vec<(Equation, BatteryResult)>> {
    let mut results = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: ResultRecord = serde_json::from_str(line)?;
        let axiom = Equation::new(record.axiom.left, record.axiom.right);
        results.push((axiom, rehydrate(record.result)));
    }
    Ok(results)
}

/// Fill in metrics a stored result is missing (older runs may predate newer
/// metric keys). Stored values are never overwritten.
fn rehydrate(mut result: BatteryResult) -> BatteryResult {
    let computed = compute_metrics(
        &result.features,
        &result.degeneracy,
        &result.model_spectrum,
        &result.implications,
        result.smallest_model_size,
        None,
        &result.perturbation_neighbors,
    );
    for (name, value) in computed {
        result.metrics.entry(name).or_insert(value);
    }
    result
}

/// Load results from a `results.jsonl` file.
pub fn load_results_as_battery(
    path: impl AsRef<Path>,
) -> EqlabResult<Vec<(Equation, BatteryResult)>> {
    parse_results_jsonl(&fs::read_to_string(path.as_ref())?)
}

/// Load a run's manifest and results back out of the store.
pub fn load_run_from_store(
    store: &ArtifactStore,
    run_id: &str,
) -> EqlabResult<(RunManifest, Vec<(Equation, BatteryResult)>)> {
    let fail = |err: eqlab_store::StoreError| EqlabError::store(err.to_string());
    let record = store
        .load_run(run_id)
        .map_err(fail)?
        .ok_or_else(|| EqlabError::not_found(format!("run id {run_id}")))?;
    let manifest: RunManifest =
        serde_json::from_value(store.read_json(&record.manifest_digest).map_err(fail)?)?;
    let results_bytes = store.read_bytes(&record.results_digest).map_err(fail)?;
    let results_text = String::from_utf8(results_bytes)
        .map_err(|err| EqlabError::serialization(format!("results blob is not UTF-8: {err}")))?;
    Ok((manifest, parse_results_jsonl(&results_text)?))
}

/// Fill in any missing `novelty_vs_archive`-independent metrics and return
/// the rehydrated results from a run directory.
pub fn load_run_directory(
    run_dir: impl AsRef<Path>,
) -> EqlabResult<(RunManifest, Vec<(Equation, BatteryResult)>)> {
    let run_dir = run_dir.as_ref();
    let manifest = load_run_manifest(run_dir.join("run.json"))?;
    let results_path = resolve_results_path(&manifest.results_path, Some(run_dir));
    let results = load_results_as_battery(results_path)?;
    Ok((manifest, results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqlab_core::spec::OperationSpec;

    fn tiny_spec() -> UniverseSpec {
        UniverseSpec::new(vec![], 2, 1).unwrap()
    }

    fn tiny_config() -> BatteryConfig {
        BatteryConfig {
            max_model_size: 2,
            perturbation_max_neighbors: 2,
            ..BatteryConfig::default()
        }
    }

    #[test]
    fn ids_are_pure_functions() {
        let spec = tiny_spec();
        let axioms = vec![Equation::parse("x0=x1").unwrap()];
        let config = tiny_config();
        let first = compute_run_id(&spec, &axioms, &config).unwrap();
        let second = compute_run_id(&spec, &axioms, &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 16);

        let axiom_id = compute_axiom_id(&axioms[0]).unwrap();
        assert_eq!(axiom_id.len(), 64);
        assert_eq!(axiom_id, compute_axiom_id(&axioms[0]).unwrap());

        let other_config = BatteryConfig {
            max_model_size: 3,
            ..tiny_config()
        };
        assert_ne!(
            first,
            compute_run_id(&spec, &axioms, &other_config).unwrap()
        );
    }

    #[test]
    fn id_changes_with_axiom_order() {
        let spec = tiny_spec();
        let a = Equation::parse("x0=x0").unwrap();
        let b = Equation::parse("x0=x1").unwrap();
        let config = tiny_config();
        let forward = compute_run_id(&spec, &[a.clone(), b.clone()], &config).unwrap();
        let backward = compute_run_id(&spec, &[b, a], &config).unwrap();
        assert_ne!(forward, backward);
    }

    #[test]
    fn relative_results_path_prefers_run_dir() {
        let dir = tempfile::tempdir().unwrap();
        let run_dir = dir.path().join("run");
        fs::create_dir_all(&run_dir).unwrap();
        fs::write(run_dir.join("results.jsonl"), "").unwrap();

        let resolved = resolve_results_path("results.jsonl", Some(&run_dir));
        assert_eq!(resolved, run_dir.join("results.jsonl"));

        let fallback = resolve_results_path("nowhere.jsonl", Some(&run_dir));
        assert_eq!(fallback, run_dir.join("nowhere.jsonl"));
    }

    #[test]
    fn spec_revalidated_at_run_boundary() {
        let mut spec = tiny_spec();
        spec.logic = "modal".to_string();
        let dir = tempfile::tempdir().unwrap();
        let err = run_battery_and_persist(&spec, &[], dir.path(), &tiny_config(), None)
            .err()
            .unwrap();
        assert!(err.to_string().contains("logic"));
    }
}
