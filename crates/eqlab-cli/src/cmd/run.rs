use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use eqlab_core::enumerate::enumerate_axioms;
use eqlab_engines::model::engine_for_name;
use eqlab_pipeline::battery::BatteryConfig;
use eqlab_pipeline::runner::run_battery_and_persist;
use eqlab_store::ArtifactStore;

use crate::{io, output};

pub struct RunOptions {
    pub engine: String,
    pub max_model_size: usize,
    pub max_model_candidates: u64,
    pub max_model_seconds: f64,
    pub max_neighbors: usize,
}

#[derive(Debug, Serialize)]
struct RunOut {
    run_id: String,
    axiom_count: usize,
    out_dir: String,
    results_path: String,
    stored: bool,
}

pub fn run(
    store_root: Option<&str>,
    spec_path: &str,
    axioms_path: Option<&str>,
    out_dir: &str,
    options: RunOptions,
) -> Result<()> {
    // Fail on an unknown engine name before any work happens.
    engine_for_name(&options.engine)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}").expect("static template"));
    pb.enable_steady_tick(std::time::Duration::from_millis(80));

    pb.set_message("loading spec");
    let spec = io::read_spec(spec_path)?;

    pb.set_message("collecting axioms");
    let axioms = match axioms_path {
        Some(path) => io::read_axioms(path)?,
        None => enumerate_axioms(&spec)?,
    };
    if axioms.is_empty() {
        pb.finish_and_clear();
        return Err(anyhow!("no axioms to analyze"));
    }

    let store = store_root.map(ArtifactStore::open).transpose()?;

    let config = BatteryConfig {
        max_model_size: options.max_model_size,
        max_model_candidates: options.max_model_candidates,
        max_model_seconds: options.max_model_seconds,
        model_finder: options.engine,
        perturbation_max_neighbors: options.max_neighbors,
        ..BatteryConfig::default()
    };

    pb.set_message(format!("analyzing {} axiom(s)", axioms.len()));
    let manifest = run_battery_and_persist(&spec, &axioms, out_dir, &config, store.as_ref())?;
    pb.finish_and_clear();

    output::heading(&format!("run {} complete", manifest.run_id))?;
    output::print(&RunOut {
        run_id: manifest.run_id,
        axiom_count: manifest.axiom_count,
        out_dir: out_dir.to_string(),
        results_path: manifest.results_path,
        stored: store.is_some(),
    })
}
