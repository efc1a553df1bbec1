use anyhow::Result;
use serde::Serialize;

use eqlab_core::canonical::Equation;
use eqlab_core::spec::{OperationSpec, UniverseSpec};
use eqlab_engines::model::{engine_for_name, ModelSearchConfig, ModelSearchStatus};
use eqlab_store::ArtifactStore;

use crate::output;

#[derive(Debug, Serialize)]
struct DoctorOut {
    version: String,
    engines: Vec<String>,
    solver_check: String,
    store_check: String,
}

/// Quick environment sanity: both engines resolve, a trivial search finds a
/// model, and the store root (if given) opens and accepts a blob.
pub fn run(store_root: Option<&str>) -> Result<()> {
    let engines = vec!["naive".to_string(), "prunable".to_string()];

    let spec = UniverseSpec::new(vec![OperationSpec::new("f", 2, false)], 2, 3)?;
    let axiom = Equation::parse("f(x0,x1)=x0")?;
    let outcome = engine_for_name("prunable")?.find_model(
        &spec,
        &[axiom],
        2,
        &ModelSearchConfig::default(),
        None,
    )?;
    let solver_check = if outcome.status == ModelSearchStatus::Found {
        "ok".to_string()
    } else {
        format!("unexpected status {}", outcome.status)
    };

    let store_check = match store_root {
        None => "skipped (no --store-root)".to_string(),
        Some(root) => match ArtifactStore::open(root).and_then(|store| {
            store.write_bytes("doctor", b"eqlab doctor probe")?;
            Ok(())
        }) {
            Ok(()) => "ok".to_string(),
            Err(err) => format!("failed: {err}"),
        },
    };

    output::heading("eqlab doctor")?;
    output::print(&DoctorOut {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engines,
        solver_check,
        store_check,
    })
}
