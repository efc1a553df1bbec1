//! Finite model search.
//!
//! A model assigns, to each operator of arity `a`, a total function
//! `{0,…,n-1}^a → {0,…,n-1}` given as a flat table. A model *satisfies* an
//! equation iff both sides evaluate equal under every assignment of the
//! equation's free variables. A search call succeeds when a model satisfies
//! every required equation and, if a must-violate equation is supplied,
//! fails it on at least one assignment.
//!
//! Both engines implement the same contract and, under sufficient budget,
//! return the same status and the same fingerprint: enumeration order is
//! fixed by spec operator order, slot index order, and value order
//! `0…n-1`, so the first satisfying model is the lexicographically
//! smallest one.
//!
//! Budget rules: the monotonic clock is sampled against the deadline at
//! every recursion entry (`timeout`); complete table assignments are
//! counted and overflow reports `cutoff`. Candidate overflow wins the tied
//! case.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use eqlab_core::canonical::Equation;
use eqlab_core::errors::{EqlabError, EqlabResult};
use eqlab_core::spec::UniverseSpec;

pub(crate) mod eval;
mod naive;
mod prunable;

pub use naive::NaiveEngine;
pub use prunable::PrunableEngine;

/// Search budget for one model-finder call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelSearchConfig {
    pub max_candidates: u64,
    pub max_seconds: f64,
}

impl Default for ModelSearchConfig {
    fn default() -> Self {
        Self {
            max_candidates: 10_000,
            max_seconds: 1.0,
        }
    }
}

impl ModelSearchConfig {
    pub fn validate(&self) -> EqlabResult<()> {
        if !self.max_seconds.is_finite() || self.max_seconds < 0.0 {
            return Err(EqlabError::invalid_argument(
                "max_seconds must be a finite, non-negative number",
            ));
        }
        Ok(())
    }

    pub(crate) fn deadline_from(&self, start: Instant) -> Instant {
        start + crate::budget_duration(self.max_seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSearchStatus {
    Found,
    NotFound,
    Timeout,
    Cutoff,
}

impl ModelSearchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Found => "found",
            Self::NotFound => "not_found",
            Self::Timeout => "timeout",
            Self::Cutoff => "cutoff",
        }
    }

    /// A decisive outcome is one the budget did not cut short.
    pub fn is_decisive(&self) -> bool {
        matches!(self, Self::Found | Self::NotFound)
    }
}

impl fmt::Display for ModelSearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one model-finder call. Candidate count and elapsed time are
/// reported for every status, including success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSearchOutcome {
    pub status: ModelSearchStatus,
    pub size: usize,
    pub fingerprint: Option<String>,
    pub candidates: u64,
    pub elapsed_seconds: f64,
}

/// The engine contract shared by the naive and prunable searches.
pub trait ModelFinder: Sync {
    fn name(&self) -> &'static str;

    fn find_model(
        &self,
        spec: &UniverseSpec,
        equations: &[Equation],
        size: usize,
        config: &ModelSearchConfig,
        must_violate: Option<&Equation>,
    ) -> EqlabResult<ModelSearchOutcome>;
}

/// Resolve an engine by its configured name.
pub fn engine_for_name(name: &str) -> EqlabResult<&'static dyn ModelFinder> {
    match name {
        "naive" => Ok(&NaiveEngine),
        "prunable" => Ok(&PrunableEngine),
        other => Err(EqlabError::invalid_argument(format!(
            "unknown model finder: {other} (expected \"naive\" or \"prunable\")"
        ))),
    }
}

/// Canonical model witness: `n=<size>;op1=v0,v1,…;op2=…` with operators in
/// spec declaration order. Equal fingerprints mean identical tables.
pub fn fingerprint(size: usize, spec: &UniverseSpec, tables: &[Vec<usize>]) -> String {
    let mut parts = vec![format!("n={size}")];
    for (op, table) in spec.operations.iter().zip(tables) {
        let values: Vec<String> = table.iter().map(|value| value.to_string()).collect();
        parts.push(format!("{}={}", op.name, values.join(",")));
    }
    parts.join(";")
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqlab_core::spec::OperationSpec;

    #[test]
    fn fingerprint_format() {
        let spec = UniverseSpec::new(
            vec![
                OperationSpec::new("f", 2, false),
                OperationSpec::new("g", 1, false),
            ],
            2,
            3,
        )
        .unwrap();
        let tables = vec![vec![0, 1, 1, 0], vec![1, 0]];
        assert_eq!(fingerprint(2, &spec, &tables), "n=2;f=0,1,1,0;g=1,0");
    }

    #[test]
    fn engine_registry() {
        assert_eq!(engine_for_name("naive").unwrap().name(), "naive");
        assert_eq!(engine_for_name("prunable").unwrap().name(), "prunable");
        assert!(engine_for_name("magic").is_err());
    }

    #[test]
    fn config_rejects_bad_deadline() {
        let config = ModelSearchConfig {
            max_candidates: 1,
            max_seconds: f64::NAN,
        };
        assert!(config.validate().is_err());
    }
}
