//! The naive engine.
//!
//! Enumerates the cartesian product of whole operation tables, one operator
//! at a time in spec declaration order, each table in lexicographic order of
//! its raw tuple. Every complete assignment is a candidate: all required
//! equations are checked on every variable assignment, then the must-violate
//! equation (which has to fail somewhere) is tested.
//!
//! This engine is the semantic reference; the prunable engine must agree
//! with it wherever both finish within budget.

use std::time::Instant;

use tracing::debug;

use eqlab_core::canonical::Equation;
use eqlab_core::errors::{EqlabError, EqlabResult};
use eqlab_core::spec::UniverseSpec;

use crate::model::eval::{CompiledSystem, TupleOdometer};
use crate::model::{
    fingerprint, ModelFinder, ModelSearchConfig, ModelSearchOutcome, ModelSearchStatus,
};

pub struct NaiveEngine;

struct NaiveSearch<'a> {
    spec: &'a UniverseSpec,
    system: &'a CompiledSystem,
    size: usize,
    tables: Vec<Vec<usize>>,
    candidates: u64,
    max_candidates: u64,
    deadline: Instant,
    budget_exceeded: bool,
}

impl NaiveSearch<'_> {
    fn search(&mut self, op_index: usize) -> Option<String> {
        if Instant::now() > self.deadline {
            self.budget_exceeded = true;
            return None;
        }
        if op_index == self.spec.operations.len() {
            self.candidates += 1;
            if self.candidates > self.max_candidates {
                self.budget_exceeded = true;
                return None;
            }
            if !self.system.satisfies_required(&self.tables, self.size) {
                return None;
            }
            if let Some(roots) = self.system.must_violate {
                if self.system.satisfies(roots, &self.tables, self.size) {
                    return None;
                }
            }
            return Some(fingerprint(self.size, self.spec, &self.tables));
        }
        let slots = self.spec.operations[op_index].slots(self.size);
        for table in TupleOdometer::new(slots, self.size) {
            self.tables[op_index] = table;
            if let Some(found) = self.search(op_index + 1) {
                return Some(found);
            }
            if self.budget_exceeded {
                return None;
            }
        }
        None
    }
}

impl ModelFinder for NaiveEngine {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn find_model(
        &self,
        spec: &UniverseSpec,
        equations: &[Equation],
        size: usize,
        config: &ModelSearchConfig,
        must_violate: Option<&Equation>,
    ) -> EqlabResult<ModelSearchOutcome> {
        if size < 1 {
            return Err(EqlabError::invalid_argument("domain size must be >= 1"));
        }
        config.validate()?;
        let system = CompiledSystem::compile(spec, equations, must_violate, size)?;

        let started = Instant::now();
        let mut search = NaiveSearch {
            spec,
            system: &system,
            size,
            tables: vec![Vec::new(); spec.operations.len()],
            candidates: 0,
            max_candidates: config.max_candidates,
            deadline: config.deadline_from(started),
            budget_exceeded: false,
        };
        let found = search.search(0);
        let elapsed_seconds = started.elapsed().as_secs_f64();

        let status = if found.is_some() {
            ModelSearchStatus::Found
        } else if search.budget_exceeded {
            if search.candidates > search.max_candidates {
                ModelSearchStatus::Cutoff
            } else {
                ModelSearchStatus::Timeout
            }
        } else {
            ModelSearchStatus::NotFound
        };
        debug!(
            engine = self.name(),
            size,
            %status,
            candidates = search.candidates,
            "model search finished"
        );
        Ok(ModelSearchOutcome {
            status,
            size,
            fingerprint: found,
            candidates: search.candidates,
            elapsed_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqlab_core::spec::OperationSpec;

    fn config() -> ModelSearchConfig {
        ModelSearchConfig {
            max_candidates: 100_000,
            max_seconds: 5.0,
        }
    }

    fn empty_spec(max_vars: usize) -> UniverseSpec {
        UniverseSpec::new(vec![], max_vars, 1).unwrap()
    }

    #[test]
    fn reflexive_axiom_found_at_size_one() {
        let spec = empty_spec(1);
        let axiom = Equation::parse("x0=x0").unwrap();
        let outcome = NaiveEngine
            .find_model(&spec, &[axiom], 1, &config(), None)
            .unwrap();
        assert_eq!(outcome.status, ModelSearchStatus::Found);
        assert_eq!(outcome.fingerprint.as_deref(), Some("n=1"));
    }

    #[test]
    fn distinct_variables_collapse_only_on_singletons() {
        let spec = empty_spec(2);
        let axiom = Equation::parse("x0=x1").unwrap();
        let at_one = NaiveEngine
            .find_model(&spec, std::slice::from_ref(&axiom), 1, &config(), None)
            .unwrap();
        assert_eq!(at_one.status, ModelSearchStatus::Found);

        let at_two = NaiveEngine
            .find_model(&spec, &[axiom], 2, &config(), None)
            .unwrap();
        assert_eq!(at_two.status, ModelSearchStatus::NotFound);
    }

    #[test]
    fn commutative_model_is_lexicographically_first() {
        let spec = UniverseSpec::new(vec![OperationSpec::new("f", 2, false)], 2, 3).unwrap();
        let axiom = Equation::parse("f(x0,x1)=f(x1,x0)").unwrap();
        let outcome = NaiveEngine
            .find_model(&spec, &[axiom], 2, &config(), None)
            .unwrap();
        assert_eq!(outcome.status, ModelSearchStatus::Found);
        // The all-zeros table is commutative and enumerated first.
        assert_eq!(outcome.fingerprint.as_deref(), Some("n=2;f=0,0,0,0"));
    }

    #[test]
    fn must_violate_demands_a_witnessing_assignment() {
        let spec = UniverseSpec::new(vec![OperationSpec::new("f", 2, false)], 3, 3).unwrap();
        let commutative = Equation::parse("f(x0,x1)=f(x1,x0)").unwrap();
        let associative = Equation::parse("f(f(x0,x1),x2)=f(x0,f(x1,x2))").unwrap();
        let outcome = NaiveEngine
            .find_model(&spec, &[commutative], 2, &config(), Some(&associative))
            .unwrap();
        // A commutative, non-associative table exists on two elements.
        assert_eq!(outcome.status, ModelSearchStatus::Found);
        assert!(outcome.fingerprint.is_some());
    }

    #[test]
    fn candidate_overflow_reports_cutoff() {
        let spec = UniverseSpec::new(vec![OperationSpec::new("f", 2, false)], 2, 3).unwrap();
        let idempotent = Equation::parse("f(x0,x0)=x0").unwrap();
        let never = Equation::parse("x0=x0").unwrap();
        let tight = ModelSearchConfig {
            max_candidates: 3,
            max_seconds: 5.0,
        };
        // x0=x0 can never be violated, so the search must exhaust candidates.
        let outcome = NaiveEngine
            .find_model(&spec, &[idempotent], 2, &tight, Some(&never))
            .unwrap();
        assert_eq!(outcome.status, ModelSearchStatus::Cutoff);
        assert_eq!(outcome.candidates, 4);
    }

    #[test]
    fn zero_budget_reports_timeout() {
        let spec = UniverseSpec::new(vec![OperationSpec::new("f", 2, false)], 2, 3).unwrap();
        let axiom = Equation::parse("f(x0,x1)=f(x1,x0)").unwrap();
        let expired = ModelSearchConfig {
            max_candidates: 100,
            max_seconds: 0.0,
        };
        let outcome = NaiveEngine
            .find_model(&spec, &[axiom], 3, &expired, None)
            .unwrap();
        assert_eq!(outcome.status, ModelSearchStatus::Timeout);
    }
}
