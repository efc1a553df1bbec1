//! The prunable engine.
//!
//! Semantically identical to the naive engine, but fills one table cell at a
//! time (operators in declaration order, then slot index, then value 0…n-1)
//! and runs a partial-consistency check after each assignment: if under the
//! current partial tables both sides of any required equation fully evaluate
//! for some variable assignment and disagree, the branch is already dead and
//! the search backtracks immediately.
//!
//! Partial evaluation is memoized per `(node, assignment)` within a single
//! check. The must-violate test is a positive goal (some assignment must
//! disagree), which cannot be decided on partial tables, so it only runs at
//! complete candidates.

use std::time::Instant;

use tracing::debug;

use eqlab_core::canonical::Equation;
use eqlab_core::errors::{EqlabError, EqlabResult};
use eqlab_core::spec::UniverseSpec;

use crate::model::eval::{CompiledSystem, Node};
use crate::model::{
    fingerprint, ModelFinder, ModelSearchConfig, ModelSearchOutcome, ModelSearchStatus,
};

pub struct PrunableEngine;

#[derive(Clone, Copy, PartialEq)]
enum MemoCell {
    Unset,
    Incomplete,
    Value(usize),
}

struct PrunableSearch<'a> {
    spec: &'a UniverseSpec,
    system: &'a CompiledSystem,
    size: usize,
    /// One partially-filled table per operator, `None` for unassigned cells.
    tables: Vec<Vec<Option<usize>>>,
    /// Global cell order: (operator index, slot index).
    slots: Vec<(usize, usize)>,
    memo: Vec<(u64, MemoCell)>,
    generation: u64,
    candidates: u64,
    max_candidates: u64,
    deadline: Instant,
    budget_exceeded: bool,
}

impl PrunableSearch<'_> {
    fn partial_evaluate(&mut self, node: usize, assignment: usize) -> Option<usize> {
        let key = node * self.system.assignments.len() + assignment;
        if self.memo[key].0 == self.generation {
            return match self.memo[key].1 {
                MemoCell::Unset | MemoCell::Incomplete => None,
                MemoCell::Value(value) => Some(value),
            };
        }
        let result = match self.system.nodes[node] {
            Node::Var(var) => Some(self.system.assignments[assignment][var]),
            Node::Unary { op, arg } => self
                .partial_evaluate(arg, assignment)
                .and_then(|value| self.tables[op][value]),
            Node::Binary { op, left, right } => {
                match (
                    self.partial_evaluate(left, assignment),
                    self.partial_evaluate(right, assignment),
                ) {
                    (Some(left), Some(right)) => self.tables[op][left * self.size + right],
                    _ => None,
                }
            }
        };
        self.memo[key] = (
            self.generation,
            match result {
                Some(value) => MemoCell::Value(value),
                None => MemoCell::Incomplete,
            },
        );
        result
    }

    /// True while no required equation is definitely violated under the
    /// current partial tables.
    fn partially_consistent(&mut self) -> bool {
        self.generation += 1;
        for assignment in 0..self.system.assignments.len() {
            for idx in 0..self.system.required.len() {
                let (left, right) = self.system.required[idx];
                let left = self.partial_evaluate(left, assignment);
                let right = self.partial_evaluate(right, assignment);
                if let (Some(left), Some(right)) = (left, right) {
                    if left != right {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn materialize(&self) -> Vec<Vec<usize>> {
        self.tables
            .iter()
            .map(|table| table.iter().map(|cell| cell.unwrap_or(0)).collect())
            .collect()
    }

    fn search(&mut self, slot_index: usize) -> Option<String> {
        if Instant::now() > self.deadline {
            self.budget_exceeded = true;
            return None;
        }
        if slot_index == self.slots.len() {
            self.candidates += 1;
            if self.candidates > self.max_candidates {
                self.budget_exceeded = true;
                return None;
            }
            let tables = self.materialize();
            if !self.system.satisfies_required(&tables, self.size) {
                return None;
            }
            if let Some(roots) = self.system.must_violate {
                if self.system.satisfies(roots, &tables, self.size) {
                    return None;
                }
            }
            return Some(fingerprint(self.size, self.spec, &tables));
        }
        let (op, slot) = self.slots[slot_index];
        for value in 0..self.size {
            self.tables[op][slot] = Some(value);
            if self.partially_consistent() {
                if let Some(found) = self.search(slot_index + 1) {
                    return Some(found);
                }
            }
            self.tables[op][slot] = None;
            if self.budget_exceeded {
                return None;
            }
        }
        None
    }
}

impl ModelFinder for PrunableEngine {
    fn name(&self) -> &'static str {
        "prunable"
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

        let mut tables = Vec::with_capacity(spec.operations.len());
        let mut slots = Vec::new();
        for (op_index, op) in spec.operations.iter().enumerate() {
            let width = op.slots(size);
            tables.push(vec![None; width]);
            for slot in 0..width {
                slots.push((op_index, slot));
            }
        }

        let started = Instant::now();
        let memo_len = system.nodes.len() * system.assignments.len();
        let mut search = PrunableSearch {
            spec,
            system: &system,
            size,
            tables,
            slots,
            memo: vec![(0, MemoCell::Unset); memo_len],
            generation: 0,
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
    use crate::model::NaiveEngine;
    use eqlab_core::spec::OperationSpec;

    fn config() -> ModelSearchConfig {
        ModelSearchConfig {
            max_candidates: 100_000,
            max_seconds: 5.0,
        }
    }

    fn binary_spec() -> UniverseSpec {
        UniverseSpec::new(vec![OperationSpec::new("f", 2, false)], 3, 5).unwrap()
    }

    #[test]
    fn agrees_with_naive_on_satisfiable_inputs() {
        let spec = binary_spec();
        let cases = [
            "f(x0,x1)=f(x1,x0)",
            "f(x0,x0)=x0",
            "f(x0,x1)=x0",
            "f(f(x0,x1),x2)=f(x0,f(x1,x2))",
        ];
        for (case, size) in cases.iter().flat_map(|c| [(c, 1usize), (c, 2)]) {
            let axiom = Equation::parse(case).unwrap();
            let naive = NaiveEngine
                .find_model(&spec, std::slice::from_ref(&axiom), size, &config(), None)
                .unwrap();
            let prunable = PrunableEngine
                .find_model(&spec, std::slice::from_ref(&axiom), size, &config(), None)
                .unwrap();
            assert_eq!(naive.status, prunable.status, "status for {case} at {size}");
            assert_eq!(
                naive.fingerprint, prunable.fingerprint,
                "fingerprint for {case} at {size}"
            );
        }
    }

    #[test]
    fn agrees_with_naive_on_unsatisfiable_inputs() {
        let spec = UniverseSpec::new(vec![], 2, 1).unwrap();
        let axiom = Equation::parse("x0=x1").unwrap();
        for size in [1usize, 2, 3] {
            let naive = NaiveEngine
                .find_model(&spec, std::slice::from_ref(&axiom), size, &config(), None)
                .unwrap();
            let prunable = PrunableEngine
                .find_model(&spec, std::slice::from_ref(&axiom), size, &config(), None)
                .unwrap();
            assert_eq!(naive.status, prunable.status);
        }
    }

    #[test]
    fn agrees_with_naive_under_must_violate() {
        let spec = binary_spec();
        let commutative = Equation::parse("f(x0,x1)=f(x1,x0)").unwrap();
        let associative = Equation::parse("f(f(x0,x1),x2)=f(x0,f(x1,x2))").unwrap();
        let naive = NaiveEngine
            .find_model(
                &spec,
                std::slice::from_ref(&commutative),
                2,
                &config(),
                Some(&associative),
            )
            .unwrap();
        let prunable = PrunableEngine
            .find_model(&spec, &[commutative], 2, &config(), Some(&associative))
            .unwrap();
        assert_eq!(naive.status, ModelSearchStatus::Found);
        assert_eq!(naive.status, prunable.status);
        assert_eq!(naive.fingerprint, prunable.fingerprint);
    }

    #[test]
    fn pruning_examines_fewer_candidates() {
        let spec = binary_spec();
        let projection = Equation::parse("f(x0,x1)=x0").unwrap();
        let naive = NaiveEngine
            .find_model(&spec, std::slice::from_ref(&projection), 2, &config(), None)
            .unwrap();
        let prunable = PrunableEngine
            .find_model(&spec, &[projection], 2, &config(), None)
            .unwrap();
        assert_eq!(naive.fingerprint, prunable.fingerprint);
        assert!(prunable.candidates <= naive.candidates);
    }

    #[test]
    fn candidate_overflow_reports_cutoff() {
        let spec = binary_spec();
        let idempotent = Equation::parse("f(x0,x0)=x0").unwrap();
        let never = Equation::parse("x0=x0").unwrap();
        let tight = ModelSearchConfig {
            max_candidates: 2,
            max_seconds: 5.0,
        };
        let outcome = PrunableEngine
            .find_model(&spec, &[idempotent], 2, &tight, Some(&never))
            .unwrap();
        assert_eq!(outcome.status, ModelSearchStatus::Cutoff);
    }
}
