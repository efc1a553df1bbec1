//! Term and axiom enumeration.
//!
//! Terms are produced by dynamic programming on size:
//! - size 1: the declared variables, in order
//! - size k: for each unary operator, wrap every size-(k-1) term; for each
//!   binary operator, combine every `(i, k-1-i)` split; commutative
//!   operators emit only pairs with `left.serialize() <= right.serialize()`
//!
//! Enumeration order is fully determined by operator declaration order and
//! variable order. Run ids hash the enumerated axiom list, so this order is
//! part of the reproducibility contract and must not change.

use itertools::Itertools;

use crate::canonical::Equation;
use crate::errors::EqlabResult;
use crate::spec::UniverseSpec;
use crate::term::Term;

fn terms_by_size(spec: &UniverseSpec) -> Vec<Vec<Term>> {
    // index 0 unused; sizes are 1-based
    let mut cache: Vec<Vec<Term>> = vec![Vec::new(); spec.max_term_size + 1];
    cache[1] = spec.variable_names().map(Term::var).collect();

    for size in 2..=spec.max_term_size {
        let mut terms = Vec::new();
        for op in &spec.operations {
            match op.arity {
                1 => {
                    for sub in &cache[size - 1] {
                        terms.push(Term::op(op.name.clone(), vec![sub.clone()]));
                    }
                }
                _ => {
                    for left_size in 1..size - 1 {
                        let right_size = size - 1 - left_size;
                        for left in &cache[left_size] {
                            for right in &cache[right_size] {
                                if op.commutative && left.serialize() > right.serialize() {
                                    continue;
                                }
                                terms.push(Term::op(
                                    op.name.clone(),
                                    vec![left.clone(), right.clone()],
                                ));
                            }
                        }
                    }
                }
            }
        }
        cache[size] = terms;
    }
    cache
}

/// All well-formed terms up to the spec's max size, smaller sizes first.
pub fn enumerate_terms(spec: &UniverseSpec) -> EqlabResult<Vec<Term>> {
    spec.validate()?;
    Ok(terms_by_size(spec).into_iter().flatten().collect())
}

/// Candidate axioms: the cartesian product `terms × terms` in enumeration
/// order.
pub fn enumerate_axioms(spec: &UniverseSpec) -> EqlabResult<Vec<Equation>> {
    let terms = enumerate_terms(spec)?;
    Ok(terms
        .iter()
        .cartesian_product(terms.iter())
        .map(|(left, right)| Equation::new(left.clone(), right.clone()))
        .collect())
}
