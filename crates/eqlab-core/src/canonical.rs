//! Canonicalization of terms and equations.
//!
//! The canonical form is the unique representative of an equation's class
//! under commutative argument reordering and variable renaming:
//! - arguments of commutative binary operators are sorted by serialized form
//! - variables are renamed onto `x0, x1, …` (first-encounter order in the
//!   winning candidate)
//! - the two sides are ordered so the lexicographically smaller
//!   `(size, serialized)` pair comes first
//!
//! Canonicalization is idempotent, and `canonicalize_equation(L, R)` equals
//! `canonicalize_equation(R, L)`; the serialized canonical equation is the
//! symmetry class used as a cross-run dedup key.

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::errors::{EqlabError, EqlabResult};
use crate::spec::UniverseSpec;
use crate::term::Term;

/// An ordered pair of terms read as `left = right`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Equation {
    pub left: Term,
    pub right: Term,
}

impl Equation {
    pub fn new(left: Term, right: Term) -> Self {
        Self { left, right }
    }

    /// `"<left>=<right>"`, the serialized form of the equation.
    pub fn key(&self) -> String {
        format!("{}={}", self.left.serialize(), self.right.serialize())
    }

    /// Parse a `left = right` line.
    pub fn parse(text: &str) -> EqlabResult<Self> {
        let (left, right) = text.split_once('=').ok_or_else(|| {
            EqlabError::parse(format!("expected an equation of the form L = R, got {text:?}"))
        })?;
        Ok(Self::new(Term::parse(left)?, Term::parse(right)?))
    }
}

impl std::fmt::Display for Equation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.left, self.right)
    }
}

/// Sort commutative arguments, validating operator references on the way.
pub fn canonicalize_term(term: &Term, spec: &UniverseSpec) -> EqlabResult<Term> {
    match term {
        Term::Var(_) => Ok(term.clone()),
        Term::Op { name, args } => {
            let op = spec.operation(name).ok_or_else(|| {
                EqlabError::invalid_argument(format!("unknown operation: {name}"))
            })?;
            if args.len() != op.arity as usize {
                return Err(EqlabError::invalid_argument(format!(
                    "operation {} expects {} argument(s), got {}",
                    name,
                    op.arity,
                    args.len()
                )));
            }
            let mut canon_args = args
                .iter()
                .map(|arg| canonicalize_term(arg, spec))
                .collect::<EqlabResult<Vec<_>>>()?;
            if op.arity == 2 && op.commutative && canon_args[0].serialize() > canon_args[1].serialize()
            {
                canon_args.swap(0, 1);
            }
            Ok(Term::op(name.clone(), canon_args))
        }
    }
}

/// Renamings of equations with more distinct variables than this are not
/// minimized exhaustively (the search is factorial in the variable count).
const MAX_EXACT_RENAME_VARS: usize = 7;

fn distinct_variables(left: &Term, right: &Term) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for name in left.variables().into_iter().chain(right.variables()) {
        if !seen.iter().any(|known| known == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

fn rename_with(term: &Term, mapping: &HashMap<&str, String>) -> Term {
    match term {
        Term::Var(name) => Term::var(mapping[name.as_str()].clone()),
        Term::Op { name, args } => Term::op(
            name.clone(),
            args.iter().map(|arg| rename_with(arg, mapping)).collect(),
        ),
    }
}

fn side_key(term: &Term) -> (usize, String) {
    (term.size(), term.serialize())
}

/// First-encounter renaming of a side pair, used beyond the exhaustive
/// minimization bound.
fn rename_first_encounter(first: &Term, second: &Term) -> Equation {
    fn walk(term: &Term, mapping: &mut HashMap<String, String>) -> Term {
        match term {
            Term::Var(name) => {
                let next = format!("x{}", mapping.len());
                let fresh = mapping.entry(name.clone()).or_insert(next);
                Term::var(fresh.clone())
            }
            Term::Op { name, args } => Term::op(
                name.clone(),
                args.iter().map(|arg| walk(arg, mapping)).collect(),
            ),
        }
    }
    let mut mapping = HashMap::new();
    let first = walk(first, &mut mapping);
    let second = walk(second, &mut mapping);
    Equation::new(first, second)
}

/// Full equation canonicalization.
///
/// Renaming, commutative sorting, and side ordering all interact: renaming
/// changes the serialized forms that sorting and ordering compare. A
/// single rename-then-order pass is therefore not stable. Instead the
/// canonical form is the minimum, under the `(size, serialized)` pair key,
/// over every bijective renaming of the equation's variables onto
/// `x0…x{k-1}` and both side orders, with commutative arguments re-sorted
/// after each renaming. The result is idempotent and side-symmetric, and
/// the winning candidate always names variables in first-encounter order.
pub fn canonicalize_equation(equation: &Equation, spec: &UniverseSpec) -> EqlabResult<Equation> {
    let left = canonicalize_term(&equation.left, spec)?;
    let right = canonicalize_term(&equation.right, spec)?;

    let variables = distinct_variables(&left, &right);
    if variables.len() > MAX_EXACT_RENAME_VARS {
        let forward = rename_first_encounter(&left, &right);
        let backward = rename_first_encounter(&right, &left);
        let forward_key = (side_key(&forward.left), side_key(&forward.right));
        let backward_key = (side_key(&backward.left), side_key(&backward.right));
        return Ok(if backward_key < forward_key {
            backward
        } else {
            forward
        });
    }

    let mut best: Option<(((usize, String), (usize, String)), Equation)> = None;
    for assignment in (0..variables.len()).permutations(variables.len()) {
        let mapping: HashMap<&str, String> = variables
            .iter()
            .zip(&assignment)
            .map(|(name, index)| (name.as_str(), format!("x{index}")))
            .collect();
        let renamed_left = canonicalize_term(&rename_with(&left, &mapping), spec)?;
        let renamed_right = canonicalize_term(&rename_with(&right, &mapping), spec)?;
        for candidate in [
            Equation::new(renamed_left.clone(), renamed_right.clone()),
            Equation::new(renamed_right, renamed_left),
        ] {
            let key = (side_key(&candidate.left), side_key(&candidate.right));
            if best
                .as_ref()
                .map_or(true, |(best_key, _)| key < *best_key)
            {
                best = Some((key, candidate));
            }
        }
    }
    // Every term contains at least one variable, and permutations of the
    // empty set still yield one (empty) assignment.
    Ok(best.expect("at least one renaming candidate").1)
}

/// Symmetry class of an equation: the key of its canonical form.
pub fn symmetry_class(equation: &Equation, spec: &UniverseSpec) -> EqlabResult<String> {
    Ok(canonicalize_equation(equation, spec)?.key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::OperationSpec;

    fn spec() -> UniverseSpec {
        UniverseSpec::new(
            vec![
                OperationSpec::new("f", 2, true),
                OperationSpec::new("g", 1, false),
            ],
            3,
            5,
        )
        .unwrap()
    }

    fn canon(text: &str) -> Equation {
        canonicalize_equation(&Equation::parse(text).unwrap(), &spec()).unwrap()
    }

    #[test]
    fn commutative_children_sorted() {
        let eq = canon("f(x1,x0)=x2");
        // Sorting happens before renaming: f(x1,x0) -> f(x0,x1).
        assert_eq!(eq.key(), "x0=f(x1,x2)");
        let term = canonicalize_term(&Term::parse("f(x2,x1)").unwrap(), &spec()).unwrap();
        assert_eq!(term.serialize(), "f(x1,x2)");
    }

    #[test]
    fn variables_renamed_by_first_encounter() {
        let eq = canon("f(x2,x2)=x1");
        assert_eq!(eq.key(), "x0=f(x1,x1)");
    }

    #[test]
    fn sides_ordered_smaller_first() {
        let a = canon("f(x0,x1)=x0");
        assert_eq!(a.left.serialize(), "x0");
        assert_eq!(a.right.serialize(), "f(x0,x1)");
    }

    #[test]
    fn idempotent() {
        let once = canon("f(x2,g(x0))=g(x1)");
        let twice = canonicalize_equation(&once, &spec()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn renaming_keeps_commutative_arguments_sorted() {
        // A single rename-then-order pass would leave f(x1,x0) unsorted
        // here; the minimization must not.
        let eq = canon("g(x1)=f(x0,x1)");
        assert_eq!(eq.key(), "g(x0)=f(x0,x1)");
        let twice = canonicalize_equation(&eq, &spec()).unwrap();
        assert_eq!(eq, twice);
    }

    #[test]
    fn side_symmetric() {
        let forward = canon("f(x0,x1)=g(x2)");
        let backward = canon("g(x2)=f(x0,x1)");
        assert_eq!(forward, backward);
        assert_eq!(
            symmetry_class(&Equation::parse("f(x0,x1)=g(x2)").unwrap(), &spec()).unwrap(),
            symmetry_class(&Equation::parse("g(x2)=f(x0,x1)").unwrap(), &spec()).unwrap()
        );
    }

    #[test]
    fn unknown_operation_rejected() {
        let eq = Equation::parse("h(x0,x1)=x0").unwrap();
        let err = canonicalize_equation(&eq, &spec()).err().unwrap();
        assert!(err.to_string().contains("unknown operation"));
    }

    #[test]
    fn arity_mismatch_rejected() {
        let eq = Equation::parse("g(x0,x1)=x0").unwrap();
        let err = canonicalize_equation(&eq, &spec()).err().unwrap();
        assert!(err.to_string().contains("argument"));
    }
}
