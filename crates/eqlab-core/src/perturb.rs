//! Perturbation neighbors.
//!
//! A neighbor of an axiom is any distinct canonical equation reachable by a
//! single syntactic edit on either side:
//! - replace one variable occurrence with another declared variable
//! - replace one operator with another of equal arity (name-sorted choices)
//! - swap the arguments of a non-commutative binary node
//! - apply any of the above inside any subterm
//!
//! Every candidate is re-canonicalized; the original equation is excluded
//! and duplicates collapse on their canonical key. Output is sorted by key.

use std::collections::BTreeMap;

use crate::canonical::{canonicalize_equation, Equation};
use crate::errors::EqlabResult;
use crate::spec::{OperationSpec, UniverseSpec};
use crate::term::Term;

fn op_choices(spec: &UniverseSpec) -> BTreeMap<u8, Vec<&OperationSpec>> {
    let mut sorted: Vec<&OperationSpec> = spec.operations.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    let mut choices: BTreeMap<u8, Vec<&OperationSpec>> = BTreeMap::new();
    for op in sorted {
        choices.entry(op.arity).or_default().push(op);
    }
    choices
}

fn collect_neighbors(
    spec: &UniverseSpec,
    var_names: &[String],
    choices: &BTreeMap<u8, Vec<&OperationSpec>>,
    term: &Term,
    into: &mut BTreeMap<String, Term>,
) {
    let add = |candidate: Term, into: &mut BTreeMap<String, Term>| {
        into.entry(candidate.serialize()).or_insert(candidate);
    };

    match term {
        Term::Var(name) => {
            for other in var_names {
                if other != name {
                    add(Term::var(other.clone()), into);
                }
            }
        }
        Term::Op { name, args } => {
            let arity = args.len() as u8;
            if let Some(ops) = choices.get(&arity) {
                for op in ops {
                    if op.name != *name {
                        add(Term::op(op.name.clone(), args.clone()), into);
                    }
                }
            }
            let commutative = spec.operation(name).map(|op| op.commutative).unwrap_or(false);
            if args.len() == 2 && !commutative {
                add(
                    Term::op(name.clone(), vec![args[1].clone(), args[0].clone()]),
                    into,
                );
            }
            for (idx, arg) in args.iter().enumerate() {
                let mut arg_neighbors = BTreeMap::new();
                collect_neighbors(spec, var_names, choices, arg, &mut arg_neighbors);
                for neighbor in arg_neighbors.into_values() {
                    let mut new_args = args.clone();
                    new_args[idx] = neighbor;
                    add(Term::op(name.clone(), new_args), into);
                }
            }
        }
    }
}

/// All 1-edit variants of a single term, sorted by serialized form.
pub fn enumerate_neighbor_terms(spec: &UniverseSpec, term: &Term) -> Vec<Term> {
    let var_names: Vec<String> = spec.variable_names().collect();
    let choices = op_choices(spec);
    let mut neighbors = BTreeMap::new();
    collect_neighbors(spec, &var_names, &choices, term, &mut neighbors);
    neighbors.into_values().collect()
}

/// Distinct canonical 1-edit neighbors of an axiom, excluding the axiom
/// itself, sorted by canonical key, optionally capped.
pub fn enumerate_neighbor_axioms(
    spec: &UniverseSpec,
    axiom: &Equation,
    limit: Option<usize>,
) -> EqlabResult<Vec<Equation>> {
    let base = canonicalize_equation(axiom, spec)?;
    let base_key = base.key();
    let mut neighbors: BTreeMap<String, Equation> = BTreeMap::new();

    for candidate in enumerate_neighbor_terms(spec, &base.left) {
        let edited = canonicalize_equation(&Equation::new(candidate, base.right.clone()), spec)?;
        let key = edited.key();
        if key != base_key {
            neighbors.entry(key).or_insert(edited);
        }
    }
    for candidate in enumerate_neighbor_terms(spec, &base.right) {
        let edited = canonicalize_equation(&Equation::new(base.left.clone(), candidate), spec)?;
        let key = edited.key();
        if key != base_key {
            neighbors.entry(key).or_insert(edited);
        }
    }

    let ordered: Vec<Equation> = neighbors.into_values().collect();
    Ok(match limit {
        Some(cap) => ordered.into_iter().take(cap).collect(),
        None => ordered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::OperationSpec;

    fn spec() -> UniverseSpec {
        UniverseSpec::new(
            vec![
                OperationSpec::new("f", 2, false),
                OperationSpec::new("h", 2, false),
            ],
            2,
            5,
        )
        .unwrap()
    }

    #[test]
    fn variable_neighbors() {
        let neighbors = enumerate_neighbor_terms(&spec(), &Term::var("x0"));
        assert_eq!(
            neighbors.iter().map(Term::serialize).collect::<Vec<_>>(),
            vec!["x1"]
        );
    }

    #[test]
    fn operator_swap_argument_swap_and_recursion() {
        let term = Term::parse("f(x0,x1)").unwrap();
        let neighbors = enumerate_neighbor_terms(&spec(), &term);
        let keys: Vec<String> = neighbors.iter().map(Term::serialize).collect();
        assert!(keys.contains(&"h(x0,x1)".to_string()));
        assert!(keys.contains(&"f(x1,x0)".to_string()));
        assert!(keys.contains(&"f(x0,x0)".to_string()));
        assert!(keys.contains(&"f(x1,x1)".to_string()));
    }

    #[test]
    fn commutative_nodes_do_not_swap_arguments() {
        let spec =
            UniverseSpec::new(vec![OperationSpec::new("f", 2, true)], 2, 5).unwrap();
        let term = Term::parse("f(x0,x1)").unwrap();
        let neighbors = enumerate_neighbor_terms(&spec, &term);
        let keys: Vec<String> = neighbors.iter().map(Term::serialize).collect();
        assert!(!keys.contains(&"f(x1,x0)".to_string()));
    }

    #[test]
    fn axiom_neighbors_exclude_original_and_dedupe() {
        let axiom = Equation::parse("f(x0,x1)=x0").unwrap();
        let neighbors = enumerate_neighbor_axioms(&spec(), &axiom, None).unwrap();
        let base = canonicalize_equation(&axiom, &spec()).unwrap().key();
        let mut seen = std::collections::BTreeSet::new();
        for neighbor in &neighbors {
            assert_ne!(neighbor.key(), base);
            assert!(seen.insert(neighbor.key()), "duplicate neighbor");
        }
        assert!(!neighbors.is_empty());
    }

    #[test]
    fn limit_caps_sorted_output() {
        let axiom = Equation::parse("f(x0,x1)=x0").unwrap();
        let all = enumerate_neighbor_axioms(&spec(), &axiom, None).unwrap();
        let capped = enumerate_neighbor_axioms(&spec(), &axiom, Some(2)).unwrap();
        assert_eq!(capped.len(), 2);
        assert_eq!(&all[..2], &capped[..]);
    }
}
