//! Breadth-first rewriting.
//!
//! Every axiom contributes two rules (`axiom_i`: lhs→rhs and `axiom_i_sym`:
//! rhs→lhs). The search starts from the goal's left side and expands each
//! term into every term reachable by a single rewrite at any position; it
//! succeeds when a term serializes equal to the goal's right side. Matching
//! is linear: the first use of a pattern variable binds it, later uses must
//! be equal. Terms are worked on raw, with no canonicalization.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Instant;

use tracing::debug;

use eqlab_core::canonical::Equation;
use eqlab_core::term::Term;

use crate::prover::{ProofOutcome, ProofSearchConfig, ProofStatus, ProofStep, RuleOrdering};

struct Rule {
    name: String,
    lhs: Term,
    rhs: Term,
}

fn derive_rules(axioms: &[Equation], ordering: RuleOrdering) -> Vec<Rule> {
    let mut rules = Vec::with_capacity(axioms.len() * 2);
    for (idx, axiom) in axioms.iter().enumerate() {
        rules.push(Rule {
            name: format!("axiom_{idx}"),
            lhs: axiom.left.clone(),
            rhs: axiom.right.clone(),
        });
        rules.push(Rule {
            name: format!("axiom_{idx}_sym"),
            lhs: axiom.right.clone(),
            rhs: axiom.left.clone(),
        });
    }
    match ordering {
        RuleOrdering::Given => {}
        RuleOrdering::Reverse => rules.reverse(),
        // Stable sorts keep the given order among equal sizes.
        RuleOrdering::ShortestLhs => rules.sort_by_key(|rule| rule.lhs.size()),
        RuleOrdering::LongestLhs => rules.sort_by_key(|rule| std::cmp::Reverse(rule.lhs.size())),
    }
    rules
}

fn match_pattern(pattern: &Term, target: &Term, bindings: &mut HashMap<String, Term>) -> bool {
    match pattern {
        Term::Var(name) => match bindings.get(name) {
            Some(existing) => existing == target,
            None => {
                bindings.insert(name.clone(), target.clone());
                true
            }
        },
        Term::Op { name, args } => match target {
            Term::Op {
                name: target_name,
                args: target_args,
            } if name == target_name && args.len() == target_args.len() => args
                .iter()
                .zip(target_args)
                .all(|(pattern, target)| match_pattern(pattern, target, bindings)),
            _ => false,
        },
    }
}

fn apply_substitution(term: &Term, bindings: &HashMap<String, Term>) -> Term {
    match term {
        Term::Var(name) => bindings.get(name).cloned().unwrap_or_else(|| term.clone()),
        Term::Op { name, args } => Term::op(
            name.clone(),
            args.iter()
                .map(|arg| apply_substitution(arg, bindings))
                .collect(),
        ),
    }
}

/// Every term obtained by applying the rule once, at any position.
fn rewrite_term(term: &Term, rule: &Rule) -> Vec<Term> {
    let mut results = Vec::new();
    let mut bindings = HashMap::new();
    if match_pattern(&rule.lhs, term, &mut bindings) {
        results.push(apply_substitution(&rule.rhs, &bindings));
    }
    if let Term::Op { name, args } = term {
        for (idx, arg) in args.iter().enumerate() {
            for rewritten in rewrite_term(arg, rule) {
                let mut new_args = args.clone();
                new_args[idx] = rewritten;
                results.push(Term::op(name.clone(), new_args));
            }
        }
    }
    results
}

/// Search for a rewrite path from the goal's left side to its right side.
pub fn prove(axioms: &[Equation], goal: &Equation, config: &ProofSearchConfig) -> ProofOutcome {
    let started = Instant::now();
    let deadline = started + crate::budget_duration(config.max_seconds);

    let target = goal.right.serialize();
    if goal.left.serialize() == target {
        let step = ProofStep {
            rule: "reflexivity".to_string(),
            left: goal.left.serialize(),
            right: target,
        };
        return ProofOutcome {
            status: ProofStatus::Proved,
            elapsed_seconds: started.elapsed().as_secs_f64(),
            steps: Some(vec![step]),
        };
    }

    let rules = derive_rules(axioms, config.rule_ordering);

    let mut queue: VecDeque<(Term, Vec<ProofStep>)> = VecDeque::new();
    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(goal.left.serialize());
    queue.push_back((goal.left.clone(), Vec::new()));
    let mut expanded = 0usize;

    let finish = |status: ProofStatus, steps: Option<Vec<ProofStep>>| {
        debug!(%status, "proof search finished");
        ProofOutcome {
            status,
            elapsed_seconds: started.elapsed().as_secs_f64(),
            steps,
        }
    };

    while let Some((term, steps)) = queue.pop_front() {
        if Instant::now() >= deadline {
            return finish(ProofStatus::Timeout, None);
        }
        if steps.len() >= config.max_steps {
            continue;
        }
        for rule in &rules {
            for rewritten in rewrite_term(&term, rule) {
                let serialized = rewritten.serialize();
                if seen.contains(&serialized) {
                    continue;
                }
                let mut next_steps = steps.clone();
                next_steps.push(ProofStep {
                    rule: rule.name.clone(),
                    left: term.serialize(),
                    right: serialized.clone(),
                });
                if serialized == target {
                    return finish(ProofStatus::Proved, Some(next_steps));
                }
                seen.insert(serialized);
                queue.push_back((rewritten, next_steps));
                expanded += 1;
                if expanded >= config.max_terms {
                    return finish(ProofStatus::Cutoff, None);
                }
            }
        }
    }

    finish(ProofStatus::Unknown, None)
}
