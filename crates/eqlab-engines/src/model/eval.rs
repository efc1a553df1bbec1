//! Shared evaluation machinery for the model engines.
//!
//! Equations are compiled once per search call into an interned node arena:
//! variables become indices into the assignment tuple, operator applications
//! reference their operator's position in the spec. Identical subterms share
//! a node, which is what makes the prunable engine's per-check memoization
//! effective. Assignments (all tuples of domain values for the collected
//! variables) are materialized up front.

use std::collections::{BTreeSet, HashMap};

use eqlab_core::canonical::Equation;
use eqlab_core::errors::{EqlabError, EqlabResult};
use eqlab_core::spec::UniverseSpec;
use eqlab_core::term::Term;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Node {
    Var(usize),
    Unary { op: usize, arg: usize },
    Binary { op: usize, left: usize, right: usize },
}

pub(crate) struct CompiledSystem {
    pub nodes: Vec<Node>,
    /// Root node pairs of the equations every model must satisfy.
    pub required: Vec<(usize, usize)>,
    /// Root node pair of the equation a model must fail, if any.
    pub must_violate: Option<(usize, usize)>,
    /// Every assignment of the collected variables to domain values.
    pub assignments: Vec<Vec<usize>>,
}

struct Compiler<'a> {
    spec: &'a UniverseSpec,
    var_index: HashMap<String, usize>,
    interned: HashMap<Term, usize>,
    nodes: Vec<Node>,
}

impl<'a> Compiler<'a> {
    fn compile(&mut self, term: &Term) -> EqlabResult<usize> {
        if let Some(&id) = self.interned.get(term) {
            return Ok(id);
        }
        let node = match term {
            Term::Var(name) => Node::Var(self.var_index[name.as_str()]),
            Term::Op { name, args } => {
                let op = self
                    .spec
                    .operations
                    .iter()
                    .position(|op| op.name == *name)
                    .ok_or_else(|| {
                        EqlabError::invalid_argument(format!("unknown operation: {name}"))
                    })?;
                let arity = self.spec.operations[op].arity as usize;
                if args.len() != arity {
                    return Err(EqlabError::invalid_argument(format!(
                        "operation {name} expects {arity} argument(s), got {}",
                        args.len()
                    )));
                }
                match args.len() {
                    1 => Node::Unary {
                        op,
                        arg: self.compile(&args[0])?,
                    },
                    _ => Node::Binary {
                        op,
                        left: self.compile(&args[0])?,
                        right: self.compile(&args[1])?,
                    },
                }
            }
        };
        let id = self.nodes.len();
        self.nodes.push(node);
        self.interned.insert(term.clone(), id);
        Ok(id)
    }
}

/// Lazy odometer over all value tuples of a given width over `0..size`,
/// rightmost position varying fastest (lexicographic ascending). The naive
/// engine iterates whole operation tables through this, so it must stay
/// lazy: a binary table on domain n has `n^(n*n)` candidates.
pub(crate) struct TupleOdometer {
    current: Vec<usize>,
    size: usize,
    exhausted: bool,
}

impl TupleOdometer {
    pub fn new(width: usize, size: usize) -> Self {
        Self {
            current: vec![0; width],
            size,
            exhausted: size == 0 && width > 0,
        }
    }
}

impl Iterator for TupleOdometer {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.exhausted {
            return None;
        }
        let item = self.current.clone();
        let mut pos = self.current.len();
        loop {
            if pos == 0 {
                self.exhausted = true;
                break;
            }
            pos -= 1;
            self.current[pos] += 1;
            if self.current[pos] < self.size {
                break;
            }
            self.current[pos] = 0;
        }
        Some(item)
    }
}

/// Materialized value tuples, for variable assignments (bounded by
/// `size^max_vars`).
pub(crate) fn value_tuples(width: usize, size: usize) -> Vec<Vec<usize>> {
    TupleOdometer::new(width, size).collect()
}

impl CompiledSystem {
    /// Compile the required equations plus the optional must-violate
    /// equation against the spec, collecting variables from all of them.
    pub fn compile(
        spec: &UniverseSpec,
        equations: &[Equation],
        must_violate: Option<&Equation>,
        size: usize,
    ) -> EqlabResult<Self> {
        let mut var_names: BTreeSet<String> = BTreeSet::new();
        for equation in equations.iter().chain(must_violate) {
            for name in equation.left.variables() {
                var_names.insert(name.to_string());
            }
            for name in equation.right.variables() {
                var_names.insert(name.to_string());
            }
        }
        let var_index: HashMap<String, usize> = var_names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        let var_count = var_index.len();

        let mut compiler = Compiler {
            spec,
            var_index,
            interned: HashMap::new(),
            nodes: Vec::new(),
        };
        let required = equations
            .iter()
            .map(|equation| {
                Ok((
                    compiler.compile(&equation.left)?,
                    compiler.compile(&equation.right)?,
                ))
            })
            .collect::<EqlabResult<Vec<_>>>()?;
        let must_violate = must_violate
            .map(|equation| {
                Ok::<_, EqlabError>((
                    compiler.compile(&equation.left)?,
                    compiler.compile(&equation.right)?,
                ))
            })
            .transpose()?;

        Ok(Self {
            nodes: compiler.nodes,
            required,
            must_violate,
            assignments: value_tuples(var_count, size),
        })
    }

    fn evaluate(&self, node: usize, env: &[usize], tables: &[Vec<usize>], size: usize) -> usize {
        match self.nodes[node] {
            Node::Var(var) => env[var],
            Node::Unary { op, arg } => tables[op][self.evaluate(arg, env, tables, size)],
            Node::Binary { op, left, right } => {
                let left = self.evaluate(left, env, tables, size);
                let right = self.evaluate(right, env, tables, size);
                tables[op][left * size + right]
            }
        }
    }

    /// Does the full model satisfy `left = right` on every assignment?
    pub fn satisfies(&self, roots: (usize, usize), tables: &[Vec<usize>], size: usize) -> bool {
        self.assignments.iter().all(|env| {
            self.evaluate(roots.0, env, tables, size) == self.evaluate(roots.1, env, tables, size)
        })
    }

    pub fn satisfies_required(&self, tables: &[Vec<usize>], size: usize) -> bool {
        self.required
            .iter()
            .all(|&roots| self.satisfies(roots, tables, size))
    }
}
