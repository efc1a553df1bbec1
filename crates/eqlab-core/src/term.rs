//! Algebraic terms.
//!
//! A term is either a variable or an operator application. Terms are
//! immutable values with structural equality; the serialized form
//! (`name` or `name(a,b,…)`) is the canonical string used for hashing,
//! ordering, and deduplication everywhere in the workspace.
//!
//! Serde note: a term serializes as its canonical string and deserializes
//! by parsing it back, so persisted artifacts stay human-readable.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{EqlabError, EqlabResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Var(String),
    Op { name: String, args: Vec<Term> },
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(name.into())
    }

    pub fn op(name: impl Into<String>, args: Vec<Term>) -> Self {
        Term::Op {
            name: name.into(),
            args,
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    /// Node count.
    pub fn size(&self) -> usize {
        match self {
            Term::Var(_) => 1,
            Term::Op { args, .. } => 1 + args.iter().map(Term::size).sum::<usize>(),
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            Term::Var(_) => 1,
            Term::Op { args, .. } => 1 + args.iter().map(Term::depth).max().unwrap_or(0),
        }
    }

    /// Variable names in pre-order, with repetition (a multiset).
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, into: &mut Vec<&'a str>) {
        match self {
            Term::Var(name) => into.push(name),
            Term::Op { args, .. } => {
                for arg in args {
                    arg.collect_variables(into);
                }
            }
        }
    }

    /// Canonical string form: `name` or `name(a,b,…)`.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.write_into(&mut out);
        out
    }

    fn write_into(&self, out: &mut String) {
        match self {
            Term::Var(name) => out.push_str(name),
            Term::Op { name, args } => {
                out.push_str(name);
                out.push('(');
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    arg.write_into(out);
                }
                out.push(')');
            }
        }
    }

    /// Parse the grammar `term := name | name "(" term ("," term)* ")"`.
    ///
    /// Names are maximal runs of characters other than `(`, `)` and `,`.
    /// Trailing input is rejected.
    pub fn parse(text: &str) -> EqlabResult<Term> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EqlabError::parse("cannot parse an empty term"));
        }
        let bytes = text.as_bytes();
        let (term, idx) = parse_term(text, bytes, 0)?;
        if idx != bytes.len() {
            return Err(EqlabError::parse(format!(
                "unexpected trailing text at position {idx} in {text:?}"
            )));
        }
        Ok(term)
    }
}

fn parse_name<'a>(source: &'a str, bytes: &[u8], mut idx: usize) -> EqlabResult<(&'a str, usize)> {
    let start = idx;
    while idx < bytes.len() && !matches!(bytes[idx], b'(' | b')' | b',') {
        idx += 1;
    }
    if start == idx {
        return Err(EqlabError::parse(format!(
            "expected a name at position {idx} in {source:?}"
        )));
    }
    Ok((&source[start..idx], idx))
}

fn parse_term(source: &str, bytes: &[u8], idx: usize) -> EqlabResult<(Term, usize)> {
    let (name, mut idx) = parse_name(source, bytes, idx)?;
    if idx < bytes.len() && bytes[idx] == b'(' {
        idx += 1;
        let mut args = Vec::new();
        loop {
            let (arg, next) = parse_term(source, bytes, idx)?;
            args.push(arg);
            idx = next;
            match bytes.get(idx) {
                Some(b',') => idx += 1,
                Some(b')') => {
                    idx += 1;
                    break;
                }
                Some(other) => {
                    return Err(EqlabError::parse(format!(
                        "unexpected character {:?} at position {idx} in {source:?}",
                        char::from(*other)
                    )))
                }
                None => return Err(EqlabError::parse("unclosed argument list")),
            }
        }
        return Ok((Term::op(name, args), idx));
    }
    Ok((Term::var(name), idx))
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.serialize())
    }
}

impl<'de> Deserialize<'de> for Term {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Term::parse(&text).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_roundtrip() {
        let term = Term::op(
            "f",
            vec![Term::var("x0"), Term::op("g", vec![Term::var("x1")])],
        );
        let text = term.serialize();
        assert_eq!(text, "f(x0,g(x1))");
        assert_eq!(Term::parse(&text).unwrap(), term);
    }

    #[test]
    fn measures() {
        let term = Term::parse("f(f(x0,x0),x1)").unwrap();
        assert_eq!(term.size(), 5);
        assert_eq!(term.depth(), 3);
        assert_eq!(term.variables(), vec!["x0", "x0", "x1"]);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(Term::parse("").is_err());
        assert!(Term::parse("f(x0,x1)x2").is_err());
        assert!(Term::parse("f(x0").is_err());
        assert!(Term::parse("f(,x0)").is_err());
        assert!(Term::parse("(x0)").is_err());
    }

    #[test]
    fn serde_as_string() {
        let term = Term::parse("f(x0,x1)").unwrap();
        let json = serde_json::to_string(&term).unwrap();
        assert_eq!(json, "\"f(x0,x1)\"");
        let back: Term = serde_json::from_str(&json).unwrap();
        assert_eq!(back, term);
    }
}
