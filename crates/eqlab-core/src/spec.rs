//! Universe specifications.
//!
//! A universe spec fixes the signature the laboratory works in: the ordered
//! list of operators (name, arity, commutativity), the variable budget, and
//! the maximum term size. It is validated once at the boundary and immutable
//! afterwards; enumeration order and run ids depend on the declared operator
//! order, so callers must not reorder operations after construction.

use serde::{Deserialize, Serialize};

use crate::errors::{EqlabError, EqlabResult};

/// One operator of the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSpec {
    pub name: String,
    pub arity: u8,
    #[serde(default)]
    pub commutative: bool,
}

impl OperationSpec {
    pub fn new(name: impl Into<String>, arity: u8, commutative: bool) -> Self {
        Self {
            name: name.into(),
            arity,
            commutative,
        }
    }

    /// Table slot count on a domain of the given size.
    pub fn slots(&self, domain_size: usize) -> usize {
        match self.arity {
            1 => domain_size,
            _ => domain_size * domain_size,
        }
    }
}

/// The signature plus enumeration budgets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseSpec {
    #[serde(default = "default_version")]
    pub version: String,
    pub logic: String,
    pub operations: Vec<OperationSpec>,
    pub max_vars: usize,
    pub max_term_size: usize,
}

fn default_version() -> String {
    crate::SPEC_VERSION_V0.to_string()
}

impl UniverseSpec {
    pub fn new(
        operations: Vec<OperationSpec>,
        max_vars: usize,
        max_term_size: usize,
    ) -> EqlabResult<Self> {
        let spec = Self {
            version: default_version(),
            logic: "equational".to_string(),
            operations,
            max_vars,
            max_term_size,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Boundary validation. Every spec must pass this before use.
    pub fn validate(&self) -> EqlabResult<()> {
        if self.logic != "equational" {
            return Err(EqlabError::invalid_argument(format!(
                "unsupported logic: {} (only \"equational\" is supported)",
                self.logic
            )));
        }
        if self.max_vars < 1 {
            return Err(EqlabError::invalid_argument("max_vars must be >= 1"));
        }
        if self.max_term_size < 1 {
            return Err(EqlabError::invalid_argument("max_term_size must be >= 1"));
        }
        let mut seen = std::collections::BTreeSet::new();
        for op in &self.operations {
            if !seen.insert(op.name.as_str()) {
                return Err(EqlabError::invalid_argument(format!(
                    "duplicate operation name: {}",
                    op.name
                )));
            }
            if !matches!(op.arity, 1 | 2) {
                return Err(EqlabError::invalid_argument(format!(
                    "unsupported arity for {}: {}",
                    op.name, op.arity
                )));
            }
            if op.commutative && op.arity != 2 {
                return Err(EqlabError::invalid_argument(format!(
                    "operation {} is commutative but not binary",
                    op.name
                )));
            }
        }
        Ok(())
    }

    pub fn from_json(text: &str) -> EqlabResult<Self> {
        let spec: UniverseSpec = serde_json::from_str(text)
            .map_err(|e| EqlabError::serialization(format!("failed to decode universe spec: {e}")))?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn operation(&self, name: &str) -> Option<&OperationSpec> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// First declared operation of the given arity, if any.
    pub fn first_operation_with_arity(&self, arity: u8) -> Option<&OperationSpec> {
        self.operations.iter().find(|op| op.arity == arity)
    }

    /// Variable names `x0 … x{max_vars-1}` in declaration order.
    pub fn variable_names(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.max_vars).map(|idx| format!("x{idx}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_spec() -> UniverseSpec {
        UniverseSpec::new(vec![OperationSpec::new("f", 2, false)], 2, 3).unwrap()
    }

    #[test]
    fn valid_spec_accepted() {
        let spec = binary_spec();
        assert_eq!(spec.version, "v0");
        assert_eq!(
            spec.variable_names().collect::<Vec<_>>(),
            vec!["x0".to_string(), "x1".to_string()]
        );
    }

    #[test]
    fn rejects_bad_logic() {
        let mut spec = binary_spec();
        spec.logic = "first_order".to_string();
        let err = spec.validate().err().unwrap();
        assert!(err.to_string().contains("logic"));
    }

    #[test]
    fn rejects_duplicate_names_and_bad_arity() {
        let dup = UniverseSpec::new(
            vec![
                OperationSpec::new("f", 2, false),
                OperationSpec::new("f", 1, false),
            ],
            1,
            1,
        );
        assert!(dup.err().unwrap().to_string().contains("duplicate"));

        let arity = UniverseSpec::new(vec![OperationSpec::new("t", 3, false)], 1, 1);
        assert!(arity.err().unwrap().to_string().contains("arity"));
    }

    #[test]
    fn rejects_commutative_unary() {
        let spec = UniverseSpec::new(vec![OperationSpec::new("g", 1, true)], 1, 1);
        assert!(spec.err().unwrap().to_string().contains("commutative"));
    }

    #[test]
    fn rejects_zero_budgets() {
        assert!(UniverseSpec::new(vec![], 0, 1).is_err());
        assert!(UniverseSpec::new(vec![], 1, 0).is_err());
    }

    #[test]
    fn decodes_json() {
        let spec = UniverseSpec::from_json(
            r#"{"version":"v0","logic":"equational",
                "operations":[{"name":"f","arity":2,"commutative":true}],
                "max_vars":2,"max_term_size":3}"#,
        )
        .unwrap();
        assert!(spec.operations[0].commutative);
        assert_eq!(spec.first_operation_with_arity(2).unwrap().name, "f");
        assert!(spec.first_operation_with_arity(1).is_none());
    }
}
